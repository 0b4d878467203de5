//! Output module for persisting harvested employees
//!
//! This module handles:
//! - Writing the dataset as a CSV table (with a UTF-8 BOM)
//! - Writing the dataset as an XLSX workbook
//! - Summarizing a finished run on the console

mod csv_output;
pub mod stats;
mod traits;
mod xlsx_output;

pub use csv_output::CsvSink;
pub use stats::{print_summary, RunSummary};
pub use traits::{DatasetSink, OutputError, OutputResult};
pub use xlsx_output::XlsxSink;

use crate::config::OutputConfig;
use crate::model::Dataset;

/// Builds the sinks named in the output configuration
pub fn configured_sinks(config: &OutputConfig) -> Vec<Box<dyn DatasetSink>> {
    let csv: Box<dyn DatasetSink> = Box::new(CsvSink::new(&config.csv_path));
    let xlsx: Box<dyn DatasetSink> = Box::new(XlsxSink::new(&config.xlsx_path));
    vec![csv, xlsx]
}

/// Writes the dataset to every sink, stopping at the first failure
///
/// # Returns
///
/// * `Ok(Vec<(String, String)>)` - (format, path) of every file written
/// * `Err(OutputError)` - A sink failed
pub fn write_all(
    dataset: &Dataset,
    sinks: &[Box<dyn DatasetSink>],
) -> OutputResult<Vec<(String, String)>> {
    let mut written = Vec::with_capacity(sinks.len());

    for sink in sinks {
        tracing::info!(
            "Writing {} rows to {} ({})",
            dataset.len(),
            sink.path().display(),
            sink.format()
        );
        sink.write(dataset)?;
        written.push((
            sink.format().to_string(),
            sink.path().display().to_string(),
        ));
    }

    Ok(written)
}
