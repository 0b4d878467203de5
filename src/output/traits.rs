//! Output sink traits and error types
//!
//! A sink receives the finished [`Dataset`] once and persists it. Sinks
//! must write a header row even when the dataset is empty.

use crate::model::Dataset;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Too many rows for {format} output: {rows}")]
    TooManyRows { format: &'static str, rows: usize },
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Trait for tabular dataset writers
pub trait DatasetSink {
    /// Short format name used in log messages
    fn format(&self) -> &'static str;

    /// Destination of the written table
    fn path(&self) -> &Path;

    /// Writes the whole dataset, replacing any existing file
    ///
    /// # Arguments
    ///
    /// * `dataset` - The deduplicated rows to persist
    fn write(&self, dataset: &Dataset) -> OutputResult<()>;
}
