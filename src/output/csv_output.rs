//! CSV table output
//!
//! The file starts with a UTF-8 byte-order mark so spreadsheet programs
//! pick the right encoding for names with non-ASCII letters.

use crate::model::{Dataset, HEADERS};
use crate::output::traits::{DatasetSink, OutputResult};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// UTF-8 byte-order mark
const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Writes the dataset as comma-separated text
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DatasetSink for CsvSink {
    fn format(&self) -> &'static str {
        "csv"
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, dataset: &Dataset) -> OutputResult<()> {
        let mut file = BufWriter::new(File::create(&self.path)?);
        file.write_all(BOM)?;

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        writer.write_record(HEADERS)?;
        for row in dataset {
            writer.write_record(row.fields())?;
        }
        writer.flush()?;

        Ok(())
    }
}
