//! Spreadsheet output

use crate::model::{Dataset, HEADERS};
use crate::output::traits::{DatasetSink, OutputError, OutputResult};
use rust_xlsxwriter::{Format, Workbook};
use std::path::{Path, PathBuf};

/// Last data row index an XLSX worksheet can hold (row 0 is the header)
const MAX_DATA_ROWS: usize = 1_048_575;

const SHEET_NAME: &str = "Employees";

/// Writes the dataset as a single-sheet XLSX workbook
#[derive(Debug, Clone)]
pub struct XlsxSink {
    path: PathBuf,
}

impl XlsxSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DatasetSink for XlsxSink {
    fn format(&self) -> &'static str {
        "xlsx"
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, dataset: &Dataset) -> OutputResult<()> {
        if dataset.len() > MAX_DATA_ROWS {
            return Err(OutputError::TooManyRows {
                format: self.format(),
                rows: dataset.len(),
            });
        }

        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold();

        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME)?;

        for (col, header) in HEADERS.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, *header, &header_format)?;
        }

        for (idx, row) in dataset.iter().enumerate() {
            let row_num = (idx + 1) as u32;
            for (col, value) in row.fields().iter().enumerate() {
                worksheet.write_string(row_num, col as u16, *value)?;
            }
        }

        workbook.save(&self.path)?;
        Ok(())
    }
}
