use calamine::{open_workbook, Reader, Xlsx};
use rust_xlsxwriter::{Format, Workbook};
use std::fs;
use std::path::{Path, PathBuf};

use super::ExportTable;
use crate::config::OutputConfig;
use crate::error::AppError;
use crate::models::Record;

const SHEET_NAME: &str = "QnA";
const COLUMN_WIDTHS: [f64; 3] = [12.0, 60.0, 80.0];

/// Writes the export table as a single-sheet workbook.
pub struct XlsxGenerator {
    output_path: PathBuf,
}

impl XlsxGenerator {
    pub fn new(config: OutputConfig) -> Self {
        Self {
            output_path: config.path,
        }
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn generate(&self, table: &ExportTable) -> Result<(), AppError> {
        if let Some(parent) = self.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME)?;

        let bold = Format::new().set_bold();
        for (col, (header, width)) in ExportTable::HEADERS.iter().zip(COLUMN_WIDTHS).enumerate() {
            worksheet.write_string_with_format(0, col as u16, *header, &bold)?;
            worksheet.set_column_width(col as u16, width)?;
        }

        for (i, record) in table.records().iter().enumerate() {
            let row = (i + 1) as u32;
            worksheet.write_string(row, 0, record.qid.as_str())?;
            worksheet.write_string(row, 1, record.question.as_str())?;
            worksheet.write_string(row, 2, record.answer.as_str())?;
        }

        workbook.save(&self.output_path)?;

        tracing::info!(
            "Wrote {} records to {}",
            table.len(),
            self.output_path.display()
        );
        Ok(())
    }

    /// Reads the first sheet of a workbook written by [`XlsxGenerator::generate`].
    /// The first row is taken as the header.
    pub fn load(path: &Path) -> Result<ExportTable, AppError> {
        let mut workbook: Xlsx<_> = open_workbook(path)?;
        let Some((_name, range)) = workbook.worksheets().into_iter().next() else {
            return Err(AppError::InvalidExport(format!(
                "{} has no worksheets",
                path.display()
            )));
        };

        let cell = |row: &[calamine::Data], i: usize| {
            row.get(i).map(|c| c.to_string()).unwrap_or_default()
        };
        let records: Vec<Record> = range
            .rows()
            .skip(1)
            .map(|row| Record {
                qid: cell(row, 0),
                question: cell(row, 1),
                answer: cell(row, 2),
            })
            .filter(|record| !record.qid.is_empty())
            .collect();

        tracing::info!("Loaded {} records from {}", records.len(), path.display());
        Ok(ExportTable::new(records))
    }
}
