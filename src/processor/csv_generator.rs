use csv::{ReaderBuilder, WriterBuilder};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::ExportTable;
use crate::config::OutputConfig;
use crate::error::AppError;
use crate::models::Record;

/// Lets spreadsheet programs detect UTF-8 (the question text is Korean).
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub struct CsvGenerator {
    output_path: PathBuf,
}

impl CsvGenerator {
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

        let mut file = File::create(&self.output_path)?;
        file.write_all(UTF8_BOM)?;

        let mut wtr = WriterBuilder::new().has_headers(false).from_writer(file);
        wtr.write_record(ExportTable::HEADERS)?;
        for record in table.records() {
            wtr.serialize(record)?;
        }
        wtr.flush()?;

        tracing::info!(
            "Wrote {} records to {}",
            table.len(),
            self.output_path.display()
        );
        Ok(())
    }

    /// Reads back a file written by [`CsvGenerator::generate`].
    pub fn load(path: &Path) -> Result<ExportTable, AppError> {
        let content = fs::read_to_string(path)?;
        let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

        let mut rdr = ReaderBuilder::new().from_reader(content.as_bytes());
        let records = rdr
            .deserialize::<Record>()
            .collect::<Result<Vec<_>, _>>()?;

        tracing::info!("Loaded {} records from {}", records.len(), path.display());
        Ok(ExportTable::new(records))
    }
}
