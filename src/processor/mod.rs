pub mod csv_generator;
pub mod progress_tracker;
pub mod qid_store;
pub mod xlsx_generator;

pub use csv_generator::CsvGenerator;
pub use progress_tracker::ProgressTracker;
pub use qid_store::QidStore;
pub use xlsx_generator::XlsxGenerator;

use std::collections::HashSet;
use std::path::Path;

use crate::{
    config::OutputConfig,
    error::AppError,
    models::{ListingQuery, Record},
    scraping::{PageSource, Scraper},
};

/// Records of one run in export column order: QID, question, answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportTable {
    records: Vec<Record>,
}

impl ExportTable {
    pub const HEADERS: [&'static str; 3] = ["QID", "질문", "답변"];

    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Header row followed by one row per record.
    pub fn rows(&self) -> Vec<Vec<String>> {
        std::iter::once(Self::HEADERS.iter().map(|h| h.to_string()).collect())
            .chain(
                self.records
                    .iter()
                    .map(|r| vec![r.qid.clone(), r.question.clone(), r.answer.clone()]),
            )
            .collect()
    }
}

/// Export file writer, picked by the output file's extension: `.csv` gets
/// CSV, anything else a workbook.
pub enum Exporter {
    Csv(CsvGenerator),
    Xlsx(XlsxGenerator),
}

impl Exporter {
    pub fn for_output(config: OutputConfig) -> Self {
        if is_csv(&config.path) {
            Exporter::Csv(CsvGenerator::new(config))
        } else {
            Exporter::Xlsx(XlsxGenerator::new(config))
        }
    }

    pub fn output_path(&self) -> &Path {
        match self {
            Exporter::Csv(generator) => generator.output_path(),
            Exporter::Xlsx(generator) => generator.output_path(),
        }
    }

    pub fn generate(&self, table: &ExportTable) -> Result<(), AppError> {
        match self {
            Exporter::Csv(generator) => generator.generate(table),
            Exporter::Xlsx(generator) => generator.generate(table),
        }
    }

    /// Reads back an earlier export of either format.
    pub fn load(path: &Path) -> Result<ExportTable, AppError> {
        if is_csv(path) {
            CsvGenerator::load(path)
        } else {
            XlsxGenerator::load(path)
        }
    }
}

fn is_csv(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}

/// Crawl, dedup and build the table for one run.
pub struct Processor<'a, P: PageSource> {
    scraper: &'a Scraper<P>,
    store: QidStore,
    progress: ProgressTracker,
}

impl<'a, P: PageSource> Processor<'a, P> {
    pub fn new(scraper: &'a Scraper<P>, store: QidStore, progress: ProgressTracker) -> Self {
        Self {
            scraper,
            store,
            progress,
        }
    }

    /// The store is only appended to after the whole listing was walked; a
    /// run that fails midway re-fetches its QIDs next time.
    pub async fn run(
        &mut self,
        query: &ListingQuery,
        filter_duplicates: bool,
    ) -> Result<ExportTable, AppError> {
        self.progress.start("Collecting records");

        let seen = if filter_duplicates {
            self.store.load()?
        } else {
            tracing::info!("Duplicate filter disabled, every listed QID will be fetched");
            HashSet::new()
        };

        let outcome = self.scraper.crawl(query, &seen, &mut self.progress).await?;
        tracing::info!(
            "Visited {} page(s): {} new records, {} already collected",
            outcome.pages_visited,
            outcome.records.len(),
            outcome.skipped
        );

        self.store.save(&outcome.new_ids())?;

        self.progress
            .complete(&format!("Collected {} records", self.progress.fetched()));

        let table = ExportTable::new(outcome.records);
        if table.is_empty() {
            tracing::info!("No new records in the requested range");
        }
        Ok(table)
    }
}
