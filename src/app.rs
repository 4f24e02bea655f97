use std::io::IsTerminal;
use std::path::Path;
use std::time::Duration;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::models::ListingQuery;
use crate::processor::{ExportTable, Exporter, Processor, ProgressTracker, QidStore};
use crate::scraping::{BrowserController, Credentials, Scraper};
use crate::sheets::SheetsUploader;

const FAILURE_SCREENSHOT: &str = "faq_crawler_failure.png";

/// One operator session: the collected table lives here until it is
/// uploaded or the process exits.
pub struct App {
    config: AppConfig,
    scraper: Option<Scraper<BrowserController>>,
    exporter: Exporter,
    table: Option<ExportTable>,
}

impl App {
    pub fn new_with_config(config: AppConfig) -> Self {
        let exporter = Exporter::for_output(config.output.clone());
        Self {
            config,
            scraper: None,
            exporter,
            table: None,
        }
    }

    pub fn table(&self) -> Option<&ExportTable> {
        self.table.as_ref()
    }

    /// Log in, crawl, export. The browser is closed whatever the outcome.
    pub async fn collect(&mut self, query: &ListingQuery, filter_duplicates: bool) -> Result<&ExportTable, AppError> {
        query.validate()?;
        self.config
            .portal
            .check_credentials()
            .map_err(AppError::AuthError)?;

        let result = self.crawl(query, filter_duplicates).await;
        if result.is_err() {
            self.capture_failure().await;
        }
        self.shutdown().await;
        let table = result?;

        self.exporter.generate(&table)?;
        Ok(self.table.insert(table))
    }

    async fn crawl(&mut self, query: &ListingQuery, filter_duplicates: bool) -> Result<ExportTable, AppError> {
        let mut progress = if std::io::stderr().is_terminal() {
            ProgressTracker::new()
        } else {
            ProgressTracker::hidden()
        };
        progress.start("Initializing browser");

        let mut browser = BrowserController::new(&self.config.browser);
        browser.start().await?;
        let timeout = Duration::from_secs(self.config.browser.timeout_secs);
        let scraper = self.scraper.insert(Scraper::new(browser, &self.config.portal, timeout)?);

        progress.update("Logging in");
        let credentials = Credentials {
            username: self.config.portal.username.clone(),
            password: self.config.portal.password.clone(),
        };
        scraper.login(&credentials).await?;

        let store = QidStore::new(&self.config.store.path);
        Processor::new(scraper, store, progress)
            .run(query, filter_duplicates)
            .await
    }

    async fn capture_failure(&self) {
        let Some(scraper) = &self.scraper else {
            return;
        };
        match scraper.page().take_screenshot(FAILURE_SCREENSHOT).await {
            Ok(()) => tracing::info!("Saved a screenshot of the failing page to {}", FAILURE_SCREENSHOT),
            Err(e) => tracing::debug!("No failure screenshot: {}", e),
        }
    }

    /// Makes a previously exported file the session's table.
    pub fn load_table(&mut self, path: &Path) -> Result<&ExportTable, AppError> {
        let table = Exporter::load(path)?;
        Ok(self.table.insert(table))
    }

    pub async fn upload(&self, sheet_name: &str) -> Result<(), AppError> {
        let table = self
            .table()
            .ok_or_else(|| AppError::SheetsApiError("nothing has been collected yet".into()))?;

        let uploader = SheetsUploader::new(&self.config.sheets)?;
        uploader.upload(sheet_name, table).await
    }

    /// Uploads the collected table when auto upload is on. Failures are
    /// only logged: the local export and the session table stay as they are.
    pub async fn upload_after_collect(&self) {
        if !self.config.sheets.auto_upload {
            return;
        }
        let Some(name) = self.sheet_name() else {
            tracing::warn!("Auto upload is on but no sheet name is set");
            return;
        };
        match self.upload(name).await {
            Ok(()) => tracing::info!("Uploaded to Google Sheet '{}'", name),
            Err(e) => tracing::error!("Upload to '{}' failed: {}", name, e),
        }
    }

    pub fn sheet_name(&self) -> Option<&str> {
        self.config
            .sheets
            .sheet_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
    }

    pub fn output_path(&self) -> &Path {
        self.exporter.output_path()
    }

    /// Closes the browser if a crawl left it open.
    pub async fn shutdown(&mut self) {
        if let Some(mut scraper) = self.scraper.take() {
            if let Err(e) = scraper.page_mut().shutdown().await {
                tracing::warn!("Failed to close browser session: {}", e);
            }
        }
    }
}
