pub mod browser;
mod extractor;
mod login;


pub use browser::{BrowserController, PageSource, WaitOutcome};
pub use login::Credentials;

use std::collections::HashSet;
use std::time::Duration;
use url::Url;

use crate::config::PortalConfig;
use crate::error::AppError;
use crate::models::{ListingQuery, Record};
use crate::processor::ProgressTracker;
use extractor::{DetailExtractor, ListingParser, DETAIL_CONTAINER_SELECTOR, ROW_SELECTOR};

const QUESTION_VIEW: &str = "properties.asp";
const ANSWER_VIEW: &str = "properties_02.asp";

/// What one pass over the listing produced.
#[derive(Debug, Default)]
pub struct CrawlOutcome {
    /// Newly fetched records, in listing order.
    pub records: Vec<Record>,
    /// Rows skipped because their QID was already known.
    pub skipped: usize,
    pub pages_visited: u32,
}

impl CrawlOutcome {
    pub fn new_ids(&self) -> Vec<String> {
        self.records.iter().map(|r| r.qid.clone()).collect()
    }
}

pub struct Scraper<P: PageSource> {
    page: P,
    login_url: String,
    console_url: String,
    timeout: Duration,
    listing: ListingParser,
    extractor: DetailExtractor,
}

impl<P: PageSource> Scraper<P> {
    pub fn new(page: P, portal: &PortalConfig, timeout: Duration) -> Result<Self, AppError> {
        Ok(Self {
            page,
            login_url: portal.login_url.clone(),
            console_url: portal.console_url.trim_end_matches('/').to_string(),
            timeout,
            listing: ListingParser::new()?,
            extractor: DetailExtractor::new(portal)?,
        })
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut P {
        &mut self.page
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<(), AppError> {
        login::login(&self.page, &self.login_url, credentials, self.timeout).await
    }

    pub fn listing_url(&self, query: &ListingQuery) -> Result<Url, AppError> {
        let mut url = self.endpoint("index.asp")?;
        url.query_pairs_mut().extend_pairs(query.params());
        Ok(url)
    }

    fn detail_url(&self, view: &str, qid: &str) -> Result<Url, AppError> {
        let mut url = self.endpoint(view)?;
        url.query_pairs_mut()
            .append_pair("intQstIdx", qid)
            .append_pair("page", "1");
        Ok(url)
    }

    fn endpoint(&self, file: &str) -> Result<Url, AppError> {
        Ok(Url::parse(&format!("{}/{}", self.console_url, file))?)
    }

    fn page_url(listing: &Url, page_no: u32) -> Url {
        let mut url = listing.clone();
        url.query_pairs_mut().append_pair("page", &page_no.to_string());
        url
    }

    /// Walks the listing page by page and fetches every QID not in `seen`.
    ///
    /// Page 1 decides how many pages there are. A page without rows ends the
    /// walk early.
    pub async fn crawl(
        &self,
        query: &ListingQuery,
        seen: &HashSet<String>,
        progress: &mut ProgressTracker,
    ) -> Result<CrawlOutcome, AppError> {
        let listing = self.listing_url(query)?;
        let mut outcome = CrawlOutcome::default();
        let mut fetched: HashSet<String> = HashSet::new();

        let mut html = self.open_listing(&listing).await?;
        let total_pages = html.as_deref().map_or(1, |h| self.listing.total_pages(h));
        tracing::info!("Listing has {} page(s)", total_pages);

        for page_no in 1..=total_pages {
            if page_no > 1 {
                html = self.open_listing(&Self::page_url(&listing, page_no)).await?;
            }

            let ids = html
                .as_deref()
                .map(|h| self.listing.record_ids(h))
                .unwrap_or_default();
            if ids.is_empty() {
                tracing::info!("Page {} has no rows, stopping", page_no);
                break;
            }

            outcome.pages_visited = page_no;
            progress.log_page(page_no, total_pages, ids.len());

            for qid in ids {
                if seen.contains(&qid) {
                    tracing::debug!("Skipping already collected QID {}", qid);
                    outcome.skipped += 1;
                    continue;
                }
                if !fetched.insert(qid.clone()) {
                    tracing::debug!("QID {} listed twice in this run", qid);
                    continue;
                }

                let record = self.fetch_record(&qid).await?;
                progress.log_record(&record.qid);
                outcome.records.push(record);
            }
        }

        Ok(outcome)
    }

    pub async fn fetch_record(&self, qid: &str) -> Result<Record, AppError> {
        let question_html = self.open_detail(&self.detail_url(QUESTION_VIEW, qid)?).await?;
        let question = self.extractor.question(&question_html);

        let answer_html = self.open_detail(&self.detail_url(ANSWER_VIEW, qid)?).await?;
        let answer = self.extractor.answer(&answer_html);

        if question.is_empty() && answer.is_empty() {
            tracing::warn!("QID {}: neither question nor answer text was found", qid);
        }

        Ok(Record {
            qid: qid.to_string(),
            question,
            answer,
        })
    }

    /// `None` when the listing rows never show up, which is how an empty
    /// result renders.
    async fn open_listing(&self, url: &Url) -> Result<Option<String>, AppError> {
        self.page.goto(url.as_str()).await?;
        match self.page.wait_for(ROW_SELECTOR, self.timeout).await? {
            WaitOutcome::Present => Ok(Some(self.page.content().await?)),
            outcome => {
                tracing::warn!("No listing rows on {} ({:?})", url, outcome);
                Ok(None)
            }
        }
    }

    async fn open_detail(&self, url: &Url) -> Result<String, AppError> {
        self.page.goto(url.as_str()).await?;
        match self.page.wait_for(DETAIL_CONTAINER_SELECTOR, self.timeout).await? {
            WaitOutcome::Present => self.page.content().await,
            WaitOutcome::NotFound | WaitOutcome::TimedOut => Err(AppError::NavigationTimeout {
                url: url.to_string(),
                selector: DETAIL_CONTAINER_SELECTOR.to_string(),
                secs: self.timeout.as_secs(),
            }),
        }
    }
}
