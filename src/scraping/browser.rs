use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder, Locator};
use serde_json::{json, Map, Value};
use std::time::Duration;

use crate::config::BrowserConfig;
use crate::error::AppError;

/// Result of waiting for an element to show up on the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    Present,
    NotFound,
    TimedOut,
}

/// The handful of page operations a crawl needs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn goto(&self, url: &str) -> Result<(), AppError>;

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<WaitOutcome, AppError>;

    async fn fill(&self, selector: &str, value: &str) -> Result<(), AppError>;

    async fn execute(&self, script: &str) -> Result<(), AppError>;

    /// Current DOM serialized as HTML.
    async fn content(&self) -> Result<String, AppError>;
}

pub struct BrowserController {
    client: Option<Client>,
    webdriver_url: String,
    headless: bool,
}

impl BrowserController {
    pub fn new(config: &BrowserConfig) -> Self {
        Self {
            client: None,
            webdriver_url: config.webdriver_url.clone(),
            headless: config.headless,
        }
    }

    pub async fn start(&mut self) -> Result<(), AppError> {
        let mut builder = ClientBuilder::native();
        builder.capabilities(self.capabilities());

        tracing::debug!("Connecting to WebDriver at {}", self.webdriver_url);
        self.client = Some(
            builder
                .connect(&self.webdriver_url)
                .await
                .map_err(|e| AppError::BrowserError(e.to_string()))?,
        );
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        if let Some(client) = self.client.take() {
            client.close().await?;
            tracing::debug!("Browser session closed");
        }
        Ok(())
    }

    pub async fn take_screenshot(&self, path: &str) -> Result<(), AppError> {
        let screenshot = self.client()?.screenshot().await?;
        tokio::fs::write(path, screenshot).await?;
        Ok(())
    }

    fn client(&self) -> Result<&Client, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::BrowserError("browser session is not started".into()))
    }

    fn capabilities(&self) -> Map<String, Value> {
        let mut args = vec!["--window-size=1280,1024"];
        if self.headless {
            args.push("--headless=new");
        }

        let mut caps = Map::new();
        caps.insert("goog:chromeOptions".to_string(), json!({ "args": args }));
        caps.insert(
            "moz:firefoxOptions".to_string(),
            json!({ "args": if self.headless { vec!["-headless"] } else { vec![] } }),
        );
        caps
    }
}

#[async_trait]
impl PageSource for BrowserController {
    async fn goto(&self, url: &str) -> Result<(), AppError> {
        tracing::trace!("goto {}", url);
        self.client()?.goto(url).await?;
        Ok(())
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<WaitOutcome, AppError> {
        let result = self
            .client()?
            .wait()
            .at_most(timeout)
            .for_element(Locator::Css(selector))
            .await;

        match result {
            Ok(_) => Ok(WaitOutcome::Present),
            Err(fantoccini::error::CmdError::WaitTimeout) => Ok(WaitOutcome::TimedOut),
            Err(e) if e.is_no_such_element() => Ok(WaitOutcome::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<(), AppError> {
        self.client()?
            .find(Locator::Css(selector))
            .await?
            .send_keys(value)
            .await?;
        Ok(())
    }

    async fn execute(&self, script: &str) -> Result<(), AppError> {
        self.client()?.execute(script, vec![]).await?;
        Ok(())
    }

    async fn content(&self) -> Result<String, AppError> {
        Ok(self.client()?.source().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_flag_reaches_chrome_args() {
        let config = BrowserConfig {
            headless: true,
            ..BrowserConfig::default()
        };
        let caps = BrowserController::new(&config).capabilities();
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(args.iter().any(|a| a == "--headless=new"));

        let config = BrowserConfig {
            headless: false,
            ..BrowserConfig::default()
        };
        let caps = BrowserController::new(&config).capabilities();
        let args = caps["goog:chromeOptions"]["args"].as_array().unwrap();
        assert!(!args.iter().any(|a| a == "--headless=new"));
    }

    #[tokio::test]
    async fn operations_fail_before_start() {
        let browser = BrowserController::new(&BrowserConfig::default());
        let err = browser.goto("https://example.com").await.unwrap_err();
        assert!(matches!(err, AppError::BrowserError(_)));
    }
}
