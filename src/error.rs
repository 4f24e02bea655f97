use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    ConfigError(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Workbook write error: {0}")]
    XlsxWriteError(#[from] rust_xlsxwriter::XlsxError),

    #[error("Workbook read error: {0}")]
    XlsxReadError(#[from] calamine::XlsxError),

    #[error("Unreadable export file: {0}")]
    InvalidExport(String),

    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Browser automation error: {0}")]
    BrowserError(String),

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Timed out after {secs}s waiting for '{selector}' on {url}")]
    NavigationTimeout {
        url: String,
        selector: String,
        secs: u64,
    },

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Service account credentials error: {0}")]
    CredentialsError(String),

    #[error("Spreadsheet '{0}' not found")]
    SheetNotFound(String),

    #[error("Spreadsheet API error: {0}")]
    SheetsApiError(String),
}

impl From<fantoccini::error::CmdError> for AppError {
    fn from(e: fantoccini::error::CmdError) -> Self {
        AppError::BrowserError(e.to_string())
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        AppError::CredentialsError(e.to_string())
    }
}
