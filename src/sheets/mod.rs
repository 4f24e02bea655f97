mod auth;
mod client;
mod models;

use reqwest::Client;
use std::path::PathBuf;

use crate::config::SheetsConfig;
use crate::error::AppError;
use crate::processor::ExportTable;
use auth::ServiceAccountKey;
use client::{sheet_range, Endpoints, SheetsClient, SpreadsheetApi};

/// Replaces the contents of a Google Sheet's first tab with an export table.
pub struct SheetsUploader {
    credentials_path: PathBuf,
    http: Client,
    endpoints: Endpoints,
}

impl SheetsUploader {
    pub fn new(config: &SheetsConfig) -> Result<Self, AppError> {
        let credentials_path = config.credentials_path.clone().ok_or_else(|| {
            AppError::CredentialsError("sheets.credentials_path is not set".into())
        })?;

        Ok(Self {
            credentials_path,
            http: Client::new(),
            endpoints: Endpoints::default(),
        })
    }

    pub async fn upload(&self, sheet_name: &str, table: &ExportTable) -> Result<(), AppError> {
        let key = ServiceAccountKey::from_file(&self.credentials_path)?;
        let token = key.access_token(&self.http).await?;
        let client = SheetsClient::new(self.http.clone(), token, self.endpoints.clone());
        write_table(&client, sheet_name, table).await
    }
}

/// Clears the first tab of `sheet_name`, then writes the header and rows from A1.
async fn write_table<A: SpreadsheetApi + ?Sized>(
    api: &A,
    sheet_name: &str,
    table: &ExportTable,
) -> Result<(), AppError> {
    let spreadsheet_id = api.find_spreadsheet(sheet_name).await?;
    let title = api.first_sheet_title(&spreadsheet_id).await?;
    let range = sheet_range(&title);

    api.clear(&spreadsheet_id, &range).await?;
    api.update(&spreadsheet_id, &format!("{}!A1", range), &table.rows())
        .await?;

    tracing::info!(
        "Uploaded {} records to '{}' / '{}'",
        table.len(),
        sheet_name,
        title
    );
    Ok(())
}
