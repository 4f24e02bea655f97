use async_trait::async_trait;
use reqwest::{Client, Response};
use url::Url;

use super::models::{DriveFileList, Spreadsheet, ValueRange};
use crate::error::AppError;

const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

/// The spreadsheet operations an upload is made of.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpreadsheetApi: Send + Sync {
    /// Id of the first non-trashed spreadsheet with exactly this name.
    async fn find_spreadsheet(&self, name: &str) -> Result<String, AppError>;

    async fn first_sheet_title(&self, spreadsheet_id: &str) -> Result<String, AppError>;

    async fn clear(&self, spreadsheet_id: &str, range: &str) -> Result<(), AppError>;

    async fn update(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Vec<String>],
    ) -> Result<(), AppError>;
}

/// Base URLs of the Drive file search and the Sheets API.
#[derive(Debug, Clone)]
pub struct Endpoints {
    pub drive_files: String,
    pub sheets: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            drive_files: "https://www.googleapis.com/drive/v3/files".to_string(),
            sheets: "https://sheets.googleapis.com/v4/spreadsheets".to_string(),
        }
    }
}

/// Thin wrapper over the Drive and Sheets REST endpoints, authorized with
/// one bearer token.
pub struct SheetsClient {
    http: Client,
    token: String,
    endpoints: Endpoints,
}

impl SheetsClient {
    pub fn new(http: Client, token: String, endpoints: Endpoints) -> Self {
        Self {
            http,
            token,
            endpoints,
        }
    }

    fn spreadsheet_url(&self, spreadsheet_id: &str, rest: &[&str]) -> Result<Url, AppError> {
        spreadsheet_url(&self.endpoints.sheets, spreadsheet_id, rest)
    }
}

#[async_trait]
impl SpreadsheetApi for SheetsClient {
    async fn find_spreadsheet(&self, name: &str) -> Result<String, AppError> {
        let response = self
            .http
            .get(&self.endpoints.drive_files)
            .bearer_auth(&self.token)
            .query(&[
                ("q", drive_query(name).as_str()),
                ("fields", "files(id,name)"),
                ("pageSize", "1"),
                ("supportsAllDrives", "true"),
                ("includeItemsFromAllDrives", "true"),
            ])
            .send()
            .await?;

        let list: DriveFileList = check(response, "Drive file search").await?.json().await?;
        list.files
            .into_iter()
            .next()
            .map(|file| {
                tracing::debug!("Spreadsheet '{}' has id {}", file.name, file.id);
                file.id
            })
            .ok_or_else(|| AppError::SheetNotFound(name.to_string()))
    }

    async fn first_sheet_title(&self, spreadsheet_id: &str) -> Result<String, AppError> {
        let url = self.spreadsheet_url(spreadsheet_id, &[])?;
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .query(&[("fields", "sheets.properties(title,index)")])
            .send()
            .await?;

        let spreadsheet: Spreadsheet = check(response, "Spreadsheet lookup").await?.json().await?;
        spreadsheet
            .first_sheet_title()
            .map(str::to_string)
            .ok_or_else(|| AppError::SheetsApiError(format!("spreadsheet {} has no sheets", spreadsheet_id)))
    }

    async fn clear(&self, spreadsheet_id: &str, range: &str) -> Result<(), AppError> {
        let url = self.spreadsheet_url(spreadsheet_id, &["values", &format!("{}:clear", range)])?;
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({}))
            .send()
            .await?;

        check(response, "Clearing sheet").await?;
        Ok(())
    }

    async fn update(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Vec<String>],
    ) -> Result<(), AppError> {
        let url = self.spreadsheet_url(spreadsheet_id, &["values", range])?;
        let body = ValueRange {
            range,
            major_dimension: "ROWS",
            values,
        };

        let response = self
            .http
            .put(url)
            .bearer_auth(&self.token)
            .query(&[("valueInputOption", "RAW")])
            .json(&body)
            .send()
            .await?;

        check(response, "Writing values").await?;
        Ok(())
    }
}

async fn check(response: Response, what: &str) -> Result<Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(AppError::SheetsApiError(format!("{} failed with {}: {}", what, status, body)))
}

fn drive_query(name: &str) -> String {
    let escaped = name.replace('\\', "\\\\").replace('\'', "\\'");
    format!(
        "name = '{}' and mimeType = '{}' and trashed = false",
        escaped, SPREADSHEET_MIME
    )
}

fn spreadsheet_url(base: &str, spreadsheet_id: &str, rest: &[&str]) -> Result<Url, AppError> {
    let mut url = Url::parse(base)?;
    url.path_segments_mut()
        .map_err(|_| AppError::SheetsApiError("Sheets endpoint cannot take path segments".into()))?
        .push(spreadsheet_id)
        .extend(rest);
    Ok(url)
}

/// A1 notation covering a whole sheet.
pub fn sheet_range(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};

    fn client_for(server: &ServerGuard) -> SheetsClient {
        SheetsClient::new(
            Client::new(),
            "test-token".to_string(),
            Endpoints {
                drive_files: format!("{}/drive/v3/files", server.url()),
                sheets: format!("{}/v4/spreadsheets", server.url()),
            },
        )
    }

    #[test]
    fn drive_query_escapes_quotes() {
        assert_eq!(
            drive_query("FAQ 'daily'"),
            "name = 'FAQ \\'daily\\'' and mimeType = 'application/vnd.google-apps.spreadsheet' and trashed = false"
        );
    }

    #[test]
    fn sheet_range_quotes_title() {
        assert_eq!(sheet_range("Sheet1"), "'Sheet1'");
        assert_eq!(sheet_range("Bob's"), "'Bob''s'");
    }

    #[test]
    fn spreadsheet_url_encodes_segments() {
        let base = Endpoints::default().sheets;
        let url = spreadsheet_url(&base, "abc123", &["values", "'시트 1':clear"]).unwrap();
        assert!(url
            .as_str()
            .starts_with("https://sheets.googleapis.com/v4/spreadsheets/abc123/values/"));
        assert!(url.as_str().ends_with(":clear"));
        assert!(!url.as_str().contains(' '));

        let url = spreadsheet_url(&base, "abc123", &[]).unwrap();
        assert_eq!(url.as_str(), "https://sheets.googleapis.com/v4/spreadsheets/abc123");
    }

    #[tokio::test]
    async fn find_spreadsheet_returns_first_match() {
        let mut server = Server::new_async().await;
        let search = server
            .mock("GET", "/drive/v3/files")
            .match_query(Matcher::UrlEncoded(
                "q".into(),
                "name = 'FAQ' and mimeType = 'application/vnd.google-apps.spreadsheet' and trashed = false".into(),
            ))
            .match_header("authorization", "Bearer test-token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"files":[{"id":"abc123","name":"FAQ"}]}"#)
            .create_async()
            .await;

        let id = client_for(&server).find_spreadsheet("FAQ").await.unwrap();
        assert_eq!(id, "abc123");
        search.assert_async().await;
    }

    #[tokio::test]
    async fn empty_drive_search_is_sheet_not_found() {
        let mut server = Server::new_async().await;
        let search = server
            .mock("GET", "/drive/v3/files")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"files":[]}"#)
            .create_async()
            .await;

        let err = client_for(&server).find_spreadsheet("FAQ").await.unwrap_err();
        assert!(matches!(err, AppError::SheetNotFound(ref name) if name == "FAQ"));
        search.assert_async().await;
    }

    #[tokio::test]
    async fn first_sheet_title_reads_metadata() {
        let mut server = Server::new_async().await;
        let _lookup = server
            .mock("GET", "/v4/spreadsheets/abc123")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"sheets":[{"properties":{"title":"Old","index":2}},{"properties":{"title":"Main","index":0}}]}"#,
            )
            .create_async()
            .await;

        let title = client_for(&server).first_sheet_title("abc123").await.unwrap();
        assert_eq!(title, "Main");
    }

    #[tokio::test]
    async fn clear_and_update_hit_values_endpoints() {
        let mut server = Server::new_async().await;
        let clear = server
            .mock("POST", Matcher::Regex(r"^/v4/spreadsheets/abc123/values/.*Main.*:clear$".into()))
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;
        let update = server
            .mock("PUT", Matcher::Regex(r"^/v4/spreadsheets/abc123/values/.*Main.*!A1$".into()))
            .match_query(Matcher::UrlEncoded("valueInputOption".into(), "RAW".into()))
            .match_body(Matcher::PartialJson(serde_json::json!({
                "majorDimension": "ROWS",
                "values": [["QID", "질문", "답변"]],
            })))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = client_for(&server);
        let range = sheet_range("Main");
        client.clear("abc123", &range).await.unwrap();
        let rows = vec![vec!["QID".to_string(), "질문".to_string(), "답변".to_string()]];
        client
            .update("abc123", &format!("{}!A1", range), &rows)
            .await
            .unwrap();

        clear.assert_async().await;
        update.assert_async().await;
    }

    #[tokio::test]
    async fn api_error_status_is_reported() {
        let mut server = Server::new_async().await;
        let _denied = server
            .mock("POST", Matcher::Any)
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body("caller does not have permission")
            .create_async()
            .await;

        let err = client_for(&server).clear("abc123", "'Main'").await.unwrap_err();
        match err {
            AppError::SheetsApiError(message) => {
                assert!(message.contains("403"));
                assert!(message.contains("caller does not have permission"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
