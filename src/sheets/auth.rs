use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::AppError;

const SCOPES: &str = "https://www.googleapis.com/auth/spreadsheets https://www.googleapis.com/auth/drive";
const JWT_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: i64 = 3600;

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// The fields of a service account key file that the token exchange needs.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Claims {
    iss: String,
    scope: String,
    aud: String,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

impl ServiceAccountKey {
    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::CredentialsError(format!("cannot read {}: {}", path.display(), e))
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn claims(&self, now: i64) -> Claims {
        Claims {
            iss: self.client_email.clone(),
            scope: SCOPES.to_string(),
            aud: self.token_uri.clone(),
            iat: now,
            exp: now + TOKEN_LIFETIME_SECS,
        }
    }

    /// Signed JWT presented to the token endpoint.
    pub fn assertion(&self, now: i64) -> Result<String, AppError> {
        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())?;
        Ok(encode(&Header::new(Algorithm::RS256), &self.claims(now), &key)?)
    }

    pub async fn access_token(&self, http: &Client) -> Result<String, AppError> {
        let assertion = self.assertion(chrono::Utc::now().timestamp())?;

        let response = http
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_GRANT_TYPE), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::CredentialsError(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response.json().await?;
        tracing::debug!("Obtained access token for {}", self.client_email);
        Ok(token.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY_JSON: &str = r#"{
        "type": "service_account",
        "project_id": "faq",
        "client_email": "crawler@faq.iam.gserviceaccount.com",
        "private_key": "not a pem key"
    }"#;

    #[test]
    fn key_file_defaults_token_uri() {
        let key: ServiceAccountKey = serde_json::from_str(KEY_JSON).unwrap();
        assert_eq!(key.client_email, "crawler@faq.iam.gserviceaccount.com");
        assert_eq!(key.token_uri, "https://oauth2.googleapis.com/token");
    }

    #[test]
    fn claims_cover_one_hour() {
        let key: ServiceAccountKey = serde_json::from_str(KEY_JSON).unwrap();
        let claims = key.claims(1_700_000_000);
        assert_eq!(claims.iss, key.client_email);
        assert_eq!(claims.aud, key.token_uri);
        assert!(claims.scope.contains("auth/spreadsheets"));
        assert!(claims.scope.contains("auth/drive"));
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn invalid_private_key_is_a_credentials_error() {
        let key: ServiceAccountKey = serde_json::from_str(KEY_JSON).unwrap();
        assert!(matches!(key.assertion(0), Err(AppError::CredentialsError(_))));
    }

    #[test]
    fn missing_key_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = ServiceAccountKey::from_file(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, AppError::CredentialsError(_)));
    }
}
