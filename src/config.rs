use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use validator::Validate;

use crate::cli::{CliArgs, Command};

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct AppConfig {
    #[validate(nested)]
    pub portal: PortalConfig,
    #[validate(nested)]
    pub browser: BrowserConfig,
    pub store: StoreConfig,
    pub output: OutputConfig,
    pub sheets: SheetsConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct PortalConfig {
    #[validate(url(message = "Login URL must be a valid URL"))]
    pub login_url: String,
    /// Base of the admin console; listing and detail pages live under it.
    #[validate(url(message = "Console URL must be a valid URL"))]
    pub console_url: String,
    pub username: String,
    pub password: String,
    pub question_marker: String,
    pub answer_marker: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            login_url: "https://faq.megagong.net/".to_string(),
            console_url: "https://faq.megagong.net/erms/transmissionM".to_string(),
            username: String::new(),
            password: String::new(),
            question_marker: "질문내용".to_string(),
            answer_marker: "답변내역".to_string(),
        }
    }
}

impl PortalConfig {
    /// Credentials are only needed when a crawl is about to start.
    pub fn check_credentials(&self) -> Result<(), String> {
        if self.username.trim().is_empty() {
            return Err("portal.username is not set".to_string());
        }
        if self.password.is_empty() {
            return Err("portal.password is not set".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
#[serde(default)]
pub struct BrowserConfig {
    #[validate(url(message = "WebDriver URL must be a valid URL"))]
    pub webdriver_url: String,
    pub headless: bool,
    #[validate(range(min = 1, message = "Timeout must be at least one second"))]
    pub timeout_secs: u64,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: "http://localhost:4444".to_string(),
            headless: true,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("collected_qids.txt"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("qna_data.xlsx"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SheetsConfig {
    /// Service account key file as downloaded from the Google Cloud console.
    pub credentials_path: Option<PathBuf>,
    pub sheet_name: Option<String>,
    pub auto_upload: bool,
}

impl AppConfig {
    pub fn load_with_cli_args(cli_args: &CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        let mut builder = Config::builder()
            .add_source(File::with_name("config").required(false));

        if let Some(config_path) = &cli_args.config {
            builder = builder.add_source(File::from(config_path.as_path()));
        }

        // FAQ_PORTAL__PASSWORD -> portal.password
        builder = builder.add_source(
            Environment::with_prefix("FAQ")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(headless) = cli_args.headless {
            builder = builder.set_override("browser.headless", headless)?;
        }
        if let Some(timeout) = cli_args.browser_timeout {
            builder = builder.set_override("browser.timeout_secs", timeout as i64)?;
        }

        match &cli_args.command {
            Command::Collect(args) => {
                if let Some(output) = &args.output {
                    builder = builder.set_override("output.path", output.to_string_lossy().to_string())?;
                }
                if let Some(sheet) = &args.sheet {
                    builder = builder.set_override("sheets.sheet_name", sheet.clone())?;
                }
                if args.upload {
                    builder = builder.set_override("sheets.auto_upload", true)?;
                }
            }
            Command::Upload(args) => {
                if let Some(sheet) = &args.sheet {
                    builder = builder.set_override("sheets.sheet_name", sheet.clone())?;
                }
            }
        }

        let app_config: AppConfig = builder.build()?.try_deserialize()?;

        app_config.validate().map_err(|e: validator::ValidationErrors| -> Box<dyn std::error::Error> {
            format!("Configuration validation failed: {}", e).into()
        })?;

        Ok(app_config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_the_console() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.portal.console_url, "https://faq.megagong.net/erms/transmissionM");
        assert_eq!(config.store.path, PathBuf::from("collected_qids.txt"));
        assert_eq!(config.browser.timeout_secs, 30);
        assert!(!config.sheets.auto_upload);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut config = AppConfig::default();
        config.browser.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_credentials_are_reported() {
        let mut portal = PortalConfig::default();
        assert!(portal.check_credentials().is_err());

        portal.username = "admin".to_string();
        assert_eq!(portal.check_credentials(), Err("portal.password is not set".to_string()));

        portal.password = "secret".to_string();
        assert!(portal.check_credentials().is_ok());
    }

    #[test]
    fn cli_can_turn_headless_off() {
        use clap::Parser;

        let args = CliArgs::try_parse_from(["faq-crawler", "--headless", "false", "collect"]).unwrap();
        let config = AppConfig::load_with_cli_args(&args).unwrap();
        assert!(!config.browser.headless);

        let args = CliArgs::try_parse_from(["faq-crawler", "collect"]).unwrap();
        let config = AppConfig::load_with_cli_args(&args).unwrap();
        assert!(config.browser.headless);
    }

    #[test]
    fn partial_file_keeps_section_defaults() {
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(
                "[portal]\nusername = \"admin\"\n[sheets]\nsheet_name = \"FAQ\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.portal.username, "admin");
        assert_eq!(config.portal.answer_marker, "답변내역");
        assert_eq!(config.sheets.sheet_name.as_deref(), Some("FAQ"));
        assert_eq!(config.output.path, PathBuf::from("qna_data.xlsx"));
    }
}
