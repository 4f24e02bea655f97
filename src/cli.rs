use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::models::{Criterion, ListingQuery};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'L', long, value_name = "LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    /// Run the browser headless (true) or with a visible window (false)
    #[arg(long, value_name = "BOOL", global = true, action = clap::ArgAction::Set)]
    pub headless: Option<bool>,

    /// Timeout for browser waits (in seconds)
    #[arg(long, value_name = "SECS", global = true)]
    pub browser_timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Log in, crawl the listing and export new records
    Collect(CollectArgs),
    /// Upload a previously exported file to a Google Sheet
    Upload(UploadArgs),
}

#[derive(Args)]
pub struct CollectArgs {
    /// Date the listing is filtered by
    #[arg(long, value_enum, default_value_t = Criterion::Question)]
    pub criterion: Criterion,

    /// First day of the range (YYYY-MM-DD, default: yesterday)
    #[arg(long, value_name = "DATE")]
    pub start_date: Option<NaiveDate>,

    /// First hour of the range (0-23)
    #[arg(long, value_name = "HOUR", default_value = "0")]
    pub start_hour: u32,

    /// Last day of the range (YYYY-MM-DD, default: today)
    #[arg(long, value_name = "DATE")]
    pub end_date: Option<NaiveDate>,

    /// Last hour of the range (0-23)
    #[arg(long, value_name = "HOUR", default_value = "23")]
    pub end_hour: u32,

    /// Fetch records even if their QID was collected before
    #[arg(long)]
    pub no_filter: bool,

    /// Output file path (.xlsx workbook or .csv)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Google Sheet to upload to
    #[arg(long, value_name = "NAME")]
    pub sheet: Option<String>,

    /// Upload to the sheet once the crawl is done
    #[arg(long)]
    pub upload: bool,
}

impl CollectArgs {
    pub fn query(&self) -> ListingQuery {
        let defaults = ListingQuery::default();
        ListingQuery {
            criterion: self.criterion,
            start_date: self.start_date.unwrap_or(defaults.start_date),
            start_hour: self.start_hour,
            end_date: self.end_date.unwrap_or(defaults.end_date),
            end_hour: self.end_hour,
        }
    }
}

#[derive(Args)]
pub struct UploadArgs {
    /// File produced by `collect`, .xlsx or .csv (default: configured output path)
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Google Sheet to upload to
    #[arg(long, value_name = "NAME")]
    pub sheet: Option<String>,
}

impl CliArgs {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log level '{}'. Valid levels are: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }

        if self.browser_timeout == Some(0) {
            return Err("browser-timeout must be greater than 0".to_string());
        }

        if let Command::Collect(args) = &self.command {
            if args.start_hour > 23 || args.end_hour > 23 {
                return Err("hours must be between 0 and 23".to_string());
            }
        }

        Ok(())
    }
}
