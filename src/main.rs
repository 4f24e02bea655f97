use std::error::Error;

mod app;
mod cli;
mod config;
mod error;
mod models;
mod processor;
mod scraping;
mod sheets;
mod shutdown;

use app::App;
use cli::{CliArgs, Command};
use error::AppError;
use shutdown::Interrupt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli_args = CliArgs::parse_args();
    cli_args.validate()?;

    let log_level = match cli_args.log_level.as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .init();

    tracing::info!("Starting FAQ crawler");

    let interrupt = Interrupt::listen();

    let config = config::AppConfig::load_with_cli_args(&cli_args)?;
    let mut app = App::new_with_config(config);

    let outcome = tokio::select! {
        result = run(&mut app, &cli_args.command) => Some(result),
        _ = interrupt.wait() => None,
    };

    // The crawl may have been dropped mid-way; make sure the browser goes too.
    app.shutdown().await;

    match outcome {
        Some(Ok(())) => tracing::info!("Finished"),
        Some(Err(e)) => {
            tracing::error!("Run failed: {}", e);
            return Err(e.into());
        }
        None => tracing::warn!("Interrupted; QIDs fetched in this run were not saved"),
    }

    Ok(())
}

async fn run(app: &mut App, command: &Command) -> Result<(), AppError> {
    match command {
        Command::Collect(args) => {
            let count = app.collect(&args.query(), !args.no_filter).await?.len();
            tracing::info!(
                "Collected {} new records into {}",
                count,
                app.output_path().display()
            );

            app.upload_after_collect().await;
            Ok(())
        }
        Command::Upload(args) => {
            let path = args
                .input
                .clone()
                .unwrap_or_else(|| app.output_path().to_path_buf());
            app.load_table(&path)?;

            let name = app
                .sheet_name()
                .map(str::to_string)
                .ok_or_else(|| AppError::SheetsApiError("no sheet name given (use --sheet)".into()))?;
            app.upload(&name).await?;
            tracing::info!("Uploaded {} to Google Sheet '{}'", path.display(), name);
            Ok(())
        }
    }
}
