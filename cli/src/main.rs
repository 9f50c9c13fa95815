use anyhow::{Context, Result};
use clap::Parser;
use lib_catalog::loggers::LoggerLocal;
use lib_catalog::{Fetcher, LogSink, Processor};
use serde_json::json;
use std::process::ExitCode;
use std::sync::Arc;

mod config;
mod report;

use config::{Config, OutputFormat, Settings};
use report::Report;

const APP_NAME: &str = "rights-report";

fn run(settings: &Settings, logger: Arc<dyn LogSink>) -> Result<String> {
    let fetcher = Fetcher::new(&settings.username, &settings.password, logger.clone())
        .context("Cannot build HTTP client")?
        .with_backoff_base(settings.backoff_base);

    let vq = fetcher
        .fetch_with_retries(&settings.vq_url, settings.max_retries)
        .context("Fetching rights document")?;
    let tq = fetcher
        .fetch_with_retries(&settings.tq_url, settings.max_retries)
        .context("Fetching assets document")?;

    let processor = Processor::from_values(vq, tq, logger)?;
    let report = Report::build(&processor, &settings.device_platform);

    match settings.output {
        OutputFormat::Text => Ok(report.render_text()),
        OutputFormat::Json => Ok(report.render_json()?),
    }
}

fn main() -> ExitCode {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let settings = match config::resolve(Config::parse()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let logger: Arc<dyn LogSink> = match LoggerLocal::new(APP_NAME, Some(settings.logger_options())) {
        Ok(logger) => Arc::new(logger),
        Err(e) => {
            eprintln!("Cannot set up logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    logger.debug(
        "Starting report",
        Some(json!({
            "vq_url": settings.vq_url,
            "tq_url": settings.tq_url,
            "device_platform": settings.device_platform,
            "max_retries": settings.max_retries,
        })),
    );

    match run(&settings, logger.clone()) {
        Ok(output) => {
            match settings.output {
                OutputFormat::Text => print!("{output}"),
                OutputFormat::Json => println!("{output}"),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            logger.fatal(&format!("An error occurred: {e:#}"), None);
            ExitCode::FAILURE
        }
    }
}
