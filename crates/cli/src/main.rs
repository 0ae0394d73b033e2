//! Require Asset configuration tool - Main Application Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use std::env;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod app;
mod args;

use app::Application;
use args::Cli;

fn main() -> Result<()> {
    // Load .env file if it exists
    let dotenv_result = dotenv::dotenv();

    // Initialize logging
    init_logging()?;

    if let Err(e) = dotenv_result {
        // Only warn if the error is not "file not found"
        if !e.to_string().contains("No such file or directory") {
            warn!("Could not load .env file: {}", e);
        }
    } else {
        info!("Loaded environment variables from .env file");
    }

    let cli = Cli::parse();
    info!("Starting require-asset v{}", env!("CARGO_PKG_VERSION"));

    let app = Application::new(&cli).context("Failed to build configuration schema")?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    app.run(&cli.command, &mut out)
}

/// Initialize logging based on environment variables
fn init_logging() -> Result<()> {
    let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
    let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    // Logs go to stderr, stdout carries the command output
    match log_format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .try_init()
                .context("Failed to initialize JSON logging")?;
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .try_init()
                .context("Failed to initialize pretty logging")?;
        }
    }

    info!("Logging initialized");
    info!("Log level: {}", log_level);
    info!("Log format: {}", log_format);

    Ok(())
}
