mod api;
mod cli;
mod config;
mod db;
mod error;
mod models;
mod staging;
mod transform;

use clap::Parser;
use cli::{App, Cli};
use colored::*;
use config::PipelineConfig;
use error::Result;
use std::env;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::{BoxMakeWriter, MakeWriterExt};
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "weather-etl.log";

/// Installs the global subscriber.
///
/// `RUST_LOG` filters events (default `info`), `LOG_FORMAT=json` switches to JSON lines and
/// `LOG_DIR` adds a daily-rolling log file next to stderr. The returned guard flushes the
/// file writer when dropped, so it must live until the end of `main`.
fn init_logging() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let (writer, guard) = match env::var("LOG_DIR") {
        Ok(dir) if !dir.trim().is_empty() => {
            let (file, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX));
            (BoxMakeWriter::new(std::io::stderr.and(file)), Some(guard))
        },
        _ => (BoxMakeWriter::new(std::io::stderr), None),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env first so it can also configure logging
    dotenv::dotenv().ok();
    let _guard = init_logging();

    let cli = Cli::parse();
    info!("Starting weather ETL: {:?}", cli.command);

    let config = match PipelineConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            println!("{} {}", "Error: invalid configuration:".red(), e);
            return Err(e);
        },
    };

    let app = App::new(config);
    if let Err(e) = app.run(cli).await {
        error!("Command execution failed: {:?}", e);
        println!(
            "{} {}",
            "Error executing command:".red(),
            e.to_string().red()
        );
        return Err(e);
    }

    Ok(())
}
