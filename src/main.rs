//! Task API server
//!
//! Serves the task REST API over HTTP, backed by a SQLite database.

use anyhow::Result;
use clap::Parser;
use std::fs::OpenOptions;
use std::sync::Arc;
use task_api::cli::seed::run_seed;
use task_api::cli::{Cli, Command};
use task_api::config::Config;
use task_api::db::Database;
use task_api::server;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging based on the --log option.
///
/// `RUST_LOG` takes precedence over the --verbose default level.
fn init_logging(cli: &Cli) -> Result<()> {
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match cli.log.as_str() {
        "0" | "off" => {
            // No logging
        }
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter())
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter())
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            // Log to file (append mode)
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_env_filter(filter())
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        return;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let mut config = Config::resolve(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    config.ensure_db_dir()?;

    let db = Database::open(&config.server.db_path)?;
    info!("Opened database at {}", config.server.db_path.display());

    match cli.command {
        None | Some(Command::Serve) => {
            let addr = config.bind_addr()?;
            server::serve(Arc::new(db), addr, shutdown_signal()).await?;
        }
        Some(Command::Seed(args)) => {
            let total = run_seed(&args, &db)?;
            println!("{} tasks in database", total);
        }
    }

    Ok(())
}
