//! log-forge - Synthetic Log Generator and SQLite Log Store
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use log_forge::config::{CliArgs, Command, InspectConfig, ServeConfig};
use log_forge::db::{LogFilter, LogStore};
use log_forge::report::print_inspection;
use log_forge::server;
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Setup logging
    setup_logging(args.verbose)?;

    match args.command {
        Command::Serve { .. } => {
            let config = ServeConfig::from_args(args).context("Invalid configuration")?;
            run_serve(config)
        }
        Command::Inspect { .. } => {
            let config = InspectConfig::from_args(args).context("Invalid configuration")?;
            run_inspect(config)
        }
    }
}

fn run_serve(config: ServeConfig) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create async runtime")?;

    runtime.block_on(async {
        server::serve(&config)
            .await
            .with_context(|| format!("Server on {} failed", config.addr))
    })
}

/// Print the total count and the latest records without writing anything
fn run_inspect(config: InspectConfig) -> Result<()> {
    let store = LogStore::open_read_only(&config.db_path)
        .with_context(|| format!("Failed to open {}", config.db_path.display()))?;

    let total = store.count().context("Failed to count records")?;
    let filter = LogFilter::default().with_limit(config.limit as u64);
    let records = store.query(&filter).context("Failed to read records")?;
    debug!(total, shown = records.len(), "inspection read");

    print_inspection(&config.db_path, total, &records).context("Failed to render records")?;

    store.close().context("Failed to close store")?;
    Ok(())
}

fn setup_logging(verbose: bool) -> Result<()> {
    // RUST_LOG wins when set
    let filter = match std::env::var("RUST_LOG") {
        Ok(spec) if !spec.is_empty() => EnvFilter::try_new(spec).context("Invalid RUST_LOG")?,
        _ if verbose => EnvFilter::new("log_forge=debug,warn"),
        _ => EnvFilter::new("log_forge=info,warn"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
