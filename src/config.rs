//! Configuration types for log-forge
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation

use crate::error::ConfigError;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Default database location, relative to the working directory
pub const DEFAULT_DB_PATH: &str = "data/logs.db";

/// Default directory for auxiliary files (agents.json)
pub const DEFAULT_DATA_DIR: &str = "data";

/// Default listen port when neither --port nor PORT is given
pub const DEFAULT_PORT: u16 = 3000;

/// Synthetic log generator and SQLite-backed log store
#[derive(Parser, Debug, Clone)]
#[command(
    name = "log-forge",
    version,
    about = "Synthetic log generator and SQLite-backed log store",
    long_about = "Ingests structured log records over HTTP, deduplicates them on their raw line,\n\
                  stores them in SQLite and serves filtered queries and streamed NDJSON/CSV exports.\n\n\
                  Also fabricates realistic log lines for a handful of fictitious services.",
    after_help = "EXAMPLES:\n    \
        log-forge serve --db data/logs.db --port 3000\n    \
        PORT=8080 log-forge serve -v\n    \
        log-forge inspect --db data/logs.db -n 5"
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose output (debug-level logging)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,
}

/// Subcommands
#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Start the HTTP server
    Serve {
        /// SQLite database file
        #[arg(long, default_value = DEFAULT_DB_PATH, value_name = "PATH")]
        db: PathBuf,

        /// Directory for agents.json
        #[arg(long, default_value = DEFAULT_DATA_DIR, value_name = "DIR")]
        data_dir: PathBuf,

        /// Bind address
        #[arg(long, default_value = "0.0.0.0")]
        bind: String,

        /// Port to listen on
        #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
        port: u16,
    },

    /// Print the record count and the latest records
    Inspect {
        /// SQLite database file
        #[arg(long, default_value = DEFAULT_DB_PATH, value_name = "PATH")]
        db: PathBuf,

        /// Number of records to show
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
    },
}

/// Validated server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeConfig {
    pub db_path: PathBuf,
    pub data_dir: PathBuf,
    pub addr: SocketAddr,
}

impl ServeConfig {
    /// Validate serve arguments
    ///
    /// Fails for a non-serve subcommand.
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        let Command::Serve {
            db,
            data_dir,
            bind,
            port,
        } = args.command
        else {
            return Err(ConfigError::InvalidDatabasePath {
                path: PathBuf::new(),
                reason: "not a serve command".to_string(),
            });
        };

        if port == 0 {
            return Err(ConfigError::InvalidPort { port });
        }

        let addr = parse_addr(&bind, port)?;
        validate_db_path(&db)?;

        Ok(Self {
            db_path: db,
            data_dir,
            addr,
        })
    }
}

/// Validated inspection configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectConfig {
    pub db_path: PathBuf,
    pub limit: usize,
}

impl InspectConfig {
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        let Command::Inspect { db, limit } = args.command else {
            return Err(ConfigError::InvalidDatabasePath {
                path: PathBuf::new(),
                reason: "not an inspect command".to_string(),
            });
        };

        if limit == 0 {
            return Err(ConfigError::InvalidLimit { limit });
        }

        validate_db_path(&db)?;
        if !db.exists() {
            return Err(ConfigError::InvalidDatabasePath {
                path: db,
                reason: "Database does not exist".to_string(),
            });
        }

        Ok(Self {
            db_path: db,
            limit,
        })
    }
}

fn parse_addr(bind: &str, port: u16) -> Result<SocketAddr, ConfigError> {
    // bracket bare IPv6 literals
    let host = if bind.contains(':') && !bind.starts_with('[') {
        format!("[{}]", bind)
    } else {
        bind.to_string()
    };

    format!("{}:{}", host, port)
        .parse()
        .map_err(|e: std::net::AddrParseError| ConfigError::InvalidBindAddress {
            addr: bind.to_string(),
            reason: e.to_string(),
        })
}

fn validate_db_path(path: &std::path::Path) -> Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::InvalidDatabasePath {
            path: path.to_path_buf(),
            reason: "Path is empty".to_string(),
        });
    }
    if path.is_dir() {
        return Err(ConfigError::InvalidDatabasePath {
            path: path.to_path_buf(),
            reason: "Path is a directory".to_string(),
        });
    }
    Ok(())
}
