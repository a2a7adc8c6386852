//! log-forge - Synthetic Log Generator and SQLite Log Store
//!
//! Ingests structured log records over HTTP, stores them in SQLite with
//! deduplication on the raw line, and serves them back as filtered JSON or as
//! streamed NDJSON/CSV exports.
//!
//! # Features
//!
//! - **Idempotent Ingestion**: The `raw` line is the dedup key. Re-sending a
//!   record is a no-op that reports zero rows inserted.
//!
//! - **Batch Transactions**: Arrays are written in one transaction. Invalid
//!   elements are dropped up front; a storage failure rolls back the batch.
//!
//! - **Deterministic Ordering**: Newest timestamp first, ties broken by
//!   descending insertion id.
//!
//! - **Streaming Export**: Rows are read in keyset-paginated batches and
//!   pushed through a bounded channel, so memory stays flat for any size.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   POST /logs    ┌──────────────────────┐
//! │   Clients /  │ ──────────────▶ │  Ingestion gateway   │
//! │  generator   │                 │  (validate, batch)   │
//! └──────────────┘                 └──────────┬───────────┘
//!                                             │ insert / insert_batch
//!                                             ▼
//!                                  ┌──────────────────────┐
//!                                  │      LogStore        │
//!                                  │  SQLite (WAL mode)   │
//!                                  └──────────┬───────────┘
//!                        query                │  cursor
//!              ┌──────────────────────────────┼────────────────┐
//!              ▼                              ▼                │
//!      GET /logs (JSON)            GET /logs/export (NDJSON/CSV)
//! ```
//!
//! # Example
//!
//! ```bash
//! # Start the server
//! log-forge serve --db data/logs.db --port 3000
//!
//! # Ingest and read back
//! curl -X POST localhost:3000/logs -d '{"raw":"[t] INFO [svc] hello","message":"hello"}'
//! curl 'localhost:3000/logs?level=ERROR&limit=10'
//! curl -OJ 'localhost:3000/logs/export?format=csv'
//! ```

pub mod config;
pub mod db;
pub mod error;
pub mod generator;
pub mod record;
pub mod report;
pub mod server;

pub use config::{CliArgs, Command, InspectConfig, ServeConfig};
pub use db::{LogFilter, LogStore, RecordCursor};
pub use record::{LogLevel, LogRecord, Metadata, NewRecord};
