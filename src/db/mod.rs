//! Database module for SQLite log storage
//!
//! This module owns the on-disk `logs` table: schema creation, inserts with
//! deduplication on `raw`, filtered queries and lazy cursors for export.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │              HTTP handlers (async)                      │
//! │  - spawn_blocking around every store call               │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │ Arc<LogStore>
//!                       ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │                   LogStore                              │
//! │  writer: Mutex<Connection>  ── inserts, transactions    │
//! │  reader: Mutex<Connection>  ── queries, cursor batches  │
//! └─────────────────────┬───────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌─────────────────────────────────────────────────────────┐
//! │              SQLite file (WAL mode)                     │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod cursor;
pub mod query;
pub mod schema;
pub mod store;

pub use cursor::RecordCursor;
pub use query::{LogFilter, QueryPlan, DEFAULT_LIMIT};
pub use schema::{create_database, create_indexes, keys};
pub use store::LogStore;
