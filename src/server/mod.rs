//! HTTP server module.
//!
//! Ingestion, query, streamed export, the synthetic generator endpoints and
//! the file-backed agent scaffold, all sharing one [`LogStore`](crate::db::LogStore).

pub mod agents;
pub mod export;
pub mod ingest;
pub mod routes;

pub use routes::{build_router, serve, AppState};
