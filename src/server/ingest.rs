//! Ingestion gateway
//!
//! Accepts a single record or an array of records, validates them and hands
//! the survivors to the store. Invalid array elements are dropped; a storage
//! failure aborts the whole batch.

use crate::db::LogStore;
use crate::error::{ServerError, ServerResult};
use crate::record::{normalize_payload, Payload};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

/// Result of one ingestion request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestOutcome {
    /// Rows actually written (duplicates excluded)
    pub inserted: usize,
    /// Array elements dropped by validation
    #[serde(skip)]
    pub rejected: usize,
}

/// Decode a raw request body
///
/// An empty (or whitespace-only) body is rejected before JSON parsing.
pub fn parse_body(bytes: &[u8]) -> ServerResult<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Err(ServerError::InvalidPayload("empty body".into()));
    }
    serde_json::from_slice(bytes)
        .map_err(|e| ServerError::InvalidPayload(format!("malformed JSON: {}", e)))
}

/// Validate `body` and persist whatever survives
pub async fn ingest(store: &Arc<LogStore>, body: Value) -> ServerResult<IngestOutcome> {
    match normalize_payload(&body)? {
        Payload::Single(record) => {
            let inserted = store.run_blocking(move |s| s.insert(&record)).await?;
            debug!(inserted, "single record ingested");
            Ok(IngestOutcome { inserted, rejected: 0 })
        }
        Payload::Batch { records, rejected } => {
            let received = records.len() + rejected;
            let inserted = store.run_blocking(move |s| s.insert_batch(&records)).await?;
            info!(received, inserted, rejected, "batch ingested");
            Ok(IngestOutcome { inserted, rejected })
        }
    }
}
