//! Error types for log-forge
//!
//! This module defines the error hierarchy for:
//! - Record validation (malformed or wrong-shape payloads)
//! - SQLite storage errors
//! - The file-backed agent scaffold
//! - Configuration and CLI errors
//! - The HTTP surface, which maps everything above onto status codes
//!
//! Design philosophy:
//! - Use thiserror for structured error types in library code
//! - Errors should be actionable - include context about what to do
//! - Preserve error chains for debugging

use std::path::PathBuf;
use thiserror::Error;

/// Payload validation errors
///
/// Every variant surfaces to HTTP callers as `InvalidPayload` (400).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// Body was null or absent
    #[error("empty body")]
    EmptyPayload,

    /// Body was neither an object nor an array of objects
    #[error("invalid payload: expected an object or an array of objects, got {found}")]
    WrongShape { found: &'static str },

    /// The dedup key is missing
    #[error("record is missing a non-empty 'raw' field")]
    MissingRaw,

    /// A field had a type that cannot be coerced
    #[error("field '{field}' has an unsupported type: {reason}")]
    InvalidField { field: &'static str, reason: String },

    /// Level outside DEBUG/INFO/WARNING/ERROR
    #[error("unknown log level '{0}'")]
    InvalidLevel(String),
}

/// Database errors
#[derive(Error, Debug)]
pub enum DbError {
    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to create database file
    #[error("Failed to create database at '{path}': {reason}")]
    CreateFailed { path: PathBuf, reason: String },

    /// Schema error
    #[error("Database schema error: {0}")]
    Schema(String),

    /// Transaction failed
    #[error("Transaction failed: {0}")]
    Transaction(String),

    /// Store was closed before the operation ran
    #[error("Store is closed")]
    Closed,

    /// Write attempted on a store opened with [`LogStore::open_read_only`](crate::db::LogStore::open_read_only)
    #[error("Store is open read-only")]
    ReadOnly,

    /// No database file where one was expected
    #[error("No database at '{0}'")]
    Missing(PathBuf),

    /// Blocking storage task died
    #[error("Storage task failed: {0}")]
    TaskFailed(String),
}

/// Agent scaffold errors
#[derive(Error, Debug)]
pub enum AgentError {
    /// Agent id does not exist
    #[error("agent not found: {0}")]
    NotFound(String),

    /// Create request was missing fields
    #[error("{0}")]
    InvalidRequest(String),

    /// Agents file could not be read or written
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Agents file could not be encoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading recent records failed
    #[error("Storage error: {0}")]
    Storage(#[from] DbError),
}

/// Configuration and CLI errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Port 0 is not a usable listen port
    #[error("Invalid port {port}: must be between 1 and 65535")]
    InvalidPort { port: u16 },

    /// Bind address did not parse
    #[error("Invalid bind address '{addr}': {reason}")]
    InvalidBindAddress { addr: String, reason: String },

    /// Database path error
    #[error("Invalid database path '{path}': {reason}")]
    InvalidDatabasePath { path: PathBuf, reason: String },

    /// Inspect limit out of range
    #[error("Invalid row limit {limit}: must be at least 1")]
    InvalidLimit { limit: usize },
}

/// HTTP-facing errors
#[derive(Error, Debug)]
pub enum ServerError {
    /// Malformed, empty or wrong-shape input
    #[error("{0}")]
    InvalidPayload(String),

    /// Underlying read/write failure
    #[error("Storage failure: {0}")]
    Storage(#[from] DbError),

    /// Referenced entity absent
    #[error("{0}")]
    NotFound(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<RecordError> for ServerError {
    fn from(err: RecordError) -> Self {
        ServerError::InvalidPayload(err.to_string())
    }
}

impl From<axum::extract::rejection::QueryRejection> for ServerError {
    fn from(rejection: axum::extract::rejection::QueryRejection) -> Self {
        ServerError::InvalidPayload(rejection.body_text())
    }
}

impl From<AgentError> for ServerError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::NotFound(_) => ServerError::NotFound(err.to_string()),
            AgentError::InvalidRequest(msg) => ServerError::InvalidPayload(msg),
            AgentError::Storage(e) => ServerError::Storage(e),
            AgentError::Json(e) => ServerError::Json(e),
            AgentError::Io { .. } => ServerError::Other(err.to_string()),
        }
    }
}

impl ServerError {
    /// HTTP status this error maps to
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;

        match self {
            ServerError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl axum::response::IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        use axum::Json;

        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = serde_json::json!({ "error": self.to_string() });
        (status, Json(body)).into_response()
    }
}

/// Result type alias for DbError
pub type DbResult<T> = std::result::Result<T, DbError>;

/// Result type alias for ServerError
pub type ServerResult<T> = std::result::Result<T, ServerError>;

/// Result type alias for AgentError
pub type AgentResult<T> = std::result::Result<T, AgentError>;
