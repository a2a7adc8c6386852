//! Canonical log record types
//!
//! A [`LogRecord`] is what the store hands back; a [`NewRecord`] is what the
//! validator produces and the store consumes. The two differ only in the
//! store-assigned fields (`id`, `created_at`).

pub mod validate;

use crate::error::RecordError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

pub use validate::{normalize_payload, normalize_record, Payload};

/// Origin tag applied when the caller does not supply one
pub const DEFAULT_SOURCE: &str = "client";

/// Severity of a log record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Stored (upper-case) representation
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(LogLevel::Debug),
            "INFO" => Ok(LogLevel::Info),
            "WARNING" | "WARN" => Ok(LogLevel::Warning),
            "ERROR" => Ok(LogLevel::Error),
            _ => Err(RecordError::InvalidLevel(s.to_string())),
        }
    }
}

/// Stored form of a level string
///
/// Known levels (including the `WARN` alias) map to their canonical name.
/// Anything else is kept, trimmed and upper-cased.
pub fn normalize_level(level: &str) -> String {
    match level.parse::<LogLevel>() {
        Ok(known) => known.as_str().to_string(),
        Err(_) => level.trim().to_uppercase(),
    }
}

/// Structured key/value metadata attached to a record
///
/// Stored as compact JSON text. Anything that fails to decode back into a
/// mapping reads as an empty mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(pub Map<String, Value>);

impl Metadata {
    /// Build from an arbitrary JSON value; non-mappings become empty
    pub fn from_value(value: Option<&Value>) -> Self {
        match value {
            Some(Value::Object(map)) => Metadata(map.clone()),
            _ => Metadata::default(),
        }
    }

    /// Canonical storage form
    pub fn to_storage(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".to_string())
    }

    /// Decode the storage form, falling back to an empty mapping
    pub fn from_storage(text: Option<&str>) -> Self {
        text.and_then(|t| serde_json::from_str::<Map<String, Value>>(t).ok())
            .map(Metadata)
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A validated record ready for insertion
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecord {
    pub timestamp: String,
    /// Already normalized, see [`normalize_level`]
    pub level: String,
    pub service: Option<String>,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub message: Option<String>,
    pub metadata: Metadata,
    pub raw: String,
    pub page: Option<String>,
    pub source: String,
}

impl NewRecord {
    /// Minimal record with defaults for everything but the dedup key
    pub fn new(raw: impl Into<String>, timestamp: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            level: LogLevel::default().as_str().to_string(),
            service: None,
            user_id: None,
            session_id: None,
            message: None,
            metadata: Metadata::default(),
            raw: raw.into(),
            page: None,
            source: DEFAULT_SOURCE.to_string(),
        }
    }
}

/// A stored record as read back from the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogRecord {
    pub id: i64,
    pub timestamp: String,
    /// Kept as text: levels outside the enumerated set are stored as given
    pub level: String,
    pub service: Option<String>,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub message: Option<String>,
    pub metadata: Metadata,
    pub raw: Option<String>,
    pub page: Option<String>,
    pub source: Option<String>,
    pub created_at: String,
}
