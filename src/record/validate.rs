//! Payload normalization
//!
//! Turns arbitrary JSON bodies into [`NewRecord`] values. The functions here
//! are pure: no I/O, and the current instant is only read when a record
//! arrives without a timestamp.

use super::{normalize_level, LogLevel, Metadata, NewRecord, DEFAULT_SOURCE};
use crate::error::RecordError;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

/// A normalized request body
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Body was a single object
    Single(NewRecord),

    /// Body was an array; invalid elements have already been dropped
    Batch {
        records: Vec<NewRecord>,
        /// Elements that failed validation (logged, never reported)
        rejected: usize,
    },
}

/// Normalize a request body
///
/// A single object must be valid. In an array, each element is validated
/// independently and the invalid ones are dropped.
pub fn normalize_payload(body: &Value) -> Result<Payload, RecordError> {
    normalize_payload_at(body, Utc::now())
}

/// Same as [`normalize_payload`] with an explicit "now" for defaulted timestamps
pub fn normalize_payload_at(body: &Value, now: DateTime<Utc>) -> Result<Payload, RecordError> {
    match body {
        Value::Null => Err(RecordError::EmptyPayload),
        Value::Object(map) => normalize_object(map, now).map(Payload::Single),
        Value::Array(items) => {
            let mut records = Vec::with_capacity(items.len());
            let mut rejected = 0;

            for item in items {
                match normalize_record_at(item, now) {
                    Ok(record) => records.push(record),
                    Err(e) => {
                        tracing::debug!(error = %e, "dropping invalid batch element");
                        rejected += 1;
                    }
                }
            }

            Ok(Payload::Batch { records, rejected })
        }
        other => Err(RecordError::WrongShape {
            found: json_type_name(other),
        }),
    }
}

/// Normalize one candidate record
pub fn normalize_record(value: &Value) -> Result<NewRecord, RecordError> {
    normalize_record_at(value, Utc::now())
}

fn normalize_record_at(value: &Value, now: DateTime<Utc>) -> Result<NewRecord, RecordError> {
    match value {
        Value::Object(map) => normalize_object(map, now),
        Value::Null => Err(RecordError::EmptyPayload),
        other => Err(RecordError::WrongShape {
            found: json_type_name(other),
        }),
    }
}

fn normalize_object(map: &Map<String, Value>, now: DateTime<Utc>) -> Result<NewRecord, RecordError> {
    let raw = optional_string(map, "raw")?.ok_or(RecordError::MissingRaw)?;

    let level = match optional_string(map, "level")? {
        Some(level) if !level.trim().is_empty() => normalize_level(&level),
        _ => LogLevel::default().as_str().to_string(),
    };

    let timestamp = optional_string(map, "timestamp")?
        .unwrap_or_else(|| now.to_rfc3339_opts(SecondsFormat::Millis, true));

    let source = optional_string(map, "source")?.unwrap_or_else(|| DEFAULT_SOURCE.to_string());

    Ok(NewRecord {
        timestamp,
        level,
        service: optional_string(map, "service")?,
        user_id: optional_string(map, "userId")?,
        session_id: optional_string(map, "sessionId")?,
        message: optional_string(map, "message")?,
        metadata: Metadata::from_value(map.get("metadata")),
        raw,
        page: optional_string(map, "page")?,
        source,
    })
}

/// Read an optional string field
///
/// Scalars are stringified, null and empty strings read as absent.
fn optional_string(map: &Map<String, Value>, field: &'static str) -> Result<Option<String>, RecordError> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(RecordError::InvalidField {
            field,
            reason: format!("expected a string, got {}", json_type_name(other)),
        }),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
