//! Query planning
//!
//! Translates a [`LogFilter`] into parameterized SQL with a deterministic
//! ordering: newest timestamp first, ties broken by descending id.

use crate::db::schema::RECORD_COLUMNS;
use crate::record::normalize_level;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rusqlite::types::Value as SqlValue;
use serde::{Deserialize, Deserializer};

/// Page size applied by [`QueryPlan::for_query`] when the caller gives none
pub const DEFAULT_LIMIT: u64 = 200;

/// Format of the `ts_key` column: fixed width so that text order is time order
const TS_KEY_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.9fZ";

/// Naive layouts accepted when a timestamp carries no offset (read as UTC)
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Filter specification shared by the list and export endpoints
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct LogFilter {
    /// Exact level match, normalized the way ingestion normalizes levels
    pub level: Option<String>,
    /// Exact page match
    pub page: Option<String>,
    /// Case-insensitive substring over message, service, userId and raw
    pub search: Option<String>,
    /// Strict lower bound on the timestamp
    pub since: Option<String>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub limit: Option<u64>,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub offset: Option<u64>,
}

/// `limit=` reads as absent, like every other blank filter
fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let text = Option::<String>::deserialize(deserializer)?;
    match text.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(n) => n
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("expected a non-negative integer, got '{}'", n))),
    }
}

impl LogFilter {
    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Position of the last row handed out, for keyset pagination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortPosition {
    pub ts_key: String,
    pub id: i64,
}

/// A planned query: WHERE conditions plus their bound values
#[derive(Debug, Clone)]
pub struct QueryPlan {
    conditions: Vec<String>,
    params: Vec<SqlValue>,
    limit: Option<u64>,
    offset: u64,
}

impl QueryPlan {
    /// Plan for the JSON list endpoint: limit defaults to [`DEFAULT_LIMIT`]
    pub fn for_query(filter: &LogFilter) -> Self {
        let mut plan = Self::unbounded(filter);
        plan.limit = Some(filter.limit.unwrap_or(DEFAULT_LIMIT));
        plan
    }

    /// Plan for export: no limit unless the caller asked for one
    pub fn for_export(filter: &LogFilter) -> Self {
        let mut plan = Self::unbounded(filter);
        plan.limit = filter.limit;
        plan
    }

    fn unbounded(filter: &LogFilter) -> Self {
        let mut conditions = Vec::new();
        let mut params = Vec::new();

        if let Some(level) = non_empty(&filter.level) {
            conditions.push("level = ?".to_string());
            params.push(SqlValue::Text(normalize_level(level)));
        }

        if let Some(page) = non_empty(&filter.page) {
            conditions.push("page = ?".to_string());
            params.push(SqlValue::Text(page.to_string()));
        }

        if let Some(since) = non_empty(&filter.since) {
            match normalize_timestamp(since) {
                Some(key) => {
                    conditions.push("ts_key > ?".to_string());
                    params.push(SqlValue::Text(key));
                }
                None => {
                    conditions.push("timestamp > ?".to_string());
                    params.push(SqlValue::Text(since.to_string()));
                }
            }
        }

        if let Some(search) = non_empty(&filter.search) {
            // both sides folded: LIKE alone only ignores ASCII case
            let pattern = format!("%{}%", escape_like(&search.to_lowercase()));
            conditions.push(
                "(fold_case(message) LIKE ? ESCAPE '\\' OR fold_case(service) LIKE ? ESCAPE '\\' \
                 OR fold_case(user_id) LIKE ? ESCAPE '\\' OR fold_case(raw) LIKE ? ESCAPE '\\')"
                    .to_string(),
            );
            for _ in 0..4 {
                params.push(SqlValue::Text(pattern.clone()));
            }
        }

        Self {
            conditions,
            params,
            limit: None,
            offset: filter.offset.unwrap_or(0),
        }
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Full query honoring the plan's own limit and offset
    pub fn sql(&self) -> (String, Vec<SqlValue>) {
        self.select(RECORD_COLUMNS, None, self.limit, self.offset)
    }

    /// One keyset page: rows strictly after `after` in sort order
    ///
    /// Also selects `ts_key` as the last column so the caller can advance.
    pub fn page_sql(&self, after: Option<&SortPosition>, limit: u64, offset: u64) -> (String, Vec<SqlValue>) {
        let columns = format!("{}, ts_key", RECORD_COLUMNS);
        self.select(&columns, after, Some(limit), offset)
    }

    fn select(
        &self,
        columns: &str,
        after: Option<&SortPosition>,
        limit: Option<u64>,
        offset: u64,
    ) -> (String, Vec<SqlValue>) {
        let mut conditions = self.conditions.clone();
        let mut params = self.params.clone();

        if let Some(pos) = after {
            conditions.push("(ts_key < ? OR (ts_key = ? AND id < ?))".to_string());
            params.push(SqlValue::Text(pos.ts_key.clone()));
            params.push(SqlValue::Text(pos.ts_key.clone()));
            params.push(SqlValue::Integer(pos.id));
        }

        let where_sql = if conditions.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", conditions.join(" AND "))
        };

        // SQLite treats a negative LIMIT as "no limit"
        params.push(SqlValue::Integer(limit.map(clamp_i64).unwrap_or(-1)));
        params.push(SqlValue::Integer(clamp_i64(offset)));

        let sql = format!(
            "SELECT {} FROM logs{} ORDER BY ts_key DESC, id DESC LIMIT ? OFFSET ?",
            columns, where_sql
        );
        (sql, params)
    }
}

/// Normalize an ISO-8601 timestamp to the `ts_key` form
///
/// Offsets are converted to UTC; timestamps without an offset are read as
/// UTC; a bare date means midnight. Returns `None` for anything else.
pub fn normalize_timestamp(ts: &str) -> Option<String> {
    let ts = ts.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.with_timezone(&Utc).format(TS_KEY_FORMAT).to_string());
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(ts, fmt) {
            return Some(naive.and_utc().format(TS_KEY_FORMAT).to_string());
        }
    }

    NaiveDate::parse_from_str(ts, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().format(TS_KEY_FORMAT).to_string())
}

/// Escape LIKE wildcards so the needle matches literally
fn escape_like(needle: &str) -> String {
    let mut out = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn clamp_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
