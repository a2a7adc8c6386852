//! Database schema definitions and creation
//!
//! This module defines the SQLite schema for storing log records and
//! provides functions to create and configure the database. Every statement
//! here is idempotent, so [`create_database`] runs on every startup.

use crate::error::{DbError, DbResult};
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;

/// Current schema version for migrations
///
/// Version 2 widened `ts_key` from microseconds to nanoseconds.
pub const SCHEMA_VERSION: u32 = 2;

/// Columns returned for a [`LogRecord`](crate::record::LogRecord), in the
/// order `record_from_row` expects them.
pub const RECORD_COLUMNS: &str =
    "id, timestamp, level, service, user_id, session_id, message, metadata, raw, page, source, created_at";

/// SQL to create the log records table
///
/// `ts_key` is the record timestamp normalized to a fixed-width UTC string
/// (empty when the timestamp does not parse), so that text ordering matches
/// temporal ordering.
const CREATE_LOGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    ts_key TEXT NOT NULL DEFAULT '',
    level TEXT NOT NULL DEFAULT 'INFO',
    service TEXT,
    user_id TEXT,
    session_id TEXT,
    message TEXT,
    metadata TEXT NOT NULL DEFAULT '{}',
    raw TEXT UNIQUE,
    page TEXT,
    source TEXT NOT NULL DEFAULT 'client',
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
)
"#;

/// SQL to create store metadata table
const CREATE_STORE_INFO_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS store_info (
    key TEXT PRIMARY KEY,
    value TEXT
)
"#;

/// SQL to create indexes for common queries
const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_logs_order ON logs(ts_key DESC, id DESC)",
    "CREATE INDEX IF NOT EXISTS idx_logs_level ON logs(level, ts_key DESC)",
    "CREATE INDEX IF NOT EXISTS idx_logs_page ON logs(page, ts_key DESC) WHERE page IS NOT NULL",
];

/// SQLite pragmas for the writer connection
const WRITE_PRAGMAS: &str = r#"
PRAGMA journal_mode = WAL;
PRAGMA synchronous = NORMAL;
PRAGMA cache_size = -16000;      -- 16MB cache
PRAGMA temp_store = MEMORY;
PRAGMA busy_timeout = 5000;
"#;

/// SQLite pragmas for reader connections
const READ_PRAGMAS: &str = r#"
PRAGMA busy_timeout = 5000;
PRAGMA cache_size = -16000;
"#;

/// Create and configure the database for writing
pub fn create_database(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(WRITE_PRAGMAS)?;

    conn.execute(CREATE_LOGS_TABLE, [])?;
    conn.execute(CREATE_STORE_INFO_TABLE, [])?;
    create_indexes(conn)?;

    set_store_info(conn, keys::SCHEMA_VERSION, &SCHEMA_VERSION.to_string())?;
    set_store_info(conn, keys::WRITER_VERSION, env!("CARGO_PKG_VERSION"))?;

    Ok(())
}

/// Schema version recorded by whichever writer last opened the file
///
/// `None` for a fresh file. A version newer than [`SCHEMA_VERSION`] is an
/// error: this build cannot know how that writer laid out `ts_key`.
pub fn stored_schema_version(conn: &Connection) -> DbResult<Option<u32>> {
    let has_info: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='store_info')",
        [],
        |row| row.get(0),
    )?;
    if !has_info {
        return Ok(None);
    }

    let version = match get_store_info(conn, keys::SCHEMA_VERSION)? {
        Some(text) => text
            .parse::<u32>()
            .map_err(|_| DbError::Schema(format!("unreadable schema version '{}'", text)))?,
        None => return Ok(None),
    };

    if version > SCHEMA_VERSION {
        return Err(DbError::Schema(format!(
            "store has schema version {}, this build supports up to {}",
            version, SCHEMA_VERSION
        )));
    }
    Ok(Some(version))
}

/// Create indexes
pub fn create_indexes(conn: &Connection) -> DbResult<()> {
    for sql in CREATE_INDEXES {
        conn.execute(sql, [])?;
    }
    Ok(())
}

/// Apply reader settings and register the SQL functions queries rely on
pub fn configure_reader(conn: &Connection) -> DbResult<()> {
    conn.execute_batch(READ_PRAGMAS)?;
    register_functions(conn)?;
    Ok(())
}

/// `fold_case(text)`: Unicode lower-casing for case-insensitive search
///
/// SQLite's own `lower()` and `LIKE` only fold ASCII.
pub fn register_functions(conn: &Connection) -> DbResult<()> {
    conn.create_scalar_function(
        "fold_case",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|t| t.to_lowercase()))
        },
    )?;
    Ok(())
}

/// Store metadata
pub fn set_store_info(conn: &Connection, key: &str, value: &str) -> DbResult<()> {
    conn.execute(
        "INSERT OR REPLACE INTO store_info (key, value) VALUES (?1, ?2)",
        [key, value],
    )?;
    Ok(())
}

/// Get store metadata
pub fn get_store_info(conn: &Connection, key: &str) -> DbResult<Option<String>> {
    let result = conn.query_row(
        "SELECT value FROM store_info WHERE key = ?1",
        [key],
        |row| row.get(0),
    );

    match result {
        Ok(value) => Ok(Some(value)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Metadata keys kept in `store_info`
pub mod keys {
    /// Schema version
    pub const SCHEMA_VERSION: &str = "schema_version";

    /// Version of log-forge that last opened the store for writing
    pub const WRITER_VERSION: &str = "writer_version";

    /// Timestamp of the last open (ISO 8601)
    pub const OPENED_AT: &str = "opened_at";
}
