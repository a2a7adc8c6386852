//! SQLite-backed log record store
//!
//! One writer connection and one reader connection, each behind its own
//! mutex. WAL mode lets reads proceed while a write transaction is open.
//!
//! # Deduplication
//!
//! `raw` carries a `UNIQUE` constraint and inserts use
//! `ON CONFLICT(raw) DO NOTHING`, so a duplicate is a zero-row insert rather
//! than an error. Because the check happens inside SQLite, two concurrent
//! inserts of the same `raw` can never both succeed. Other constraint
//! violations still surface as errors.

use crate::db::cursor::{RecordCursor, DEFAULT_BATCH_SIZE};
use crate::db::query::{normalize_timestamp, LogFilter, QueryPlan};
use crate::db::schema::{self, keys};
use crate::error::{DbError, DbResult};
use crate::record::{LogRecord, Metadata, NewRecord};
use parking_lot::Mutex;
use rusqlite::{params, params_from_iter, Connection, OpenFlags, Row};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

const INSERT_SQL: &str = "INSERT INTO logs \
     (timestamp, ts_key, level, service, user_id, session_id, message, metadata, raw, page, source) \
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11) \
     ON CONFLICT(raw) DO NOTHING";

/// Durable, queryable holder of log records
pub struct LogStore {
    path: PathBuf,
    read_only: bool,
    writer: Mutex<Option<Connection>>,
    reader: Mutex<Option<Connection>>,
}

impl LogStore {
    /// Open (or create) the store at `path`
    ///
    /// Creates the parent directory if needed. Schema creation is idempotent.
    /// Rows written under an older schema version get their `ts_key` rebuilt.
    pub fn open(path: &Path) -> DbResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| DbError::CreateFailed {
                    path: path.to_path_buf(),
                    reason: format!("Failed to create parent directory: {}", e),
                })?;
            }
        }

        let mut writer = Connection::open(path)?;
        let previous = schema::stored_schema_version(&writer)?;
        // rebuild before create_database stamps the new version
        if matches!(previous, Some(v) if v < schema::SCHEMA_VERSION) {
            let rekeyed = rebuild_ts_keys(&mut writer)?;
            info!(rekeyed, from = ?previous, "rebuilt ordering keys");
        }
        schema::create_database(&writer)?;
        schema::set_store_info(&writer, keys::OPENED_AT, &chrono::Utc::now().to_rfc3339())?;

        let reader = open_reader(path)?;

        info!(path = %path.display(), "log store opened");

        Ok(Self {
            path: path.to_path_buf(),
            read_only: false,
            writer: Mutex::new(Some(writer)),
            reader: Mutex::new(Some(reader)),
        })
    }

    /// Open an existing store for reading only
    ///
    /// Runs no DDL and writes nothing, not even `store_info`. Inserts fail
    /// with [`DbError::ReadOnly`].
    pub fn open_read_only(path: &Path) -> DbResult<Self> {
        if !path.is_file() {
            return Err(DbError::Missing(path.to_path_buf()));
        }

        let reader = open_reader(path)?;
        schema::stored_schema_version(&reader)?;

        debug!(path = %path.display(), "log store opened read-only");

        Ok(Self {
            path: path.to_path_buf(),
            read_only: true,
            writer: Mutex::new(None),
            reader: Mutex::new(Some(reader)),
        })
    }

    /// Close both connections; later operations fail with [`DbError::Closed`]
    pub fn close(&self) -> DbResult<()> {
        let reader = self.reader.lock().take();
        let writer = self.writer.lock().take();

        if let Some(conn) = reader {
            conn.close().map_err(|(_, e)| DbError::Sqlite(e))?;
        }
        if let Some(conn) = writer {
            conn.close().map_err(|(_, e)| DbError::Sqlite(e))?;
        }

        info!(path = %self.path.display(), "log store closed");
        Ok(())
    }

    /// Insert one record; returns 1, or 0 when `raw` already exists
    pub fn insert(&self, record: &NewRecord) -> DbResult<usize> {
        let guard = self.writer.lock();
        let conn = guard.as_ref().ok_or_else(|| self.no_writer())?;
        insert_record(conn, record)
    }

    /// Insert records inside one transaction
    ///
    /// Duplicates are skipped and not counted. Any other error rolls the whole
    /// batch back and is returned; no partial batch is ever visible.
    pub fn insert_batch(&self, records: &[NewRecord]) -> DbResult<usize> {
        if records.is_empty() {
            return Ok(0);
        }

        let start = Instant::now();
        let mut guard = self.writer.lock();
        let conn = guard.as_mut().ok_or_else(|| self.no_writer())?;

        let tx = conn.transaction()?;
        let mut inserted = 0;
        for record in records {
            match insert_record(&tx, record) {
                Ok(n) => inserted += n,
                Err(e) => {
                    warn!(error = %e, batch = records.len(), "batch insert failed, rolling back");
                    // dropping `tx` rolls back
                    return Err(e);
                }
            }
        }
        tx.commit()
            .map_err(|e| DbError::Transaction(format!("commit failed: {}", e)))?;

        debug!(
            inserted,
            skipped = records.len() - inserted,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "batch committed"
        );
        Ok(inserted)
    }

    /// Run a filtered query; see [`QueryPlan::for_query`] for defaults
    pub fn query(&self, filter: &LogFilter) -> DbResult<Vec<LogRecord>> {
        let (sql, params) = QueryPlan::for_query(filter).sql();

        self.with_reader(|conn| {
            let mut stmt = conn.prepare_cached(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(params.iter()), record_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Lazy, batched read of the filtered result set
    pub fn cursor(self: &Arc<Self>, filter: &LogFilter) -> RecordCursor {
        RecordCursor::new(Arc::clone(self), filter, DEFAULT_BATCH_SIZE)
    }

    /// Total number of stored records
    pub fn count(&self) -> DbResult<u64> {
        self.with_reader(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM logs", [], |row| row.get(0))?;
            Ok(count.max(0) as u64)
        })
    }

    fn no_writer(&self) -> DbError {
        if self.read_only {
            DbError::ReadOnly
        } else {
            DbError::Closed
        }
    }

    /// Run `f` against the reader connection
    pub(crate) fn with_reader<T>(&self, f: impl FnOnce(&Connection) -> DbResult<T>) -> DbResult<T> {
        let guard = self.reader.lock();
        let conn = guard.as_ref().ok_or(DbError::Closed)?;
        f(conn)
    }

    /// Run a blocking store operation off the async runtime
    pub async fn run_blocking<T, F>(self: &Arc<Self>, f: F) -> DbResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&LogStore) -> DbResult<T> + Send + 'static,
    {
        let store = Arc::clone(self);
        tokio::task::spawn_blocking(move || f(store.as_ref()))
            .await
            .map_err(|e| DbError::TaskFailed(e.to_string()))?
    }
}

fn open_reader(path: &Path) -> DbResult<Connection> {
    let reader = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX | OpenFlags::SQLITE_OPEN_URI,
    )?;
    schema::configure_reader(&reader)?;
    Ok(reader)
}

/// Recompute `ts_key` for every row in one transaction
fn rebuild_ts_keys(conn: &mut Connection) -> DbResult<usize> {
    let tx = conn.transaction()?;
    let mut updated = 0;
    {
        let mut select = tx.prepare("SELECT id, timestamp FROM logs")?;
        let rows = select
            .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut update = tx.prepare("UPDATE logs SET ts_key = ?1 WHERE id = ?2")?;
        for (id, timestamp) in rows {
            let ts_key = normalize_timestamp(&timestamp).unwrap_or_default();
            updated += update.execute(params![ts_key, id])?;
        }
    }
    tx.commit()
        .map_err(|e| DbError::Transaction(format!("commit failed: {}", e)))?;
    Ok(updated)
}

fn insert_record(conn: &Connection, record: &NewRecord) -> DbResult<usize> {
    let mut stmt = conn.prepare_cached(INSERT_SQL)?;
    let ts_key = normalize_timestamp(&record.timestamp).unwrap_or_default();

    let changed = stmt.execute(params![
        record.timestamp,
        ts_key,
        record.level,
        record.service,
        record.user_id,
        record.session_id,
        record.message,
        record.metadata.to_storage(),
        record.raw,
        record.page,
        record.source,
    ])?;

    Ok(changed)
}

/// Map a row selected with [`RECORD_COLUMNS`](schema::RECORD_COLUMNS)
pub(crate) fn record_from_row(row: &Row<'_>) -> rusqlite::Result<LogRecord> {
    let metadata: Option<String> = row.get(7)?;

    Ok(LogRecord {
        id: row.get(0)?,
        timestamp: row.get(1)?,
        level: row.get(2)?,
        service: row.get(3)?,
        user_id: row.get(4)?,
        session_id: row.get(5)?,
        message: row.get(6)?,
        metadata: Metadata::from_storage(metadata.as_deref()),
        raw: row.get(8)?,
        page: row.get(9)?,
        source: row.get(10)?,
        created_at: row.get(11)?,
    })
}
