//! Lazy record cursor for streaming reads
//!
//! A [`RecordCursor`] walks a query result in small keyset-paginated
//! batches. Between batches it holds no connection, so a slow consumer never
//! pins the reader, and memory stays bounded by the batch size regardless of
//! how many rows match.
//!
//! The cursor is finite and not restartable: once it yields `None` or an
//! error, every later call yields `None`.

use crate::db::query::{LogFilter, QueryPlan, SortPosition};
use crate::db::store::{record_from_row, LogStore};
use crate::error::DbResult;
use crate::record::LogRecord;
use rusqlite::params_from_iter;
use std::collections::VecDeque;
use std::sync::Arc;

/// Rows fetched per round trip
pub const DEFAULT_BATCH_SIZE: u64 = 256;

/// Incremental read handle over a filtered, ordered result set
pub struct RecordCursor {
    store: Arc<LogStore>,
    plan: QueryPlan,
    batch_size: u64,
    /// Rows still allowed by the plan's limit (`None` = unbounded)
    remaining: Option<u64>,
    /// Offset applies to the first batch only; later batches use the keyset
    pending_offset: u64,
    position: Option<SortPosition>,
    buffer: VecDeque<LogRecord>,
    done: bool,
    fetched: u64,
}

impl RecordCursor {
    pub fn new(store: Arc<LogStore>, filter: &LogFilter, batch_size: u64) -> Self {
        let plan = QueryPlan::for_export(filter);
        let remaining = plan.limit();
        let pending_offset = plan.offset();

        Self {
            store,
            plan,
            batch_size: batch_size.max(1),
            remaining,
            pending_offset,
            position: None,
            buffer: VecDeque::new(),
            done: false,
            fetched: 0,
        }
    }

    /// Total rows pulled from the store so far
    pub fn fetched(&self) -> u64 {
        self.fetched
    }

    /// Stop early; subsequent calls to `next` return `None`
    pub fn close(&mut self) {
        self.done = true;
        self.buffer.clear();
    }

    fn fetch_batch(&mut self) -> DbResult<()> {
        let want = match self.remaining {
            Some(0) => {
                self.done = true;
                return Ok(());
            }
            Some(n) => n.min(self.batch_size),
            None => self.batch_size,
        };

        let (sql, params) = self.plan.page_sql(self.position.as_ref(), want, self.pending_offset);

        let rows: Vec<(LogRecord, String)> = self.store.with_reader(|conn| {
            let mut stmt = conn.prepare_cached(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(params.iter()), |row| {
                    let record = record_from_row(row)?;
                    let ts_key: String = row.get(12)?;
                    Ok((record, ts_key))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        self.pending_offset = 0;
        let got = rows.len() as u64;
        if got < want {
            self.done = true;
        }
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining = remaining.saturating_sub(got);
        }
        self.fetched += got;

        if let Some((last, ts_key)) = rows.last() {
            self.position = Some(SortPosition {
                ts_key: ts_key.clone(),
                id: last.id,
            });
        }
        self.buffer.extend(rows.into_iter().map(|(record, _)| record));

        Ok(())
    }
}

impl Iterator for RecordCursor {
    type Item = DbResult<LogRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.buffer.is_empty() && !self.done {
            if let Err(e) = self.fetch_batch() {
                self.close();
                return Some(Err(e));
            }
        }

        self.buffer.pop_front().map(Ok)
    }
}
