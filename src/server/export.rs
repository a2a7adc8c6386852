//! Streaming export as NDJSON or CSV
//!
//! A blocking producer walks a [`RecordCursor`](crate::db::RecordCursor),
//! renders rows into chunks and pushes them through a bounded channel that
//! feeds the response body. When the channel is full the producer waits;
//! when the client disconnects the send fails and the producer stops.
//!
//! A storage error after the first chunk cannot change the status code any
//! more, so it is logged and the body simply ends early.

use crate::db::{LogFilter, LogStore};
use crate::error::ServerError;
use crate::record::LogRecord;
use axum::body::{Body, Bytes};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use std::convert::Infallible;
use std::fmt::Write as _;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// CSV header row
pub const CSV_HEADER: &str = "id,timestamp,level,service,userId,sessionId,page,message\n";

/// Chunks buffered between producer and body
const CHANNEL_CAPACITY: usize = 16;

/// Flush threshold for a rendered chunk
const CHUNK_BYTES: usize = 16 * 1024;

/// Export output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Ndjson,
    Csv,
}

impl ExportFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Ndjson => "application/x-ndjson; charset=utf-8",
            ExportFormat::Csv => "text/csv; charset=utf-8",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Ndjson => "ndjson",
            ExportFormat::Csv => "csv",
        }
    }

    /// Append one rendered record to `out`
    fn render_into(&self, record: &LogRecord, out: &mut String) -> serde_json::Result<()> {
        match self {
            ExportFormat::Ndjson => out.push_str(&render_ndjson_line(record)?),
            ExportFormat::Csv => out.push_str(&render_csv_row(record)),
        }
        Ok(())
    }
}

impl FromStr for ExportFormat {
    type Err = ServerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "ndjson" => Ok(ExportFormat::Ndjson),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(ServerError::InvalidPayload(format!(
                "unsupported export format '{}': expected ndjson or csv",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// One compact JSON object followed by `\n`
pub fn render_ndjson_line(record: &LogRecord) -> serde_json::Result<String> {
    let mut line = serde_json::to_string(record)?;
    line.push('\n');
    Ok(line)
}

/// One CSV row followed by `\n`; only `message` is quoted
pub fn render_csv_row(record: &LogRecord) -> String {
    let opt = |v: &Option<String>| v.clone().unwrap_or_default();

    let mut row = String::new();
    let _ = write!(
        row,
        "{},{},{},{},{},{},{},",
        record.id,
        record.timestamp,
        record.level,
        opt(&record.service),
        opt(&record.user_id),
        opt(&record.session_id),
        opt(&record.page),
    );
    if let Some(message) = &record.message {
        row.push_str(&csv_quote(message));
    }
    row.push('\n');
    row
}

/// Wrap in double quotes, doubling embedded quotes
pub fn csv_quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// `logs_<unix-millis>.<ext>`
pub fn export_filename(format: ExportFormat) -> String {
    format!("logs_{}.{}", chrono::Utc::now().timestamp_millis(), format.extension())
}

/// Build the streamed response with download headers
pub fn export_response(store: Arc<LogStore>, filter: LogFilter, format: ExportFormat) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", export_filename(format));
    let body = stream_export(store, filter, format);

    (
        [
            (CONTENT_TYPE, format.content_type().to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}

/// How a producer run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportOutcome {
    /// Every matching row was sent
    Complete { rows: u64 },
    /// A storage error ended the body early
    Truncated { rows: u64 },
    /// The consumer went away and the cursor was abandoned
    Abandoned { rows: u64 },
}

/// Body fed by a blocking producer over a bounded channel
pub fn stream_export(store: Arc<LogStore>, filter: LogFilter, format: ExportFormat) -> Body {
    spawn_export(store, filter, format).0
}

/// Same as [`stream_export`], also handing back the producer task
pub fn spawn_export(
    store: Arc<LogStore>,
    filter: LogFilter,
    format: ExportFormat,
) -> (Body, JoinHandle<ExportOutcome>) {
    let (tx, rx) = mpsc::channel::<Bytes>(CHANNEL_CAPACITY);

    let producer = tokio::task::spawn_blocking(move || produce(store, filter, format, tx));

    let stream = futures_util::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|chunk| (Ok::<_, Infallible>(chunk), rx))
    });
    (Body::from_stream(stream), producer)
}

fn produce(
    store: Arc<LogStore>,
    filter: LogFilter,
    format: ExportFormat,
    tx: mpsc::Sender<Bytes>,
) -> ExportOutcome {
    let start = Instant::now();
    let mut cursor = store.cursor(&filter);
    let mut buf = String::with_capacity(CHUNK_BYTES * 2);
    let mut rows: u64 = 0;
    let mut truncated = false;

    if format == ExportFormat::Csv {
        buf.push_str(CSV_HEADER);
    }

    while let Some(item) = cursor.next() {
        match item {
            Ok(record) => {
                if let Err(e) = format.render_into(&record, &mut buf) {
                    warn!(id = record.id, error = %e, "skipping unrenderable record");
                    continue;
                }
                rows += 1;
            }
            Err(e) => {
                warn!(error = %e, rows, "export truncated by storage error");
                truncated = true;
                break;
            }
        }

        if buf.len() >= CHUNK_BYTES && tx.blocking_send(Bytes::from(std::mem::take(&mut buf))).is_err() {
            debug!(rows, fetched = cursor.fetched(), "export consumer went away");
            cursor.close();
            return ExportOutcome::Abandoned { rows };
        }
    }

    if !buf.is_empty() && tx.blocking_send(Bytes::from(buf)).is_err() {
        debug!(rows, "export consumer went away");
        return ExportOutcome::Abandoned { rows };
    }

    if truncated {
        return ExportOutcome::Truncated { rows };
    }

    info!(
        %format,
        rows,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "export finished"
    );
    ExportOutcome::Complete { rows }
}
