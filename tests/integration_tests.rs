//! Integration tests for log-forge
//!
//! Every test works against an on-disk SQLite store in a temporary
//! directory; the HTTP tests drive the router in-process.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use log_forge::db::{schema, LogFilter, LogStore};
use log_forge::error::DbError;
use log_forge::record::{normalize_payload, LogLevel, NewRecord, Payload};
use log_forge::server::{build_router, AppState};
use rusqlite::Connection;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;
use tower::ServiceExt;

fn open_store(dir: &Path) -> Arc<LogStore> {
    Arc::new(LogStore::open(&dir.join("logs.db")).unwrap())
}

fn record(raw: &str, ts: &str, level: LogLevel) -> NewRecord {
    let mut r = NewRecord::new(raw, ts);
    r.level = level.to_string();
    r
}

fn app(dir: &Path) -> (Router, Arc<LogStore>) {
    let store = open_store(dir);
    let state = Arc::new(AppState::new(Arc::clone(&store), dir));
    (build_router(state), store)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, body.to_vec())
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

// ─── Store properties ────────────────────────────────────────────

#[test]
fn test_database_schema_creation() {
    let conn = Connection::open_in_memory().unwrap();
    schema::create_database(&conn).unwrap();

    let tables: Vec<String> = conn
        .prepare("SELECT name FROM sqlite_master WHERE type='table'")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();

    assert!(tables.contains(&"logs".to_string()));
    assert!(tables.contains(&"store_info".to_string()));
    assert_eq!(
        schema::get_store_info(&conn, schema::keys::SCHEMA_VERSION).unwrap(),
        Some(schema::SCHEMA_VERSION.to_string())
    );
}

#[test]
fn test_same_raw_twice_inserts_once() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());

    let r = record("[t] INFO [svc] hello", "2024-01-01T00:00:00Z", LogLevel::Info);
    assert_eq!(store.insert(&r).unwrap(), 1);
    assert_eq!(store.insert(&r).unwrap(), 0);
    assert_eq!(store.count().unwrap(), 1);
}

#[test]
fn test_query_ordering_and_filters() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());

    let mut batch = vec![
        record("a", "2024-01-01T10:00:00Z", LogLevel::Info),
        record("b", "2024-01-01T12:00:00+02:00", LogLevel::Error), // 10:00Z, same instant as "a"
        record("c", "2024-01-02T00:00:00Z", LogLevel::Warning),
        record("d", "2023-12-31T23:59:59.999Z", LogLevel::Error),
        record("e", "2024-01-01T11:00:00Z", LogLevel::Debug),
    ];
    batch[2].page = Some("/checkout".into());
    batch[3].message = Some("Payment 100% failed".into());
    batch[4].service = Some("pricing-engine".into());
    assert_eq!(store.insert_batch(&batch).unwrap(), 5);

    let all = store.query(&LogFilter::default()).unwrap();
    let raws: Vec<&str> = all.iter().map(|r| r.raw.as_deref().unwrap()).collect();
    // same instant: higher id first
    assert_eq!(raws, vec!["c", "e", "b", "a", "d"]);

    let errors = store
        .query(&LogFilter {
            level: Some("error".into()),
            ..Default::default()
        })
        .unwrap();
    assert!(errors.iter().all(|r| r.level == "ERROR"));
    assert_eq!(errors.len(), 2);

    let page = store
        .query(&LogFilter {
            page: Some("/checkout".into()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].raw.as_deref(), Some("c"));

    let search = store
        .query(&LogFilter {
            search: Some("PRICING".into()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(search.len(), 1);
    assert_eq!(search[0].raw.as_deref(), Some("e"));

    // `%` is literal, not a wildcard
    let percent = store
        .query(&LogFilter {
            search: Some("100%".into()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(percent.len(), 1);

    let paged = store
        .query(&LogFilter {
            limit: Some(2),
            offset: Some(1),
            ..Default::default()
        })
        .unwrap();
    let raws: Vec<&str> = paged.iter().map(|r| r.raw.as_deref().unwrap()).collect();
    assert_eq!(raws, vec!["e", "b"]);

    let none = store.query(&LogFilter::default().with_limit(0)).unwrap();
    assert!(none.is_empty());
}

#[test]
fn test_since_is_strict() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());

    store
        .insert_batch(&[
            record("t1", "2024-05-01T00:00:00Z", LogLevel::Info),
            record("t2", "2024-05-02T00:00:00Z", LogLevel::Info),
            record("t3", "2024-05-03T00:00:00Z", LogLevel::Info),
        ])
        .unwrap();

    let rows = store
        .query(&LogFilter {
            since: Some("2024-05-02T00:00:00Z".into()),
            ..Default::default()
        })
        .unwrap();
    let raws: Vec<&str> = rows.iter().map(|r| r.raw.as_deref().unwrap()).collect();
    assert_eq!(raws, vec!["t3"]);

    // equivalent instant in another offset
    let rows = store
        .query(&LogFilter {
            since: Some("2024-05-02T02:00:00+02:00".into()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[test]
fn test_sub_microsecond_timestamps() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());

    store
        .insert_batch(&[
            record("later", "2024-01-01T00:00:00.0000009Z", LogLevel::Info),
            record("earlier", "2024-01-01T00:00:00.0000001Z", LogLevel::Info),
        ])
        .unwrap();

    let rows = store
        .query(&LogFilter {
            since: Some("2024-01-01T00:00:00Z".into()),
            ..Default::default()
        })
        .unwrap();
    let raws: Vec<&str> = rows.iter().map(|r| r.raw.as_deref().unwrap()).collect();
    // ordered by time, not by id
    assert_eq!(raws, vec!["later", "earlier"]);

    let rows = store
        .query(&LogFilter {
            since: Some("2024-01-01T00:00:00.0000005Z".into()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].raw.as_deref(), Some("later"));
}

#[test]
fn test_reopen_rebuilds_old_ordering_keys() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("logs.db");

    {
        let store = LogStore::open(&path).unwrap();
        store.insert(&record("old", "2024-01-01T00:00:00.5Z", LogLevel::Info)).unwrap();
        store.close().unwrap();
    }

    // rewind to the microsecond layout of schema version 1
    {
        let conn = Connection::open(&path).unwrap();
        conn.execute("UPDATE logs SET ts_key = '2024-01-01T00:00:00.500000Z'", []).unwrap();
        schema::set_store_info(&conn, schema::keys::SCHEMA_VERSION, "1").unwrap();
    }

    let store = LogStore::open(&path).unwrap();
    store.close().unwrap();

    let conn = Connection::open(&path).unwrap();
    let ts_key: String = conn
        .query_row("SELECT ts_key FROM logs WHERE raw = 'old'", [], |row| row.get(0))
        .unwrap();
    assert_eq!(ts_key, "2024-01-01T00:00:00.500000000Z");
    assert_eq!(
        schema::get_store_info(&conn, schema::keys::SCHEMA_VERSION).unwrap(),
        Some(schema::SCHEMA_VERSION.to_string())
    );
}

#[test]
fn test_open_read_only_writes_nothing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("logs.db");

    {
        let store = LogStore::open(&path).unwrap();
        store.insert(&record("kept", "2024-01-01T00:00:00Z", LogLevel::Info)).unwrap();
        store.close().unwrap();
    }

    let opened_at = |path: &Path| {
        let conn = Connection::open(path).unwrap();
        schema::get_store_info(&conn, schema::keys::OPENED_AT).unwrap()
    };
    let before = opened_at(&path);

    let store = LogStore::open_read_only(&path).unwrap();
    assert_eq!(store.count().unwrap(), 1);
    assert_eq!(store.query(&LogFilter::default()).unwrap()[0].raw.as_deref(), Some("kept"));
    assert!(matches!(
        store.insert(&record("new", "2024-01-02T00:00:00Z", LogLevel::Info)),
        Err(DbError::ReadOnly)
    ));
    store.close().unwrap();

    assert_eq!(opened_at(&path), before);

    assert!(matches!(
        LogStore::open_read_only(&dir.path().join("missing.db")),
        Err(DbError::Missing(_))
    ));
    assert!(!dir.path().join("missing.db").exists());
}

#[test]
fn test_search_folds_non_ascii_case() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());

    let mut r = record("u1", "2024-01-01T00:00:00Z", LogLevel::Error);
    r.message = Some("ÉRROR in Zürich".into());
    store.insert(&r).unwrap();
    store.insert(&record("u2", "2024-01-02T00:00:00Z", LogLevel::Info)).unwrap();

    for needle in ["érror", "ZÜRICH", "error"] {
        let rows = store
            .query(&LogFilter {
                search: Some(needle.into()),
                ..Default::default()
            })
            .unwrap();
        let expected = if needle == "error" { 0 } else { 1 };
        assert_eq!(rows.len(), expected, "search {:?}", needle);
    }
}

#[test]
fn test_metadata_round_trip() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());

    let Payload::Single(r) =
        normalize_payload(&json!({"raw": "m1", "metadata": {"a": 1, "b": [true, null]}})).unwrap()
    else {
        panic!("expected a single record");
    };
    store.insert(&r).unwrap();

    let rows = store.query(&LogFilter::default()).unwrap();
    assert_eq!(
        serde_json::to_value(&rows[0].metadata).unwrap(),
        json!({"a": 1, "b": [true, null]})
    );
}

#[test]
fn test_batch_with_invalid_element() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());

    let Payload::Batch { records, rejected } =
        normalize_payload(&json!([{"message": "a", "raw": "r1"}, {"message": "b"}])).unwrap()
    else {
        panic!("expected a batch");
    };
    assert_eq!(rejected, 1);
    assert_eq!(store.insert_batch(&records).unwrap(), 1);
    assert_eq!(store.count().unwrap(), 1);
}

#[test]
fn test_concurrent_identical_raw() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());
    let r = record("contended", "2024-01-01T00:00:00Z", LogLevel::Info);

    let handles: Vec<_> = (0..2)
        .map(|_| {
            let store = Arc::clone(&store);
            let r = r.clone();
            std::thread::spawn(move || store.insert(&r).unwrap())
        })
        .collect();
    let mut results: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    results.sort();

    assert_eq!(results, vec![0, 1]);
    assert_eq!(store.count().unwrap(), 1);
}

#[test]
fn test_cursor_streams_everything() {
    let dir = tempdir().unwrap();
    let store = open_store(dir.path());

    let records: Vec<NewRecord> = (0..1000)
        .map(|i| record(&format!("bulk-{}", i), &format!("2024-02-01T00:{:02}:{:02}Z", (i / 60) % 60, i % 60), LogLevel::Info))
        .collect();
    assert_eq!(store.insert_batch(&records).unwrap(), 1000);

    let mut cursor = store.cursor(&LogFilter::default());
    let mut count = 0;
    let mut last_id = i64::MAX;
    let mut last_ts = String::from("9999");
    for row in cursor.by_ref() {
        let row = row.unwrap();
        assert!(row.timestamp < last_ts || (row.timestamp == last_ts && row.id < last_id));
        last_ts = row.timestamp;
        last_id = row.id;
        count += 1;
    }
    assert_eq!(count, 1000);
    assert_eq!(cursor.fetched(), 1000);
}

// ─── HTTP surface ────────────────────────────────────────────────

#[tokio::test]
async fn test_health() {
    let dir = tempdir().unwrap();
    let (app, _) = app(dir.path());

    let (status, _, body) = send(&app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_ingest_endpoint() {
    let dir = tempdir().unwrap();
    let (app, store) = app(dir.path());

    let (status, _, body) = send(&app, post_json("/logs", r#"{"raw":"x1","message":"hi"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!({"inserted": 1}));

    let (_, _, body) = send(&app, post_json("/logs", r#"{"raw":"x1","message":"hi"}"#)).await;
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!({"inserted": 0}));

    let (_, _, body) = send(
        &app,
        post_json("/logs", r#"[{"message":"a","raw":"r1"},{"message":"b"}]"#),
    )
    .await;
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!({"inserted": 1}));

    let (_, _, body) = send(&app, post_json("/logs", "[]")).await;
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!({"inserted": 0}));

    assert_eq!(store.count().unwrap(), 2);
}

#[tokio::test]
async fn test_ingest_rejections() {
    let dir = tempdir().unwrap();
    let (app, _) = app(dir.path());

    for body in ["", "null", "\"text\"", "{bad json", r#"{"message":"no raw"}"#] {
        let (status, _, bytes) = send(&app, post_json("/logs", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "body {:?}", body);
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(json["error"].is_string());
    }
}

#[tokio::test]
async fn test_unknown_levels_stored_upper_cased() {
    let dir = tempdir().unwrap();
    let (app, _) = app(dir.path());

    let (status, _, body) = send(&app, post_json("/logs", r#"{"raw":"f1","level":"fatal"}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!({"inserted": 1}));

    let (_, _, body) = send(
        &app,
        post_json("/logs", r#"[{"raw":"c1","level":"critical"},{"raw":"t1","level":"trace"}]"#),
    )
    .await;
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!({"inserted": 2}));

    let (_, _, body) = send(&app, get("/logs?level=fatal")).await;
    let rows: Vec<Value> = serde_json::from_slice(&body).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["level"], "FATAL");
}

#[tokio::test]
async fn test_level_filter_accepts_warn_alias() {
    let dir = tempdir().unwrap();
    let (app, _) = app(dir.path());

    send(&app, post_json("/logs", r#"{"raw":"w1","level":"warn"}"#)).await;

    for query in ["/logs?level=warn", "/logs?level=WARNING"] {
        let (status, _, body) = send(&app, get(query)).await;
        assert_eq!(status, StatusCode::OK);
        let rows: Vec<Value> = serde_json::from_slice(&body).unwrap();
        assert_eq!(rows.len(), 1, "query {}", query);
        assert_eq!(rows[0]["level"], "WARNING");
    }
}

#[tokio::test]
async fn test_bad_query_strings_are_json_400() {
    let dir = tempdir().unwrap();
    let (app, _) = app(dir.path());

    for uri in [
        "/logs?limit=abc",
        "/logs?offset=-3",
        "/logs/export?format=csv&format=ndjson",
        "/logs/generate?count=1&count=2",
        "/logs/download?count=1&count=2",
    ] {
        let (status, headers, body) = send(&app, get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "uri {}", uri);
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert!(json["error"].is_string(), "uri {}", uri);
    }

    // blank values impose no constraint
    let (status, _, body) = send(&app, get("/logs?limit=&offset=&level=")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), json!([]));
}

#[tokio::test]
async fn test_storage_failure_is_json_500() {
    let dir = tempdir().unwrap();
    let (app, store) = app(dir.path());
    store.close().unwrap();

    let (status, _, body) = send(&app, get("/logs")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert!(json["error"].as_str().unwrap().contains("closed"));

    let (status, _, body) = send(&app, post_json("/logs", r#"{"raw":"late"}"#)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert!(json["error"].is_string());
}

#[tokio::test]
async fn test_list_endpoint() {
    let dir = tempdir().unwrap();
    let (app, store) = app(dir.path());
    store
        .insert_batch(&[
            record("l1", "2024-01-01T00:00:00Z", LogLevel::Info),
            record("l2", "2024-01-02T00:00:00Z", LogLevel::Error),
        ])
        .unwrap();

    let (status, _, body) = send(&app, get("/logs?level=ERROR")).await;
    assert_eq!(status, StatusCode::OK);
    let rows: Vec<Value> = serde_json::from_slice(&body).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["raw"], "l2");
    assert_eq!(rows[0]["metadata"], json!({}));
    assert!(rows[0]["createdAt"].is_string());
}

#[tokio::test]
async fn test_export_csv() {
    let dir = tempdir().unwrap();
    let (app, store) = app(dir.path());

    let mut r = record("q1", "2024-01-01T00:00:00Z", LogLevel::Info);
    r.message = Some(r#"He said "hi""#.into());
    store.insert(&r).unwrap();

    let (status, headers, body) = send(&app, get("/logs/export?format=CSV")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "text/csv; charset=utf-8");
    let disposition = headers[header::CONTENT_DISPOSITION].to_str().unwrap();
    assert!(disposition.starts_with("attachment; filename=\"logs_"));
    assert!(disposition.ends_with(".csv\""));

    let text = String::from_utf8(body).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "id,timestamp,level,service,userId,sessionId,page,message");
    assert_eq!(lines[1], r#"1,2024-01-01T00:00:00Z,INFO,,,,,"He said ""hi""""#);
}

#[tokio::test]
async fn test_export_ndjson_with_filters() {
    let dir = tempdir().unwrap();
    let (app, store) = app(dir.path());
    store
        .insert_batch(&[
            record("n1", "2024-01-01T00:00:00Z", LogLevel::Info),
            record("n2", "2024-01-02T00:00:00Z", LogLevel::Info),
            record("n3", "2024-01-03T00:00:00Z", LogLevel::Error),
        ])
        .unwrap();

    let (status, headers, body) = send(&app, get("/logs/export?since=2024-01-01T00:00:00Z&level=info")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "application/x-ndjson; charset=utf-8");

    let text = String::from_utf8(body).unwrap();
    let rows: Vec<Value> = text.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["raw"], "n2");
}

#[tokio::test]
async fn test_export_unknown_format() {
    let dir = tempdir().unwrap();
    let (app, _) = app(dir.path());

    let (status, _, _) = send(&app, get("/logs/export?format=xml")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_generate_and_append() {
    let dir = tempdir().unwrap();
    let (app, store) = app(dir.path());

    let (status, _, body) = send(&app, get("/logs/generate?count=5")).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["logs"].as_array().unwrap().len(), 5);
    assert_eq!(json["stats"]["total"], 5);
    assert!(json.get("inserted").is_none());
    assert_eq!(store.count().unwrap(), 0);

    let (status, _, body) = send(&app, post_json("/logs/generate", r#"{"count":7,"append":true}"#)).await;
    assert_eq!(status, StatusCode::OK);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["logs"].as_array().unwrap().len(), 7);
    // identical lines in the same millisecond collapse on the dedup key
    let inserted = json["inserted"].as_u64().unwrap();
    assert!(inserted >= 1);

    let rows = store.query(&LogFilter::default()).unwrap();
    assert_eq!(rows.len() as u64, inserted);
    assert!(rows.iter().all(|r| r.source.as_deref() == Some("generator")));
}

#[tokio::test]
async fn test_download() {
    let dir = tempdir().unwrap();
    let (app, _) = app(dir.path());

    let (status, headers, body) = send(&app, get("/logs/download?count=3")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_TYPE], "text/plain; charset=utf-8");
    assert!(headers[header::CONTENT_DISPOSITION].to_str().unwrap().contains(".log"));
    assert_eq!(String::from_utf8(body).unwrap().lines().count(), 3);
}

#[tokio::test]
async fn test_agents_flow() {
    let dir = tempdir().unwrap();
    let (app, store) = app(dir.path());
    store
        .insert(&record("agent-input", "2024-01-01T00:00:00Z", LogLevel::Error))
        .unwrap();

    let (status, _, _) = send(&app, post_json("/agents", r#"{"name":"ana"}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _, body) = send(&app, post_json("/agents", r#"{"name":"ana","role":"triage"}"#)).await;
    assert_eq!(status, StatusCode::CREATED);
    let agent: Value = serde_json::from_slice(&body).unwrap();
    let id = agent["id"].as_str().unwrap().to_string();

    let (status, _, body) = send(&app, post_json(&format!("/agents/{}/run", id), "")).await;
    assert_eq!(status, StatusCode::OK);
    let thought: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(thought["agentId"], id.as_str());

    let (_, _, body) = send(&app, get(&format!("/agents/{}/memory", id))).await;
    let memory: Vec<Value> = serde_json::from_slice(&body).unwrap();
    assert_eq!(memory.len(), 1);

    let (_, _, body) = send(&app, get("/agents")).await;
    assert_eq!(serde_json::from_slice::<Vec<Value>>(&body).unwrap().len(), 1);
}

#[tokio::test]
async fn test_unknown_agent_is_404() {
    let dir = tempdir().unwrap();
    let (app, _) = app(dir.path());

    let (status, _, body) = send(&app, post_json("/agents/agent-0/run", "")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert!(json["error"].as_str().unwrap().contains("agent-0"));

    let (status, _, _) = send(&app, get("/agents/agent-0/memory")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
