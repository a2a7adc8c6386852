//! Axum HTTP routes for the log service.

use crate::config::ServeConfig;
use crate::db::{LogFilter, LogStore};
use crate::error::{ServerError, ServerResult};
use crate::generator::{self, GenerateOptions, GenerationStats, LogGenerator};
use crate::record::{LogRecord, NewRecord};
use crate::report;
use crate::server::agents::{Agent, AgentRegistry, Thought};
use crate::server::export::{self, ExportFormat};
use crate::server::ingest;
use axum::body::Bytes;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

const ENDPOINTS: &[&str] = &[
    "GET  /health",
    "POST /logs",
    "GET  /logs",
    "GET  /logs/export",
    "GET  /logs/generate",
    "POST /logs/generate",
    "GET  /logs/download",
    "GET  /agents",
    "POST /agents",
    "POST /agents/:id/run",
    "GET  /agents/:id/memory",
];

/// Shared application state
pub struct AppState {
    pub store: Arc<LogStore>,
    pub agents: Arc<AgentRegistry>,
}

impl AppState {
    pub fn new(store: Arc<LogStore>, data_dir: &path::Path) -> Self {
        Self {
            store,
            agents: Arc::new(AgentRegistry::new(data_dir)),
        }
    }
}

// ─── Route builder ───────────────────────────────────────────────

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/logs", post(ingest_logs).get(list_logs))
        .route("/logs/export", get(export_logs))
        .route("/logs/generate", get(generate_get).post(generate_post))
        .route("/logs/download", get(download_logs))
        .route("/agents", get(list_agents).post(create_agent))
        .route("/agents/:id/run", post(run_agent))
        .route("/agents/:id/memory", get(agent_memory))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ─── Handlers ────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "log-forge",
        "endpoints": ENDPOINTS,
    }))
}

async fn ingest_logs(State(state): State<Arc<AppState>>, body: Bytes) -> ServerResult<Json<Value>> {
    let value = ingest::parse_body(&body)?;
    let outcome = ingest::ingest(&state.store, value).await?;
    Ok(Json(json!({ "inserted": outcome.inserted })))
}

async fn list_logs(
    State(state): State<Arc<AppState>>,
    query: Result<Query<LogFilter>, QueryRejection>,
) -> ServerResult<Json<Vec<LogRecord>>> {
    let Query(filter) = query?;
    let records = state.store.run_blocking(move |s| s.query(&filter)).await?;
    Ok(Json(records))
}

/// Query string for the export endpoint
#[derive(Debug, Default, Deserialize)]
struct ExportParams {
    format: Option<String>,
    since: Option<String>,
    level: Option<String>,
    page: Option<String>,
}

async fn export_logs(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ExportParams>, QueryRejection>,
) -> ServerResult<Response> {
    let Query(params) = query?;
    let format = match params.format.as_deref() {
        Some(f) => f.parse::<ExportFormat>()?,
        None => ExportFormat::default(),
    };

    let filter = LogFilter {
        level: params.level,
        page: params.page,
        since: params.since,
        ..Default::default()
    };

    info!(%format, ?filter, "export requested");
    Ok(export::export_response(Arc::clone(&state.store), filter, format))
}

/// Generator knobs, accepted from a query string or a JSON body
///
/// Values are kept loose so that `count=50` and `{"count": 50}` both work.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateParams {
    count: Option<Value>,
    service_type: Option<String>,
    log_level: Option<String>,
    bug_frequency: Option<Value>,
    append: Option<Value>,
}

impl GenerateParams {
    fn count(&self) -> usize {
        let count = self
            .count
            .as_ref()
            .and_then(loose_u64)
            .map(|n| n.min(usize::MAX as u64) as usize)
            .unwrap_or(generator::DEFAULT_COUNT);
        generator::clamp_count(count)
    }

    fn options(&self) -> GenerateOptions {
        let defaults = GenerateOptions::default();
        GenerateOptions {
            service_type: self.service_type.clone().unwrap_or(defaults.service_type),
            log_level: self.log_level.clone().unwrap_or(defaults.log_level),
            bug_frequency: self
                .bug_frequency
                .as_ref()
                .and_then(loose_u64)
                .map(|n| n.min(100) as u32)
                .unwrap_or(defaults.bug_frequency),
        }
    }

    fn append(&self) -> bool {
        match &self.append {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_u64() == Some(1),
            Some(Value::String(s)) => s == "true" || s == "1",
            _ => false,
        }
    }
}

fn loose_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

async fn generate_get(
    State(state): State<Arc<AppState>>,
    query: Result<Query<GenerateParams>, QueryRejection>,
) -> ServerResult<Json<Value>> {
    let Query(params) = query?;
    generate(&state, params).await
}

async fn generate_post(
    State(state): State<Arc<AppState>>,
    body: Option<Json<GenerateParams>>,
) -> ServerResult<Json<Value>> {
    let params = body.map(|Json(p)| p).unwrap_or_default();
    generate(&state, params).await
}

async fn generate(state: &Arc<AppState>, params: GenerateParams) -> ServerResult<Json<Value>> {
    let opts = params.options();
    let logs = LogGenerator::new().generate(params.count(), &opts);
    let stats = GenerationStats::from_logs(&logs);

    let mut response = json!({ "logs": logs, "stats": stats });

    if params.append() {
        let records: Vec<NewRecord> = logs.iter().map(|l| l.to_record()).collect();
        let outcome = ingest::ingest(&state.store, serde_json::to_value(records)?).await?;
        response["inserted"] = json!(outcome.inserted);
    }

    info!(total = stats.total, bugs = stats.bugs, append = params.append(), "logs generated");
    Ok(Json(response))
}

async fn download_logs(
    query: Result<Query<GenerateParams>, QueryRejection>,
) -> ServerResult<impl IntoResponse> {
    let Query(params) = query?;
    let logs = LogGenerator::new().generate(params.count(), &params.options());
    let mut body = logs.iter().map(|l| l.raw.as_str()).collect::<Vec<_>>().join("\n");
    body.push('\n');

    let disposition = format!(
        "attachment; filename=\"logs_{}.log\"",
        chrono::Utc::now().timestamp_millis()
    );

    Ok((
        [
            (CONTENT_TYPE, "text/plain; charset=utf-8".to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        body,
    ))
}

/// Run blocking agent-file work off the runtime
async fn blocking<T, F>(f: F) -> ServerResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> ServerResult<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServerError::Other(format!("task failed: {}", e)))?
}

async fn list_agents(State(state): State<Arc<AppState>>) -> ServerResult<Json<Vec<Agent>>> {
    let agents = Arc::clone(&state.agents);
    let list = blocking(move || Ok(agents.list()?)).await?;
    Ok(Json(list))
}

#[derive(Debug, Default, Deserialize)]
struct CreateAgentRequest {
    name: Option<String>,
    role: Option<String>,
}

async fn create_agent(
    State(state): State<Arc<AppState>>,
    body: Option<Json<CreateAgentRequest>>,
) -> ServerResult<(StatusCode, Json<Agent>)> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let name = req.name.unwrap_or_default();
    let role = req.role.unwrap_or_default();

    let agents = Arc::clone(&state.agents);
    let agent = blocking(move || Ok(agents.create(&name, &role)?)).await?;
    Ok((StatusCode::CREATED, Json(agent)))
}

async fn run_agent(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ServerResult<Json<Thought>> {
    let agents = Arc::clone(&state.agents);
    let store = Arc::clone(&state.store);
    let thought = blocking(move || Ok(agents.run(&id, &store)?)).await?;
    Ok(Json(thought))
}

async fn agent_memory(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ServerResult<Json<Vec<Thought>>> {
    let agents = Arc::clone(&state.agents);
    let memory = blocking(move || Ok(agents.memory(&id)?)).await?;
    Ok(Json(memory))
}

// ─── Server startup ──────────────────────────────────────────────

/// Open the store and serve until Ctrl-C
pub async fn serve(config: &ServeConfig) -> Result<(), ServerError> {
    let db_path = config.db_path.clone();
    let store = tokio::task::spawn_blocking(move || LogStore::open(&db_path))
        .await
        .map_err(|e| ServerError::Other(format!("task failed: {}", e)))??;
    let store = Arc::new(store);

    let records = store.run_blocking(|s| s.count()).await?;
    report::print_serve_header(config.addr, &config.db_path, &config.data_dir, records);

    let state = Arc::new(AppState::new(Arc::clone(&store), &config.data_dir));
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!(addr = %config.addr, "server listening");
    for endpoint in ENDPOINTS {
        info!("  {}", endpoint);
    }

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServerError::Io)?;

    store.run_blocking(|s| s.close()).await?;
    info!("server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    info!("shutting down gracefully");
}
