//! File-backed agent scaffold
//!
//! Agents live in `agents.json` under the data directory. "Running" an agent
//! reads the most recent records through the store's ordered query,
//! summarizes them and appends the result to the agent's memory.

use crate::db::{LogFilter, LogStore};
use crate::error::{AgentError, AgentResult};
use crate::record::LogRecord;
use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File name inside the data directory
pub const AGENTS_FILE: &str = "agents.json";

/// Records reviewed per run
pub const RUN_WINDOW: u64 = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub memory: Vec<Thought>,
}

/// One run's output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thought {
    pub timestamp: String,
    pub agent_id: String,
    pub observation: String,
    pub suggestion: String,
}

/// Persistent set of agents
pub struct AgentRegistry {
    path: PathBuf,
    // serializes read-modify-write cycles on the file
    lock: Mutex<()>,
}

impl AgentRegistry {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(AGENTS_FILE),
            lock: Mutex::new(()),
        }
    }

    pub fn list(&self) -> AgentResult<Vec<Agent>> {
        let _guard = self.lock.lock();
        self.load()
    }

    /// Create an agent; `name` and `role` must be non-empty
    pub fn create(&self, name: &str, role: &str) -> AgentResult<Agent> {
        let (name, role) = (name.trim(), role.trim());
        if name.is_empty() || role.is_empty() {
            return Err(AgentError::InvalidRequest("name and role are required".into()));
        }

        let _guard = self.lock.lock();
        let mut agents = self.load()?;

        let mut millis = Utc::now().timestamp_millis();
        while agents.iter().any(|a| a.id == format!("agent-{}", millis)) {
            millis += 1;
        }

        let agent = Agent {
            id: format!("agent-{}", millis),
            name: name.to_string(),
            role: role.to_string(),
            memory: Vec::new(),
        };
        agents.push(agent.clone());
        self.save(&agents)?;

        info!(id = %agent.id, name = %agent.name, "agent created");
        Ok(agent)
    }

    /// Summarize recent records and append the thought to the agent's memory
    pub fn run(&self, id: &str, store: &LogStore) -> AgentResult<Thought> {
        // fail fast before touching the store
        if !self.list()?.iter().any(|a| a.id == id) {
            return Err(AgentError::NotFound(id.to_string()));
        }

        let records = store.query(&LogFilter::default().with_limit(RUN_WINDOW))?;
        let thought = summarize(id, &records);

        let _guard = self.lock.lock();
        let mut agents = self.load()?;
        let agent = agents
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| AgentError::NotFound(id.to_string()))?;
        agent.memory.push(thought.clone());
        self.save(&agents)?;

        debug!(id, reviewed = records.len(), "agent run recorded");
        Ok(thought)
    }

    pub fn memory(&self, id: &str) -> AgentResult<Vec<Thought>> {
        self.list()?
            .into_iter()
            .find(|a| a.id == id)
            .map(|a| a.memory)
            .ok_or_else(|| AgentError::NotFound(id.to_string()))
    }

    fn load(&self) -> AgentResult<Vec<Agent>> {
        match std::fs::read(&self.path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Ok(Vec::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(source) => Err(AgentError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn save(&self, agents: &[Agent]) -> AgentResult<()> {
        let io_err = |source: std::io::Error| AgentError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_vec_pretty(agents)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(io_err)?;
        std::fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}

/// Build a thought from a window of records
pub fn summarize(agent_id: &str, records: &[LogRecord]) -> Thought {
    let mut by_level: BTreeMap<&str, usize> = BTreeMap::new();
    let mut by_service: BTreeMap<&str, usize> = BTreeMap::new();
    let mut error_services: BTreeMap<&str, usize> = BTreeMap::new();

    for record in records {
        *by_level.entry(record.level.as_str()).or_default() += 1;
        let service = record.service.as_deref().unwrap_or("unknown");
        *by_service.entry(service).or_default() += 1;
        if record.level == "ERROR" {
            *error_services.entry(service).or_default() += 1;
        }
    }

    let levels = by_level
        .iter()
        .map(|(level, n)| format!("{}={}", level, n))
        .collect::<Vec<_>>()
        .join(", ");

    let mut services: Vec<(&str, usize)> = by_service.into_iter().collect();
    services.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    let busiest = services
        .iter()
        .take(3)
        .map(|(s, n)| format!("{} ({})", s, n))
        .collect::<Vec<_>>()
        .join(", ");

    let observation = if records.is_empty() {
        "No logs to review yet".to_string()
    } else {
        format!("Reviewed {} logs: {}; busiest services: {}", records.len(), levels, busiest)
    };

    let errors = by_level.get("ERROR").copied().unwrap_or(0);
    let warnings = by_level.get("WARNING").copied().unwrap_or(0);
    let suggestion = if errors > 0 {
        let worst = error_services
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
            .map(|(s, _)| *s)
            .unwrap_or("unknown");
        format!("Investigate {} errors, starting with {}", errors, worst)
    } else if warnings > 0 {
        format!("No errors, but {} warnings are worth a look", warnings)
    } else {
        "Nothing needs attention".to_string()
    };

    Thought {
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        agent_id: agent_id.to_string(),
        observation,
        suggestion,
    }
}
