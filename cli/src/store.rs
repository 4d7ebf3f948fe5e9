use std::path::{Path, PathBuf};

use agentdash_core::agents::{Agent, CreateAgentInput, UpdateAgentInput, generate_agent_id};
use agentdash_core::compliance::{ComplianceStatus, StatusList};
use serde_json::json;

use crate::util::{Failure, config_dir, fetch_json, write_private};

/// Where agent records live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StoreKind {
    /// The dashboard API, which proxies the workflow backend
    Remote,
    /// A JSON file in the config directory
    Local,
}

#[derive(Debug, thiserror::Error)]
pub enum LocalStoreError {
    #[error("Agent not found: {0}")]
    NotFound(String),
    #[error("Agent already exists: {0}")]
    Duplicate(String),
    #[error("{0} must not be empty")]
    Invalid(&'static str),
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("corrupt agent file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl From<LocalStoreError> for Failure {
    fn from(err: LocalStoreError) -> Self {
        let (code, error) = match &err {
            LocalStoreError::NotFound(_) => (1, "not_found"),
            LocalStoreError::Duplicate(_) | LocalStoreError::Invalid(_) => {
                (1, "validation_failed")
            }
            LocalStoreError::Io { .. } | LocalStoreError::Corrupt { .. } => (2, "store_error"),
        };
        Failure {
            code,
            body: json!({"error": error, "message": err.to_string()}),
        }
    }
}

/// Agents kept in a single JSON array on disk.
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_path() -> PathBuf {
        config_dir().join("agents.json")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<Vec<Agent>, LocalStoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(LocalStoreError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        serde_json::from_str(&raw).map_err(|source| LocalStoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, agents: &[Agent]) -> Result<(), LocalStoreError> {
        let data = serde_json::to_vec_pretty(agents).map_err(|source| LocalStoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;
        write_private(&self.path, &data).map_err(|source| LocalStoreError::Io {
            path: self.path.clone(),
            source,
        })
    }

    pub fn list(&self) -> Result<Vec<Agent>, LocalStoreError> {
        self.load()
    }

    pub fn get(&self, agent_id: &str) -> Result<Agent, LocalStoreError> {
        self.load()?
            .into_iter()
            .find(|a| a.agent_id == agent_id)
            .ok_or_else(|| LocalStoreError::NotFound(agent_id.to_string()))
    }

    pub fn create(
        &self,
        agent_id: Option<String>,
        input: CreateAgentInput,
    ) -> Result<Agent, LocalStoreError> {
        input.validate().map_err(LocalStoreError::Invalid)?;

        let mut agents = self.load()?;
        let agent_id = agent_id.unwrap_or_else(|| generate_agent_id(chrono::Utc::now()));
        if agents.iter().any(|a| a.agent_id == agent_id) {
            return Err(LocalStoreError::Duplicate(agent_id));
        }

        let agent = input.into_agent(agent_id);
        agents.push(agent.clone());
        self.save(&agents)?;
        Ok(agent)
    }

    pub fn update(&self, update: UpdateAgentInput) -> Result<Agent, LocalStoreError> {
        if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(LocalStoreError::Invalid("name"));
        }

        let mut agents = self.load()?;
        let agent = agents
            .iter_mut()
            .find(|a| a.agent_id == update.agent_id)
            .ok_or_else(|| LocalStoreError::NotFound(update.agent_id.clone()))?;
        update.apply_to(agent);
        let updated = agent.clone();
        self.save(&agents)?;
        Ok(updated)
    }

    pub fn delete(&self, agent_id: &str) -> Result<(), LocalStoreError> {
        let mut agents = self.load()?;
        let before = agents.len();
        agents.retain(|a| a.agent_id != agent_id);
        if agents.len() == before {
            return Err(LocalStoreError::NotFound(agent_id.to_string()));
        }
        self.save(&agents)
    }
}

/// The agent store a command runs against.
#[derive(Debug, Clone)]
pub enum AgentStore {
    Remote {
        api_url: String,
        authorization: Option<String>,
    },
    Local(LocalStore),
}

fn decode<T: serde::de::DeserializeOwned>(
    value: serde_json::Value,
    what: &str,
) -> Result<T, Failure> {
    serde_json::from_value(value).map_err(|e| Failure {
        code: 2,
        body: json!({
            "error": "decode_error",
            "message": format!("Unexpected {what} payload from API: {e}")
        }),
    })
}

impl AgentStore {
    fn remote_auth(authorization: &Option<String>) -> Result<&str, Failure> {
        authorization.as_deref().ok_or_else(|| Failure {
            code: 1,
            body: json!({
                "error": "cli_error",
                "message": "No credentials found.",
                "docs_hint": "Run `agentdash login` or set AGENTDASH_TOKEN."
            }),
        })
    }

    pub async fn list(&self) -> Result<Vec<Agent>, Failure> {
        match self {
            Self::Remote {
                api_url,
                authorization,
            } => {
                let value = fetch_json(
                    api_url,
                    reqwest::Method::GET,
                    &["api", "agents"],
                    authorization.as_deref(),
                    None,
                )
                .await?;
                if value.is_null() {
                    return Ok(Vec::new());
                }
                decode(value, "agent list")
            }
            Self::Local(store) => Ok(store.list()?),
        }
    }

    pub async fn get(&self, agent_id: &str) -> Result<Agent, Failure> {
        match self {
            Self::Remote {
                api_url,
                authorization,
            } => {
                let auth = Self::remote_auth(authorization)?;
                let value = fetch_json(
                    api_url,
                    reqwest::Method::GET,
                    &["api", "agents", agent_id],
                    Some(auth),
                    None,
                )
                .await?;
                decode(value, "agent")
            }
            Self::Local(store) => Ok(store.get(agent_id)?),
        }
    }

    /// Returns what the store reports back: the backend acknowledgement for
    /// the remote store, the stored record for the local one.
    pub async fn create(
        &self,
        agent_id: Option<String>,
        input: CreateAgentInput,
    ) -> Result<serde_json::Value, Failure> {
        match self {
            Self::Remote {
                api_url,
                authorization,
            } => {
                let mut body = serde_json::to_value(&input)
                    .map_err(|e| Failure::usage(format!("Failed to encode agent: {e}")))?;
                if let Some(id) = agent_id {
                    body["agent_id"] = json!(id);
                }
                fetch_json(
                    api_url,
                    reqwest::Method::POST,
                    &["api", "agents"],
                    authorization.as_deref(),
                    Some(&body),
                )
                .await
            }
            Self::Local(store) => Ok(json!(store.create(agent_id, input)?)),
        }
    }

    pub async fn update(&self, update: UpdateAgentInput) -> Result<serde_json::Value, Failure> {
        match self {
            Self::Remote {
                api_url,
                authorization,
            } => {
                let auth = Self::remote_auth(authorization)?;
                let body = serde_json::to_value(&update)
                    .map_err(|e| Failure::usage(format!("Failed to encode update: {e}")))?;
                fetch_json(
                    api_url,
                    reqwest::Method::PUT,
                    &["api", "agents", update.agent_id.as_str()],
                    Some(auth),
                    Some(&body),
                )
                .await
            }
            Self::Local(store) => Ok(json!(store.update(update)?)),
        }
    }

    pub async fn delete(&self, agent_id: &str) -> Result<serde_json::Value, Failure> {
        match self {
            Self::Remote {
                api_url,
                authorization,
            } => {
                let auth = Self::remote_auth(authorization)?;
                fetch_json(
                    api_url,
                    reqwest::Method::DELETE,
                    &["api", "agents", agent_id],
                    Some(auth),
                    None,
                )
                .await
            }
            Self::Local(store) => {
                store.delete(agent_id)?;
                Ok(json!({"success": true}))
            }
        }
    }

    /// Current compliance status list. The local store has no assessments.
    pub async fn statuses(&self, agent_id: &str) -> Result<Vec<ComplianceStatus>, Failure> {
        match self {
            Self::Remote {
                api_url,
                authorization,
            } => {
                let auth = Self::remote_auth(authorization)?;
                let value = fetch_json(
                    api_url,
                    reqwest::Method::GET,
                    &["api", "agents", agent_id, "status"],
                    Some(auth),
                    None,
                )
                .await?;
                let list = StatusList::from_value(value);
                if list.skipped > 0 {
                    tracing::warn!(
                        agent_id = %agent_id,
                        skipped = list.skipped,
                        "ignoring malformed compliance status entries"
                    );
                }
                Ok(list.entries)
            }
            Self::Local(_) => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use agentdash_core::agents::{CreateAgentInput, UpdateAgentInput};
    use agentdash_core::catalog::MetricCatalog;
    use agentdash_core::selection::Selection;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    use super::{AgentStore, LocalStore, LocalStoreError};

    /// Answers one request with `body` and hands back the request line.
    async fn serve_once(body: serde_json::Value) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let api_url = format!("http://{}", listener.local_addr().expect("addr"));
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut buf = vec![0u8; 8192];
            let n = socket.read(&mut buf).await.expect("read");
            let request = String::from_utf8_lossy(&buf[..n]).to_string();
            let payload = body.to_string();
            let response = format!(
                "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{payload}",
                payload.len()
            );
            socket.write_all(response.as_bytes()).await.expect("write");
            request.lines().next().unwrap_or_default().to_string()
        });
        (api_url, handle)
    }

    fn remote(api_url: String) -> AgentStore {
        AgentStore::Remote {
            api_url,
            authorization: Some("Basic x".to_string()),
        }
    }

    fn store() -> (tempfile::TempDir, LocalStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = LocalStore::new(dir.path().join("agents.json"));
        (dir, store)
    }

    #[test]
    fn empty_store_lists_nothing() {
        let (_dir, store) = store();
        assert!(store.list().expect("list").is_empty());
    }

    #[test]
    fn create_persists_with_default_selection() {
        let (_dir, store) = store();
        let catalog = MetricCatalog::builtin();
        let created = store
            .create(
                Some("agent_1".to_string()),
                CreateAgentInput::new("Claims triage", catalog),
            )
            .expect("create");
        assert_eq!(created.metrics, catalog.default_selection());

        let reopened = LocalStore::new(store.path());
        let fetched = reopened.get("agent_1").expect("get");
        assert_eq!(fetched, created);
    }

    #[test]
    fn create_generates_id_and_rejects_duplicates() {
        let (_dir, store) = store();
        let catalog = MetricCatalog::builtin();
        let created = store
            .create(None, CreateAgentInput::new("A", catalog))
            .expect("create");
        assert!(created.agent_id.starts_with("agent_"));

        let err = store
            .create(Some(created.agent_id.clone()), CreateAgentInput::new("B", catalog))
            .unwrap_err();
        assert!(matches!(err, LocalStoreError::Duplicate(_)));
    }

    #[test]
    fn create_rejects_blank_name() {
        let (_dir, store) = store();
        let err = store
            .create(None, CreateAgentInput::new(" ", MetricCatalog::builtin()))
            .unwrap_err();
        assert!(matches!(err, LocalStoreError::Invalid("name")));
    }

    #[test]
    fn update_applies_only_present_fields() {
        let (_dir, store) = store();
        store
            .create(
                Some("agent_1".to_string()),
                CreateAgentInput::new("Old", MetricCatalog::builtin()),
            )
            .expect("create");

        let updated = store
            .update(UpdateAgentInput {
                agent_id: "agent_1".to_string(),
                metrics: Some(Selection::from(vec!["resilience:latency".to_string()])),
                status: Some(false),
                ..Default::default()
            })
            .expect("update");
        assert_eq!(updated.name, "Old");
        assert!(!updated.status);
        assert_eq!(updated.metrics.len(), 1);
        assert_eq!(store.get("agent_1").expect("get"), updated);
    }

    #[test]
    fn update_and_delete_report_missing_agent() {
        let (_dir, store) = store();
        let err = store
            .update(UpdateAgentInput {
                agent_id: "ghost".to_string(),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, LocalStoreError::NotFound(_)));
        assert!(matches!(
            store.delete("ghost").unwrap_err(),
            LocalStoreError::NotFound(_)
        ));
    }

    #[test]
    fn delete_removes_only_target() {
        let (_dir, store) = store();
        let catalog = MetricCatalog::builtin();
        for id in ["a", "b"] {
            store
                .create(Some(id.to_string()), CreateAgentInput::new(id, catalog))
                .expect("create");
        }
        store.delete("a").expect("delete");
        let ids: Vec<_> = store
            .list()
            .expect("list")
            .into_iter()
            .map(|a| a.agent_id)
            .collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[test]
    fn corrupt_file_is_reported() {
        let (_dir, store) = store();
        std::fs::write(store.path(), "{not json").expect("write");
        assert!(matches!(
            store.list().unwrap_err(),
            LocalStoreError::Corrupt { .. }
        ));
    }

    #[tokio::test]
    async fn local_store_has_no_assessments() {
        let (_dir, local) = store();
        let store = AgentStore::Local(local);
        assert!(store.statuses("agent_1").await.expect("statuses").is_empty());
        let failure = store.get("agent_1").await.unwrap_err();
        assert_eq!(failure.code, 1);
        assert_eq!(failure.body["error"], "not_found");
    }

    #[tokio::test]
    async fn remote_statuses_skip_malformed_entries() {
        let (api_url, server) = serve_once(serde_json::json!([
            {"metric": "resilience:latency", "status": null},
            {"metric": "resilience:latency", "status": "FAIL", "action_required": "STOP"}
        ]))
        .await;

        let statuses = remote(api_url).statuses("agent_1").await.expect("statuses");
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].status, "FAIL");
        assert_eq!(
            server.await.expect("server"),
            "GET /api/agents/agent_1/status HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn remote_ids_are_sent_as_one_path_segment() {
        let (api_url, server) = serve_once(serde_json::json!([])).await;
        remote(api_url).statuses("x/status?y").await.expect("statuses");
        assert_eq!(
            server.await.expect("server"),
            "GET /api/agents/x%2Fstatus%3Fy/status HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn remote_agent_with_unknown_classification_still_loads() {
        let (api_url, _server) = serve_once(serde_json::json!({
            "agent_id": "agent_1",
            "name": "Claims triage",
            "impact_level": "critical",
            "metrics": null
        }))
        .await;

        let agent = remote(api_url).get("agent_1").await.expect("agent");
        assert_eq!(agent.impact_level, None);
        assert!(agent.metrics.is_empty());
    }
}
