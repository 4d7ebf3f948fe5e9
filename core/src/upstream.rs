//! Wire shapes of the workflow-automation backend.
//!
//! The backend exposes one URL; the operation is chosen with the `action`
//! query parameter and every call is a JSON `POST`. Responses share one
//! envelope: `{"status": "success"|"error", "data": ..., "error": {"message": ...}}`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamAction {
    Auth,
    ListAgents,
    CreateAgent,
    GetAgent,
    UpdateAgent,
    DeleteAgent,
    GetStatus,
}

impl UpstreamAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "auth",
            Self::ListAgents => "list-agents",
            Self::CreateAgent => "create-agent",
            Self::GetAgent => "get-agent",
            Self::UpdateAgent => "update-agent",
            Self::DeleteAgent => "delete-agent",
            Self::GetStatus => "get-status",
        }
    }

    /// Path of the payload inside `data`, if the action returns a nested one.
    fn payload_key(self) -> Option<&'static str> {
        match self {
            Self::ListAgents => Some("agents"),
            Self::GetAgent => Some("agent"),
            Self::GetStatus => Some("compliance"),
            Self::Auth | Self::CreateAgent | Self::UpdateAgent | Self::DeleteAgent => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpstreamErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpstreamEnvelope {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub error: Option<UpstreamErrorBody>,
}

impl UpstreamEnvelope {
    pub fn is_error(&self) -> bool {
        self.status == "error"
    }

    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// Error message reported by the backend, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.error
            .as_ref()
            .and_then(|e| e.message.as_deref())
            .filter(|m| !m.is_empty())
    }

    /// Extract the action's payload from `data`.
    /// Returns `None` when a nested payload is missing.
    pub fn into_payload(self, action: UpstreamAction) -> Option<serde_json::Value> {
        match action.payload_key() {
            Some(key) => match self.data {
                serde_json::Value::Object(mut map) => map.remove(key),
                _ => None,
            },
            None => Some(self.data),
        }
    }
}
