use axum::Router;
use axum::http::StatusCode;
use agentdash_core::upstream::UpstreamAction;

use crate::error::AppError;
use crate::state::AppState;

pub mod agents;
pub mod auth;
pub mod compliance;
pub mod health;
pub mod metrics;

/// Every route except `/api/auth`, which gets its own rate limit in `main`.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(metrics::router())
        .merge(agents::router())
        .merge(compliance::router())
}

/// How one proxied operation reports failure to the client.
pub(crate) struct Operation {
    pub action: UpstreamAction,
    /// Message when the backend is unreachable or replies with garbage
    pub failure: &'static str,
    /// Status used when the backend answers with an error envelope
    pub rejected_status: StatusCode,
    /// Message when the error envelope carries none
    pub rejected_default: &'static str,
}

impl Operation {
    pub const fn new(
        action: UpstreamAction,
        failure: &'static str,
        rejected_status: StatusCode,
        rejected_default: &'static str,
    ) -> Self {
        Self {
            action,
            failure,
            rejected_status,
            rejected_default,
        }
    }

    fn unavailable(&self, detail: impl ToString) -> AppError {
        AppError::UpstreamUnavailable {
            message: self.failure.to_string(),
            detail: format!("{}: {}", self.action.as_str(), detail.to_string()),
        }
    }
}

/// Call the backend and unwrap the operation's payload.
pub(crate) async fn forward(
    state: &AppState,
    op: &Operation,
    authorization: Option<&str>,
    body: Option<&serde_json::Value>,
) -> Result<serde_json::Value, AppError> {
    let envelope = state
        .upstream
        .call(op.action, authorization, body)
        .await
        .map_err(|e| op.unavailable(e))?;

    if envelope.is_error() {
        let message = envelope
            .error_message()
            .unwrap_or(op.rejected_default)
            .to_string();
        return Err(match op.rejected_status {
            StatusCode::NOT_FOUND => AppError::NotFound { message },
            status => AppError::Upstream { status, message },
        });
    }

    envelope
        .into_payload(op.action)
        .ok_or_else(|| op.unavailable("response is missing its payload"))
}
