use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use agentdash_core::agents::AgentSelection;
use agentdash_core::compliance::{ComplianceStatus, StatusList};
use agentdash_core::error::ApiError;
use agentdash_core::report::{ComplianceReport, build_report};
use agentdash_core::upstream::UpstreamAction;

use crate::error::AppError;
use crate::extract::Authorization;
use crate::routes::{Operation, agents, forward};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/agents/{id}/status", get(get_status))
        .route("/api/agents/{id}/compliance", get(get_compliance))
}

const STATUS: Operation = Operation::new(
    UpstreamAction::GetStatus,
    "Failed to fetch compliance status",
    StatusCode::BAD_REQUEST,
    "Failed to fetch compliance status",
);

/// Resolved compliance overview for one agent.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ComplianceResponse {
    pub agent_id: String,
    pub name: String,
    pub report: ComplianceReport,
    pub generated_at: DateTime<Utc>,
}

/// Raw compliance status list for an agent
#[utoipa::path(
    get,
    path = "/api/agents/{id}/status",
    params(("id" = String, Path, description = "Agent id")),
    responses(
        (status = 200, description = "Status entries as reported by the backend", body = Vec<ComplianceStatus>),
        (status = 400, description = "Backend rejection", body = ApiError),
        (status = 401, description = "Missing Authorization header", body = ApiError),
        (status = 500, description = "Backend unreachable", body = ApiError)
    ),
    security(("basic_auth" = [])),
    tag = "compliance"
)]
pub async fn get_status(
    State(state): State<AppState>,
    Authorization(authorization): Authorization,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let body = json!({ "agent_id": id });
    let statuses = forward(&state, &STATUS, Some(&authorization), Some(&body)).await?;
    Ok(Json(statuses))
}

/// Resolved compliance overview for an agent
///
/// Fetches the agent and its status list together, then resolves every
/// catalog metric against that one pair of snapshots. Malformed fields and
/// status entries are ignored rather than failing the report.
#[utoipa::path(
    get,
    path = "/api/agents/{id}/compliance",
    params(("id" = String, Path, description = "Agent id")),
    responses(
        (status = 200, description = "Per-category resolved metric views", body = ComplianceResponse),
        (status = 400, description = "Backend rejection", body = ApiError),
        (status = 401, description = "Missing Authorization header", body = ApiError),
        (status = 404, description = "Agent not found", body = ApiError),
        (status = 500, description = "Backend unreachable", body = ApiError)
    ),
    security(("basic_auth" = [])),
    tag = "compliance"
)]
pub async fn get_compliance(
    State(state): State<AppState>,
    Authorization(authorization): Authorization,
    Path(id): Path<String>,
) -> Result<Json<ComplianceResponse>, AppError> {
    let body = json!({ "agent_id": id });
    let (agent, statuses) = tokio::join!(
        forward(&state, &agents::GET, Some(&authorization), Some(&body)),
        forward(&state, &STATUS, Some(&authorization), Some(&body)),
    );

    let agent = AgentSelection::from_value(&agent?);
    let statuses = StatusList::from_value(statuses?);
    if statuses.skipped > 0 {
        tracing::warn!(
            agent_id = %id,
            skipped = statuses.skipped,
            "ignoring malformed compliance status entries"
        );
    }

    let report = build_report(&state.catalog, &agent.metrics, &statuses.entries);
    if report.summary.critical_actions > 0 {
        tracing::warn!(
            agent_id = %id,
            critical_actions = report.summary.critical_actions,
            "agent has metrics requiring it to be stopped"
        );
    }

    Ok(Json(ComplianceResponse {
        agent_id: if agent.agent_id.is_empty() {
            id
        } else {
            agent.agent_id
        },
        name: agent.name,
        report,
        generated_at: Utc::now(),
    }))
}
