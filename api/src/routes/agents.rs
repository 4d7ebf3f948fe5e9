use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;

use agentdash_core::agents::{CreateAgentInput, UpdateAgentInput, generate_agent_id};
use agentdash_core::error::ApiError;
use agentdash_core::upstream::UpstreamAction;

use crate::error::AppError;
use crate::extract::{AppJson, Authorization, MaybeAuthorization};
use crate::routes::{Operation, forward};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/agents", get(list_agents).post(create_agent))
        .route(
            "/api/agents/{id}",
            get(get_agent).put(update_agent).delete(delete_agent),
        )
}

const LIST: Operation = Operation::new(
    UpstreamAction::ListAgents,
    "Failed to fetch agents",
    StatusCode::BAD_REQUEST,
    "Failed to fetch agents",
);
const CREATE: Operation = Operation::new(
    UpstreamAction::CreateAgent,
    "Failed to create agent",
    StatusCode::BAD_REQUEST,
    "Failed to create agent",
);
pub(crate) const GET: Operation = Operation::new(
    UpstreamAction::GetAgent,
    "Failed to fetch agent",
    StatusCode::NOT_FOUND,
    "Agent not found",
);
const UPDATE: Operation = Operation::new(
    UpstreamAction::UpdateAgent,
    "Failed to update agent",
    StatusCode::BAD_REQUEST,
    "Failed to update agent",
);
const DELETE: Operation = Operation::new(
    UpstreamAction::DeleteAgent,
    "Failed to delete agent",
    StatusCode::BAD_REQUEST,
    "Failed to delete agent",
);

/// Body of POST /api/agents. `agent_id` is generated when omitted.
#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CreateAgentRequest {
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(flatten)]
    pub input: CreateAgentInput,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct DeletedResponse {
    pub success: bool,
}

/// List all agents
#[utoipa::path(
    get,
    path = "/api/agents",
    responses(
        (status = 200, description = "Agent records as stored by the backend", body = Vec<agentdash_core::agents::Agent>),
        (status = 400, description = "Backend rejected the request", body = ApiError),
        (status = 500, description = "Backend unreachable", body = ApiError)
    ),
    tag = "agents"
)]
pub async fn list_agents(
    State(state): State<AppState>,
    MaybeAuthorization(authorization): MaybeAuthorization,
) -> Result<Json<serde_json::Value>, AppError> {
    let agents = forward(&state, &LIST, authorization.as_deref(), None).await?;
    Ok(Json(agents))
}

/// Create an agent
///
/// Forwards the full record, including classification fields, to the
/// backend. Metric identifiers unknown to the catalog are kept as-is.
#[utoipa::path(
    post,
    path = "/api/agents",
    request_body = CreateAgentRequest,
    responses(
        (status = 200, description = "Backend acknowledgement"),
        (status = 400, description = "Invalid body or backend rejection", body = ApiError),
        (status = 500, description = "Backend unreachable", body = ApiError)
    ),
    tag = "agents"
)]
pub async fn create_agent(
    State(state): State<AppState>,
    MaybeAuthorization(authorization): MaybeAuthorization,
    AppJson(req): AppJson<CreateAgentRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    if let Err(field) = req.input.validate() {
        return Err(AppError::Validation {
            message: format!("{field} must not be empty"),
            field: Some(field.to_string()),
            received: None,
            docs_hint: None,
        });
    }

    let agent_id = req
        .agent_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| generate_agent_id(chrono::Utc::now()));

    let orphaned = req
        .input
        .metrics
        .iter()
        .filter(|id| !state.catalog.contains(id))
        .count();
    if orphaned > 0 {
        tracing::warn!(agent_id = %agent_id, orphaned, "agent selects metrics outside the catalog");
    }

    let agent = req.input.into_agent(agent_id);
    let body = serde_json::to_value(&agent)
        .map_err(|e| AppError::Internal(format!("Failed to serialize agent: {e}")))?;

    let created = forward(&state, &CREATE, authorization.as_deref(), Some(&body)).await?;
    tracing::info!(agent_id = %agent.agent_id, "agent created");
    Ok(Json(created))
}

/// Get a single agent
#[utoipa::path(
    get,
    path = "/api/agents/{id}",
    params(("id" = String, Path, description = "Agent id")),
    responses(
        (status = 200, description = "The agent record", body = agentdash_core::agents::Agent),
        (status = 401, description = "Missing Authorization header", body = ApiError),
        (status = 404, description = "Agent not found", body = ApiError),
        (status = 500, description = "Backend unreachable", body = ApiError)
    ),
    security(("basic_auth" = [])),
    tag = "agents"
)]
pub async fn get_agent(
    State(state): State<AppState>,
    Authorization(authorization): Authorization,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let body = json!({ "agent_id": id });
    let agent = forward(&state, &GET, Some(&authorization), Some(&body)).await?;
    Ok(Json(agent))
}

/// Update an agent
///
/// Only the fields present in the body are sent; the path id wins over any
/// `agent_id` in the body.
#[utoipa::path(
    put,
    path = "/api/agents/{id}",
    params(("id" = String, Path, description = "Agent id")),
    request_body = UpdateAgentInput,
    responses(
        (status = 200, description = "Backend acknowledgement"),
        (status = 400, description = "Invalid body or backend rejection", body = ApiError),
        (status = 401, description = "Missing Authorization header", body = ApiError),
        (status = 500, description = "Backend unreachable", body = ApiError)
    ),
    security(("basic_auth" = [])),
    tag = "agents"
)]
pub async fn update_agent(
    State(state): State<AppState>,
    Authorization(authorization): Authorization,
    Path(id): Path<String>,
    AppJson(mut update): AppJson<UpdateAgentInput>,
) -> Result<Json<serde_json::Value>, AppError> {
    if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
        return Err(AppError::Validation {
            message: "name must not be empty".to_string(),
            field: Some("name".to_string()),
            received: None,
            docs_hint: Some("Omit `name` to leave it unchanged.".to_string()),
        });
    }

    update.agent_id = id;
    let body = serde_json::to_value(&update)
        .map_err(|e| AppError::Internal(format!("Failed to serialize update: {e}")))?;

    let updated = forward(&state, &UPDATE, Some(&authorization), Some(&body)).await?;
    tracing::info!(agent_id = %update.agent_id, "agent updated");
    Ok(Json(updated))
}

/// Delete an agent
#[utoipa::path(
    delete,
    path = "/api/agents/{id}",
    params(("id" = String, Path, description = "Agent id")),
    responses(
        (status = 200, description = "Agent deleted", body = DeletedResponse),
        (status = 400, description = "Backend rejection", body = ApiError),
        (status = 401, description = "Missing Authorization header", body = ApiError),
        (status = 500, description = "Backend unreachable", body = ApiError)
    ),
    security(("basic_auth" = [])),
    tag = "agents"
)]
pub async fn delete_agent(
    State(state): State<AppState>,
    Authorization(authorization): Authorization,
    Path(id): Path<String>,
) -> Result<Json<DeletedResponse>, AppError> {
    let body = json!({ "agent_id": id });
    forward(&state, &DELETE, Some(&authorization), Some(&body)).await?;
    tracing::info!(agent_id = %id, "agent deleted");
    Ok(Json(DeletedResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::routes::test_support::{app, get, send, with_json};
    use crate::upstream::fake::{FakeBackend, Reply};

    #[tokio::test]
    async fn list_unwraps_agents_payload() {
        let backend = FakeBackend::default().reply(
            "list-agents",
            Reply::json(json!({"status": "success", "data": {"agents": [{"agent_id": "agent_1"}]}})),
        );
        let (status, body) = send(app(&backend).await, get("/api/agents", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([{"agent_id": "agent_1"}]));
        assert_eq!(backend.calls()[0].authorization, None);
    }

    #[tokio::test]
    async fn list_maps_error_envelope_to_400() {
        let backend = FakeBackend::default().reply(
            "list-agents",
            Reply::json(json!({"status": "error", "error": {"message": "workflow paused"}})),
        );
        let (status, body) = send(app(&backend).await, get("/api/agents", Some("Basic x"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "workflow paused");
    }

    #[tokio::test]
    async fn list_reports_garbage_as_500() {
        let backend = FakeBackend::default().reply(
            "list-agents",
            Reply::raw(StatusCode::OK, "not json"),
        );
        let (status, body) = send(app(&backend).await, get("/api/agents", None)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Failed to fetch agents");
    }

    #[tokio::test]
    async fn get_requires_authorization() {
        let backend = FakeBackend::default();
        let (status, body) = send(app(&backend).await, get("/api/agents/agent_1", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn get_maps_error_envelope_to_404_with_default_message() {
        let backend = FakeBackend::default()
            .reply("get-agent", Reply::json(json!({"status": "error"})));
        let (status, body) =
            send(app(&backend).await, get("/api/agents/agent_9", Some("Basic x"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Agent not found");

        let call = &backend.calls()[0];
        assert_eq!(call.action, "get-agent");
        assert_eq!(call.body, json!({"agent_id": "agent_9"}));
        assert_eq!(call.authorization.as_deref(), Some("Basic x"));
    }

    #[tokio::test]
    async fn create_generates_id_and_forwards_full_record() {
        let backend = FakeBackend::default().reply(
            "create-agent",
            Reply::json(json!({"status": "success", "data": {"created": true}})),
        );
        let (status, body) = send(
            app(&backend).await,
            with_json(
                "POST",
                "/api/agents",
                Some("Basic x"),
                json!({"name": "Claims triage", "metrics": ["resilience:latency"], "impact_level": "high"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"created": true}));

        let sent = &backend.calls()[0].body;
        assert!(sent["agent_id"].as_str().unwrap().starts_with("agent_"));
        assert_eq!(sent["name"], "Claims triage");
        assert_eq!(sent["status"], true);
        assert_eq!(sent["metrics"], json!(["resilience:latency"]));
        assert_eq!(sent["impact_level"], "high");
        assert_eq!(sent["real_time_class"], "Not Real Time");
    }

    #[tokio::test]
    async fn create_keeps_client_supplied_id() {
        let backend = FakeBackend::default().reply(
            "create-agent",
            Reply::json(json!({"status": "success", "data": {}})),
        );
        send(
            app(&backend).await,
            with_json(
                "POST",
                "/api/agents",
                None,
                json!({"agent_id": "agent_42", "name": "Bot"}),
            ),
        )
        .await;
        assert_eq!(backend.calls()[0].body["agent_id"], "agent_42");
    }

    #[tokio::test]
    async fn create_rejects_blank_name_without_calling_backend() {
        let backend = FakeBackend::default();
        let (status, body) = send(
            app(&backend).await,
            with_json("POST", "/api/agents", None, json!({"name": "  "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["field"], "name");
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn create_rejects_missing_name_as_validation_error() {
        let backend = FakeBackend::default();
        let (status, body) = send(
            app(&backend).await,
            with_json("POST", "/api/agents", None, json!({"description": "x"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_failed");
        assert_eq!(body["field"], "name");
    }

    #[tokio::test]
    async fn update_sends_only_present_fields_with_path_id() {
        let backend = FakeBackend::default().reply(
            "update-agent",
            Reply::json(json!({"status": "success", "data": {"updated": true}})),
        );
        let (status, _) = send(
            app(&backend).await,
            with_json(
                "PUT",
                "/api/agents/agent_7",
                Some("Basic x"),
                json!({"agent_id": "spoofed", "status": false, "metrics": []}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            backend.calls()[0].body,
            json!({"agent_id": "agent_7", "status": false, "metrics": []})
        );
    }

    #[tokio::test]
    async fn delete_returns_success_flag() {
        let backend = FakeBackend::default().reply(
            "delete-agent",
            Reply::json(json!({"status": "success", "data": null})),
        );
        let request = axum::http::Request::builder()
            .method("DELETE")
            .uri("/api/agents/agent_3")
            .header("authorization", "Basic x")
            .body(axum::body::Body::empty())
            .unwrap();
        let (status, body) = send(app(&backend).await, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true}));
        assert_eq!(backend.calls()[0].body, json!({"agent_id": "agent_3"}));
    }
}
