use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use agentdash_core::auth::basic_token;
use agentdash_core::error::ApiError;

use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;
use crate::upstream::AuthOutcome;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/auth", post(login))
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    pub success: bool,
}

/// Check credentials against the backend
///
/// On success the client keeps `base64(username:password)` and sends it as
/// `Authorization: Basic <token>` on subsequent calls.
#[utoipa::path(
    post,
    path = "/api/auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted", body = LoginResponse),
        (status = 400, description = "Username or password missing", body = ApiError),
        (status = 401, description = "Credentials rejected", body = ApiError),
        (status = 429, description = "Too many attempts"),
        (status = 500, description = "Backend unreachable", body = ApiError)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    if req.username.is_empty() || req.password.is_empty() {
        let field = if req.username.is_empty() {
            "username"
        } else {
            "password"
        };
        return Err(AppError::Validation {
            message: "Username and password are required".to_string(),
            field: Some(field.to_string()),
            received: None,
            docs_hint: None,
        });
    }

    let token = basic_token(&req.username, &req.password);
    let outcome = state
        .upstream
        .authenticate(&token)
        .await
        .map_err(|e| AppError::UpstreamUnavailable {
            message: "Authentication failed".to_string(),
            detail: e.to_string(),
        })?;

    match outcome {
        AuthOutcome::Accepted => {
            tracing::info!(username = %req.username, "login accepted");
            Ok(Json(LoginResponse { success: true }))
        }
        AuthOutcome::Rejected(reason) => {
            tracing::warn!(username = %req.username, "login rejected");
            Err(AppError::Unauthorized {
                message: reason.unwrap_or_else(|| "Authentication failed".to_string()),
                docs_hint: None,
            })
        }
    }
}
