use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use agentdash_core::error::{self, ApiError};

/// Internal error type that converts to structured API responses
#[derive(Debug)]
pub enum AppError {
    /// Validation error (400)
    Validation {
        message: String,
        field: Option<String>,
        received: Option<serde_json::Value>,
        docs_hint: Option<String>,
    },
    /// Missing or rejected credentials (401)
    Unauthorized {
        message: String,
        docs_hint: Option<String>,
    },
    /// Backend reported that the record does not exist (404)
    NotFound { message: String },
    /// Backend answered with an error envelope; status chosen per operation
    Upstream { status: StatusCode, message: String },
    /// Backend unreachable or its reply unusable (500)
    UpstreamUnavailable { message: String, detail: String },
    /// Internal error (500)
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = uuid::Uuid::now_v7().to_string();

        let (status, api_error) = match self {
            AppError::Validation {
                message,
                field,
                received,
                docs_hint,
            } => (
                StatusCode::BAD_REQUEST,
                ApiError {
                    error: error::codes::VALIDATION_FAILED.to_string(),
                    message,
                    field,
                    received,
                    request_id,
                    docs_hint,
                },
            ),
            AppError::Unauthorized { message, docs_hint } => (
                StatusCode::UNAUTHORIZED,
                ApiError {
                    error: error::codes::UNAUTHORIZED.to_string(),
                    message,
                    field: None,
                    received: None,
                    request_id,
                    docs_hint,
                },
            ),
            AppError::NotFound { message } => (
                StatusCode::NOT_FOUND,
                ApiError {
                    error: error::codes::NOT_FOUND.to_string(),
                    message,
                    field: None,
                    received: None,
                    request_id,
                    docs_hint: None,
                },
            ),
            AppError::Upstream { status, message } => {
                tracing::warn!(status = status.as_u16(), message = %message, "upstream rejected request");
                (
                    status,
                    ApiError {
                        error: error::codes::UPSTREAM_ERROR.to_string(),
                        message,
                        field: None,
                        received: None,
                        request_id,
                        docs_hint: None,
                    },
                )
            }
            AppError::UpstreamUnavailable { message, detail } => {
                tracing::error!(message = %message, detail = %detail, "upstream call failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: error::codes::UPSTREAM_ERROR.to_string(),
                        message,
                        field: None,
                        received: None,
                        request_id,
                        docs_hint: None,
                    },
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: error::codes::INTERNAL_ERROR.to_string(),
                        message: "An internal error occurred".to_string(),
                        field: None,
                        received: None,
                        request_id,
                        docs_hint: None,
                    },
                )
            }
        };

        (status, Json(api_error)).into_response()
    }
}

impl AppError {
    pub fn missing_authorization() -> Self {
        AppError::Unauthorized {
            message: "Unauthorized".to_string(),
            docs_hint: Some(
                "Send `Authorization: Basic <token>` obtained from POST /api/auth.".to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    use super::AppError;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn upstream_error_keeps_status_and_message() {
        let (status, body) = body_json(AppError::Upstream {
            status: StatusCode::NOT_FOUND,
            message: "Agent not found".to_string(),
        })
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "upstream_error");
        assert_eq!(body["message"], "Agent not found");
        assert!(body["request_id"].is_string());
    }

    #[tokio::test]
    async fn unavailable_hides_detail() {
        let (status, body) = body_json(AppError::UpstreamUnavailable {
            message: "Failed to fetch agents".to_string(),
            detail: "connection refused".to_string(),
        })
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Failed to fetch agents");
        assert!(!body.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn missing_authorization_is_401() {
        let (status, body) = body_json(AppError::missing_authorization()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "unauthorized");
        assert_eq!(body["message"], "Unauthorized");
    }
}
