use axum::body::Body;
use axum::http::{HeaderValue, Response, StatusCode, header};
use axum::response::IntoResponse;
use tower_governor::{
    GovernorError, GovernorLayer, governor::GovernorConfigBuilder,
    key_extractor::SmartIpKeyExtractor,
};

use agentdash_core::error::{ApiError, codes};

type RateLimitLayer =
    GovernorLayer<SmartIpKeyExtractor, governor::middleware::NoOpMiddleware, Body>;

/// Rate limit for POST /api/auth: 10 attempts per minute per IP.
pub fn auth_layer() -> RateLimitLayer {
    GovernorLayer::new(
        GovernorConfigBuilder::default()
            .per_second(6)
            .burst_size(10)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .expect("invalid governor config for auth"),
    )
    .error_handler(json_error_handler)
}

/// Render governor failures in the `ApiError` shape, with `Retry-After`.
fn json_error_handler(err: GovernorError) -> Response<Body> {
    let (status, retry_after, message) = match err {
        GovernorError::TooManyRequests { wait_time, .. } => (
            StatusCode::TOO_MANY_REQUESTS,
            Some(wait_time),
            format!("Too many login attempts. Retry after {wait_time} seconds."),
        ),
        GovernorError::UnableToExtractKey => (
            StatusCode::INTERNAL_SERVER_ERROR,
            None,
            "Unable to determine client identity for rate limiting".to_string(),
        ),
        GovernorError::Other { code, msg, .. } => (code, None, msg.unwrap_or_default()),
    };

    tracing::warn!(status = status.as_u16(), "rate limit rejected request");

    let body = ApiError {
        error: codes::RATE_LIMITED.to_string(),
        message,
        field: None,
        received: None,
        request_id: uuid::Uuid::now_v7().to_string(),
        docs_hint: None,
    };
    let mut response = (status, axum::Json(body)).into_response();
    if let Some(secs) = retry_after {
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(secs));
    }
    response
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use tower_governor::GovernorError;

    use super::json_error_handler;

    #[tokio::test]
    async fn too_many_requests_renders_api_error() {
        let response = json_error_handler(GovernorError::TooManyRequests {
            wait_time: 7,
            headers: None,
        });
        assert_eq!(response.status(), 429);
        assert_eq!(
            response.headers().get("retry-after").expect("retry-after"),
            "7"
        );
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should read");
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json body");
        assert_eq!(body["error"], "rate_limited");
        assert!(body["request_id"].is_string());
    }
}
