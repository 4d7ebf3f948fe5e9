use serde::Serialize;
use utoipa::ToSchema;

/// Structured error response returned by the proxy API.
/// Carries enough context for a client to show a plain message and,
/// where possible, point at the offending field.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    /// Machine-readable error code (e.g. "validation_failed", "not_found", "upstream_error")
    pub error: String,
    /// Human-readable description of what went wrong
    pub message: String,
    /// Which field caused the error (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// The value that was received (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<serde_json::Value>,
    /// Request ID for tracing and debugging
    pub request_id: String,
    /// Hint about what the correct usage looks like
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_hint: Option<String>,
}

/// Error codes used across the API
pub mod codes {
    pub const VALIDATION_FAILED: &str = "validation_failed";
    pub const NOT_FOUND: &str = "not_found";
    pub const UPSTREAM_ERROR: &str = "upstream_error";
    pub const INTERNAL_ERROR: &str = "internal_error";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const RATE_LIMITED: &str = "rate_limited";
}

/// Problems found while loading or validating a metric catalog.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("category key must not be empty")]
    EmptyCategoryKey,
    #[error("metric key must not be empty (category `{category}`)")]
    EmptyMetricKey { category: String },
    #[error("duplicate category key `{0}`")]
    DuplicateCategory(String),
    #[error("duplicate metric key `{metric}` in category `{category}`")]
    DuplicateMetric { category: String, metric: String },
    #[error("key `{0}` must not contain ':'")]
    SeparatorInKey(String),
    #[error("invalid catalog JSON: {0}")]
    Json(String),
}
