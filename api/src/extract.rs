//! Extractors that turn axum rejections and missing headers into `AppError`.
//!
//! `AppJson<T>` replaces `axum::Json<T>` in handler signatures so that a bad
//! agent payload yields a JSON `validation_failed` body instead of axum's
//! plain-text 422.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Request, rejection::JsonRejection},
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::error::AppError;

pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(map_json_rejection(rejection)),
        }
    }
}

pub fn map_json_rejection(rejection: JsonRejection) -> AppError {
    let body_text = rejection.body_text();
    let field = serde_field_hint(&body_text).unwrap_or_else(|| "body".to_string());

    AppError::Validation {
        message: format!("Invalid request body: {body_text}"),
        field: Some(field),
        received: None,
        docs_hint: Some("Compare the body with the schema served at /swagger-ui.".to_string()),
    }
}

/// Field named by serde's "missing field `x`" / "unknown field `x`" messages.
fn serde_field_hint(msg: &str) -> Option<String> {
    ["missing field `", "unknown field `"]
        .iter()
        .find_map(|pattern| {
            let after = &msg[msg.find(pattern)? + pattern.len()..];
            let end = after.find('`')?;
            Some(after[..end].to_string())
        })
}

/// The raw `Authorization` header, forwarded verbatim to the backend.
/// Rejects with 401 when absent or not valid UTF-8.
#[derive(Debug, Clone)]
pub struct Authorization(pub String);

/// Like [`Authorization`], but absent headers are allowed.
#[derive(Debug, Clone)]
pub struct MaybeAuthorization(pub Option<String>);

fn authorization_header(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .map(str::to_string)
}

impl<S> FromRequestParts<S> for Authorization
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        authorization_header(parts)
            .map(Authorization)
            .ok_or_else(AppError::missing_authorization)
    }
}

impl<S> FromRequestParts<S> for MaybeAuthorization
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthorization(authorization_header(parts)))
    }
}
