use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::CorsLayer;

const DEFAULT_ORIGINS: &str = "http://localhost:3000";

/// Build a CORS layer from the `AGENTDASH_CORS_ORIGINS` env var.
///
/// - Origins: comma-separated list (default: `http://localhost:3000`)
/// - Methods: GET, POST, PUT, DELETE, OPTIONS
/// - Headers: Authorization, Content-Type
/// - Max age: 3600s
pub fn build_cors_layer() -> CorsLayer {
    let origins_str =
        std::env::var("AGENTDASH_CORS_ORIGINS").unwrap_or_else(|_| DEFAULT_ORIGINS.to_string());
    layer_for(&parse_origins(&origins_str))
}

fn parse_origins(raw: &str) -> Vec<HeaderValue> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect()
}

fn layer_for(origins: &[HeaderValue]) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(origins.to_vec())
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            HeaderName::from_static("authorization"),
            HeaderName::from_static("content-type"),
        ])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    use super::{layer_for, parse_origins};

    #[test]
    fn parse_origins_trims_and_skips_blanks() {
        let origins = parse_origins(" https://dash.example.com , ,http://localhost:3000");
        assert_eq!(origins.len(), 2);
        assert_eq!(origins[0], "https://dash.example.com");
        assert_eq!(origins[1], "http://localhost:3000");
    }

    #[tokio::test]
    async fn preflight_allows_put_from_listed_origin() {
        let app = Router::new()
            .route("/api/agents/a1", get(|| async { StatusCode::OK }))
            .layer(layer_for(&parse_origins("https://dash.example.com")));

        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/agents/a1")
                    .header("origin", "https://dash.example.com")
                    .header("access-control-request-method", "PUT")
                    .body(Body::empty())
                    .expect("request should build"),
            )
            .await
            .expect("request should succeed");

        let headers = response.headers();
        assert_eq!(
            headers
                .get("access-control-allow-origin")
                .expect("allow-origin header should exist"),
            "https://dash.example.com"
        );
        let methods = headers
            .get("access-control-allow-methods")
            .expect("allow-methods header should exist")
            .to_str()
            .expect("ascii header");
        assert!(methods.contains("PUT"));
    }
}
