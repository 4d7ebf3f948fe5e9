use axum::extract::Request;
use axum::http::{HeaderValue, StatusCode, Uri};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

/// Redirect plain-HTTP requests to HTTPS using `X-Forwarded-Proto`.
///
/// Enabled by `AGENTDASH_REQUIRE_HTTPS` when the service sits behind a
/// TLS-terminating proxy. Requests without the header are treated as HTTPS.
/// All responses get an HSTS header.
pub async fn require_https(req: Request, next: Next) -> Response {
    if let Some(location) = redirect_target(&req) {
        let mut response =
            (StatusCode::MOVED_PERMANENTLY, [("location", location.to_string())]).into_response();
        add_hsts_header(&mut response);
        return response;
    }

    let mut response = next.run(req).await;
    add_hsts_header(&mut response);
    response
}

fn redirect_target(req: &Request) -> Option<Uri> {
    let proto = req
        .headers()
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("https");
    if proto != "http" {
        return None;
    }

    let host = req
        .headers()
        .get("host")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    format!("https://{host}{path_and_query}").parse().ok()
}

fn add_hsts_header(response: &mut Response) {
    response.headers_mut().insert(
        "strict-transport-security",
        HeaderValue::from_static("max-age=63072000; includeSubDomains"),
    );
}
