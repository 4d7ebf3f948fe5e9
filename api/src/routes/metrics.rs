use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use agentdash_core::catalog::MetricCategory;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/metrics", get(get_catalog))
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CatalogResponse {
    pub categories: Vec<MetricCategory>,
    /// Every metric identifier, in catalog order. Also the default
    /// selection of a new agent.
    pub metric_keys: Vec<String>,
    pub total: usize,
}

/// Metric catalog
///
/// Static for the lifetime of the process. Clients may cache it.
#[utoipa::path(
    get,
    path = "/api/metrics",
    responses(
        (status = 200, description = "Metric categories and identifiers", body = CatalogResponse)
    ),
    tag = "metrics"
)]
pub async fn get_catalog(State(state): State<AppState>) -> Json<CatalogResponse> {
    let catalog = &state.catalog;
    Json(CatalogResponse {
        categories: catalog.categories().to_vec(),
        metric_keys: catalog.all_metric_keys(),
        total: catalog.metric_count(),
    })
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use crate::routes::test_support::{app, get, send};
    use crate::upstream::fake::FakeBackend;

    #[tokio::test]
    async fn catalog_is_served_without_backend() {
        let backend = FakeBackend::default();
        let (status, body) = send(app(&backend).await, get("/api/metrics", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 16);
        assert_eq!(body["metric_keys"][0], "resilience:error_fallbacks");
        assert_eq!(body["categories"][1]["key"], "hallucination_control");
        assert!(backend.calls().is_empty());
    }
}
