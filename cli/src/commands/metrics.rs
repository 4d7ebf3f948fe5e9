use agentdash_core::catalog::{MetricCatalog, MetricCategory};
use serde::Deserialize;
use serde_json::json;

use crate::store::AgentStore;
use crate::util::{Failure, fetch_json, print_json};

#[derive(Deserialize)]
struct CatalogPayload {
    categories: Vec<MetricCategory>,
}

/// The catalog the store's agents are rendered against: the server's for
/// the remote store, the built-in one for the local store.
pub async fn catalog_for(store: &AgentStore) -> Result<MetricCatalog, Failure> {
    let AgentStore::Remote { api_url, .. } = store else {
        return Ok(MetricCatalog::builtin().clone());
    };

    let value = fetch_json(api_url, reqwest::Method::GET, &["api", "metrics"], None, None).await?;
    let payload: CatalogPayload = serde_json::from_value(value).map_err(|e| Failure {
        code: 2,
        body: json!({"error": "decode_error", "message": format!("Unexpected catalog payload: {e}")}),
    })?;
    MetricCatalog::new(payload.categories).map_err(|e| Failure {
        code: 2,
        body: json!({"error": "decode_error", "message": format!("Server catalog is invalid: {e}")}),
    })
}

pub async fn run(store: &AgentStore) -> i32 {
    match catalog_for(store).await {
        Ok(catalog) => {
            print_json(&json!({
                "categories": catalog.categories(),
                "metric_keys": catalog.all_metric_keys(),
                "total": catalog.metric_count(),
            }));
            0
        }
        Err(failure) => failure.report(),
    }
}
