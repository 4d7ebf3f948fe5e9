use std::sync::Arc;

use agentdash_core::catalog::MetricCatalog;

use crate::upstream::UpstreamClient;

#[derive(Clone)]
pub struct AppState {
    pub upstream: UpstreamClient,
    pub catalog: Arc<MetricCatalog>,
}

impl AppState {
    pub fn new(upstream: UpstreamClient, catalog: MetricCatalog) -> Self {
        Self {
            upstream,
            catalog: Arc::new(catalog),
        }
    }
}
