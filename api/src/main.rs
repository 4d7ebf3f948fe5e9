use std::net::SocketAddr;

use axum::Router;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod error;
mod extract;
mod middleware;
mod routes;
mod state;
mod upstream;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Agent Dashboard API",
        version = "0.1.0",
        description = "Compliance dashboard for AI agents. Proxies agent records and compliance verdicts from the workflow backend and resolves them against the metric catalog."
    ),
    paths(
        routes::health::health_check,
        routes::auth::login,
        routes::metrics::get_catalog,
        routes::agents::list_agents,
        routes::agents::create_agent,
        routes::agents::get_agent,
        routes::agents::update_agent,
        routes::agents::delete_agent,
        routes::compliance::get_status,
        routes::compliance::get_compliance,
    ),
    components(schemas(
        HealthResponse,
        agentdash_core::error::ApiError,
        agentdash_core::catalog::MetricDefinition,
        agentdash_core::catalog::MetricCategory,
        agentdash_core::selection::Selection,
        agentdash_core::agents::Agent,
        agentdash_core::agents::Execution,
        agentdash_core::agents::ImpactLevel,
        agentdash_core::agents::RealTimeClass,
        agentdash_core::agents::ActionType,
        agentdash_core::agents::MetricsCount,
        agentdash_core::agents::CreateAgentInput,
        agentdash_core::agents::UpdateAgentInput,
        agentdash_core::compliance::ComplianceStatus,
        agentdash_core::compliance::ResolvedMetricView,
        agentdash_core::action::Severity,
        agentdash_core::action::ActionMessage,
        agentdash_core::report::MetricReport,
        agentdash_core::report::CategoryReport,
        agentdash_core::report::ComplianceReport,
        agentdash_core::report::ReportSummary,
        routes::auth::LoginRequest,
        routes::auth::LoginResponse,
        routes::metrics::CatalogResponse,
        routes::agents::CreateAgentRequest,
        routes::agents::DeletedResponse,
        routes::compliance::ComplianceResponse,
    )),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "basic_auth",
            utoipa::openapi::security::SecurityScheme::Http(
                utoipa::openapi::security::Http::new(
                    utoipa::openapi::security::HttpAuthScheme::Basic,
                ),
            ),
        );
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Number of metrics in the loaded catalog
    pub catalog_metrics: usize,
}

#[tokio::main]
async fn main() {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();

    // Structured JSON logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agentdash_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = match config::Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            std::process::exit(1);
        }
    };

    let catalog = match config.load_catalog() {
        Ok(catalog) => catalog,
        Err(e) => {
            tracing::error!(error = %e, "failed to load metric catalog");
            std::process::exit(1);
        }
    };
    tracing::info!(
        categories = catalog.categories().len(),
        metrics = catalog.metric_count(),
        custom = config.catalog_path.is_some(),
        "metric catalog loaded"
    );

    let upstream = match upstream::UpstreamClient::new(
        config.upstream_url.clone(),
        config.upstream_timeout,
    ) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "failed to build upstream client");
            std::process::exit(1);
        }
    };

    let app_state = state::AppState::new(upstream, catalog);

    // CORS
    let cors_layer = middleware::cors::build_cors_layer();

    // Login is the only route with its own rate limit
    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .merge(routes::router())
        .merge(routes::auth::router().layer(middleware::rate_limit::auth_layer()))
        .layer(axum::middleware::from_fn(middleware::security_headers::apply))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .option_layer(config.require_https.then(|| {
                    axum::middleware::from_fn(middleware::https::require_https)
                }))
                .layer(cors_layer),
        )
        .with_state(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(upstream = %config.upstream_url, "Agent dashboard API listening on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "failed to bind listener");
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        tracing::error!(error = %e, "server terminated");
        std::process::exit(1);
    }
}
