use axum::{
    Router,
    http::HeaderValue,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::RecordStore;
use crate::services::{EnrichmentService, SyncEngine};
use crate::state::SharedState;

mod error;
mod movies;
mod observability;
mod sync;
mod system;
mod types;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn new(shared: SharedState, prometheus_handle: Option<PrometheusHandle>) -> Arc<Self> {
        Arc::new(Self {
            shared: Arc::new(shared),
            start_time: std::time::Instant::now(),
            prometheus_handle,
        })
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.shared.store
    }

    #[must_use]
    pub fn engine(&self) -> &SyncEngine {
        &self.shared.engine
    }

    #[must_use]
    pub fn enrichment(&self) -> &EnrichmentService {
        &self.shared.enrichment
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = &state.config().server.cors_allowed_origins;

    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    let api_router = Router::new()
        .route("/health", get(system::health))
        .route("/sync/logs", get(sync::list_logs))
        .route("/sync/{kind}/{id}/push", post(sync::push))
        .route("/sync/{kind}/{id}/bidirectional", post(sync::bidirectional))
        .route("/sync/{kind}/remote/{remote_id}/pull", post(sync::pull))
        .route("/sync/{kind}/bulk-pull", post(sync::bulk_pull))
        .route("/movies/{tmdb_id}/details", get(movies::details));

    let mut app = Router::new().nest("/api", api_router);
    if state.config().observability.metrics_enabled {
        app = app.route("/metrics", get(observability::get_metrics));
    }

    app.with_state(state)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
