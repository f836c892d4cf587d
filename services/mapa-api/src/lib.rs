//! Mapa API library
//!
//! HTTP service that renders Brazilian boundary maps with point overlays.

pub mod config;
pub mod handlers;
pub mod metrics;
pub mod pipeline;
pub mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use state::AppState;

/// Build the application router.
pub fn router(state: Arc<AppState>, prometheus: PrometheusHandle) -> Router {
    Router::new()
        // Rendering
        .route("/api/map", post(handlers::map::map_handler))
        .route("/api/map/download", post(handlers::map::download_handler))
        // Area selection
        .route("/api/areas/regions", get(handlers::areas::regions_handler))
        .route("/api/areas/states", get(handlers::areas::states_handler))
        .route(
            "/api/areas/municipalities",
            get(handlers::areas::municipalities_handler),
        )
        // Health and metrics
        .route("/health", get(handlers::health::health_handler))
        .route("/metrics", get(handlers::health::metrics_handler))
        // Middleware
        .layer(Extension(state))
        .layer(Extension(prometheus))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
