//! API route definitions

use crate::manager::ModelManager;
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<ModelManager>,
    pub prometheus_handle: metrics_exporter_prometheus::PrometheusHandle,
}

/// Create the main API router
///
/// Model identifiers contain a `/` and must be percent-encoded in the path
/// (`ollama%2Fllama2%3A7b`).
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health and status
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        // Catalog
        .route("/models", get(handlers::list_models))
        .route("/models/search", get(handlers::search_models))
        .route("/models/refresh", post(handlers::refresh_models))
        .route(
            "/models/{id}",
            get(handlers::get_model).delete(handlers::uninstall_model),
        )
        // Lifecycle
        .route("/models/{id}/installed", get(handlers::is_model_installed))
        .route("/models/{id}/install", post(handlers::install_model))
        .route(
            "/default-model",
            get(handlers::get_default_model).put(handlers::set_default_model),
        )
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}
