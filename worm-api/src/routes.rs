//! API route configuration.

use std::sync::Arc;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::handlers;
use crate::state::AppState;

/// Creates the API router with all routes configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))

        // Relay
        .route("/api/v1/relay", post(handlers::relay_json))
        .route("/api/v1/relay/:name", post(handlers::relay_text))

        // Cache
        .route(
            "/api/v1/cache",
            get(handlers::list_cache).delete(handlers::clear_cache),
        )
        .route("/api/v1/cache/stats", get(handlers::cache_stats))
        .route("/api/v1/cache/:name", delete(handlers::invalidate_entry))

        .with_state(state)
}
