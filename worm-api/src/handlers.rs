//! API route handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::IntoResponse,
    Json,
};
use tracing::{debug, info};

use worm_broker::CacheStats;
use worm_core::error::WormError;

use crate::dto::*;
use crate::error::ApiError;
use crate::state::AppState;

type Result<T> = std::result::Result<T, ApiError>;

/// Header carrying the outcome of a plain-text relay.
pub const OUTCOME_HEADER: HeaderName = HeaderName::from_static("x-worm-outcome");

/// GET /health
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let dispatcher = &state.dispatcher;
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        transports: dispatcher
            .transports()
            .kinds()
            .into_iter()
            .map(String::from)
            .collect(),
        cached_entries: dispatcher.cache().stats().valid_entries,
    })
}

/// POST /api/v1/relay/:name
///
/// The body is the payload. The reply is always `200 OK` with the reply text
/// as body; the outcome travels in the `x-worm-outcome` header.
pub async fn relay_text(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    payload: String,
) -> impl IntoResponse {
    let reply = state.dispatcher.handle_detailed(&name, &payload).await;
    debug!(name, outcome = %reply.outcome, "Relayed text request");

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8")),
            (OUTCOME_HEADER, HeaderValue::from_static(reply.outcome.as_str())),
        ],
        reply.body,
    )
}

/// POST /api/v1/relay
pub async fn relay_json(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RelayRequest>,
) -> Result<Json<RelayResponse>> {
    if req.name.trim().is_empty() {
        return Err(WormError::InvalidRequest("name cannot be empty".into()).into());
    }

    let reply = state.dispatcher.handle_detailed(&req.name, &req.payload).await;
    debug!(name = %req.name, outcome = %reply.outcome, "Relayed JSON request");
    Ok(Json(RelayResponse::from(reply)))
}

/// GET /api/v1/cache
pub async fn list_cache(State(state): State<Arc<AppState>>) -> Json<CacheListResponse> {
    let cache = state.dispatcher.cache();
    let now = cache.now();
    let entries: Vec<CacheEntryDto> = cache
        .entries()
        .into_iter()
        .map(|entry| CacheEntryDto::from_entry(entry, now))
        .collect();

    Json(CacheListResponse {
        total: entries.len(),
        entries,
    })
}

/// GET /api/v1/cache/stats
pub async fn cache_stats(State(state): State<Arc<AppState>>) -> Json<CacheStats> {
    Json(state.dispatcher.cache().stats())
}

/// DELETE /api/v1/cache/:name
pub async fn invalidate_entry(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<StatusCode> {
    if state.dispatcher.cache().invalidate(&name) {
        info!(name, "Invalidated cached resolution");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found(format!("no cached resolution for {}", name)))
    }
}

/// DELETE /api/v1/cache
pub async fn clear_cache(State(state): State<Arc<AppState>>) -> StatusCode {
    state.dispatcher.cache().clear();
    info!("Cleared resolution cache");
    StatusCode::NO_CONTENT
}
