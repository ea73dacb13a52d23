//! Route definitions

use axum::{
    Router,
    routing::{get, post},
};

use crate::{handlers, markup::INCOMING_PATH, state::AppState};

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health and status endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/healthz", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .route("/metrics", get(handlers::metrics::get_metrics))
        // Provider webhooks
        .route(INCOMING_PATH, post(handlers::voice::incoming))
        .route("/voice/fallback", post(handlers::voice::fallback))
        .route("/voice/status", post(handlers::voice::status))
        // Synthesized clips
        .route("/audio/{clip_id}", get(handlers::audio::get_clip))
        // Call inspection (v1)
        .route("/v1/calls", get(handlers::calls::list_calls))
        .route("/v1/calls/{call_sid}", get(handlers::calls::get_call))
        .with_state(state)
}
