//! Health check handlers

use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Liveness check - is the server running?
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub generator: ServiceStatus,
    pub synthesizer: ServiceStatus,
    pub active_sessions: u64,
}

/// Status of an upstream service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub healthy: bool,
}

/// Readiness check - can calls be answered?
///
/// Only the generator is required; without the synthesizer replies are
/// spoken by the provider.
pub async fn readiness_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let readiness = state.controller.readiness().await;
    let ready = readiness.is_ready();

    let status_code = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(ReadinessResponse {
            ready,
            generator: ServiceStatus {
                healthy: readiness.generator,
            },
            synthesizer: ServiceStatus {
                healthy: readiness.synthesizer,
            },
            active_sessions: state.controller.active_sessions(),
        }),
    )
}
