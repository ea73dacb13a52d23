//! Call inspection endpoints
//!
//! Read-only snapshots of live sessions, protected by the webhook secret.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use domain::CallSession;
use integration_twilio::{WebhookQuery, secrets_match};
use secrecy::ExposeSecret;
use serde::Serialize;
use tracing::instrument;

use crate::{error::ApiError, state::AppState};

/// Live sessions, oldest first
#[derive(Debug, Serialize)]
pub struct CallsResponse {
    pub count: usize,
    pub calls: Vec<CallSession>,
}

fn authorize(state: &AppState, query: &WebhookQuery) -> Result<(), ApiError> {
    if secrets_match(&query.secret, state.telephony.webhook_secret.expose_secret()) {
        Ok(())
    } else {
        state.metrics.webhook_rejected();
        Err(ApiError::Forbidden("invalid secret".to_string()))
    }
}

#[instrument(skip(state, query))]
pub async fn list_calls(
    State(state): State<AppState>,
    Query(query): Query<WebhookQuery>,
) -> Result<Json<CallsResponse>, ApiError> {
    authorize(&state, &query)?;

    let calls = state.controller.sessions().await;
    Ok(Json(CallsResponse {
        count: calls.len(),
        calls,
    }))
}

#[instrument(skip(state, query))]
pub async fn get_call(
    State(state): State<AppState>,
    Path(call_sid): Path<String>,
    Query(query): Query<WebhookQuery>,
) -> Result<Json<CallSession>, ApiError> {
    authorize(&state, &query)?;

    Ok(Json(state.controller.session(&call_sid).await?))
}
