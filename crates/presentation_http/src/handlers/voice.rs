//! Voice webhook handlers
//!
//! Each request is authenticated before anything else happens: the shared
//! secret from the query string first, then the provider signature when
//! signature checks are enabled. A rejected request never reaches the
//! turn controller.

use application::TurnRequest;
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use integration_twilio::{
    StatusCallbackForm, VoiceResponse, VoiceWebhookForm, WebhookQuery, parse_form, secrets_match,
    verify_signature,
};
use secrecy::ExposeSecret;
use tracing::{debug, info, instrument, warn};

use crate::{error::ApiError, markup, state::AppState};

pub const SIGNATURE_HEADER: &str = "x-twilio-signature";

/// Speech webhook: one turn of the conversation
#[instrument(skip_all)]
pub async fn incoming(
    State(state): State<AppState>,
    Query(query): Query<WebhookQuery>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let params = authenticate(&state, &query, &uri, &headers, &body)?;
    let turn_hint = query.turn_hint()?;
    let form = VoiceWebhookForm::from_params(&params);

    debug!(
        call_sid = %form.call_sid,
        turn = ?turn_hint,
        confidence = ?form.confidence(),
        "Voice webhook received"
    );

    let response = state
        .controller
        .handle_turn(TurnRequest {
            call_sid: form.call_sid.clone(),
            turn_hint,
            transcript: form.transcript().map(str::to_string),
            secret_valid: true,
        })
        .await?;

    state.metrics.record_turn(&response);
    let twiml = markup::render(&response.action, response.sequence, &state.telephony)?;
    Ok(twiml_response(&twiml))
}

/// Fallback webhook: the provider could not use our previous answer
#[instrument(skip_all)]
pub async fn fallback(
    State(state): State<AppState>,
    Query(query): Query<WebhookQuery>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let params = authenticate(&state, &query, &uri, &headers, &body)?;
    let form = VoiceWebhookForm::from_params(&params);

    warn!(
        call_sid = %form.call_sid,
        error_code = ?form.error_code,
        "Provider fallback invoked"
    );

    let response = state.controller.abandon(&form.call_sid, true).await?;
    state.metrics.record_turn(&response);
    let twiml = markup::render(&response.action, response.sequence, &state.telephony)?;
    Ok(twiml_response(&twiml))
}

/// Call status callback: release the session once the call is over
#[instrument(skip_all)]
pub async fn status(
    State(state): State<AppState>,
    Query(query): Query<WebhookQuery>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let params = authenticate(&state, &query, &uri, &headers, &body)?;
    let form = StatusCallbackForm::from_params(&params);
    state.metrics.status_callback();

    if form.call_status.is_terminal() {
        let removed = state.controller.end_call(&form.call_sid, true).await?;
        info!(
            call_sid = %form.call_sid,
            status = %form.call_status,
            duration_secs = ?form.call_duration,
            removed,
            "Call finished"
        );
    } else {
        debug!(call_sid = %form.call_sid, status = %form.call_status, "Call status update");
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Check the shared secret and, if enabled, the request signature
///
/// Returns the decoded form parameters.
fn authenticate(
    state: &AppState,
    query: &WebhookQuery,
    uri: &Uri,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Vec<(String, String)>, ApiError> {
    state.metrics.webhook_received();
    let telephony = state.telephony.as_ref();

    if !secrets_match(&query.secret, telephony.webhook_secret.expose_secret()) {
        warn!("Rejected webhook with invalid secret");
        state.metrics.webhook_rejected();
        return Err(ApiError::Forbidden("invalid secret".to_string()));
    }

    let params = parse_form(body);

    if let Some(token) = telephony.signature_token() {
        let path = uri
            .path_and_query()
            .map_or_else(|| uri.path(), |pq| pq.as_str());
        let url = format!("{}{path}", telephony.base_url());
        let signature = headers
            .get(SIGNATURE_HEADER)
            .and_then(|value| value.to_str().ok());

        if let Err(e) = verify_signature(token, &url, &params, signature) {
            warn!(error = %e, "Rejected webhook with invalid signature");
            state.metrics.webhook_rejected();
            return Err(e.into());
        }
    }

    Ok(params)
}

fn twiml_response(twiml: &VoiceResponse) -> Response {
    (
        [(header::CONTENT_TYPE, "text/xml; charset=utf-8")],
        twiml.to_xml(),
    )
        .into_response()
}
