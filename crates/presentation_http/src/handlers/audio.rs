//! Synthesized clip route

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use domain::ClipId;
use tracing::{debug, instrument};

use crate::{error::ApiError, state::AppState};

/// Serve a synthesized clip
///
/// Unknown, malformed, expired and used-up ids all answer 404.
#[instrument(skip(state))]
pub async fn get_clip(
    State(state): State<AppState>,
    Path(clip_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = ClipId::parse(&clip_id).map_err(|e| ApiError::NotFound(e.to_string()))?;
    let audio = state.clips.fetch(&id)?;

    debug!(bytes = audio.len(), content_type = %audio.content_type, "Serving clip");

    Ok((
        [
            (header::CONTENT_TYPE, audio.content_type),
            (header::CACHE_CONTROL, "no-store".to_string()),
        ],
        audio.data,
    )
        .into_response())
}
