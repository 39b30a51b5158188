//! No-download metadata lookup handler.

use super::MetadataRequest;
use crate::api::AppState;
use crate::error::Result;
use crate::types::MediaMetadata;
use axum::{Json, extract::State};

/// POST /metadata - Fetch title and thumbnail for a URL
///
/// Delegates to the extractor in no-download mode. Extractor failures are
/// classified and surfaced as a single HTTP 500 — there is no partial
/// result.
#[utoipa::path(
    post,
    path = "/metadata",
    tag = "metadata",
    request_body = MetadataRequest,
    responses(
        (status = 200, description = "Video metadata", body = MediaMetadata),
        (status = 500, description = "Classified extractor failure", body = crate::error::ApiError)
    )
)]
pub async fn fetch_metadata(
    State(state): State<AppState>,
    Json(request): Json<MetadataRequest>,
) -> Result<Json<MediaMetadata>> {
    let metadata = state.downloader.fetch_metadata(&request.url).await?;
    Ok(Json(metadata))
}
