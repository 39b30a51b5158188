//! Batch download submission handler.

use super::DownloadBatchRequest;
use crate::api::AppState;
use crate::types::BatchResult;
use axum::{Json, extract::State};
use std::path::PathBuf;

/// POST /download - Run a batch of URLs to completion
///
/// Blocks until every URL in the batch has reached a terminal state, then
/// returns one result per URL in request order. Individual failures are
/// reported inside `results`, never as an HTTP error — the reply status is
/// 200 whenever the batch itself was accepted.
#[utoipa::path(
    post,
    path = "/download",
    tag = "downloads",
    request_body = DownloadBatchRequest,
    responses(
        (status = 200, description = "Batch completed; per-URL outcomes inside", body = BatchResult),
        (status = 422, description = "Malformed request body")
    )
)]
pub async fn download_batch(
    State(state): State<AppState>,
    Json(request): Json<DownloadBatchRequest>,
) -> Json<BatchResult> {
    let target_dir = PathBuf::from(request.download_dir);
    let batch = state.downloader.run_batch(&request.urls, &target_dir).await;
    Json(batch)
}
