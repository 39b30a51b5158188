//! Serving finished download artifacts.

use super::DownloadedFileQuery;
use crate::api::AppState;
use crate::error::Error;
use crate::utils::{is_safe_filename, resolve_served_file};
use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use std::path::{Path, PathBuf};

/// GET /downloaded-file - Return the binary content of a finished artifact
///
/// Tries the exact filename first, then falls back to a prefix match so a
/// stale format-suffixed name (e.g. `title.f140.mp4`) still resolves to the
/// merged file (`title.mp4`). 404 when neither matches.
#[utoipa::path(
    get,
    path = "/downloaded-file",
    tag = "files",
    params(
        ("filename" = String, Query, description = "Filename to serve"),
        ("download_dir" = String, Query, description = "Directory the file was downloaded into")
    ),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 400, description = "Unsafe filename"),
        (status = 404, description = "No matching file, even after prefix-match fallback")
    )
)]
pub async fn downloaded_file(
    State(_state): State<AppState>,
    Query(query): Query<DownloadedFileQuery>,
) -> Response {
    if !is_safe_filename(&query.filename) {
        return Error::InvalidRequest(format!(
            "filename '{}' contains path components",
            query.filename
        ))
        .into_response();
    }

    let dir = PathBuf::from(&query.download_dir);
    let Some(path) = resolve_served_file(&dir, &query.filename) else {
        tracing::debug!(
            filename = %query.filename,
            dir = %dir.display(),
            "requested file not found"
        );
        return Error::FileNotFound(query.filename).into_response();
    };

    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "failed to read artifact");
            return Error::Io(e).into_response();
        }
    };

    let served_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| query.filename.clone());

    (
        [
            (header::CONTENT_TYPE, content_type_for(&path).to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{served_name}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

/// Naive content-type from the file extension; enough for media downloads.
fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mkv") => "video/x-matroska",
        Some("m4a") => "audio/mp4",
        Some("mp3") => "audio/mpeg",
        _ => "application/octet-stream",
    }
}
