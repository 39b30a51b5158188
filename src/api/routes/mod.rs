//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`download`] — Batch download submission
//! - [`metadata`] — No-download metadata lookup
//! - [`files`] — Serving finished artifacts
//! - [`progress`] — WebSocket progress feed
//! - [`system`] — Liveness, health, events, OpenAPI

use serde::{Deserialize, Serialize};

mod download;
mod files;
mod metadata;
mod progress;
mod system;

// Re-export all handlers so `routes::function_name` continues to work
pub use download::*;
pub use files::*;
pub use metadata::*;
pub use progress::*;
pub use system::*;

// ============================================================================
// Request/Query Types (shared across handlers)
// ============================================================================

/// Request body for POST /download
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct DownloadBatchRequest {
    /// URLs to download, processed in order
    pub urls: Vec<String>,

    /// Directory the files are written to
    pub download_dir: String,
}

/// Request body for POST /metadata
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct MetadataRequest {
    /// URL to look up
    pub url: String,
}

/// Query parameters for GET /downloaded-file
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct DownloadedFileQuery {
    /// Filename to serve (no path components)
    pub filename: String,

    /// Directory the file was downloaded into
    pub download_dir: String,
}
