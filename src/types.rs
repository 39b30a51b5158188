//! Core types for tube-dl

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use utoipa::ToSchema;

/// Outcome reason attached to a result whose download succeeded but whose
/// merged output file could not be located on disk afterwards.
pub const REASON_MERGED_FILE_NOT_FOUND: &str = "merged_file_not_found";

/// Lifecycle phase of a single download job.
///
/// Phases only move forward: `Pending → Downloading → Finished | Error`.
/// The `Downloading` phase repeats as progress arrives; the tool's synthetic
/// "already downloaded" notice short-circuits straight to `Finished`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum JobPhase {
    /// Accepted into a batch, not started yet
    Pending,
    /// Bytes are being transferred
    Downloading,
    /// Terminal: the tool reported completion
    Finished,
    /// Terminal: the tool failed
    Error,
}

impl JobPhase {
    /// Whether this phase is terminal (no further transitions allowed).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobPhase::Finished | JobPhase::Error)
    }

    /// Whether a transition from `self` to `next` moves forward.
    ///
    /// Re-entering `Downloading` while already downloading is forward;
    /// leaving a terminal phase never is.
    pub fn can_advance_to(&self, next: JobPhase) -> bool {
        match (self, next) {
            (JobPhase::Pending, _) => true,
            (JobPhase::Downloading, JobPhase::Pending) => false,
            (JobPhase::Downloading, _) => true,
            (JobPhase::Finished | JobPhase::Error, _) => false,
        }
    }
}

/// Event emitted while a download job runs, broadcast to every observer.
///
/// One job produces zero or more `downloading` events followed by exactly one
/// terminal event. Events from a single job reach each surviving observer in
/// emission order; no ordering is guaranteed across jobs.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Transfer in progress
    Downloading {
        /// Source URL identifying the job
        url: String,
        /// Filename the tool is currently writing (if reported)
        #[serde(skip_serializing_if = "Option::is_none")]
        filename: Option<String>,
        /// Progress percentage (0.0 to 100.0, 0.0 when total size is unknown)
        percent: f64,
        /// Transfer rate in bytes per second
        #[serde(skip_serializing_if = "Option::is_none")]
        speed: Option<f64>,
        /// Estimated seconds remaining
        #[serde(skip_serializing_if = "Option::is_none")]
        eta: Option<u64>,
        /// Bytes transferred so far
        downloaded_bytes: u64,
        /// Total bytes, when the tool knows it
        #[serde(skip_serializing_if = "Option::is_none")]
        total_bytes: Option<u64>,
    },

    /// Download completed
    Finished {
        /// Source URL identifying the job
        url: String,
        /// Resolved output filename (directory prefix stripped)
        filename: String,
        /// True when the tool skipped the download because the file was
        /// already on disk
        already_downloaded: bool,
    },

    /// Download failed
    Failed {
        /// Source URL identifying the job
        url: String,
        /// Classified, user-facing error message
        error: String,
    },
}

impl ProgressEvent {
    /// The URL of the job that produced this event.
    pub fn url(&self) -> &str {
        match self {
            ProgressEvent::Downloading { url, .. }
            | ProgressEvent::Finished { url, .. }
            | ProgressEvent::Failed { url, .. } => url,
        }
    }
}

/// Per-URL status inside a batch reply
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UrlStatus {
    /// Download completed and the output file was located
    Success,
    /// Download failed, or the output file could not be located
    Error,
}

/// One entry of a batch reply: the terminal outcome of a single URL.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct UrlResult {
    /// The URL as submitted
    pub url: String,

    /// Terminal status
    pub status: UrlStatus,

    /// Resolved output filename (success only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    /// Directory the file was written to (success only)
    #[serde(rename = "downloadDir", skip_serializing_if = "Option::is_none")]
    pub download_dir: Option<PathBuf>,

    /// Classified, user-facing error message (error only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Machine-readable reason distinguishing error families (error only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl UrlResult {
    /// A successful outcome with its resolved artifact.
    pub fn success(
        url: impl Into<String>,
        filename: impl Into<String>,
        download_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            url: url.into(),
            status: UrlStatus::Success,
            filename: Some(filename.into()),
            download_dir: Some(download_dir.into()),
            error: None,
            reason: None,
        }
    }

    /// A failed outcome carrying a classified error message.
    pub fn failure(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            status: UrlStatus::Error,
            filename: None,
            download_dir: None,
            error: Some(error.into()),
            reason: None,
        }
    }

    /// A failed outcome with a machine-readable reason.
    pub fn failure_with_reason(
        url: impl Into<String>,
        error: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            reason: Some(reason.into()),
            ..Self::failure(url, error)
        }
    }
}

/// Aggregated reply for one submitted batch of URLs.
///
/// Contains exactly one [`UrlResult`] per requested URL, in request order.
/// The batch-level status is always `"completed"`; individual failures live
/// inside `results`.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct BatchResult {
    /// Batch-level status, always `"completed"`
    pub status: String,

    /// One outcome per requested URL, in request order
    pub results: Vec<UrlResult>,
}

impl BatchResult {
    /// Wrap per-URL outcomes into a completed batch reply.
    pub fn completed(results: Vec<UrlResult>) -> Self {
        Self {
            status: "completed".to_string(),
            results,
        }
    }
}

/// Metadata about a video, fetched without downloading it.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct MediaMetadata {
    /// Video title, empty when the tool reports none
    pub title: String,

    /// Thumbnail URL, empty when the tool reports none
    pub thumbnail: String,
}
