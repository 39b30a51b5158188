//! External media-extractor seam.
//!
//! The service treats the extraction/transcoding engine as an opaque
//! collaborator behind the [`MediaExtractor`] trait. The shipped
//! implementation drives the yt-dlp CLI ([`ytdlp::YtDlpExtractor`]); tests
//! substitute scripted stubs.
//!
//! Implementations report raw progress through an unbounded mpsc sender.
//! The sender may be used from any execution context — including the
//! blocking worker thread the CLI implementation runs on — because
//! `UnboundedSender::send` is synchronous and thread-safe. The receiving
//! side (the job runner's translation task) is the only code that touches
//! loop-owned state; implementations must never reach past the channel.

pub mod ytdlp;

pub use ytdlp::YtDlpExtractor;

use crate::error::Result;
use crate::types::MediaMetadata;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::sync::mpsc::UnboundedSender;

/// One download request handed to an extractor.
#[derive(Clone, Debug)]
pub struct DownloadRequest {
    /// Source URL to fetch
    pub url: String,

    /// Directory the output file must land in (already created by the caller)
    pub output_dir: PathBuf,
}

/// Raw progress as reported by the external tool, before translation into
/// the normalized [`ProgressEvent`](crate::types::ProgressEvent) vocabulary.
#[derive(Clone, Debug)]
pub enum RawProgress {
    /// Transfer in progress
    Downloading {
        /// File currently being written, as the tool printed it (may carry
        /// a directory prefix)
        filename: Option<String>,
        /// Bytes transferred so far
        downloaded_bytes: u64,
        /// Total bytes when known
        total_bytes: Option<u64>,
        /// Transfer rate in bytes per second when known
        speed: Option<f64>,
        /// Estimated seconds remaining when known
        eta: Option<u64>,
    },

    /// The tool finished writing its output file
    Finished {
        /// Output path as the tool printed it (may carry a directory prefix)
        filename: String,
    },

    /// Informational message that is not a progress update.
    ///
    /// Notably carries the tool's "has already been downloaded" notice,
    /// which replaces the normal finished callback when a cached file is
    /// detected.
    Info {
        /// The raw message line
        message: String,
    },
}

/// Opaque media extraction engine.
///
/// `download` blocks until the tool reaches a terminal state, streaming raw
/// progress through `progress` along the way. Errors carry the tool's raw
/// failure text in [`Error::Extraction`](crate::error::Error::Extraction);
/// classification into user-facing messages happens at the job-runner
/// boundary, not here.
#[async_trait]
pub trait MediaExtractor: Send + Sync {
    /// Fetch and merge the media behind `request.url` into
    /// `request.output_dir`, reporting raw progress as it happens.
    async fn download(
        &self,
        request: DownloadRequest,
        progress: UnboundedSender<RawProgress>,
    ) -> Result<()>;

    /// Fetch title and thumbnail for a URL without downloading anything.
    ///
    /// Returns empty strings when the tool reports no data.
    async fn fetch_metadata(&self, url: &str) -> Result<MediaMetadata>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
