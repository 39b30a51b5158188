//! Core downloader service split into focused submodules.
//!
//! The `VideoDownloader` struct and its methods are organized by domain:
//! - [`batch`] - Batch orchestration and artifact reconciliation
//! - [`job`] - Single-job execution and progress translation

mod batch;
mod job;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

use crate::bus::ProgressBus;
use crate::classify::classify_extractor_error;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::extractor::{MediaExtractor, YtDlpExtractor};
use crate::types::{MediaMetadata, ProgressEvent};
use std::sync::Arc;

/// Main downloader service (cloneable - all fields are Arc-wrapped or cheap)
///
/// Owns every piece of shared state: the configuration, the progress
/// broadcast bus, and the extractor handle. There are no ambient globals.
#[derive(Clone)]
pub struct VideoDownloader {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Progress event broadcast bus (multiple observers supported)
    pub(crate) bus: ProgressBus,
    /// External media extractor (trait object for pluggable implementations)
    pub(crate) extractor: Arc<dyn MediaExtractor>,
}

impl VideoDownloader {
    /// Create a new VideoDownloader instance backed by the yt-dlp CLI.
    ///
    /// This resolves the extractor binary (explicit path or PATH search) and
    /// creates the default download directory.
    pub fn new(config: Config) -> Result<Self> {
        let extractor = YtDlpExtractor::from_config(&config.extractor)?;
        Self::with_extractor(config, Arc::new(extractor))
    }

    /// Create a VideoDownloader with a custom extractor implementation.
    ///
    /// Useful for embedding alternative extraction engines and for tests
    /// that substitute a scripted stub.
    pub fn with_extractor(config: Config, extractor: Arc<dyn MediaExtractor>) -> Result<Self> {
        std::fs::create_dir_all(&config.download.download_dir).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create download directory '{}': {}",
                    config.download.download_dir.display(),
                    e
                ),
            ))
        })?;

        tracing::info!(
            extractor = extractor.name(),
            download_dir = %config.download.download_dir.display(),
            "downloader initialized"
        );

        Ok(Self {
            config: Arc::new(config),
            bus: ProgressBus::new(),
            extractor,
        })
    }

    /// Subscribe to progress events.
    ///
    /// Multiple observers are supported. Each observer receives all events
    /// independently; an observer that falls behind by more than the channel
    /// capacity sees a `RecvError::Lagged` and misses those snapshots.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tube_dl::{Config, VideoDownloader};
    ///
    /// # fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let downloader = VideoDownloader::new(Config::default())?;
    ///
    /// let mut events = downloader.subscribe();
    /// tokio::spawn(async move {
    ///     while let Ok(event) = events.recv().await {
    ///         println!("progress: {event:?}");
    ///     }
    /// });
    /// # Ok(())
    /// # }
    /// ```
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<ProgressEvent> {
        self.bus.subscribe()
    }

    /// Get the current configuration.
    ///
    /// The configuration is wrapped in an Arc, so this is a cheap clone.
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// The progress bus, for components that publish or fan out events.
    pub fn bus(&self) -> &ProgressBus {
        &self.bus
    }

    /// Fetch title and thumbnail for a URL without downloading it.
    ///
    /// Delegates to the extractor in no-download mode. Failures are
    /// classified into a user-facing message and surfaced as a single
    /// request-level error — there is no partial result.
    pub async fn fetch_metadata(&self, url: &str) -> Result<MediaMetadata> {
        match self.extractor.fetch_metadata(url).await {
            Ok(metadata) => Ok(metadata),
            Err(Error::Extraction(raw)) => {
                let classified = classify_extractor_error(&raw);
                tracing::warn!(url, raw_error = %raw, classified = %classified, "metadata fetch failed");
                Err(Error::Extraction(classified))
            }
            Err(other) => Err(other),
        }
    }

    /// Spawn the REST API server in a background task.
    ///
    /// The server runs concurrently with download processing and listens on
    /// the configured bind address (default: 127.0.0.1:8000).
    pub fn spawn_api_server(self: &Arc<Self>) -> tokio::task::JoinHandle<Result<()>> {
        let downloader = self.clone();
        let config = self.config.clone();

        tokio::spawn(async move { crate::api::start_api_server(downloader, config).await })
    }
}
