//! # tube-dl
//!
//! Backend library for video download applications, powered by the external
//! yt-dlp extractor.
//!
//! ## Design Philosophy
//!
//! tube-dl is designed to be:
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Event-driven** - Observers subscribe to live progress, no polling required
//! - **Tool-agnostic at the seam** - The extraction engine sits behind a trait;
//!   the shipped implementation drives the yt-dlp CLI
//! - **Sensible defaults** - Works out of the box with zero configuration
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use tube_dl::{Config, VideoDownloader};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = Arc::new(VideoDownloader::new(Config::default())?);
//!
//!     // Subscribe to progress events
//!     let mut events = downloader.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     // Run a batch of downloads
//!     let batch = downloader
//!         .run_batch(
//!             &["https://example.com/watch?v=abc123".to_string()],
//!             Path::new("downloads"),
//!         )
//!         .await;
//!     println!("{} results", batch.results.len());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API and WebSocket progress feed
pub mod api;
/// In-process progress broadcast bus
pub mod bus;
/// Classification of raw extractor failures into user-facing messages
pub mod classify;
/// Configuration types
pub mod config;
/// Core downloader implementation (decomposed into focused submodules)
pub mod downloader;
/// Error types
pub mod error;
/// External media-extractor seam
pub mod extractor;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

// Re-export commonly used types
pub use bus::ProgressBus;
pub use config::{ApiConfig, Config, DownloadConfig, ExtractorConfig};
pub use downloader::VideoDownloader;
pub use error::{ApiError, Error, ErrorDetail, Result, ToHttpStatus};
pub use extractor::{DownloadRequest, MediaExtractor, RawProgress, YtDlpExtractor};
pub use types::{
    BatchResult, JobPhase, MediaMetadata, ProgressEvent, UrlResult, UrlStatus,
};

/// Helper function to run the API server with graceful signal handling.
///
/// Serves the API until a termination signal arrives, then returns.
///
/// - **Unix:** listens for SIGTERM and SIGINT.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tube_dl::{Config, VideoDownloader, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let downloader = Arc::new(VideoDownloader::new(Config::default())?);
///
///     // Serve until SIGTERM / Ctrl+C
///     run_with_shutdown(downloader).await?;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(downloader: std::sync::Arc<VideoDownloader>) -> Result<()> {
    let config = downloader.get_config();

    tokio::select! {
        result = api::start_api_server(downloader, config) => result,
        _ = wait_for_signal() => {
            tracing::info!("Shutdown signal received, stopping API server");
            Ok(())
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Signal registration may fail in restricted environments (containers,
    // tests); fall back to ctrl_c when it does.
    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        _ => {
            tracing::warn!("Could not register signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
