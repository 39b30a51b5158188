//! Job runner: executes one download and translates the tool's raw progress
//! into normalized broadcast events.
//!
//! Each job is owned exclusively by the runner executing it; nothing else
//! mutates its state. The extractor reports raw progress from its own
//! execution context (a blocking worker for the CLI implementation), so
//! every callback crosses an unbounded channel before anything touches the
//! bus — the translation task below is the only consumer.

use crate::bus::ProgressBus;
use crate::classify::classify_extractor_error;
use crate::error::Error;
use crate::extractor::ytdlp::ALREADY_DOWNLOADED_MARKER;
use crate::extractor::{DownloadRequest, MediaExtractor, RawProgress};
use crate::types::{JobPhase, ProgressEvent};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Terminal outcome of one job.
///
/// Extractor failures are always folded into `Failure` here — a failing URL
/// must never take down the batch it belongs to.
#[derive(Clone, Debug)]
pub(crate) enum JobOutcome {
    /// The tool reported completion
    Success {
        /// Filename from the tool's finished event, directory prefix
        /// stripped. The batch-level artifact is re-resolved from disk; this
        /// is kept for logging.
        resolved_filename: Option<String>,
    },
    /// The tool failed
    Failure {
        /// Classified, user-facing error message
        error: String,
    },
}

/// One URL's download attempt and its lifecycle state.
struct Job {
    url: String,
    phase: JobPhase,
    downloaded_bytes: u64,
    resolved_filename: Option<String>,
}

impl Job {
    fn new(url: String) -> Self {
        Self {
            url,
            phase: JobPhase::Pending,
            downloaded_bytes: 0,
            resolved_filename: None,
        }
    }
}

/// Run one download job to its terminal outcome.
///
/// Creates the target directory (idempotent), drives the extractor, and
/// broadcasts normalized progress along the way. Never panics and never
/// propagates extractor errors upward.
pub(crate) async fn run_job(
    extractor: Arc<dyn MediaExtractor>,
    bus: ProgressBus,
    url: &str,
    target_dir: &Path,
) -> JobOutcome {
    if let Err(e) = tokio::fs::create_dir_all(target_dir).await {
        let error = format!(
            "Download failed: could not create download directory '{}': {}",
            target_dir.display(),
            e
        );
        tracing::error!(url, error = %error, "job setup failed");
        bus.publish(ProgressEvent::Failed {
            url: url.to_string(),
            error: error.clone(),
        });
        return JobOutcome::Failure { error };
    }

    let (raw_tx, raw_rx) = mpsc::unbounded_channel();
    let translator = tokio::spawn(translate_progress(url.to_string(), raw_rx, bus.clone()));

    let request = DownloadRequest {
        url: url.to_string(),
        output_dir: target_dir.to_path_buf(),
    };

    // The sender moves into the extractor; once `download` returns, all
    // sender clones are gone and the translator drains to completion.
    let result = extractor.download(request, raw_tx).await;

    let resolved_filename = match translator.await {
        Ok(name) => name,
        Err(e) => {
            tracing::error!(url, error = %e, "progress translation task failed");
            None
        }
    };

    match result {
        Ok(()) => {
            tracing::info!(url, resolved = ?resolved_filename, "download finished");
            JobOutcome::Success { resolved_filename }
        }
        Err(Error::Extraction(raw)) => {
            let error = classify_extractor_error(&raw);
            tracing::warn!(url, raw_error = %raw, classified = %error, "download failed");
            bus.publish(ProgressEvent::Failed {
                url: url.to_string(),
                error: error.clone(),
            });
            JobOutcome::Failure { error }
        }
        Err(other) => {
            let error = classify_extractor_error(&other.to_string());
            tracing::warn!(url, error = %error, "download failed");
            bus.publish(ProgressEvent::Failed {
                url: url.to_string(),
                error: error.clone(),
            });
            JobOutcome::Failure { error }
        }
    }
}

/// Consume raw progress from the extractor's context and publish normalized
/// events, in arrival order, until the channel closes.
///
/// Returns the resolved output filename when a terminal finished event was
/// seen.
async fn translate_progress(
    url: String,
    mut raw_rx: mpsc::UnboundedReceiver<RawProgress>,
    bus: ProgressBus,
) -> Option<String> {
    let mut job = Job::new(url);

    while let Some(raw) = raw_rx.recv().await {
        match raw {
            RawProgress::Downloading {
                filename,
                downloaded_bytes,
                total_bytes,
                speed,
                eta,
            } => {
                if !job.phase.can_advance_to(JobPhase::Downloading) {
                    continue;
                }
                job.phase = JobPhase::Downloading;
                job.downloaded_bytes = downloaded_bytes;

                let percent = match total_bytes {
                    Some(total) if total > 0 => downloaded_bytes as f64 / total as f64 * 100.0,
                    _ => 0.0,
                };

                bus.publish(ProgressEvent::Downloading {
                    url: job.url.clone(),
                    filename: filename.as_deref().map(file_name_only),
                    percent,
                    speed,
                    eta,
                    downloaded_bytes,
                    total_bytes,
                });
            }

            RawProgress::Finished { filename } => {
                if !job.phase.can_advance_to(JobPhase::Finished) {
                    continue;
                }
                job.phase = JobPhase::Finished;

                let name = file_name_only(&filename);
                job.resolved_filename = Some(name.clone());
                bus.publish(ProgressEvent::Finished {
                    url: job.url.clone(),
                    filename: name,
                    already_downloaded: false,
                });
            }

            RawProgress::Info { message } => {
                // The tool skips the normal finished callback when it finds
                // the file already on disk; compensate with a synthetic
                // finished event.
                if !message.contains(ALREADY_DOWNLOADED_MARKER) {
                    continue;
                }
                if !job.phase.can_advance_to(JobPhase::Finished) {
                    continue;
                }
                if let Some(name) = parse_already_downloaded(&message) {
                    job.phase = JobPhase::Finished;
                    job.resolved_filename = Some(name.clone());
                    bus.publish(ProgressEvent::Finished {
                        url: job.url.clone(),
                        filename: name,
                        already_downloaded: true,
                    });
                }
            }
        }
    }

    tracing::debug!(
        url = %job.url,
        phase = ?job.phase,
        downloaded_bytes = job.downloaded_bytes,
        "progress translation complete"
    );
    job.resolved_filename
}

/// Strip any leading directory prefix from a path the tool printed.
fn file_name_only(raw: &str) -> String {
    Path::new(raw)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| raw.to_string())
}

/// Parse the filename out of an "has already been downloaded" notice.
///
/// The notice has the shape
/// `[download] <path> has already been downloaded`, with the path possibly
/// carrying the output-directory prefix.
fn parse_already_downloaded(message: &str) -> Option<String> {
    let head = message.split(ALREADY_DOWNLOADED_MARKER).next()?.trim();
    let path = head.strip_prefix("[download]").unwrap_or(head).trim();
    if path.is_empty() {
        return None;
    }
    Some(file_name_only(path))
}
