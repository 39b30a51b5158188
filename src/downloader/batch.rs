//! Batch orchestration: runs each requested URL to a terminal outcome and
//! reconciles the finished artifact on disk.

use super::VideoDownloader;
use super::job::{self, JobOutcome};
use crate::types::{BatchResult, REASON_MERGED_FILE_NOT_FOUND, UrlResult};
use crate::utils::latest_file_with_extension;
use std::path::Path;
use std::time::Duration;

impl VideoDownloader {
    /// Run a batch of URLs against one target directory.
    ///
    /// URLs are processed strictly sequentially; the reply carries exactly
    /// one entry per requested URL, in request order. One URL failing never
    /// prevents the rest of the batch from running.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use tube_dl::{Config, VideoDownloader};
    /// use std::path::Path;
    ///
    /// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
    /// let downloader = VideoDownloader::new(Config::default())?;
    /// let batch = downloader
    ///     .run_batch(
    ///         &["https://example/video1".to_string()],
    ///         Path::new("/tmp/videos"),
    ///     )
    ///     .await;
    /// assert_eq!(batch.results.len(), 1);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run_batch(&self, urls: &[String], target_dir: &Path) -> BatchResult {
        tracing::info!(
            count = urls.len(),
            dir = %target_dir.display(),
            "starting download batch"
        );

        let mut results = Vec::with_capacity(urls.len());
        for url in urls {
            let outcome = job::run_job(
                self.extractor.clone(),
                self.bus.clone(),
                url,
                target_dir,
            )
            .await;

            let entry = match outcome {
                JobOutcome::Success { resolved_filename } => {
                    self.reconcile_success(url, target_dir, resolved_filename.as_deref())
                        .await
                }
                JobOutcome::Failure { error } => UrlResult::failure(url, error),
            };
            results.push(entry);
        }

        tracing::info!(count = results.len(), "download batch complete");
        BatchResult::completed(results)
    }

    /// Resolve the artifact a successful job produced.
    ///
    /// The tool's final merged filename is not reliably known ahead of time
    /// when intermediate format-suffixed files exist, so the most recently
    /// modified file with the configured media extension is taken as the
    /// artifact. A short grace delay tolerates filesystem flush latency but
    /// is never required for correctness.
    async fn reconcile_success(
        &self,
        url: &str,
        target_dir: &Path,
        reported_filename: Option<&str>,
    ) -> UrlResult {
        let grace = Duration::from_millis(self.config.download.reconcile_grace_ms);
        if !grace.is_zero() {
            tokio::time::sleep(grace).await;
        }

        let extension = &self.config.download.media_extension;
        match latest_file_with_extension(target_dir, extension) {
            Some(path) => {
                let filename = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                tracing::debug!(
                    url,
                    artifact = %filename,
                    reported = ?reported_filename,
                    "reconciled download artifact"
                );
                UrlResult::success(url, filename, target_dir)
            }
            None => {
                tracing::warn!(
                    url,
                    dir = %target_dir.display(),
                    reported = ?reported_filename,
                    "download reported success but no merged file was found"
                );
                UrlResult::failure_with_reason(
                    url,
                    "download reported success but no merged output file was found",
                    REASON_MERGED_FILE_NOT_FOUND,
                )
            }
        }
    }
}
