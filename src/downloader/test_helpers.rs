//! Shared test helpers: a scripted extractor stub and downloader fixtures.

use crate::config::Config;
use crate::downloader::VideoDownloader;
use crate::error::{Error, Result};
use crate::extractor::{DownloadRequest, MediaExtractor, RawProgress};
use crate::types::MediaMetadata;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::tempdir;
use tokio::sync::mpsc::UnboundedSender;

/// What the scripted extractor should do for one URL.
#[derive(Clone)]
pub(crate) enum ScriptedBehavior {
    /// Emit the given raw progress, write `produce_file` (if any) into the
    /// target directory, and return success.
    Succeed {
        progress: Vec<RawProgress>,
        produce_file: Option<String>,
    },
    /// Return an extraction failure with the given raw error text.
    Fail { message: String },
}

/// Scripted in-memory extractor for tests.
///
/// Behaviors are registered per URL before the downloader is constructed;
/// unknown URLs fail loudly so tests never silently pass on a typo.
#[derive(Default)]
pub(crate) struct ScriptedExtractor {
    downloads: HashMap<String, ScriptedBehavior>,
    metadata: HashMap<String, std::result::Result<MediaMetadata, String>>,
}

impl ScriptedExtractor {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// A download that reports plain progress and produces `filename`.
    pub(crate) fn with_success(mut self, url: &str, filename: &str) -> Self {
        let progress = vec![
            RawProgress::Downloading {
                filename: Some(filename.to_string()),
                downloaded_bytes: 500,
                total_bytes: Some(1000),
                speed: Some(1024.0),
                eta: Some(1),
            },
            RawProgress::Downloading {
                filename: Some(filename.to_string()),
                downloaded_bytes: 1000,
                total_bytes: Some(1000),
                speed: Some(2048.0),
                eta: Some(0),
            },
            RawProgress::Finished {
                filename: filename.to_string(),
            },
        ];
        self.downloads.insert(
            url.to_string(),
            ScriptedBehavior::Succeed {
                progress,
                produce_file: Some(filename.to_string()),
            },
        );
        self
    }

    /// A download with explicit raw progress and an optional produced file.
    pub(crate) fn with_scripted(
        mut self,
        url: &str,
        progress: Vec<RawProgress>,
        produce_file: Option<&str>,
    ) -> Self {
        self.downloads.insert(
            url.to_string(),
            ScriptedBehavior::Succeed {
                progress,
                produce_file: produce_file.map(str::to_string),
            },
        );
        self
    }

    /// A download that fails with the given raw extractor error text.
    pub(crate) fn with_failure(mut self, url: &str, message: &str) -> Self {
        self.downloads.insert(
            url.to_string(),
            ScriptedBehavior::Fail {
                message: message.to_string(),
            },
        );
        self
    }

    /// Metadata returned for a URL.
    pub(crate) fn with_metadata(mut self, url: &str, title: &str, thumbnail: &str) -> Self {
        self.metadata.insert(
            url.to_string(),
            Ok(MediaMetadata {
                title: title.to_string(),
                thumbnail: thumbnail.to_string(),
            }),
        );
        self
    }

    /// Metadata failure with the given raw extractor error text.
    pub(crate) fn with_metadata_failure(mut self, url: &str, message: &str) -> Self {
        self.metadata
            .insert(url.to_string(), Err(message.to_string()));
        self
    }
}

#[async_trait]
impl MediaExtractor for ScriptedExtractor {
    async fn download(
        &self,
        request: DownloadRequest,
        progress: UnboundedSender<RawProgress>,
    ) -> Result<()> {
        match self.downloads.get(&request.url) {
            Some(ScriptedBehavior::Succeed {
                progress: steps,
                produce_file,
            }) => {
                for step in steps {
                    progress.send(step.clone()).ok();
                }
                if let Some(filename) = produce_file {
                    std::fs::write(request.output_dir.join(filename), b"video-bytes")
                        .map_err(Error::Io)?;
                }
                Ok(())
            }
            Some(ScriptedBehavior::Fail { message }) => Err(Error::Extraction(message.clone())),
            None => Err(Error::Other(format!(
                "no scripted behavior for URL {}",
                request.url
            ))),
        }
    }

    async fn fetch_metadata(&self, url: &str) -> Result<MediaMetadata> {
        match self.metadata.get(url) {
            Some(Ok(metadata)) => Ok(metadata.clone()),
            Some(Err(message)) => Err(Error::Extraction(message.clone())),
            None => Err(Error::Other(format!("no scripted metadata for URL {url}"))),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Create a test VideoDownloader with the given scripted extractor.
/// Returns the downloader and the tempdir (which must be kept alive).
pub(crate) fn create_test_downloader(
    extractor: ScriptedExtractor,
) -> (VideoDownloader, tempfile::TempDir) {
    let temp_dir = tempdir().unwrap();

    let mut config = Config::default();
    config.download.download_dir = temp_dir.path().join("downloads");
    config.download.reconcile_grace_ms = 0; // keep tests fast
    config.extractor.cookies_file = None;

    let downloader = VideoDownloader::with_extractor(config, Arc::new(extractor)).unwrap();

    (downloader, temp_dir)
}
