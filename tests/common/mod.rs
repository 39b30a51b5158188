//! Shared fixtures for the end-to-end tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tube_dl::{
    Config, DownloadRequest, Error, MediaExtractor, MediaMetadata, RawProgress, Result,
    VideoDownloader,
};

/// Scripted behavior for one URL.
#[derive(Clone)]
pub enum Behavior {
    /// Emit progress, write the named file, return success.
    Produce { filename: String },
    /// Report success without touching the filesystem.
    ProduceNothing,
    /// Fail with the given raw extractor error text.
    Fail { message: String },
}

/// Minimal extractor stub driven entirely by a per-URL behavior table.
#[derive(Default)]
pub struct StubExtractor {
    behaviors: HashMap<String, Behavior>,
    metadata: HashMap<String, MediaMetadata>,
}

impl StubExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn behavior(mut self, url: &str, behavior: Behavior) -> Self {
        self.behaviors.insert(url.to_string(), behavior);
        self
    }

    pub fn metadata(mut self, url: &str, title: &str, thumbnail: &str) -> Self {
        self.metadata.insert(
            url.to_string(),
            MediaMetadata {
                title: title.to_string(),
                thumbnail: thumbnail.to_string(),
            },
        );
        self
    }
}

#[async_trait]
impl MediaExtractor for StubExtractor {
    async fn download(
        &self,
        request: DownloadRequest,
        progress: UnboundedSender<RawProgress>,
    ) -> Result<()> {
        match self.behaviors.get(&request.url) {
            Some(Behavior::Produce { filename }) => {
                for (done, total) in [(250u64, 1000u64), (1000, 1000)] {
                    progress
                        .send(RawProgress::Downloading {
                            filename: Some(filename.clone()),
                            downloaded_bytes: done,
                            total_bytes: Some(total),
                            speed: Some(4096.0),
                            eta: Some((total - done) / 4096),
                        })
                        .ok();
                }
                std::fs::write(request.output_dir.join(filename), b"e2e-bytes")
                    .map_err(Error::Io)?;
                progress
                    .send(RawProgress::Finished {
                        filename: filename.clone(),
                    })
                    .ok();
                Ok(())
            }
            Some(Behavior::ProduceNothing) => Ok(()),
            Some(Behavior::Fail { message }) => Err(Error::Extraction(message.clone())),
            None => Err(Error::Other(format!("unscripted URL {}", request.url))),
        }
    }

    async fn fetch_metadata(&self, url: &str) -> Result<MediaMetadata> {
        self.metadata
            .get(url)
            .cloned()
            .ok_or_else(|| Error::Extraction(format!("no metadata for {url}")))
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// Build a downloader around a stub extractor, rooted in a tempdir.
pub fn stub_downloader(extractor: StubExtractor) -> (Arc<VideoDownloader>, tempfile::TempDir) {
    let temp = tempfile::tempdir().expect("tempdir");

    let mut config = Config::default();
    config.download.download_dir = temp.path().join("downloads");
    config.download.reconcile_grace_ms = 0;
    config.extractor.cookies_file = None;

    let downloader = VideoDownloader::with_extractor(config, Arc::new(extractor))
        .expect("downloader construction");
    (Arc::new(downloader), temp)
}
