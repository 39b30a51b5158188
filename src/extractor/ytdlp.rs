//! yt-dlp CLI-backed extractor implementation.
//!
//! Runs the external `yt-dlp` binary as a child process. Download mode runs
//! on a blocking worker thread and parses the tool's stdout line-by-line
//! into [`RawProgress`] messages; metadata mode is a one-shot
//! `--dump-single-json` invocation.

use super::{DownloadRequest, MediaExtractor, RawProgress};
use crate::config::ExtractorConfig;
use crate::error::{Error, Result};
use crate::types::MediaMetadata;
use async_trait::async_trait;
use regex::Regex;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tokio::sync::mpsc::UnboundedSender;

/// Marker yt-dlp prints instead of the finished callback when the output
/// file is already on disk.
pub(crate) const ALREADY_DOWNLOADED_MARKER: &str = "has already been downloaded";

/// CLI-backed extractor using the external yt-dlp binary.
///
/// # Examples
///
/// ```no_run
/// use tube_dl::config::ExtractorConfig;
/// use tube_dl::extractor::YtDlpExtractor;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// // Auto-discover from PATH
/// let extractor = YtDlpExtractor::from_config(&ExtractorConfig::default())?;
/// # Ok(())
/// # }
/// ```
pub struct YtDlpExtractor {
    binary_path: PathBuf,
    options: ExtractorConfig,
}

impl YtDlpExtractor {
    /// Create an extractor with an explicit binary path.
    pub fn new(binary_path: PathBuf, options: ExtractorConfig) -> Self {
        Self {
            binary_path,
            options,
        }
    }

    /// Resolve the binary from the configuration.
    ///
    /// Uses the explicit `binary_path` when set, otherwise searches PATH via
    /// the `which` crate (unless `search_path` is disabled).
    pub fn from_config(options: &ExtractorConfig) -> Result<Self> {
        let binary_path = if let Some(path) = &options.binary_path {
            path.clone()
        } else if options.search_path {
            which::which("yt-dlp").map_err(|e| {
                Error::ExtractorUnavailable(format!("yt-dlp not found in PATH: {e}"))
            })?
        } else {
            return Err(Error::ExtractorUnavailable(
                "no binary path configured and PATH search is disabled".to_string(),
            ));
        };

        Ok(Self::new(binary_path, options.clone()))
    }

    /// The cookie file to pass along, if one currently exists on disk.
    ///
    /// Checked per call so dropping a cookie file in place takes effect
    /// without a restart.
    fn available_cookie_file(&self) -> Option<PathBuf> {
        match &self.options.cookies_file {
            Some(path) if path.exists() => {
                tracing::info!(path = %path.display(), "using cookie file");
                Some(path.clone())
            }
            Some(path) => {
                tracing::debug!(path = %path.display(), "cookie file not found, continuing without");
                None
            }
            None => None,
        }
    }

    /// Assemble the argument list for a download invocation.
    fn build_download_args(&self, request: &DownloadRequest) -> Vec<String> {
        let output_template = request.output_dir.join(&self.options.output_template);

        let mut args = vec![
            "-f".to_string(),
            self.options.format.clone(),
            "--merge-output-format".to_string(),
            self.options.merge_output_format.clone(),
            "-o".to_string(),
            output_template.to_string_lossy().into_owned(),
            "--newline".to_string(),
        ];

        if self.options.no_playlist {
            args.push("--no-playlist".to_string());
        }

        if let Some(cookies) = self.available_cookie_file() {
            args.push("--cookies".to_string());
            args.push(cookies.to_string_lossy().into_owned());
        }

        args.push(request.url.clone());
        args
    }

    /// Assemble the argument list for a metadata invocation.
    fn build_metadata_args(&self, url: &str) -> Vec<String> {
        let mut args = vec![
            "--dump-single-json".to_string(),
            "--no-download".to_string(),
            "--no-warnings".to_string(),
        ];

        if self.options.no_playlist {
            args.push("--no-playlist".to_string());
        }

        if let Some(cookies) = self.available_cookie_file() {
            args.push("--cookies".to_string());
            args.push(cookies.to_string_lossy().into_owned());
        }

        args.push(url.to_string());
        args
    }
}

#[async_trait]
impl MediaExtractor for YtDlpExtractor {
    async fn download(
        &self,
        request: DownloadRequest,
        progress: UnboundedSender<RawProgress>,
    ) -> Result<()> {
        let binary = self.binary_path.clone();
        let args = self.build_download_args(&request);

        tracing::info!(
            url = %request.url,
            dir = %request.output_dir.display(),
            "starting yt-dlp download"
        );

        // The child process is driven synchronously; its stdout loop may not
        // run on the event loop. Progress crosses back over the unbounded
        // channel, which is safe to send on from this worker thread.
        tokio::task::spawn_blocking(move || run_download(&binary, &args, &progress))
            .await
            .map_err(|e| Error::Other(format!("download task join error: {e}")))?
    }

    async fn fetch_metadata(&self, url: &str) -> Result<MediaMetadata> {
        let args = self.build_metadata_args(url);

        let output = tokio::process::Command::new(&self.binary_path)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                Error::ExtractorUnavailable(format!(
                    "failed to execute {}: {e}",
                    self.binary_path.display()
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Extraction(extract_error_text(&stderr)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_metadata_json(&stdout))
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}

/// Drive one yt-dlp download to completion on the current (blocking) thread.
fn run_download(binary: &Path, args: &[String], tx: &UnboundedSender<RawProgress>) -> Result<()> {
    let mut child = Command::new(binary)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            Error::ExtractorUnavailable(format!("failed to spawn {}: {e}", binary.display()))
        })?;

    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| Error::Other("child stderr not captured".to_string()))?;
    let stderr_reader = std::thread::spawn(move || {
        let mut buf = String::new();
        BufReader::new(stderr).read_to_string(&mut buf).ok();
        buf
    });

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| Error::Other("child stdout not captured".to_string()))?;

    let mut parser = OutputParser::new();
    for line in BufReader::new(stdout).lines() {
        let Ok(line) = line else { break };
        if let Some(raw) = parser.parse_line(&line) {
            // A closed receiver means nobody is listening anymore; keep
            // draining stdout so the child is not blocked on a full pipe.
            tx.send(raw).ok();
        }
    }

    let status = child.wait().map_err(Error::Io)?;
    let stderr_text = stderr_reader.join().unwrap_or_default();

    if status.success() {
        // The CLI has no explicit finished callback; synthesize one from the
        // last output path the tool printed. An already-downloaded run
        // prints neither a destination nor a merge target, and its notice
        // has already been forwarded as an Info message.
        if let Some(filename) = parser.into_final_filename() {
            tx.send(RawProgress::Finished { filename }).ok();
        }
        Ok(())
    } else {
        Err(Error::Extraction(extract_error_text(&stderr_text)))
    }
}

/// Incremental parser over yt-dlp stdout lines.
struct OutputParser {
    progress_re: Regex,
    merger_re: Regex,
    /// Last `[download] Destination:` path seen
    current_file: Option<String>,
    /// Merge target from the `[Merger]` line, the authoritative final path
    merged_file: Option<String>,
}

impl OutputParser {
    #[allow(clippy::expect_used)]
    fn new() -> Self {
        Self {
            progress_re: Regex::new(
                r"^\[download\]\s+(?P<pct>\d+(?:\.\d+)?)% of ~?\s*(?P<size>\d+(?:\.\d+)?)(?P<unit>[KMGT]iB|B)(?: at\s+(?P<rate>\d+(?:\.\d+)?)(?P<rate_unit>[KMGT]iB|B)/s)?(?: ETA (?P<eta>[\d:]+))?",
            )
            .expect("progress regex is valid"),
            merger_re: Regex::new(r#"^\[Merger\] Merging formats into "(?P<path>.+)""#)
                .expect("merger regex is valid"),
            current_file: None,
            merged_file: None,
        }
    }

    /// Parse one stdout line, updating filename tracking as a side effect.
    fn parse_line(&mut self, line: &str) -> Option<RawProgress> {
        if let Some(path) = line.strip_prefix("[download] Destination: ") {
            self.current_file = Some(path.trim().to_string());
            return None;
        }

        if let Some(caps) = self.merger_re.captures(line) {
            self.merged_file = Some(caps["path"].to_string());
            return None;
        }

        if line.contains(ALREADY_DOWNLOADED_MARKER) {
            return Some(RawProgress::Info {
                message: line.to_string(),
            });
        }

        let caps = self.progress_re.captures(line)?;

        let percent: f64 = caps["pct"].parse().ok()?;
        let size: f64 = caps["size"].parse().ok()?;
        let total_bytes = to_bytes(size, &caps["unit"]);
        let downloaded_bytes = (total_bytes as f64 * percent / 100.0).round() as u64;

        let speed = match (caps.name("rate"), caps.name("rate_unit")) {
            (Some(rate), Some(unit)) => rate
                .as_str()
                .parse::<f64>()
                .ok()
                .map(|r| r * to_bytes(1.0, unit.as_str()) as f64),
            _ => None,
        };

        let eta = caps.name("eta").and_then(|m| parse_clock(m.as_str()));

        Some(RawProgress::Downloading {
            filename: self.current_file.clone(),
            downloaded_bytes,
            total_bytes: Some(total_bytes),
            speed,
            eta,
        })
    }

    /// The path of the final artifact, preferring the merge target over the
    /// last per-format destination.
    fn into_final_filename(self) -> Option<String> {
        self.merged_file.or(self.current_file)
    }
}

/// Convert a sized quantity with a binary unit suffix into bytes.
fn to_bytes(value: f64, unit: &str) -> u64 {
    let factor: u64 = match unit {
        "KiB" => 1024,
        "MiB" => 1024 * 1024,
        "GiB" => 1024 * 1024 * 1024,
        "TiB" => 1024_u64.pow(4),
        _ => 1,
    };
    (value * factor as f64).round() as u64
}

/// Parse a `HH:MM:SS` / `MM:SS` clock string into seconds.
fn parse_clock(s: &str) -> Option<u64> {
    let mut seconds: u64 = 0;
    for part in s.split(':') {
        seconds = seconds.checked_mul(60)?.checked_add(part.parse().ok()?)?;
    }
    Some(seconds)
}

/// Pull the most relevant failure text out of yt-dlp's stderr.
///
/// yt-dlp prefixes fatal messages with `ERROR:`; the last such line carries
/// the terminal failure. Falls back to the trimmed stderr when no marker is
/// present.
fn extract_error_text(stderr: &str) -> String {
    stderr
        .lines()
        .rev()
        .find_map(|line| line.trim().strip_prefix("ERROR:"))
        .map(|rest| rest.trim().to_string())
        .unwrap_or_else(|| stderr.trim().to_string())
}

/// Parse the `--dump-single-json` payload for title and thumbnail.
fn parse_metadata_json(payload: &str) -> MediaMetadata {
    let info: serde_json::Value = match serde_json::from_str(payload) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "yt-dlp metadata output was not valid JSON");
            return MediaMetadata::default();
        }
    };

    MediaMetadata {
        title: info
            .get("title")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
        thumbnail: info
            .get("thumbnail")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string(),
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn extractor_with(options: ExtractorConfig) -> YtDlpExtractor {
        YtDlpExtractor::new(PathBuf::from("/usr/bin/yt-dlp"), options)
    }

    fn request(dir: &Path) -> DownloadRequest {
        DownloadRequest {
            url: "https://example/video1".to_string(),
            output_dir: dir.to_path_buf(),
        }
    }

    // --- argument construction ---

    #[test]
    fn download_args_carry_format_container_and_template() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = extractor_with(ExtractorConfig {
            cookies_file: None,
            ..ExtractorConfig::default()
        });

        let args = extractor.build_download_args(&request(dir.path()));

        assert_eq!(args[0], "-f");
        assert_eq!(args[1], "bv*[ext=mp4]+ba[ext=m4a]/b[ext=mp4]/best");
        assert_eq!(args[2], "--merge-output-format");
        assert_eq!(args[3], "mp4");
        assert_eq!(args[4], "-o");
        assert!(args[5].ends_with("%(title)s.%(ext)s"));
        assert!(args[5].starts_with(dir.path().to_str().unwrap()));
        assert!(args.contains(&"--newline".to_string()));
        assert!(args.contains(&"--no-playlist".to_string()));
        assert_eq!(args.last().unwrap(), "https://example/video1");
    }

    #[test]
    fn download_args_include_cookies_only_when_file_exists() {
        let dir = tempfile::tempdir().unwrap();
        let cookie_path = dir.path().join("cookies.txt");

        let extractor = extractor_with(ExtractorConfig {
            cookies_file: Some(cookie_path.clone()),
            ..ExtractorConfig::default()
        });

        // File absent: no --cookies
        let args = extractor.build_download_args(&request(dir.path()));
        assert!(!args.contains(&"--cookies".to_string()));

        // File present: --cookies <path>
        std::fs::write(&cookie_path, "# Netscape HTTP Cookie File\n").unwrap();
        let args = extractor.build_download_args(&request(dir.path()));
        let idx = args.iter().position(|a| a == "--cookies").unwrap();
        assert_eq!(args[idx + 1], cookie_path.to_string_lossy());
    }

    #[test]
    fn no_playlist_flag_respects_config() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = extractor_with(ExtractorConfig {
            no_playlist: false,
            cookies_file: None,
            ..ExtractorConfig::default()
        });

        let args = extractor.build_download_args(&request(dir.path()));
        assert!(!args.contains(&"--no-playlist".to_string()));
    }

    #[test]
    fn metadata_args_request_json_without_download() {
        let extractor = extractor_with(ExtractorConfig {
            cookies_file: None,
            ..ExtractorConfig::default()
        });

        let args = extractor.build_metadata_args("https://example/v");
        assert!(args.contains(&"--dump-single-json".to_string()));
        assert!(args.contains(&"--no-download".to_string()));
        assert_eq!(args.last().unwrap(), "https://example/v");
    }

    // --- stdout parsing ---

    #[test]
    fn progress_line_parses_percent_size_rate_and_eta() {
        let mut parser = OutputParser::new();
        let raw = parser
            .parse_line("[download]  45.3% of 10.00MiB at 1.25MiB/s ETA 00:05")
            .unwrap();

        match raw {
            RawProgress::Downloading {
                downloaded_bytes,
                total_bytes,
                speed,
                eta,
                ..
            } => {
                assert_eq!(total_bytes, Some(10 * 1024 * 1024));
                // 45.3% of 10MiB
                let expected = (10.0 * 1024.0 * 1024.0 * 0.453_f64).round() as u64;
                assert_eq!(downloaded_bytes, expected);
                assert_eq!(speed, Some(1.25 * 1024.0 * 1024.0));
                assert_eq!(eta, Some(5));
            }
            other => panic!("expected Downloading, got {other:?}"),
        }
    }

    #[test]
    fn progress_line_with_estimated_size_parses() {
        let mut parser = OutputParser::new();
        let raw = parser
            .parse_line("[download]  23.4% of ~ 5.50MiB at  512.00KiB/s ETA 00:12 (frag 3/10)")
            .unwrap();

        match raw {
            RawProgress::Downloading {
                total_bytes, speed, ..
            } => {
                assert_eq!(total_bytes, Some((5.5 * 1024.0 * 1024.0) as u64));
                assert_eq!(speed, Some(512.0 * 1024.0));
            }
            other => panic!("expected Downloading, got {other:?}"),
        }
    }

    #[test]
    fn progress_line_without_rate_or_eta_still_parses() {
        let mut parser = OutputParser::new();
        let raw = parser.parse_line("[download] 100% of 2.00KiB").unwrap();

        match raw {
            RawProgress::Downloading {
                downloaded_bytes,
                total_bytes,
                speed,
                eta,
                ..
            } => {
                assert_eq!(total_bytes, Some(2048));
                assert_eq!(downloaded_bytes, 2048);
                assert!(speed.is_none());
                assert!(eta.is_none());
            }
            other => panic!("expected Downloading, got {other:?}"),
        }
    }

    #[test]
    fn destination_line_sets_current_filename_for_later_progress() {
        let mut parser = OutputParser::new();
        assert!(
            parser
                .parse_line("[download] Destination: downloads/Title.f137.mp4")
                .is_none()
        );

        let raw = parser
            .parse_line("[download]   1.0% of 10.00MiB at 1.00MiB/s ETA 00:10")
            .unwrap();
        match raw {
            RawProgress::Downloading { filename, .. } => {
                assert_eq!(filename.as_deref(), Some("downloads/Title.f137.mp4"));
            }
            other => panic!("expected Downloading, got {other:?}"),
        }
    }

    #[test]
    fn merger_line_wins_over_last_destination() {
        let mut parser = OutputParser::new();
        parser.parse_line("[download] Destination: downloads/Title.f137.mp4");
        parser.parse_line("[download] Destination: downloads/Title.f140.m4a");
        parser.parse_line("[Merger] Merging formats into \"downloads/Title.mp4\"");

        assert_eq!(
            parser.into_final_filename().as_deref(),
            Some("downloads/Title.mp4")
        );
    }

    #[test]
    fn without_merger_the_last_destination_is_final() {
        let mut parser = OutputParser::new();
        parser.parse_line("[download] Destination: downloads/Title.mp4");

        assert_eq!(
            parser.into_final_filename().as_deref(),
            Some("downloads/Title.mp4")
        );
    }

    #[test]
    fn already_downloaded_notice_becomes_info() {
        let mut parser = OutputParser::new();
        let raw = parser
            .parse_line("[download] downloads/Title.mp4 has already been downloaded")
            .unwrap();

        match raw {
            RawProgress::Info { message } => {
                assert!(message.contains("has already been downloaded"));
            }
            other => panic!("expected Info, got {other:?}"),
        }
    }

    #[test]
    fn unrelated_lines_are_ignored() {
        let mut parser = OutputParser::new();
        assert!(parser.parse_line("[youtube] abc123: Downloading webpage").is_none());
        assert!(parser.parse_line("[info] Writing video metadata").is_none());
        assert!(parser.parse_line("").is_none());
    }

    // --- unit helpers ---

    #[test]
    fn to_bytes_handles_all_units() {
        assert_eq!(to_bytes(1.0, "B"), 1);
        assert_eq!(to_bytes(1.0, "KiB"), 1024);
        assert_eq!(to_bytes(1.0, "MiB"), 1024 * 1024);
        assert_eq!(to_bytes(1.0, "GiB"), 1024 * 1024 * 1024);
        assert_eq!(to_bytes(2.5, "KiB"), 2560);
    }

    #[test]
    fn parse_clock_handles_minutes_and_hours() {
        assert_eq!(parse_clock("00:05"), Some(5));
        assert_eq!(parse_clock("01:30"), Some(90));
        assert_eq!(parse_clock("01:00:00"), Some(3600));
        assert_eq!(parse_clock("Unknown"), None);
    }

    // --- stderr classification input ---

    #[test]
    fn extract_error_text_picks_last_error_line() {
        let stderr = "WARNING: some warning\n\
                      ERROR: first failure\n\
                      ERROR: [youtube] abc: Sign in to confirm you're not a bot\n";
        assert_eq!(
            extract_error_text(stderr),
            "[youtube] abc: Sign in to confirm you're not a bot"
        );
    }

    #[test]
    fn extract_error_text_falls_back_to_whole_stderr() {
        assert_eq!(extract_error_text("  boom\n"), "boom");
    }

    // --- metadata parsing ---

    #[test]
    fn metadata_json_extracts_title_and_thumbnail() {
        let payload = r#"{"title": "A Video", "thumbnail": "https://img.example/t.jpg", "duration": 120}"#;
        let meta = parse_metadata_json(payload);
        assert_eq!(meta.title, "A Video");
        assert_eq!(meta.thumbnail, "https://img.example/t.jpg");
    }

    #[test]
    fn metadata_json_missing_fields_become_empty_strings() {
        let meta = parse_metadata_json(r#"{"duration": 12}"#);
        assert_eq!(meta.title, "");
        assert_eq!(meta.thumbnail, "");
    }

    #[test]
    fn metadata_invalid_json_becomes_empty_metadata() {
        let meta = parse_metadata_json("not json at all");
        assert_eq!(meta.title, "");
        assert_eq!(meta.thumbnail, "");
    }

    // --- binary discovery ---

    #[test]
    fn from_config_prefers_explicit_binary_path() {
        let options = ExtractorConfig {
            binary_path: Some(PathBuf::from("/opt/yt-dlp")),
            ..ExtractorConfig::default()
        };
        let extractor = YtDlpExtractor::from_config(&options).unwrap();
        assert_eq!(extractor.binary_path, PathBuf::from("/opt/yt-dlp"));
    }

    #[test]
    fn from_config_without_path_or_search_is_unavailable() {
        let options = ExtractorConfig {
            binary_path: None,
            search_path: false,
            ..ExtractorConfig::default()
        };
        match YtDlpExtractor::from_config(&options) {
            Err(Error::ExtractorUnavailable(_)) => {}
            Err(other) => panic!("expected ExtractorUnavailable, got {other:?}"),
            Ok(_) => panic!("expected ExtractorUnavailable, got an extractor"),
        }
    }

    #[test]
    fn from_config_path_search_is_consistent_with_which() {
        let options = ExtractorConfig {
            binary_path: None,
            search_path: true,
            ..ExtractorConfig::default()
        };
        let which_result = which::which("yt-dlp");
        let from_config_result = YtDlpExtractor::from_config(&options);

        assert_eq!(
            which_result.is_ok(),
            from_config_result.is_ok(),
            "from_config should succeed if and only if which::which() finds yt-dlp"
        );
    }
}
