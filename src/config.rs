//! Configuration types for tube-dl

use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf};
use utoipa::ToSchema;

/// Download behavior configuration (directories, artifact reconciliation)
///
/// Groups settings related to where downloads land and how the finished
/// artifact is located on disk. Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct DownloadConfig {
    /// Default download directory (default: "./downloads")
    ///
    /// Requests may override this per batch; the default is created at
    /// startup so the service is usable out of the box.
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// File extension of the final merged artifact (default: "mp4")
    ///
    /// Artifact reconciliation scans the target directory for files with
    /// this extension after a download reports success.
    #[serde(default = "default_media_extension")]
    pub media_extension: String,

    /// Grace delay in milliseconds before scanning for the merged artifact
    /// (default: 200)
    ///
    /// Tolerates filesystem flush latency after the tool exits. Best-effort
    /// only; correctness never depends on it.
    #[serde(default = "default_reconcile_grace_ms")]
    pub reconcile_grace_ms: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            download_dir: default_download_dir(),
            media_extension: default_media_extension(),
            reconcile_grace_ms: default_reconcile_grace_ms(),
        }
    }
}

/// External extractor (yt-dlp) configuration
///
/// Groups settings for the external binary and the arguments handed to it.
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ExtractorConfig {
    /// Path to the yt-dlp executable (auto-detected from PATH if None)
    #[serde(default)]
    pub binary_path: Option<PathBuf>,

    /// Whether to search PATH for the binary if no explicit path is set
    /// (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,

    /// Path to a Netscape-format cookie file (default: "cookies.txt")
    ///
    /// Checked for existence on every download/metadata call; passed to the
    /// tool only when present, so dropping a cookie file in place takes
    /// effect without a restart.
    #[serde(default = "default_cookies_file")]
    pub cookies_file: Option<PathBuf>,

    /// Format selector handed to the tool
    /// (default: best mp4 video + m4a audio, falling back to best available)
    #[serde(default = "default_format")]
    pub format: String,

    /// Container the tool merges separate audio/video streams into
    /// (default: "mp4")
    #[serde(default = "default_media_extension")]
    pub merge_output_format: String,

    /// Output filename template, relative to the target directory
    /// (default: "%(title)s.%(ext)s")
    #[serde(default = "default_output_template")]
    pub output_template: String,

    /// Restrict playlist URLs to their single referenced video (default: true)
    #[serde(default = "default_true")]
    pub no_playlist: bool,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            binary_path: None,
            search_path: true,
            cookies_file: default_cookies_file(),
            format: default_format(),
            merge_output_format: default_media_extension(),
            output_template: default_output_template(),
            no_playlist: true,
        }
    }
}

/// REST/WebSocket API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Bind address for the API server (default: 127.0.0.1:8000)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Whether to add CORS headers (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins; "*" allows any origin (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Whether to serve the interactive Swagger UI (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

/// API and external server integration
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ServerIntegrationConfig {
    /// REST/WebSocket API settings
    #[serde(default)]
    pub api: ApiConfig,
}

/// Main configuration for the downloader service
///
/// Fields are organized into logical sub-configs for maintainability:
/// - [`download`](DownloadConfig) — directories, artifact reconciliation
/// - [`extractor`](ExtractorConfig) — external binary and its arguments
/// - [`server`](ServerIntegrationConfig) — API bind address, CORS, Swagger
///
/// All sub-config fields are flattened for serialization, so the JSON/TOML
/// format has no nesting and every field keeps a sensible default.
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Download behavior settings
    #[serde(flatten)]
    pub download: DownloadConfig,

    /// External extractor settings
    #[serde(flatten)]
    pub extractor: ExtractorConfig,

    /// API server settings
    #[serde(flatten)]
    pub server: ServerIntegrationConfig,
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("./downloads")
}

fn default_media_extension() -> String {
    "mp4".to_string()
}

fn default_reconcile_grace_ms() -> u64 {
    200
}

fn default_cookies_file() -> Option<PathBuf> {
    Some(PathBuf::from("cookies.txt"))
}

fn default_format() -> String {
    "bv*[ext=mp4]+ba[ext=m4a]/b[ext=mp4]/best".to_string()
}

fn default_output_template() -> String {
    "%(title)s.%(ext)s".to_string()
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8000))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_true() -> bool {
    true
}
