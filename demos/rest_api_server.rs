//! REST API server example
//!
//! This example shows how to run tube-dl with the REST API enabled,
//! allowing control via HTTP endpoints.
//!
//! After starting, you can:
//! - View Swagger UI at http://localhost:8000/swagger-ui
//! - Submit downloads via POST http://localhost:8000/download
//! - Fetch metadata via POST http://localhost:8000/metadata
//! - Watch progress via ws://localhost:8000/ws/progress or GET /events

use std::sync::Arc;
use tube_dl::config::{ApiConfig, Config, DownloadConfig, ServerIntegrationConfig};
use tube_dl::{VideoDownloader, run_with_shutdown};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    // Build configuration
    let config = Config {
        download: DownloadConfig {
            download_dir: "downloads".into(),
            ..Default::default()
        },
        server: ServerIntegrationConfig {
            api: ApiConfig {
                bind_address: "127.0.0.1:8000".parse()?,
                cors_enabled: true,
                cors_origins: vec!["*".to_string()],
                swagger_ui: true,
            },
        },
        ..Default::default()
    };

    // Create downloader instance (resolves yt-dlp from PATH)
    let downloader = Arc::new(VideoDownloader::new(config)?);

    println!("🚀 Starting tube-dl REST API server");
    println!("📖 Swagger UI: http://localhost:8000/swagger-ui");
    println!("🔄 Progress feed: ws://localhost:8000/ws/progress");
    println!();
    println!("Example commands:");
    println!("  # Submit a download batch");
    println!("  curl -X POST http://localhost:8000/download \\");
    println!("    -H 'Content-Type: application/json' \\");
    println!(
        "    -d '{{\"urls\": [\"https://www.youtube.com/watch?v=abc123\"], \"download_dir\": \"downloads\"}}'"
    );
    println!();
    println!("  # Fetch metadata");
    println!("  curl -X POST http://localhost:8000/metadata \\");
    println!("    -H 'Content-Type: application/json' \\");
    println!("    -d '{{\"url\": \"https://www.youtube.com/watch?v=abc123\"}}'");
    println!();
    println!("  # Stream events (Server-Sent Events)");
    println!("  curl -N http://localhost:8000/events");
    println!();

    // Serve until SIGTERM / Ctrl+C
    run_with_shutdown(downloader).await?;

    Ok(())
}
