use super::*;
use crate::VideoDownloader;
use crate::downloader::test_helpers::{ScriptedExtractor, create_test_downloader};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use std::time::Duration;
use tower::ServiceExt;


/// Helper to build a router around a scripted extractor.
/// Returns the app, the downloader, and the tempdir (which must be kept alive).
fn create_test_app(
    extractor: ScriptedExtractor,
) -> (Router, Arc<VideoDownloader>, tempfile::TempDir) {
    let (downloader, temp_dir) = create_test_downloader(extractor);
    let downloader = Arc::new(downloader);
    let config = downloader.get_config();
    let app = create_router(downloader.clone(), config);
    (app, downloader, temp_dir)
}

/// Read a response body and parse it as JSON.
async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_api_server_spawns() {
    let (downloader, _temp_dir) = create_test_downloader(ScriptedExtractor::new());
    let downloader = Arc::new(downloader);

    // Use a random available port for testing
    let mut config = (*downloader.get_config()).clone();
    config.server.api.bind_address = "127.0.0.1:0".parse().unwrap(); // Port 0 = OS assigns a free port
    let config = Arc::new(config);

    // Spawn the API server
    let api_handle = tokio::spawn({
        let downloader = downloader.clone();
        let config = config.clone();
        async move { start_api_server(downloader, config).await }
    });

    // Give it a moment to start
    tokio::time::sleep(Duration::from_millis(100)).await;

    api_handle.abort();
}

#[tokio::test]
async fn test_spawn_api_server_method() {
    let (downloader, _temp_dir) = create_test_downloader(ScriptedExtractor::new());
    let downloader = Arc::new(downloader);

    let api_handle = downloader.spawn_api_server();

    tokio::time::sleep(Duration::from_millis(100)).await;

    api_handle.abort();
}

#[tokio::test]
async fn test_cors_enabled() {
    let (downloader, _temp_dir) = create_test_downloader(ScriptedExtractor::new());
    let downloader = Arc::new(downloader);

    let mut config = (*downloader.get_config()).clone();
    config.server.api.cors_enabled = true;
    config.server.api.cors_origins = vec!["*".to_string()];
    let config = Arc::new(config);

    let app = create_router(downloader, config);

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        response.headers().contains_key("access-control-allow-origin"),
        "CORS header should be present when CORS is enabled"
    );
}

#[tokio::test]
async fn test_cors_disabled_omits_headers() {
    let (downloader, _temp_dir) = create_test_downloader(ScriptedExtractor::new());
    let downloader = Arc::new(downloader);

    let mut config = (*downloader.get_config()).clone();
    config.server.api.cors_enabled = false;
    let config = Arc::new(config);

    let app = create_router(downloader, config);

    let request = Request::builder()
        .uri("/health")
        .header("Origin", "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        !response.headers().contains_key("access-control-allow-origin"),
        "CORS header should be absent when CORS is disabled"
    );
}
