//! OpenAPI documentation and schema generation
//!
//! This module defines the OpenAPI specification for the tube-dl REST API
//! using utoipa for compile-time spec generation.

use utoipa::OpenApi;

/// OpenAPI documentation for the tube-dl REST API
///
/// This struct is used to generate the OpenAPI 3.1 specification that describes
/// all available endpoints, request/response types, and API behavior.
///
/// The spec can be accessed via:
/// - `/openapi.json` - JSON format OpenAPI specification
/// - `/swagger-ui` - Interactive Swagger UI documentation
///
/// The WebSocket progress feed (`/ws/progress`) is outside the OpenAPI
/// surface; its frames are the same [`ProgressEvent`](crate::types::ProgressEvent)
/// payloads documented in the components section.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "tube-dl REST API",
        version = "0.1.0",
        description = "REST API for submitting video download batches, fetching metadata, and serving finished files",
        license(
            name = "MIT OR Apache-2.0"
        )
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development server")
    ),
    paths(
        // Downloads
        crate::api::routes::download_batch,

        // Metadata
        crate::api::routes::fetch_metadata,

        // Files
        crate::api::routes::downloaded_file,

        // System
        crate::api::routes::root,
        crate::api::routes::health_check,
        crate::api::routes::openapi_spec,
        crate::api::routes::event_stream,
    ),
    components(schemas(
        // Core types from types.rs
        crate::types::JobPhase,
        crate::types::ProgressEvent,
        crate::types::UrlStatus,
        crate::types::UrlResult,
        crate::types::BatchResult,
        crate::types::MediaMetadata,

        // Request types
        crate::api::routes::DownloadBatchRequest,
        crate::api::routes::MetadataRequest,
        crate::api::routes::DownloadedFileQuery,

        // Error envelope
        crate::error::ApiError,
        crate::error::ErrorDetail,
    )),
    tags(
        (name = "downloads", description = "Batch download submission"),
        (name = "metadata", description = "No-download metadata lookup"),
        (name = "files", description = "Serving finished artifacts"),
        (name = "system", description = "Liveness, health, events, OpenAPI"),
    )
)]
pub struct ApiDoc;
