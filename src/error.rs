//! Error types for tube-dl
//!
//! This module provides error handling for the library, including:
//! - Domain-specific error variants (extraction, reconciliation, config)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for tube-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for tube-dl
///
/// This is the primary error type used throughout the library. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "download_dir")
        key: Option<String>,
    },

    /// The external extractor failed.
    ///
    /// Carries the raw failure text from the tool until it is classified at
    /// the job-runner boundary into a user-facing message.
    #[error("extraction failed: {0}")]
    Extraction(String),

    /// No usable extractor binary could be resolved
    #[error("extractor unavailable: {0}")]
    ExtractorUnavailable(String),

    /// A download reported success but no merged output file was found
    #[error("merged file not found in {}", dir.display())]
    MergedFileNotFound {
        /// Directory that was scanned for the output artifact
        dir: PathBuf,
    },

    /// Requested file does not exist (after fallback search)
    #[error("file not found: {0}")]
    FileNotFound(String),

    /// Malformed or unacceptable request input
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
/// It follows a standard format with machine-readable error codes,
/// human-readable messages, and optional contextual details.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "file_not_found",
///     "message": "file not found: title.mp4",
///     "details": {
///       "filename": "title.mp4"
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "file_not_found", "extraction_failed")
    ///
    /// Clients can use this for programmatic error handling.
    pub code: String,

    /// Human-readable error message
    ///
    /// This is suitable for displaying to end users.
    pub message: String,

    /// Optional additional context about the error
    ///
    /// This can include fields like the scanned directory, the requested
    /// filename, validation errors, etc.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    /// Create an API error with additional details
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    /// Create a "not found" error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("not_found", format!("{} not found", resource.into()))
    }

    /// Create a "validation error" error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new("validation_error", message)
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }

    /// Create a "service unavailable" error
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new("service_unavailable", message)
    }
}

/// Convert errors to HTTP status codes for API responses
///
/// This trait maps domain errors to appropriate HTTP status codes.
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::InvalidRequest(_) => 400,

            // 404 Not Found
            Error::FileNotFound(_) => 404,

            // 500 Internal Server Error - extraction failures surface here
            // (the metadata endpoint contract is a plain 500 carrying the
            // classified message)
            Error::Extraction(_) => 500,
            Error::MergedFileNotFound { .. } => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,

            // 503 Service Unavailable - no extractor binary
            Error::ExtractorUnavailable(_) => 503,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Extraction(_) => "extraction_failed",
            Error::ExtractorUnavailable(_) => "extractor_unavailable",
            Error::MergedFileNotFound { .. } => "merged_file_not_found",
            Error::FileNotFound(_) => "file_not_found",
            Error::InvalidRequest(_) => "invalid_request",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        // Add contextual details for specific error types
        let details = match &error {
            Error::MergedFileNotFound { dir } => Some(serde_json::json!({
                "dir": dir,
            })),
            Error::FileNotFound(filename) => Some(serde_json::json!({
                "filename": filename,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
