//! Error types for filing-dl
//!
//! This module provides the error taxonomy for the library:
//! - [`RegistryError`] for anything that goes wrong talking to the registry or archive
//! - [`ConversionError`] for rendering failures
//! - [`Error`], the crate-wide error that wraps both plus configuration, I/O and API errors
//! - HTTP status code mapping and structured JSON error bodies for the REST API
//!
//! An empty filing selection is not an error; it is represented as `None`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for filing-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for filing-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "registry.user_agent")
        key: Option<String>,
    },

    /// Registry or archive request failed
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Document conversion failed
    #[error("conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// Caller supplied invalid input (e.g., no known tickers)
    #[error("validation error: {0}")]
    Validation(String),

    /// Job, report or company not found
    #[error("not found: {0}")]
    NotFound(String),

    /// A background job failed as a whole
    #[error("job failed: {0}")]
    JobFailed(String),

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

/// Failures talking to the filings registry or document archive
///
/// Transport-specific error types never leave this enum's `source` fields, so callers
/// only ever match on these variants.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Connection, timeout or body-read failure
    #[error("request to {url} failed: {source}")]
    Transport {
        /// The URL that was requested
        url: String,
        /// Underlying transport error
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-success status
    #[error("request to {url} returned HTTP {status}")]
    Status {
        /// The URL that was requested
        url: String,
        /// HTTP status code returned by the server
        status: u16,
    },

    /// Response body could not be interpreted
    #[error("malformed response from {url}: {reason}")]
    MalformedResponse {
        /// The URL that was requested
        url: String,
        /// What was wrong with the body
        reason: String,
    },

    /// Downloaded bytes could not be written to disk
    #[error("failed to write {path}: {source}")]
    Write {
        /// Destination path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Failures converting a downloaded filing into a PDF
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The input document could not be read
    #[error("cannot read input {path}: {source}")]
    InputUnreadable {
        /// The input file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The rendering engine reported a failure
    #[error("rendering {input} failed: {reason}")]
    RendererFailed {
        /// The markup file handed to the renderer
        input: PathBuf,
        /// Renderer output or exit status
        reason: String,
    },

    /// No rendering engine is available
    #[error("no renderer available: {reason}")]
    RendererUnavailable {
        /// Why no renderer could be used
        reason: String,
    },

    /// Writing the temporary markup shell failed
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The file being written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "job_not_found",
///     "message": "not found: job 5f0c...",
///     "details": { "job_id": "5f0c..." }
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
    /// Machine-readable error code (e.g., "not_found", "validation_error")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
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
}

/// Convert errors to HTTP status codes for API responses
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
            Error::Validation(_) => 400,

            // 404 Not Found
            Error::NotFound(_) => 404,

            // 422 Unprocessable Entity - the filing exists but could not be rendered
            Error::Conversion(_) => 422,

            // 500 Internal Server Error
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::JobFailed(_) => 500,
            Error::Other(_) => 500,

            // 502 Bad Gateway - upstream registry failures
            Error::Registry(_) => 502,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Registry(e) => match e {
                RegistryError::Transport { .. } => "registry_unreachable",
                RegistryError::Status { .. } => "registry_status",
                RegistryError::MalformedResponse { .. } => "registry_malformed_response",
                RegistryError::Write { .. } => "registry_write_failed",
            },
            Error::Conversion(e) => match e {
                ConversionError::InputUnreadable { .. } => "input_unreadable",
                ConversionError::RendererFailed { .. } => "renderer_failed",
                ConversionError::RendererUnavailable { .. } => "renderer_unavailable",
                ConversionError::Io { .. } => "conversion_io_error",
            },
            Error::Validation(_) => "validation_error",
            Error::NotFound(_) => "not_found",
            Error::JobFailed(_) => "job_failed",
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

        let details = match &error {
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            Error::Registry(RegistryError::Status { url, status }) => Some(serde_json::json!({
                "url": url,
                "upstream_status": status,
            })),
            Error::Registry(RegistryError::Transport { url, .. })
            | Error::Registry(RegistryError::MalformedResponse { url, .. }) => {
                Some(serde_json::json!({
                    "url": url,
                }))
            }
            Error::Conversion(ConversionError::RendererFailed { input, .. }) => {
                Some(serde_json::json!({
                    "input": input,
                }))
            }
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
