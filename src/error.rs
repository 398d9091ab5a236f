//! Error types for ipa-builder
//!
//! This module provides the error taxonomy shared by every component:
//! - Input validation failures (raised before any remote call)
//! - Remote call failures carrying the remote status code and body
//! - HTTP status code mapping for the API front door
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for ipa-builder operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for ipa-builder
///
/// Terminal job outcomes (`completed`, `failed`) are not errors; they are
/// [`BuildStatus`](crate::types::BuildStatus) values returned by polling.
#[derive(Debug, Error)]
pub enum Error {
    /// A required input was missing or malformed
    #[error("validation error: {field}: {message}")]
    Validation {
        /// The offending input field (e.g., "app_name")
        field: String,
        /// Human-readable description of the problem
        message: String,
    },

    /// The request body exceeded the configured size limit
    #[error("request body exceeds the {limit} byte limit")]
    PayloadTooLarge {
        /// Maximum accepted body size in bytes
        limit: usize,
    },

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "REPO_OWNER")
        key: Option<String>,
    },

    /// No remote auth token is configured
    #[error("remote auth token is not configured")]
    MissingCredentials,

    /// Creating or updating the icon blob in the remote content store failed
    #[error("icon upload failed: {status} - {body}")]
    UploadFailed {
        /// HTTP status returned by the remote
        status: u16,
        /// Response body returned by the remote
        body: String,
    },

    /// The remote run queue did not accept the dispatch
    #[error("workflow dispatch failed: {status} - {body}")]
    DispatchFailed {
        /// HTTP status returned by the remote
        status: u16,
        /// Response body returned by the remote
        body: String,
    },

    /// Fetching the artifact archive failed
    #[error("artifact download failed: {status} - {body}")]
    DownloadFailed {
        /// HTTP status returned by the remote
        status: u16,
        /// Response body returned by the remote
        body: String,
    },

    /// Reading the run or artifact lists failed
    #[error("reconciliation error: {0}")]
    Reconciliation(String),

    /// The remote answered with a transient status (429 or 5xx)
    #[error("remote unavailable: {status} - {body}")]
    RemoteUnavailable {
        /// HTTP status returned by the remote
        status: u16,
        /// Response body returned by the remote
        body: String,
    },

    /// The polling caller gave up before the job reached a terminal state
    #[error("build did not finish after {attempts} status checks")]
    PollTimeout {
        /// Number of status checks performed
        attempts: u32,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Network error
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),
}

impl Error {
    /// Shorthand for a [`Error::Validation`] error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// API error response format
///
/// This structure is returned by API endpoints when an error occurs.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "dispatch_failed",
///     "message": "workflow dispatch failed: 422 - Unexpected inputs provided",
///     "details": {
///       "remote_status": 422
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
    /// Machine-readable error code (e.g., "validation_error", "upload_failed")
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
            // 400 Bad Request - caller supplied bad input
            Error::Validation { .. } => 400,
            Error::PayloadTooLarge { .. } => 413,

            // 500 Internal Server Error - local problems
            Error::Config { .. } => 500,
            Error::Io(_) => 500,
            Error::ApiServerError(_) => 500,

            // 502 Bad Gateway - the remote CI system misbehaved
            Error::UploadFailed { .. } => 502,
            Error::DispatchFailed { .. } => 502,
            Error::DownloadFailed { .. } => 502,
            Error::Reconciliation(_) => 502,
            Error::RemoteUnavailable { .. } => 502,
            Error::Network(_) => 502,
            Error::Serialization(_) => 502,

            // 503 Service Unavailable - cannot talk to the remote at all
            Error::MissingCredentials => 503,

            // 504 Gateway Timeout
            Error::PollTimeout { .. } => 504,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Validation { .. } => "validation_error",
            Error::PayloadTooLarge { .. } => "payload_too_large",
            Error::Config { .. } => "config_error",
            Error::MissingCredentials => "missing_credentials",
            Error::UploadFailed { .. } => "upload_failed",
            Error::DispatchFailed { .. } => "dispatch_failed",
            Error::DownloadFailed { .. } => "download_failed",
            Error::Reconciliation(_) => "reconciliation_error",
            Error::RemoteUnavailable { .. } => "remote_unavailable",
            Error::PollTimeout { .. } => "poll_timeout",
            Error::Io(_) => "io_error",
            Error::Network(_) => "network_error",
            Error::Serialization(_) => "serialization_error",
            Error::ApiServerError(_) => "api_server_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Validation { field, .. } => Some(serde_json::json!({
                "field": field,
            })),
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            Error::UploadFailed { status, .. }
            | Error::DispatchFailed { status, .. }
            | Error::DownloadFailed { status, .. }
            | Error::RemoteUnavailable { status, .. } => Some(serde_json::json!({
                "remote_status": status,
            })),
            Error::PollTimeout { attempts } => Some(serde_json::json!({
                "attempts": attempts,
            })),
            Error::PayloadTooLarge { limit } => Some(serde_json::json!({
                "limit_bytes": limit,
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
