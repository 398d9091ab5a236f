//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`build`]: build submission
//! - [`status`]: build status polling
//! - [`download`]: artifact download proxy
//! - [`system`]: health, OpenAPI, unknown-endpoint fallback

use crate::types::{BuildStatus, ClientStatus};
use serde::{Deserialize, Serialize};

mod build;
mod download;
mod status;
mod system;

pub use build::*;
pub use download::*;
pub use status::*;
pub use system::*;

/// Endpoints advertised by the unknown-endpoint fallback
pub const AVAILABLE_ENDPOINTS: &[&str] = &[
    "GET /api/health",
    "POST /api/build",
    "GET /api/status/:requestId",
    "GET /api/download/:artifactId",
    "GET /api/openapi.json",
];

// ============================================================================
// Request/Response Types (shared across handlers)
// ============================================================================

/// Request body for POST /api/build
///
/// Missing fields deserialize as empty and are reported by validation.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuildRequest {
    /// Display name of the app
    #[serde(default)]
    pub app_name: String,
    /// URL the app wraps
    #[serde(default)]
    pub website_url: String,
    /// PNG icon, bare base64 or a `data:image/png;base64,...` URL
    #[serde(default)]
    pub icon_base64: String,
}

/// Response for POST /api/build
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuildResponse {
    /// Always true; failures use the error body
    pub success: bool,
    /// JobId to poll with
    pub request_id: String,
    /// Human-readable confirmation
    pub message: String,
}

/// Response for GET /api/status/:requestId
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// building, completed or failed
    pub status: BuildStatus,
    /// Progress or failure message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Artifact id to pass to /api/download (completed only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_id: Option<u64>,
    /// Artifact name as produced by the pipeline (completed only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_name: Option<String>,
    /// Download link served by this API (completed only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
}

impl From<ClientStatus> for StatusResponse {
    fn from(status: ClientStatus) -> Self {
        let artifact = status.artifact;
        Self {
            status: status.status,
            message: status.message,
            artifact_id: artifact.as_ref().map(|a| a.id),
            artifact_name: artifact.as_ref().map(|a| a.name.clone()),
            download_url: artifact.map(|a| format!("/api/download/{}", a.id)),
        }
    }
}

/// Body of a status check that could not be answered
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
pub struct StatusErrorResponse {
    /// Always `error`
    pub status: BuildStatus,
    /// What went wrong
    pub error: String,
}
