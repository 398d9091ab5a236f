//! Remote CI boundary
//!
//! [`RemoteCi`] is the seam between the build engine and the external CI
//! system. Each method maps to one remote endpoint and returns the raw
//! status and body; interpreting success is left to the component that owns
//! the contract (e.g. dispatch accepts exactly 204). [`GitHubClient`] is the
//! production implementation.

use crate::error::{Error, Result};
use crate::types::StoragePath;
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

mod github;

#[cfg(test)]
pub(crate) mod fake;

pub use github::GitHubClient;

/// Chunked response body
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// Status and body of a buffered remote response
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteReply {
    /// HTTP status code
    pub status: u16,
    /// Response body as text (may be empty)
    pub body: String,
}

impl RemoteReply {
    /// Create a reply from a status and body
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Rate limited or server-side failure; worth retrying
    pub fn is_transient(&self) -> bool {
        self.status == 429 || (500..600).contains(&self.status)
    }

    /// Decode the body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// Streaming remote response (artifact archives)
pub struct RemoteDownload {
    /// HTTP status code of the final response (after redirects)
    pub status: u16,
    /// Content length reported by the remote, if any
    pub content_length: Option<u64>,
    /// Response body, chunk by chunk
    pub body: ByteStream,
}

impl RemoteDownload {
    /// Wrap an in-memory body, mostly for error replies and tests
    pub fn from_bytes(status: u16, body: impl Into<Bytes>) -> Self {
        let body: Bytes = body.into();
        Self {
            status,
            content_length: Some(body.len() as u64),
            body: futures::stream::once(async move { Ok(body) }).boxed(),
        }
    }

    /// 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Drain the body into a string; read errors end the text early
    pub async fn into_text(mut self) -> String {
        let mut buf = Vec::new();
        while let Some(chunk) = self.body.next().await {
            match chunk {
                Ok(chunk) => buf.extend_from_slice(&chunk),
                Err(e) => {
                    tracing::debug!(error = %e, "error body truncated");
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl std::fmt::Debug for RemoteDownload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteDownload")
            .field("status", &self.status)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Body of a create/update call against the content store
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PutContents {
    /// Commit message
    pub message: String,
    /// Base64-encoded blob
    pub content: String,
    /// Branch receiving the blob
    pub branch: String,
    /// Version token of the object being replaced; omitted on create
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha: Option<String>,
}

/// Existing object metadata returned by the content probe
#[derive(Clone, Debug, Deserialize)]
pub struct ContentInfo {
    /// Version token
    pub sha: String,
}

/// Body of a workflow dispatch call
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowDispatch {
    /// Git ref the run executes on
    #[serde(rename = "ref")]
    pub git_ref: String,
    /// Run parameters
    pub inputs: DispatchInputs,
}

/// Parameters handed to the build pipeline
///
/// The pipeline must name its output artifact with `request_id` embedded;
/// that name is the only link back to the submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchInputs {
    /// Application display name
    pub app_name: String,
    /// URL the app wraps
    pub website_url: String,
    /// Content-store path of the uploaded icon
    pub icon_path: String,
    /// The JobId
    pub request_id: String,
}

/// Operations the build engine needs from the remote CI system
#[async_trait]
pub trait RemoteCi: Send + Sync {
    /// `GET /contents/{path}`: existence probe
    async fn get_contents(&self, path: &StoragePath) -> Result<RemoteReply>;

    /// `PUT /contents/{path}`: create or update a blob
    async fn put_contents(&self, path: &StoragePath, body: &PutContents) -> Result<RemoteReply>;

    /// `POST /workflows/{id}/dispatches`: enqueue a run
    async fn dispatch_workflow(&self, body: &WorkflowDispatch) -> Result<RemoteReply>;

    /// `GET /actions/runs?per_page=N`: most recent runs
    async fn list_runs(&self, per_page: u32) -> Result<RemoteReply>;

    /// `GET {artifacts_url}`: artifacts of one run
    async fn list_artifacts(&self, artifacts_url: &str) -> Result<RemoteReply>;

    /// `GET /actions/artifacts/{id}/zip`: archive stream, redirects followed
    async fn download_artifact(&self, artifact_id: u64) -> Result<RemoteDownload>;
}

/// Shorthand for the "no token configured" error raised by remote clients
pub(crate) fn missing_credentials() -> Error {
    tracing::warn!("remote call attempted without an auth token");
    Error::MissingCredentials
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_contents_omits_sha_on_create() {
        let body = PutContents {
            message: "m".into(),
            content: "aGk=".into(),
            branch: "main".into(),
            sha: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("sha").is_none());
    }

    #[test]
    fn workflow_dispatch_uses_ref_key() {
        let body = WorkflowDispatch {
            git_ref: "main".into(),
            inputs: DispatchInputs {
                app_name: "App".into(),
                website_url: "https://example.com".into(),
                icon_path: "temp-icons/x.png".into(),
                request_id: "x".into(),
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["ref"], "main");
        assert_eq!(json["inputs"]["request_id"], "x");
    }

    #[test]
    fn reply_classification() {
        assert!(RemoteReply::new(204, "").is_success());
        assert!(!RemoteReply::new(404, "").is_success());
        assert!(RemoteReply::new(429, "").is_transient());
        assert!(RemoteReply::new(502, "").is_transient());
        assert!(!RemoteReply::new(422, "").is_transient());
    }

    #[tokio::test]
    async fn download_into_text_collects_chunks() {
        let download = RemoteDownload::from_bytes(404, "Not Found");
        assert!(!download.is_success());
        assert_eq!(download.into_text().await, "Not Found");
    }
}
