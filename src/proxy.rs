//! Artifact download proxy
//!
//! Archives are only reachable with the remote credentials, so clients
//! download through this proxy. The body is passed through chunk by chunk.

use crate::error::{Error, Result};
use crate::remote::{ByteStream, RemoteCi};
use std::sync::Arc;

/// Content type of proxied archives
pub const ARTIFACT_CONTENT_TYPE: &str = "application/zip";

/// Fixed attachment filename of proxied archives
pub const ARTIFACT_FILENAME: &str = "app.ipa.zip";

/// A proxied archive ready to be streamed to the client
pub struct ArtifactDownload {
    /// Archive size as reported by the remote, if known
    pub content_length: Option<u64>,
    /// Archive bytes
    pub body: ByteStream,
}

impl ArtifactDownload {
    /// Value for the `Content-Disposition` header
    pub fn content_disposition() -> String {
        format!("attachment; filename={ARTIFACT_FILENAME}")
    }
}

impl std::fmt::Debug for ArtifactDownload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactDownload")
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// Streams artifact archives out of the authenticated remote store
#[derive(Clone)]
pub struct ArtifactProxy {
    remote: Arc<dyn RemoteCi>,
}

impl ArtifactProxy {
    /// Create a proxy reading through `remote`
    pub fn new(remote: Arc<dyn RemoteCi>) -> Self {
        Self { remote }
    }

    /// Open the archive of `artifact_id`
    ///
    /// A failure after the first chunk surfaces as an error item in the
    /// stream; the client sees a truncated archive.
    pub async fn download(&self, artifact_id: u64) -> Result<ArtifactDownload> {
        let download = self.remote.download_artifact(artifact_id).await?;

        if !download.is_success() {
            let status = download.status;
            let body = download.into_text().await;
            tracing::warn!(artifact_id, status, "artifact download rejected");
            return Err(Error::DownloadFailed { status, body });
        }

        tracing::info!(
            artifact_id,
            content_length = ?download.content_length,
            "streaming artifact"
        );
        Ok(ArtifactDownload {
            content_length: download.content_length,
            body: download.body,
        })
    }
}
