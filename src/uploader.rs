//! Icon upload into the remote content store
//!
//! Each job gets a deterministic, request-scoped path. The store needs the
//! current version token (`sha`) to overwrite an object, so every upload
//! probes first and then creates or updates.

use crate::config::RemoteConfig;
use crate::error::{Error, Result};
use crate::remote::{ContentInfo, PutContents, RemoteCi};
use crate::types::{IconEncoding, JobId, StoragePath};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::sync::Arc;

/// Pushes job icons into the remote content store
#[derive(Clone)]
pub struct ArtifactUploader {
    remote: Arc<dyn RemoteCi>,
    config: Arc<RemoteConfig>,
}

impl ArtifactUploader {
    /// Create an uploader writing through `remote`
    pub fn new(remote: Arc<dyn RemoteCi>, config: Arc<RemoteConfig>) -> Self {
        Self { remote, config }
    }

    /// Store `blob` under the job's icon path and return that path
    ///
    /// Overwrites an object left at the same path; the stored object is
    /// never cleaned up.
    pub async fn upload(
        &self,
        job_id: &JobId,
        blob: &[u8],
        encoding: IconEncoding,
    ) -> Result<StoragePath> {
        let path = StoragePath::for_icon(&self.config.icon_dir, job_id, encoding);
        let sha = self.existing_sha(&path).await;

        let body = PutContents {
            message: format!("Upload icon for build {job_id}"),
            content: STANDARD.encode(blob),
            branch: self.config.git_ref.clone(),
            sha,
        };

        let reply = self.remote.put_contents(&path, &body).await?;
        if !reply.is_success() {
            tracing::warn!(
                job_id = %job_id,
                path = %path,
                status = reply.status,
                "icon upload rejected"
            );
            return Err(Error::UploadFailed {
                status: reply.status,
                body: reply.body,
            });
        }

        tracing::info!(
            job_id = %job_id,
            path = %path,
            bytes = blob.len(),
            update = body.sha.is_some(),
            "icon uploaded"
        );
        Ok(path)
    }

    /// Version token of the object at `path`, if one exists
    ///
    /// Any failure of the probe counts as "does not exist".
    async fn existing_sha(&self, path: &StoragePath) -> Option<String> {
        match self.remote.get_contents(path).await {
            Ok(reply) if reply.is_success() => match reply.json::<ContentInfo>() {
                Ok(info) => Some(info.sha),
                Err(e) => {
                    tracing::debug!(path = %path, error = %e, "content probe body not understood");
                    None
                }
            },
            Ok(reply) => {
                tracing::debug!(path = %path, status = reply.status, "no existing object");
                None
            }
            Err(e) => {
                tracing::debug!(path = %path, error = %e, "content probe failed");
                None
            }
        }
    }
}
