//! Job submission: validate, upload the icon, dispatch the build run

use crate::config::RemoteConfig;
use crate::error::{Error, Result};
use crate::remote::{DispatchInputs, RemoteCi, WorkflowDispatch};
use crate::types::{JobId, JobRequest};
use crate::uploader::ArtifactUploader;
use std::sync::Arc;

/// Turns a [`JobRequest`] into a dispatched remote run
#[derive(Clone)]
pub struct JobSubmitter {
    remote: Arc<dyn RemoteCi>,
    uploader: ArtifactUploader,
    config: Arc<RemoteConfig>,
}

impl JobSubmitter {
    /// Create a submitter using `remote` for both upload and dispatch
    pub fn new(remote: Arc<dyn RemoteCi>, config: Arc<RemoteConfig>) -> Self {
        let uploader = ArtifactUploader::new(remote.clone(), config.clone());
        Self {
            remote,
            uploader,
            config,
        }
    }

    /// Check a request without touching the network
    pub fn validate(request: &JobRequest) -> Result<()> {
        if request.app_name.trim().is_empty() {
            return Err(Error::validation("app_name", "app name is required"));
        }

        let target = request.target_url.trim();
        if target.is_empty() {
            return Err(Error::validation("target_url", "website URL is required"));
        }
        match url::Url::parse(target) {
            Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {}
            Ok(url) => {
                return Err(Error::validation(
                    "target_url",
                    format!("unsupported URL scheme '{}'", url.scheme()),
                ));
            }
            Err(e) => {
                return Err(Error::validation(
                    "target_url",
                    format!("invalid website URL: {e}"),
                ));
            }
        }

        if request.icon.is_empty() {
            return Err(Error::validation("icon", "icon is required"));
        }

        Ok(())
    }

    /// Submit a build and return the JobId used to track it
    ///
    /// The remote accepts a dispatch with exactly `204 No Content`; any other
    /// status, including `200` with a body, is [`Error::DispatchFailed`].
    pub async fn submit(&self, request: &JobRequest) -> Result<JobId> {
        Self::validate(request)?;

        let job_id = JobId::generate();
        tracing::info!(job_id = %job_id, app_name = %request.app_name, "submitting build");

        let icon_path = self
            .uploader
            .upload(&job_id, &request.icon, request.icon_encoding)
            .await?;

        let dispatch = WorkflowDispatch {
            git_ref: self.config.git_ref.clone(),
            inputs: DispatchInputs {
                app_name: request.app_name.trim().to_string(),
                website_url: request.target_url.trim().to_string(),
                icon_path: icon_path.to_string(),
                request_id: job_id.to_string(),
            },
        };

        let reply = self.remote.dispatch_workflow(&dispatch).await?;
        if reply.status != 204 {
            tracing::warn!(
                job_id = %job_id,
                status = reply.status,
                workflow = %self.config.workflow,
                "workflow dispatch rejected"
            );
            return Err(Error::DispatchFailed {
                status: reply.status,
                body: reply.body,
            });
        }

        tracing::info!(job_id = %job_id, workflow = %self.config.workflow, "build dispatched");
        Ok(job_id)
    }
}
