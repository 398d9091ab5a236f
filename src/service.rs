//! Build service facade
//!
//! [`BuildService`] wires the uploader, submitter, reconciler and proxy to a
//! single remote client and exposes the three caller operations. It is cheap
//! to clone and shared between API handlers.

use crate::config::Config;
use crate::error::Result;
use crate::poller;
use crate::proxy::{ArtifactDownload, ArtifactProxy};
use crate::reconciler::StatusReconciler;
use crate::remote::{GitHubClient, RemoteCi};
use crate::retry::RetryingRemote;
use crate::submitter::JobSubmitter;
use crate::types::{ClientStatus, JobId, JobRequest};
use std::sync::Arc;

/// Entry point for submitting builds, tracking them and fetching their output
#[derive(Clone)]
pub struct BuildService {
    config: Arc<Config>,
    submitter: JobSubmitter,
    reconciler: StatusReconciler,
    proxy: ArtifactProxy,
}

impl BuildService {
    /// Create a service talking to GitHub, with transient failures retried
    /// per `config.retry`
    pub fn new(config: Config) -> Result<Self> {
        let github = GitHubClient::new(Arc::new(config.remote.clone()))?;
        let remote = RetryingRemote::new(github, config.retry.clone());
        Ok(Self::with_remote(config, Arc::new(remote)))
    }

    /// Create a service on top of an arbitrary remote implementation
    pub fn with_remote(config: Config, remote: Arc<dyn RemoteCi>) -> Self {
        let remote_config = Arc::new(config.remote.clone());
        Self {
            submitter: JobSubmitter::new(remote.clone(), remote_config),
            reconciler: StatusReconciler::new(remote.clone(), config.remote.runs_page_size),
            proxy: ArtifactProxy::new(remote),
            config: Arc::new(config),
        }
    }

    /// The configuration the service was built with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Validate, upload the icon and dispatch a build run
    pub async fn submit_job(&self, request: &JobRequest) -> Result<JobId> {
        self.submitter.submit(request).await
    }

    /// One status check for `job_id`
    pub async fn poll_status(&self, job_id: &JobId) -> ClientStatus {
        self.reconciler.get_status(job_id).await
    }

    /// Poll until `job_id` completes or fails, per `config.poll`
    ///
    /// Returns [`crate::Error::PollTimeout`] once the attempt ceiling is hit.
    pub async fn wait_for_build(&self, job_id: &JobId) -> Result<ClientStatus> {
        let reconciler = &self.reconciler;
        poller::poll_until_resolved(&self.config.poll, move |attempt| {
            tracing::debug!(job_id = %job_id, attempt, "checking build status");
            reconciler.get_status(job_id)
        })
        .await
    }

    /// Open the archive of a finished build for streaming
    pub async fn download_artifact(&self, artifact_id: u64) -> Result<ArtifactDownload> {
        self.proxy.download(artifact_id).await
    }
}
