//! Status reconciliation
//!
//! The remote has no lookup by JobId. The only link between a submission and
//! its run is the artifact name, which embeds the JobId. A status check
//! therefore lists the most recent runs, newest first, and scans their
//! artifacts until one matches. Nothing is cached; every call reflects the
//! remote as it is now.

use crate::error::{Error, Result};
use crate::remote::RemoteCi;
use crate::types::{
    ArtifactHandle, ArtifactList, ClientStatus, JobId, RemoteArtifact, RemoteRun, RunConclusion,
    RunList, RunStatus,
};
use std::sync::Arc;

/// Message reported while no run is visible for a job yet
pub const QUEUED_MESSAGE: &str = "queued";

/// Maps remote runs and artifacts to a [`ClientStatus`]
#[derive(Clone)]
pub struct StatusReconciler {
    remote: Arc<dyn RemoteCi>,
    page_size: u32,
}

impl StatusReconciler {
    /// Create a reconciler inspecting the `page_size` most recent runs
    pub fn new(remote: Arc<dyn RemoteCi>, page_size: u32) -> Self {
        Self { remote, page_size }
    }

    /// Current status of `job_id`
    ///
    /// Never fails: a run list that cannot be fetched yields an `error`
    /// status the caller may poll past.
    pub async fn get_status(&self, job_id: &JobId) -> ClientStatus {
        let mut runs = match self.fetch_runs().await {
            Ok(runs) => runs,
            Err(e) => {
                tracing::warn!(job_id = %job_id, error = %e, "run list unavailable");
                return ClientStatus::error(e.to_string());
            }
        };

        sort_newest_first(&mut runs);

        for run in &runs {
            let Some(artifacts) = self.fetch_artifacts(run).await else {
                continue;
            };
            if let Some(artifact) = artifacts.iter().find(|a| job_id.matches_artifact(&a.name)) {
                let status = classify(run, artifact);
                tracing::debug!(
                    job_id = %job_id,
                    run_id = run.id,
                    artifact = %artifact.name,
                    status = ?status.status,
                    "job matched"
                );
                return status;
            }
        }

        tracing::debug!(job_id = %job_id, runs = runs.len(), "no matching artifact yet");
        ClientStatus::building(QUEUED_MESSAGE)
    }

    async fn fetch_runs(&self) -> Result<Vec<RemoteRun>> {
        let reply = self
            .remote
            .list_runs(self.page_size)
            .await
            .map_err(|e| Error::Reconciliation(format!("failed to list runs: {e}")))?;
        if !reply.is_success() {
            return Err(Error::Reconciliation(format!(
                "failed to list runs: remote returned {}",
                reply.status
            )));
        }
        let list: RunList = reply
            .json()
            .map_err(|e| Error::Reconciliation(format!("failed to decode run list: {e}")))?;
        Ok(list.workflow_runs)
    }

    async fn fetch_artifacts(&self, run: &RemoteRun) -> Option<Vec<RemoteArtifact>> {
        let reply = match self.remote.list_artifacts(&run.artifacts_url).await {
            Ok(reply) if reply.is_success() => reply,
            Ok(reply) => {
                tracing::debug!(run_id = run.id, status = reply.status, "skipping run");
                return None;
            }
            Err(e) => {
                tracing::debug!(run_id = run.id, error = %e, "skipping run");
                return None;
            }
        };
        match reply.json::<ArtifactList>() {
            Ok(list) => Some(list.artifacts),
            Err(e) => {
                tracing::debug!(run_id = run.id, error = %e, "skipping run, artifacts undecodable");
                None
            }
        }
    }
}

/// Order runs most recent first; runs without a timestamp go last
///
/// The sort is stable, so ties keep the remote's order.
fn sort_newest_first(runs: &mut [RemoteRun]) {
    runs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Client status of a run whose artifact matched the job
pub fn classify(run: &RemoteRun, artifact: &RemoteArtifact) -> ClientStatus {
    match (&run.status, &run.conclusion) {
        (RunStatus::Completed, Some(RunConclusion::Success)) => {
            ClientStatus::completed(ArtifactHandle::from(artifact))
        }
        (RunStatus::Completed, Some(conclusion)) => {
            ClientStatus::failed(format!("build failed ({conclusion})"))
        }
        (RunStatus::Completed, None) => ClientStatus::building("build finishing"),
        (RunStatus::Queued, _) => ClientStatus::building("build queued"),
        (RunStatus::InProgress, _) => ClientStatus::building("build in progress"),
        (RunStatus::Other(status), _) => ClientStatus::building(format!("build {status}")),
    }
}
