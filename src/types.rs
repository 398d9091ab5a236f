//! Core types for ipa-builder

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Opaque correlation token issued for every submission
///
/// The remote pipeline embeds it into the name of the artifact it produces;
/// status checks find the job again by substring match on artifact names.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Generate a fresh id from 128 random bits (32 lowercase hex characters)
    pub fn generate() -> Self {
        let token: u128 = rand::thread_rng().r#gen();
        Self(format!("{token:032x}"))
    }

    /// Wrap an id received from a caller
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether an artifact name carries this id
    pub fn matches_artifact(&self, artifact_name: &str) -> bool {
        !self.0.is_empty() && artifact_name.contains(&self.0)
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Raster format of the icon blob
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum IconEncoding {
    /// PNG (the only format the pipeline accepts)
    #[default]
    Png,
}

impl IconEncoding {
    /// File extension used for the stored icon
    pub fn extension(&self) -> &'static str {
        match self {
            IconEncoding::Png => "png",
        }
    }
}

/// A build request as submitted by a client
///
/// Held only while the icon is uploaded and the run is dispatched.
#[derive(Clone, Debug)]
pub struct JobRequest {
    /// Display name of the application to build
    pub app_name: String,
    /// Absolute URL the generated app wraps
    pub target_url: String,
    /// Encoded icon image
    pub icon: Vec<u8>,
    /// Encoding of `icon`
    pub icon_encoding: IconEncoding,
}

impl JobRequest {
    /// Create a request with a PNG icon
    pub fn new(app_name: impl Into<String>, target_url: impl Into<String>, icon: Vec<u8>) -> Self {
        Self {
            app_name: app_name.into(),
            target_url: target_url.into(),
            icon,
            icon_encoding: IconEncoding::Png,
        }
    }
}

/// Location of an uploaded blob in the remote content store
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoragePath(String);

impl StoragePath {
    /// Deterministic, request-scoped path: `{dir}/{job_id}.{ext}`
    pub fn for_icon(dir: &str, job_id: &JobId, encoding: IconEncoding) -> Self {
        let dir = dir.trim_matches('/');
        Self(format!("{dir}/{job_id}.{}", encoding.extension()))
    }

    /// The path as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for StoragePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle status of a remote run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Waiting for a runner
    Queued,
    /// Executing
    InProgress,
    /// Finished; see the conclusion
    Completed,
    /// Any other status the remote reports (waiting, requested, pending, ...)
    #[serde(untagged)]
    Other(String),
}

/// Outcome of a completed remote run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunConclusion {
    /// The run succeeded
    Success,
    /// The run failed
    Failure,
    /// The run was cancelled
    Cancelled,
    /// The run exceeded its time limit
    TimedOut,
    /// Any other conclusion the remote reports
    #[serde(untagged)]
    Other(String),
}

impl std::fmt::Display for RunConclusion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunConclusion::Success => f.write_str("success"),
            RunConclusion::Failure => f.write_str("failure"),
            RunConclusion::Cancelled => f.write_str("cancelled"),
            RunConclusion::TimedOut => f.write_str("timed_out"),
            RunConclusion::Other(other) => f.write_str(other),
        }
    }
}

/// One execution in the remote CI system (read-only view)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoteRun {
    /// Remote run identifier
    pub id: u64,
    /// Lifecycle status
    pub status: RunStatus,
    /// Outcome, only meaningful once completed
    #[serde(default)]
    pub conclusion: Option<RunConclusion>,
    /// Creation time, used to order runs most-recent-first
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Where the run's artifacts are listed
    pub artifacts_url: String,
}

/// Page of runs as returned by the remote list endpoint
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RunList {
    /// Total runs known to the remote
    #[serde(default)]
    pub total_count: u64,
    /// Runs on this page
    #[serde(default)]
    pub workflow_runs: Vec<RemoteRun>,
}

/// One artifact produced by a remote run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoteArtifact {
    /// Remote artifact identifier
    pub id: u64,
    /// Artifact name; carries the JobId
    pub name: String,
    /// Authenticated archive download URL
    pub archive_download_url: String,
}

/// Artifact list as returned by a run's artifacts endpoint
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ArtifactList {
    /// Total artifacts of the run
    #[serde(default)]
    pub total_count: u64,
    /// Artifacts
    #[serde(default)]
    pub artifacts: Vec<RemoteArtifact>,
}

/// What a caller needs to download a finished build
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ArtifactHandle {
    /// Remote artifact identifier, accepted by the download proxy
    pub id: u64,
    /// Artifact name as produced by the pipeline
    pub name: String,
    /// Remote (authenticated) archive URL
    pub download_url: String,
}

impl From<&RemoteArtifact> for ArtifactHandle {
    fn from(artifact: &RemoteArtifact) -> Self {
        Self {
            id: artifact.id,
            name: artifact.name.clone(),
            download_url: artifact.archive_download_url.clone(),
        }
    }
}

/// Client-facing build status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BuildStatus {
    /// Not finished yet (or not visible yet)
    Building,
    /// Finished successfully; an artifact is available
    Completed,
    /// Finished without success
    Failed,
    /// Status could not be determined this time; poll again
    Error,
}

impl BuildStatus {
    /// Whether the job has reached a final outcome
    ///
    /// `Error` is not terminal: it denotes a transient reconciliation failure.
    pub fn is_terminal(&self) -> bool {
        matches!(self, BuildStatus::Completed | BuildStatus::Failed)
    }
}

/// Result of one status check, recomputed on every poll
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ClientStatus {
    /// Current status
    pub status: BuildStatus,
    /// Optional human-readable message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Artifact handle, present only when `status` is `completed`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<ArtifactHandle>,
}

impl ClientStatus {
    /// Still building
    pub fn building(message: impl Into<String>) -> Self {
        Self {
            status: BuildStatus::Building,
            message: Some(message.into()),
            artifact: None,
        }
    }

    /// Finished with an artifact
    pub fn completed(artifact: ArtifactHandle) -> Self {
        Self {
            status: BuildStatus::Completed,
            message: None,
            artifact: Some(artifact),
        }
    }

    /// Finished without success
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: BuildStatus::Failed,
            message: Some(message.into()),
            artifact: None,
        }
    }

    /// Transient reconciliation failure
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: BuildStatus::Error,
            message: Some(message.into()),
            artifact: None,
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_job_ids_are_32_hex_chars_and_distinct() {
        let a = JobId::generate();
        let b = JobId::generate();
        assert_eq!(a.as_str().len(), 32);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn job_id_matches_only_names_containing_it() {
        let id = JobId::new("1700000000000");
        assert!(id.matches_artifact("build-1700000000000-ipa.zip"));
        assert!(!id.matches_artifact("build-1700000000001-ipa.zip"));
        assert!(!id.matches_artifact("build-170000000000-ipa.zip"));
    }

    #[test]
    fn empty_job_id_never_matches() {
        assert!(!JobId::new("").matches_artifact("anything"));
    }

    #[test]
    fn storage_path_is_request_scoped() {
        let id = JobId::new("abc");
        let path = StoragePath::for_icon("temp-icons/", &id, IconEncoding::Png);
        assert_eq!(path.as_str(), "temp-icons/abc.png");
    }

    #[test]
    fn run_status_parses_known_and_unknown_values() {
        let run: RemoteRun = serde_json::from_value(serde_json::json!({
            "id": 7,
            "status": "in_progress",
            "conclusion": null,
            "artifacts_url": "https://example/artifacts"
        }))
        .unwrap();
        assert_eq!(run.status, RunStatus::InProgress);
        assert!(run.conclusion.is_none());

        let status: RunStatus = serde_json::from_str("\"waiting\"").unwrap();
        assert_eq!(status, RunStatus::Other("waiting".to_string()));

        let conclusion: RunConclusion = serde_json::from_str("\"startup_failure\"").unwrap();
        assert_eq!(conclusion.to_string(), "startup_failure");
    }

    #[test]
    fn run_list_ignores_unknown_fields() {
        let list: RunList = serde_json::from_value(serde_json::json!({
            "total_count": 1,
            "workflow_runs": [{
                "id": 1,
                "name": "build",
                "status": "completed",
                "conclusion": "success",
                "created_at": "2024-05-01T10:00:00Z",
                "artifacts_url": "https://example/runs/1/artifacts"
            }]
        }))
        .unwrap();
        assert_eq!(list.workflow_runs.len(), 1);
        assert_eq!(
            list.workflow_runs[0].conclusion,
            Some(RunConclusion::Success)
        );
        assert!(list.workflow_runs[0].created_at.is_some());
    }

    #[test]
    fn only_completed_and_failed_are_terminal() {
        assert!(BuildStatus::Completed.is_terminal());
        assert!(BuildStatus::Failed.is_terminal());
        assert!(!BuildStatus::Building.is_terminal());
        assert!(!BuildStatus::Error.is_terminal());
    }

    #[test]
    fn client_status_serializes_lowercase_and_skips_empty_fields() {
        let json = serde_json::to_value(ClientStatus::building("queued")).unwrap();
        assert_eq!(json["status"], "building");
        assert_eq!(json["message"], "queued");
        assert!(json.get("artifact").is_none());
    }
}
