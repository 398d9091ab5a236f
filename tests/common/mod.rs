//! Common test utilities for ipa-builder integration tests
//!
//! [`GitHubMock`] is a wiremock server answering the GitHub endpoints the
//! engine uses, for one repository (`acme/builds`).

#![allow(dead_code)]

use ipa_builder::Config;
use serde_json::{Value, json};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const OWNER: &str = "acme";
pub const REPO: &str = "builds";
pub const TOKEN: &str = "ghp_integration_token";

/// Mock GitHub API for a single repository
pub struct GitHubMock {
    pub server: MockServer,
}

impl GitHubMock {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Configuration pointing at this server, with fast retry and polling
    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.remote.token = Some(TOKEN.to_string());
        config.remote.owner = OWNER.to_string();
        config.remote.repo = REPO.to_string();
        config.remote.api_base_url = self.server.uri();
        config.remote.request_timeout = Duration::from_secs(5);
        config.retry.initial_delay = Duration::from_millis(5);
        config.retry.max_delay = Duration::from_millis(20);
        config.retry.jitter = false;
        config.poll.interval = Duration::from_millis(5);
        config.poll.max_interval = Duration::from_millis(20);
        config.poll.max_attempts = 5;
        config
    }

    pub fn repo_path(tail: &str) -> String {
        format!("/repos/{OWNER}/{REPO}/{tail}")
    }

    pub fn artifacts_url(&self, run_id: u64) -> String {
        format!(
            "{}{}",
            self.server.uri(),
            Self::repo_path(&format!("actions/runs/{run_id}/artifacts"))
        )
    }

    /// Icon path probe answers 404 for every path
    pub async fn mount_no_existing_icon(&self) {
        Mock::given(method("GET"))
            .and(wiremock::matchers::path_regex(r"^/repos/acme/builds/contents/.*$"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
            .mount(&self.server)
            .await;
    }

    /// Icon PUT answers `status`
    pub async fn mount_put_icon(&self, status: u16) {
        Mock::given(method("PUT"))
            .and(wiremock::matchers::path_regex(r"^/repos/acme/builds/contents/.*$"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({"content": {}})))
            .mount(&self.server)
            .await;
    }

    /// Workflow dispatch answers `status`
    pub async fn mount_dispatch(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path(Self::repo_path("actions/workflows/build.yml/dispatches")))
            .respond_with(ResponseTemplate::new(status))
            .mount(&self.server)
            .await;
    }

    /// Run list with the given runs
    pub async fn mount_runs(&self, runs: Vec<Value>) {
        Mock::given(method("GET"))
            .and(path(Self::repo_path("actions/runs")))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"total_count": runs.len(), "workflow_runs": runs})),
            )
            .mount(&self.server)
            .await;
    }

    /// Artifact list of one run
    pub async fn mount_artifacts(&self, run_id: u64, artifacts: &[(u64, &str)]) {
        let artifacts: Vec<Value> = artifacts
            .iter()
            .map(|(id, name)| {
                json!({
                    "id": id,
                    "name": name,
                    "archive_download_url": format!(
                        "{}{}",
                        self.server.uri(),
                        Self::repo_path(&format!("actions/artifacts/{id}/zip"))
                    ),
                })
            })
            .collect();
        Mock::given(method("GET"))
            .and(path(Self::repo_path(&format!(
                "actions/runs/{run_id}/artifacts"
            ))))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"total_count": artifacts.len(), "artifacts": artifacts})),
            )
            .mount(&self.server)
            .await;
    }

    /// Archive download redirecting to blob storage, as GitHub does
    pub async fn mount_archive(&self, artifact_id: u64, bytes: Vec<u8>) {
        let blob_path = format!("/blob-storage/{artifact_id}.zip");
        Mock::given(method("GET"))
            .and(path(Self::repo_path(&format!(
                "actions/artifacts/{artifact_id}/zip"
            ))))
            .respond_with(
                ResponseTemplate::new(302)
                    .insert_header("location", format!("{}{blob_path}", self.server.uri()).as_str()),
            )
            .mount(&self.server)
            .await;
        Mock::given(method("GET"))
            .and(path(blob_path))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(bytes))
            .mount(&self.server)
            .await;
    }

    /// A run object as listed by GitHub
    pub fn run(&self, id: u64, status: &str, conclusion: Option<&str>, created_at: &str) -> Value {
        json!({
            "id": id,
            "name": "Build iOS App",
            "status": status,
            "conclusion": conclusion,
            "created_at": created_at,
            "artifacts_url": self.artifacts_url(id),
        })
    }
}

/// Minimal PNG signature, enough for an icon payload
pub fn png_bytes() -> Vec<u8> {
    vec![0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n']
}
