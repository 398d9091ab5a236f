//! GitHub REST implementation of [`RemoteCi`].

use super::{
    PutContents, RemoteCi, RemoteDownload, RemoteReply, WorkflowDispatch, missing_credentials,
};
use crate::config::RemoteConfig;
use crate::error::{Error, Result};
use crate::types::StoragePath;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Method, RequestBuilder, header};
use std::sync::Arc;

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";

/// Client for the GitHub contents and Actions APIs of one repository
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    config: Arc<RemoteConfig>,
}

impl GitHubClient {
    /// Create a client for the repository described by `config`
    ///
    /// A missing token is not an error here; every call then fails with
    /// [`Error::MissingCredentials`].
    pub fn new(config: Arc<RemoteConfig>) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static(GITHUB_ACCEPT));

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(10))
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self { http, config })
    }

    /// The configuration this client was built from
    pub fn config(&self) -> &RemoteConfig {
        &self.config
    }

    fn repo_url(&self, tail: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.owner,
            self.config.repo,
            tail.trim_start_matches('/')
        )
    }

    fn authorized(&self, method: Method, url: &str) -> Result<RequestBuilder> {
        let token = self
            .config
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(missing_credentials)?;
        Ok(self.http.request(method, url).bearer_auth(token))
    }

    async fn send(&self, request: RequestBuilder) -> Result<RemoteReply> {
        let response = request.timeout(self.config.request_timeout).send().await?;
        let status = response.status().as_u16();
        let url = response.url().to_string();
        let body = response.text().await?;
        tracing::debug!(url = %url, status, "remote call finished");
        Ok(RemoteReply { status, body })
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl RemoteCi for GitHubClient {
    async fn get_contents(&self, path: &StoragePath) -> Result<RemoteReply> {
        let url = self.repo_url(&format!("contents/{path}"));
        let request = self
            .authorized(Method::GET, &url)?
            .query(&[("ref", self.config.git_ref.as_str())]);
        self.send(request).await
    }

    async fn put_contents(&self, path: &StoragePath, body: &PutContents) -> Result<RemoteReply> {
        let url = self.repo_url(&format!("contents/{path}"));
        let request = self.authorized(Method::PUT, &url)?.json(body);
        self.send(request).await
    }

    async fn dispatch_workflow(&self, body: &WorkflowDispatch) -> Result<RemoteReply> {
        let url = self.repo_url(&format!(
            "actions/workflows/{}/dispatches",
            self.config.workflow
        ));
        let request = self.authorized(Method::POST, &url)?.json(body);
        self.send(request).await
    }

    async fn list_runs(&self, per_page: u32) -> Result<RemoteReply> {
        let url = self.repo_url("actions/runs");
        let request = self
            .authorized(Method::GET, &url)?
            .query(&[("per_page", per_page)]);
        self.send(request).await
    }

    async fn list_artifacts(&self, artifacts_url: &str) -> Result<RemoteReply> {
        let request = self.authorized(Method::GET, artifacts_url)?;
        self.send(request).await
    }

    async fn download_artifact(&self, artifact_id: u64) -> Result<RemoteDownload> {
        let url = self.repo_url(&format!("actions/artifacts/{artifact_id}/zip"));
        // Only the connect timeout applies: archives can take long to stream.
        let response = self.authorized(Method::GET, &url)?.send().await?;
        let status = response.status().as_u16();
        let content_length = response.content_length();
        tracing::debug!(
            artifact_id,
            status,
            final_url = %response.url(),
            content_length = ?content_length,
            "artifact download started"
        );
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(Error::from))
            .boxed();
        Ok(RemoteDownload {
            status,
            content_length,
            body,
        })
    }
}
