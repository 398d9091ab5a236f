//! Configuration types for ipa-builder
//!
//! Configuration is an explicitly constructed [`Config`] value handed to each
//! component at construction time. [`Config::from_env`] builds one from the
//! process environment for the server binary; tests build their own.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, time::Duration};
use utoipa::ToSchema;

/// Remote CI system (GitHub) connection settings
#[derive(Clone, Serialize, Deserialize, ToSchema)]
pub struct RemoteConfig {
    /// Bearer token for the remote API (None = every remote call fails with
    /// `MissingCredentials`)
    #[serde(default, skip_serializing)]
    pub token: Option<String>,

    /// Owner of the repository hosting the build workflow
    #[serde(default)]
    pub owner: String,

    /// Name of the repository hosting the build workflow
    #[serde(default)]
    pub repo: String,

    /// Base URL of the remote API (default: "https://api.github.com")
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Workflow file or id to dispatch (default: "build.yml")
    #[serde(default = "default_workflow")]
    pub workflow: String,

    /// Git ref the workflow runs on and icons are committed to (default: "main")
    #[serde(default = "default_git_ref")]
    pub git_ref: String,

    /// Number of most recent runs inspected per status check (default: 20)
    #[serde(default = "default_runs_page_size")]
    pub runs_page_size: u32,

    /// Content-store directory receiving uploaded icons (default: "temp-icons")
    #[serde(default = "default_icon_dir")]
    pub icon_dir: String,

    /// User-Agent sent with every remote request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-request timeout for JSON calls (default: 30 seconds)
    ///
    /// Artifact downloads are streamed and are not subject to this timeout.
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Time allowed to establish a connection, downloads included (default: 10 seconds)
    #[serde(default = "default_connect_timeout", with = "duration_serde")]
    pub connect_timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            token: None,
            owner: String::new(),
            repo: String::new(),
            api_base_url: default_api_base_url(),
            workflow: default_workflow(),
            git_ref: default_git_ref(),
            runs_page_size: default_runs_page_size(),
            icon_dir: default_icon_dir(),
            user_agent: default_user_agent(),
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

// Hand-written so the token never ends up in logs.
impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("token", &self.token.as_deref().map(redact_token))
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("api_base_url", &self.api_base_url)
            .field("workflow", &self.workflow)
            .field("git_ref", &self.git_ref)
            .field("runs_page_size", &self.runs_page_size)
            .field("icon_dir", &self.icon_dir)
            .field("user_agent", &self.user_agent)
            .field("request_timeout", &self.request_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl RemoteConfig {
    /// `owner/repo` slug used in API paths
    pub fn repo_slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }

    /// Whether a non-empty token is configured
    pub fn has_token(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// Retry configuration for transient remote failures (429, 5xx, timeouts)
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 30 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

/// Polling discipline for callers waiting on a build
///
/// The reconciler itself has no notion of time; this is the ceiling after
/// which a job that never shows up is reported as timed out.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct PollConfig {
    /// Delay between the first status checks (default: 10 seconds)
    #[serde(default = "default_poll_interval", with = "duration_serde")]
    pub interval: Duration,

    /// Upper bound for the delay once backoff kicks in (default: 30 seconds)
    #[serde(default = "default_poll_max_interval", with = "duration_serde")]
    pub max_interval: Duration,

    /// Growth factor applied to the delay after each non-terminal check
    /// (default: 1.0 = fixed interval)
    #[serde(default = "default_poll_multiplier")]
    pub backoff_multiplier: f64,

    /// Number of status checks before giving up (default: 60)
    #[serde(default = "default_poll_attempts")]
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: default_poll_interval(),
            max_interval: default_poll_max_interval(),
            backoff_multiplier: default_poll_multiplier(),
            max_attempts: default_poll_attempts(),
        }
    }
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 0.0.0.0:3000)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,

    /// Largest request body accepted, in bytes (default: 50 MiB)
    ///
    /// Icons travel base64-encoded inside the JSON body of `POST /api/build`.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Main configuration for ipa-builder
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Remote CI connection settings
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Retry policy for transient remote failures
    #[serde(default)]
    pub retry: RetryConfig,

    /// Polling discipline for callers waiting on a build
    #[serde(default)]
    pub poll: PollConfig,

    /// REST API settings
    #[serde(default)]
    pub api: ApiConfig,
}

impl Config {
    /// Build a configuration from environment variables, falling back to defaults.
    ///
    /// | Env Var          | Field                    | Default                  |
    /// |------------------|--------------------------|--------------------------|
    /// | `GITHUB_TOKEN`   | `remote.token`           | unset                    |
    /// | `REPO_OWNER`     | `remote.owner`           | empty                    |
    /// | `REPO_NAME`      | `remote.repo`            | empty                    |
    /// | `GITHUB_API_URL` | `remote.api_base_url`    | `https://api.github.com` |
    /// | `WORKFLOW_FILE`  | `remote.workflow`        | `build.yml`              |
    /// | `WORKFLOW_REF`   | `remote.git_ref`         | `main`                   |
    /// | `HOST`           | `api.bind_address` (ip)  | `0.0.0.0`                |
    /// | `PORT`           | `api.bind_address` (port)| `3000`                   |
    /// | `CORS_ORIGINS`   | `api.cors_origins`       | `*`                      |
    ///
    /// Returns [`Error::Config`] when `HOST`/`PORT` cannot be parsed. Missing
    /// repository coordinates are reported by [`Config::validate`].
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        config.remote.token = env_non_empty("GITHUB_TOKEN");
        if let Some(owner) = env_non_empty("REPO_OWNER") {
            config.remote.owner = owner;
        }
        if let Some(repo) = env_non_empty("REPO_NAME") {
            config.remote.repo = repo;
        }
        if let Some(url) = env_non_empty("GITHUB_API_URL") {
            config.remote.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(workflow) = env_non_empty("WORKFLOW_FILE") {
            config.remote.workflow = workflow;
        }
        if let Some(git_ref) = env_non_empty("WORKFLOW_REF") {
            config.remote.git_ref = git_ref;
        }

        let host = env_non_empty("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = env_non_empty("PORT").unwrap_or_else(|| "3000".to_string());
        let port: u16 = port.parse().map_err(|_| Error::Config {
            message: format!("PORT must be a valid port number, got '{port}'"),
            key: Some("PORT".to_string()),
        })?;
        let ip: std::net::IpAddr = host.parse().map_err(|_| Error::Config {
            message: format!("HOST must be an IP address, got '{host}'"),
            key: Some("HOST".to_string()),
        })?;
        config.api.bind_address = SocketAddr::new(ip, port);

        if let Some(origins) = env_non_empty("CORS_ORIGINS") {
            config.api.cors_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        Ok(config)
    }

    /// Check that the settings needed to address the remote project are present.
    ///
    /// A missing token is not an error here: it degrades every remote call to
    /// [`Error::MissingCredentials`] instead.
    pub fn validate(&self) -> Result<()> {
        if self.remote.owner.trim().is_empty() {
            return Err(Error::Config {
                message: "repository owner is not set".to_string(),
                key: Some("REPO_OWNER".to_string()),
            });
        }
        if self.remote.repo.trim().is_empty() {
            return Err(Error::Config {
                message: "repository name is not set".to_string(),
                key: Some("REPO_NAME".to_string()),
            });
        }
        if self.remote.runs_page_size == 0 || self.remote.runs_page_size > 100 {
            return Err(Error::Config {
                message: format!(
                    "runs_page_size must be between 1 and 100, got {}",
                    self.remote.runs_page_size
                ),
                key: Some("runs_page_size".to_string()),
            });
        }
        url::Url::parse(&self.remote.api_base_url).map_err(|e| Error::Config {
            message: format!("invalid api_base_url '{}': {e}", self.remote.api_base_url),
            key: Some("GITHUB_API_URL".to_string()),
        })?;
        Ok(())
    }
}

/// Keep the first characters of a token for diagnostics, hide the rest
pub fn redact_token(token: &str) -> String {
    let prefix: String = token.chars().take(8).collect();
    format!("{prefix}...")
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn default_api_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_workflow() -> String {
    "build.yml".to_string()
}

fn default_git_ref() -> String {
    "main".to_string()
}

fn default_runs_page_size() -> u32 {
    20
}

fn default_icon_dir() -> String {
    "temp-icons".to_string()
}

fn default_user_agent() -> String {
    concat!("ipa-builder/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(10)
}

fn default_poll_max_interval() -> Duration {
    Duration::from_secs(30)
}

fn default_poll_multiplier() -> f64 {
    1.0
}

fn default_poll_attempts() -> u32 {
    60
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_max_body_bytes() -> usize {
    50 * 1024 * 1024
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
