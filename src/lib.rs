//! # ipa-builder
//!
//! Asynchronous build-job engine on top of a remote CI system.
//!
//! A client submits an app name, a website URL and an icon. The icon is
//! committed to the CI repository, a parameterized workflow run is dispatched,
//! and the run is tracked through the artifacts it produces: the artifact name
//! embeds the JobId, which is the only correlation between a submission and
//! its run. Finished archives are streamed back through an authenticated proxy.
//!
//! ## Components
//!
//! - [`uploader::ArtifactUploader`] stores the icon with create-or-update semantics
//! - [`submitter::JobSubmitter`] validates, uploads and dispatches
//! - [`reconciler::StatusReconciler`] maps runs and artifacts to a [`ClientStatus`]
//! - [`proxy::ArtifactProxy`] streams archives
//!
//! All of them talk to the remote through the [`remote::RemoteCi`] trait;
//! [`BuildService`] wires them to one client.
//!
//! ## Quick Start
//!
//! ```no_run
//! use ipa_builder::{BuildService, Config, JobRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.remote.token = Some("ghp_...".to_string());
//!     config.remote.owner = "acme".to_string();
//!     config.remote.repo = "app-builds".to_string();
//!
//!     let service = BuildService::new(config)?;
//!
//!     let icon = std::fs::read("icon.png")?;
//!     let job_id = service
//!         .submit_job(&JobRequest::new("Demo", "https://example.com", icon))
//!         .await?;
//!
//!     let status = service.wait_for_build(&job_id).await?;
//!     if let Some(artifact) = status.artifact {
//!         let _archive = service.download_artifact(artifact.id).await?;
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Caller-side polling until a job resolves
pub mod poller;
/// Artifact download proxy
pub mod proxy;
/// Status reconciliation
pub mod reconciler;
/// Remote CI boundary and GitHub client
pub mod remote;
/// Retry logic with exponential backoff
pub mod retry;
/// Build service facade
pub mod service;
/// Job submission
pub mod submitter;
/// Core types
pub mod types;
/// Icon upload
pub mod uploader;

// Re-export commonly used types
pub use config::{Config, PollConfig, RemoteConfig, RetryConfig};
pub use error::{ApiError, Error, ErrorDetail, Result, ToHttpStatus};
pub use proxy::ArtifactDownload;
pub use remote::{GitHubClient, RemoteCi};
pub use retry::RetryingRemote;
pub use service::BuildService;
pub use types::{ArtifactHandle, BuildStatus, ClientStatus, JobId, JobRequest};

/// Resolves once the process is asked to terminate.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// Meant as the shutdown future of [`api::start_api_server`].
#[cfg(unix)]
pub async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), _) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            if let Ok(mut sigint) = signal(SignalKind::interrupt()) {
                sigint.recv().await;
                tracing::info!("Received SIGINT signal (Ctrl+C)");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
        (_, Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            if let Ok(mut sigterm) = signal(SignalKind::terminate()) {
                sigterm.recv().await;
                tracing::info!("Received SIGTERM signal");
            } else {
                tracing::error!("Could not register any signal handlers, using ctrl_c fallback");
                tokio::signal::ctrl_c().await.ok();
            }
        }
    }
}

/// Resolves once the process is asked to terminate (Ctrl+C).
#[cfg(not(unix))]
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
