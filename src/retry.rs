//! Retry logic with exponential backoff
//!
//! [`retry_with_backoff`] retries an async operation on transient failures,
//! with exponential backoff and optional jitter to prevent thundering herd.
//! [`RetryingRemote`] applies it to the calls of a [`RemoteCi`], so the
//! components stay free of rate-limit handling. Reads are retried on any
//! transient failure; writes only when the remote never acted on them.
//!
//! # Example
//!
//! ```no_run
//! use ipa_builder::config::{RemoteConfig, RetryConfig};
//! use ipa_builder::remote::GitHubClient;
//! use ipa_builder::retry::RetryingRemote;
//! use std::sync::Arc;
//!
//! # fn example() -> ipa_builder::Result<()> {
//! let github = GitHubClient::new(Arc::new(RemoteConfig::default()))?;
//! let remote = RetryingRemote::new(github, RetryConfig::default());
//! # let _ = remote;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::Error;
use crate::remote::{PutContents, RemoteCi, RemoteDownload, RemoteReply, WorkflowDispatch};
use crate::types::StoragePath;
use async_trait::async_trait;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (timeouts, connection resets, 429/5xx replies) return `true`.
/// Permanent failures (missing credentials, rejected input) return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            Error::Network(e) => e.is_timeout() || e.is_connect(),
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::NotConnected
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::Interrupted
            ),
            // 429 / 5xx
            Error::RemoteUnavailable { .. } => true,
            Error::Validation { .. }
            | Error::PayloadTooLarge { .. }
            | Error::Config { .. }
            | Error::MissingCredentials
            | Error::UploadFailed { .. }
            | Error::DispatchFailed { .. }
            | Error::DownloadFailed { .. }
            | Error::Reconciliation(_)
            | Error::PollTimeout { .. }
            | Error::Serialization(_)
            | Error::ApiServerError(_) => false,
        }
    }
}

/// Execute an async operation with exponential backoff retry logic
///
/// Returns the successful result or the last error after all retry attempts
/// are exhausted. `config.max_attempts` counts retries, so the operation runs
/// at most `max_attempts + 1` times.
pub async fn retry_with_backoff<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut attempt = 0;
    let mut delay = config.initial_delay;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!(attempts = attempt + 1, "Operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < config.max_attempts => {
                attempt += 1;

                tracing::warn!(
                    error = %e,
                    attempt = attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis(),
                    "Operation failed, retrying"
                );

                let jittered_delay = if config.jitter {
                    add_jitter(delay)
                } else {
                    delay
                };

                tokio::time::sleep(jittered_delay).await;

                delay = scale_delay(delay, config.backoff_multiplier, config.max_delay);
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::error!(
                        error = %e,
                        attempts = attempt + 1,
                        "Operation failed after all retry attempts exhausted"
                    );
                } else {
                    tracing::debug!(error = %e, "Operation failed with non-retryable error");
                }
                return Err(e);
            }
        }
    }
}

/// Multiply `delay` by `multiplier`, capped at `max`
///
/// Products too large for a [`Duration`] saturate to `max`.
pub(crate) fn scale_delay(delay: Duration, multiplier: f64, max: Duration) -> Duration {
    Duration::try_from_secs_f64(delay.as_secs_f64() * multiplier)
        .unwrap_or(max)
        .min(max)
}

/// Add random jitter to a delay to prevent thundering herd
///
/// The actual delay will be between `delay` and `2 * delay`.
fn add_jitter(delay: Duration) -> Duration {
    let mut rng = rand::thread_rng();
    let jitter_factor: f64 = rng.gen_range(0.0..=1.0);
    let jittered_secs = delay.as_secs_f64() * (1.0 + jitter_factor);
    Duration::try_from_secs_f64(jittered_secs).unwrap_or(delay)
}

/// Failure of a non-idempotent call
///
/// A 5xx reply or a timeout may arrive after the remote already applied the
/// write, so only a 429 reply or a refused connection is retried.
struct WriteFailure(Error);

impl IsRetryable for WriteFailure {
    fn is_retryable(&self) -> bool {
        match &self.0 {
            Error::RemoteUnavailable { status, .. } => *status == 429,
            Error::Network(e) => e.is_connect(),
            Error::Io(e) => e.kind() == std::io::ErrorKind::ConnectionRefused,
            _ => false,
        }
    }
}

impl std::fmt::Display for WriteFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(&self.0, f)
    }
}

/// [`RemoteCi`] decorator that retries transient failures
///
/// Reads (`get_contents`, `list_runs`, `list_artifacts`, `download_artifact`)
/// are retried on transport errors per [`IsRetryable`] and on 429/5xx
/// replies. Writes (`put_contents`, `dispatch_workflow`) are retried only
/// when rejected with 429 or when the connection was refused. Once attempts
/// run out the last transient reply is handed back unchanged so the calling
/// component applies its own error mapping.
pub struct RetryingRemote<R> {
    inner: R,
    config: RetryConfig,
}

impl<R: RemoteCi> RetryingRemote<R> {
    /// Wrap `inner` with the given retry policy
    pub fn new(inner: R, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    /// The wrapped client
    pub fn inner(&self) -> &R {
        &self.inner
    }

    async fn with_retry<F, Fut>(&self, mut call: F) -> crate::Result<RemoteReply>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = crate::Result<RemoteReply>>,
    {
        let result = retry_with_backoff(&self.config, || {
            let pending = call();
            async move {
                match pending.await {
                    Ok(reply) if reply.is_transient() => Err(Error::RemoteUnavailable {
                        status: reply.status,
                        body: reply.body,
                    }),
                    other => other,
                }
            }
        })
        .await;

        match result {
            Err(Error::RemoteUnavailable { status, body }) => Ok(RemoteReply { status, body }),
            other => other,
        }
    }

    async fn with_write_retry<F, Fut>(&self, mut call: F) -> crate::Result<RemoteReply>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = crate::Result<RemoteReply>>,
    {
        let result = retry_with_backoff(&self.config, || {
            let pending = call();
            async move {
                match pending.await {
                    Ok(reply) if reply.status == 429 => Err(WriteFailure(Error::RemoteUnavailable {
                        status: reply.status,
                        body: reply.body,
                    })),
                    Ok(reply) => Ok(reply),
                    Err(e) => Err(WriteFailure(e)),
                }
            }
        })
        .await;

        match result {
            Ok(reply) => Ok(reply),
            Err(WriteFailure(Error::RemoteUnavailable { status, body })) => {
                Ok(RemoteReply { status, body })
            }
            Err(WriteFailure(e)) => Err(e),
        }
    }
}

#[async_trait]
impl<R: RemoteCi> RemoteCi for RetryingRemote<R> {
    async fn get_contents(&self, path: &StoragePath) -> crate::Result<RemoteReply> {
        self.with_retry(|| self.inner.get_contents(path)).await
    }

    async fn put_contents(
        &self,
        path: &StoragePath,
        body: &PutContents,
    ) -> crate::Result<RemoteReply> {
        self.with_write_retry(|| self.inner.put_contents(path, body))
            .await
    }

    async fn dispatch_workflow(&self, body: &WorkflowDispatch) -> crate::Result<RemoteReply> {
        self.with_write_retry(|| self.inner.dispatch_workflow(body))
            .await
    }

    async fn list_runs(&self, per_page: u32) -> crate::Result<RemoteReply> {
        self.with_retry(|| self.inner.list_runs(per_page)).await
    }

    async fn list_artifacts(&self, artifacts_url: &str) -> crate::Result<RemoteReply> {
        self.with_retry(|| self.inner.list_artifacts(artifacts_url))
            .await
    }

    async fn download_artifact(&self, artifact_id: u64) -> crate::Result<RemoteDownload> {
        // Only the initial response is retried; a stream that fails midway is not resumed.
        let result = retry_with_backoff(&self.config, || async {
            let download = self.inner.download_artifact(artifact_id).await?;
            if download.status == 429 || (500..600).contains(&download.status) {
                let status = download.status;
                let body = download.into_text().await;
                return Err(Error::RemoteUnavailable { status, body });
            }
            Ok(download)
        })
        .await;

        match result {
            Err(Error::RemoteUnavailable { status, body }) => {
                Ok(RemoteDownload::from_bytes(status, body))
            }
            other => other,
        }
    }
}
