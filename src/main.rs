use ipa_builder::config::redact_token;
use ipa_builder::{BuildService, Config};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ipa_builder=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "invalid configuration");
        return Err(e.into());
    }

    match config.remote.token.as_deref() {
        Some(token) if !token.is_empty() => {
            tracing::info!(token = %redact_token(token), "GitHub token configured");
        }
        _ => tracing::warn!("GITHUB_TOKEN is not set; every build request will fail"),
    }
    tracing::info!(
        repository = %config.remote.repo_slug(),
        workflow = %config.remote.workflow,
        "remote CI configured"
    );

    let service = Arc::new(BuildService::new(config.clone())?);
    ipa_builder::api::start_api_server(service, Arc::new(config), ipa_builder::shutdown_signal())
        .await?;

    Ok(())
}
