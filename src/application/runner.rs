//! Process entry point: configuration, logging, wiring, one run

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use crate::application::session_authenticator::SessionAuthenticator;
use crate::application::sync_engine::{RunOutcome, SyncEngine};
use crate::application::validated_config::ValidatedSyncConfig;
use crate::domain::errors::SyncError;
use crate::infrastructure::{
    ConfigManager, HttpClient, HttpFormBrowser, JsonCursorStore, PortalClient, WebhookClient,
    init_logging_with_config,
};

/// Load configuration, execute one sync run, and report how it ended
pub async fn run() -> Result<RunOutcome> {
    let manager = ConfigManager::new();
    let config = manager.load_config().map_err(SyncError::from)?;
    init_logging_with_config(&config.logging)?;
    if let Some(path) = manager.config_path() {
        tracing::debug!(path = %path.display(), "Configuration file location");
    }

    let validated = ValidatedSyncConfig::from_app_config(&config).map_err(SyncError::from)?;
    validated.log_config();

    let cancellation = CancellationToken::new();
    let watcher = {
        let token = cancellation.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("🛑 Interrupt received, cancelling sync run");
                token.cancel();
            }
        })
    };

    let portal_http = HttpClient::new(validated.http.clone(), cancellation.clone())
        .context("failed to build portal HTTP client")?;
    let webhook_http = HttpClient::new(validated.webhook_http.clone(), cancellation.clone())
        .context("failed to build webhook HTTP client")?;
    let mut browser =
        HttpFormBrowser::new(&validated.http).context("failed to build browser context")?;

    let engine = SyncEngine::new(
        Arc::new(JsonCursorStore::new(validated.cursor_path.clone())),
        Arc::new(PortalClient::new(Arc::new(portal_http), validated.portal_settings())),
        Arc::new(WebhookClient::new(
            Arc::new(webhook_http),
            validated.webhook_url.clone(),
        )),
        SessionAuthenticator::new(validated.auth.clone()),
        validated.engine_settings(),
        cancellation,
    );

    let today = chrono::Local::now().date_naive();
    let outcome = engine.run(&mut browser, &validated.credentials, today).await;
    watcher.abort();

    let outcome = outcome?;
    match &outcome {
        RunOutcome::Delivered { count, watermark } => tracing::info!(
            count,
            watermark = watermark.as_ref().map_or("unchanged", |w| w.as_str()),
            "✅ Delivered new leads"
        ),
        RunOutcome::NothingNew => tracing::info!("✅ No new leads since last run"),
    }
    Ok(outcome)
}
