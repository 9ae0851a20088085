//! BusySync - busy-block synchronisation service
//!
//! Main entry point: loads configuration, starts the polling scheduler and
//! serves the webhook endpoint until Ctrl-C.

use std::sync::Arc;

use anyhow::Context as _;
use busysync_api::http::{self, HttpServer};
use busysync_api::utils::logging::init_tracing;
use busysync_api::{commands, AppContext, ServerSettings};
use busysync_infra::{config, GoogleClientConfig, GoogleClientFactory};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before tracing so RUST_LOG from the file applies
    let dotenv = dotenvy::dotenv();
    init_tracing();
    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(err) => info!(error = %err, "no .env file loaded"),
    }

    info!(version = env!("CARGO_PKG_VERSION"), "BusySync starting");

    let sync_config = config::load().context("invalid configuration")?;
    let settings = ServerSettings::from_env().context("invalid server settings")?;
    info!(?settings, "server settings loaded");

    let factory = GoogleClientFactory::new(GoogleClientConfig::default())
        .context("failed to build calendar client factory")?;
    let ctx = Arc::new(
        AppContext::new(sync_config, Arc::new(factory))
            .context("failed to initialise services")?
            .with_channel_token(settings.channel_token.clone()),
    );

    ctx.start().await.context("failed to start polling scheduler")?;

    let server = HttpServer::start(settings.bind_addr, http::router(Arc::clone(&ctx), settings.api_key.clone()))
        .await
        .context("failed to start HTTP server")?;

    if let Some(base_url) = ctx.config.webhook_base_url.clone() {
        match commands::setup_webhook_subscriptions(&ctx, &base_url).await {
            Ok(results) => {
                let failed = results.iter().filter(|r| !r.success).count();
                info!(total = results.len(), failed, "webhook subscriptions registered");
            }
            Err(err) => warn!(error = %err, "webhook subscription setup failed"),
        }
    } else {
        info!("WEBHOOK_BASE_URL not set; relying on polling only");
    }

    info!(addr = %server.local_addr(), "BusySync initialized successfully");

    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to listen for shutdown signal");
    }
    info!("shutdown signal received");

    if let Err(err) = server.shutdown().await {
        error!(error = %err, "HTTP server did not shut down cleanly");
    }
    ctx.shutdown().await.context("failed to stop services")?;

    info!("BusySync stopped");
    Ok(())
}
