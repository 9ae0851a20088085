//! Push-notification ingestion and channel registration commands

use std::collections::HashMap;
use std::time::Instant;

use busysync_domain::{SubscriptionResult, WebhookNotification, WebhookProcessingResult};
use tracing::{info, warn};
use url::Url;

use crate::commands::{CommandError, CommandResult};
use crate::context::AppContext;
use crate::utils::command_helpers::execute_command;
use crate::utils::logging::log_command_execution;

/// Path the notification endpoint is served on, relative to the public base
/// URL.
pub const WEBHOOK_PATH: &str = "/webhooks/google-calendar";

/// Process one inbound notification given its HTTP headers.
///
/// Never fails: malformed headers, notifications for calendars nobody
/// syncs and token mismatches come back as `success = false` with the
/// reason in `error`.
pub async fn handle_webhook_notification(
    ctx: &AppContext,
    headers: &HashMap<String, String>,
) -> WebhookProcessingResult {
    let start = Instant::now();
    let result = process_notification(ctx, headers).await;
    log_command_execution("webhook::handle_webhook_notification", start.elapsed(), result.success);
    result
}

async fn process_notification(
    ctx: &AppContext,
    headers: &HashMap<String, String>,
) -> WebhookProcessingResult {
    if let Err(reason) = ctx.webhook_handler.validate_headers(headers) {
        warn!(reason = %reason, "rejected webhook notification");
        return WebhookProcessingResult::failed(reason);
    }

    let notification = WebhookNotification::from_headers(headers);
    if let Some(expected) = ctx.channel_token() {
        if notification.channel_token.as_deref() != Some(expected) {
            warn!(
                channel_id = notification.channel_id.as_deref().unwrap_or_default(),
                "webhook channel token mismatch"
            );
            return WebhookProcessingResult::failed("Invalid channel token");
        }
    }

    ctx.webhook_handler.handle_notification(&notification).await
}

/// Full notification URL for a public base URL.
///
/// # Errors
///
/// `invalid_input` unless `base_url` is an absolute http(s) URL.
pub fn webhook_callback_url(base_url: &str) -> CommandResult<String> {
    let parsed = Url::parse(base_url.trim()).map_err(|err| {
        CommandError::invalid_input(format!("invalid webhook base URL '{base_url}': {err}"))
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(CommandError::invalid_input(format!(
            "webhook base URL must use http or https, got '{}'",
            parsed.scheme()
        )));
    }
    Ok(format!("{}{WEBHOOK_PATH}", parsed.as_str().trim_end_matches('/')))
}

/// Register a push channel for every monitored calendar.
///
/// One result per calendar; a calendar that fails does not stop the
/// others.
pub async fn setup_webhook_subscriptions(
    ctx: &AppContext,
    callback_base_url: &str,
) -> CommandResult<Vec<SubscriptionResult>> {
    let callback_url = webhook_callback_url(callback_base_url)?;
    execute_command("webhook::setup_webhook_subscriptions", || async {
        info!(callback_url = %callback_url, "setting up webhook subscriptions");
        Ok(ctx.webhook_handler.setup_subscriptions(&callback_url, ctx.channel_token()).await)
    })
    .await
}
