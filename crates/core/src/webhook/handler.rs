//! Push-notification handling and channel lifecycle

use std::collections::HashMap;
use std::sync::Arc;

use busysync_domain::constants::{WEBHOOK_DAYS_BACK, WEBHOOK_DAYS_FORWARD};
use busysync_domain::types::webhook::{HEADER_CHANNEL_ID, HEADER_RESOURCE_ID, HEADER_RESOURCE_STATE};
use busysync_domain::{
    BusySyncError, MonitoredCalendar, Result, ResourceState, SubscriptionResult, SyncType, WebhookNotification,
    WebhookProcessingResult,
};
use chrono::{Duration, Utc};
use futures::future::join_all;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::sync::SyncEngine;

/// Prefix for channel ids this process registers.
pub const CHANNEL_ID_PREFIX: &str = "busysync";

/// Validates inbound notifications and feeds the notified calendar's recent
/// window through the sync engine.
pub struct WebhookHandler {
    engine: Arc<SyncEngine>,
    // calendar id -> owning account, built from the flows' sources
    calendar_accounts: HashMap<String, u32>,
    monitored: Vec<MonitoredCalendar>,
}

impl WebhookHandler {
    pub fn new(engine: Arc<SyncEngine>) -> Self {
        let mut calendar_accounts = HashMap::new();
        let mut monitored = Vec::new();
        for flow in engine.flows() {
            if calendar_accounts.contains_key(&flow.source_calendar_id) {
                continue;
            }
            calendar_accounts.insert(flow.source_calendar_id.clone(), flow.source_account_id);
            monitored.push(MonitoredCalendar {
                calendar_id: flow.source_calendar_id.clone(),
                account_id: flow.source_account_id,
                account_name: engine.registry().account_name(flow.source_account_id),
                flow_name: flow.name.clone(),
            });
        }

        info!(monitored_calendars = monitored.len(), "webhook handler initialised");
        Self { engine, calendar_accounts, monitored }
    }

    pub fn monitored_calendars(&self) -> &[MonitoredCalendar] {
        &self.monitored
    }

    pub fn is_monitored(&self, calendar_id: &str) -> bool {
        self.calendar_accounts.contains_key(calendar_id)
    }

    /// Owning account of a monitored calendar.
    pub fn account_for_calendar(&self, calendar_id: &str) -> Option<u32> {
        self.calendar_accounts.get(calendar_id).copied()
    }

    /// Process one notification. Never fails; problems are reported on the
    /// returned result.
    #[instrument(skip(self, notification), fields(
        channel_id = notification.channel_id.as_deref().unwrap_or_default(),
        resource_state = notification.resource_state.as_deref().unwrap_or_default(),
    ))]
    pub async fn handle_notification(
        &self,
        notification: &WebhookNotification,
    ) -> WebhookProcessingResult {
        let (Some(resource_id), Some(_channel_id), Some(state)) = (
            notification.resource_id.as_deref(),
            notification.channel_id.as_deref(),
            notification.resource_state.as_deref(),
        ) else {
            warn!("webhook notification missing required fields");
            return WebhookProcessingResult::failed(
                "Missing required fields: resourceId, channelId and resourceState",
            );
        };

        let state = match state.parse::<ResourceState>() {
            Ok(state) => state,
            Err(_) => {
                warn!(state, "unknown webhook resource state");
                return WebhookProcessingResult::failed(format!("Unknown resource state: {state}"));
            }
        };

        match state {
            ResourceState::Exists => {
                debug!("channel confirmation received");
                WebhookProcessingResult::succeeded(0, Vec::new())
            }
            ResourceState::Sync | ResourceState::Update => {
                let calendar_id = self.resolve_calendar(notification, resource_id);
                match self.account_for_calendar(&calendar_id) {
                    Some(account_id) => self.sync_recent_window(&calendar_id, account_id).await,
                    None => {
                        warn!(calendar_id = %calendar_id, "notification for unmapped calendar");
                        WebhookProcessingResult::failed(format!(
                            "No account found for calendar {calendar_id}"
                        ))
                    }
                }
            }
        }
    }

    async fn sync_recent_window(&self, calendar_id: &str, account_id: u32) -> WebhookProcessingResult {
        let now = Utc::now();
        let start = now - Duration::days(WEBHOOK_DAYS_BACK);
        let end = now + Duration::days(WEBHOOK_DAYS_FORWARD);

        let result = self
            .engine
            .sync_calendar_events(calendar_id, account_id, start, end, SyncType::Webhook)
            .await;

        let processed = result.events_processed;
        match result.error {
            Some(err) => WebhookProcessingResult {
                processed_events: processed,
                results: result.results,
                ..WebhookProcessingResult::failed(err)
            },
            None => {
                info!(calendar_id, account_id, processed_events = processed, "webhook sync finished");
                WebhookProcessingResult::succeeded(processed, result.results)
            }
        }
    }

    /// Prefer the calendar id embedded in the resource URI; fall back to the
    /// resource id when the URI is absent or names an unmonitored calendar.
    fn resolve_calendar(&self, notification: &WebhookNotification, resource_id: &str) -> String {
        notification
            .resource_uri
            .as_deref()
            .and_then(calendar_id_from_uri)
            .filter(|id| self.is_monitored(id))
            .unwrap_or_else(|| resource_id.to_string())
    }

    /// Header-level validation. Side-effect free.
    pub fn validate_headers(&self, headers: &HashMap<String, String>) -> std::result::Result<(), String> {
        let notification = WebhookNotification::from_headers(headers);

        let Some(channel_id) = notification.channel_id.as_deref() else {
            return Err(format!("Missing required header: {HEADER_CHANNEL_ID}"));
        };
        let Some(resource_id) = notification.resource_id.as_deref() else {
            return Err(format!("Missing required header: {HEADER_RESOURCE_ID}"));
        };
        let Some(state) = notification.resource_state.as_deref() else {
            return Err(format!("Missing required header: {HEADER_RESOURCE_STATE}"));
        };

        if state.parse::<ResourceState>().is_err() {
            return Err(format!("Invalid resource state: {state}"));
        }

        let calendar_id = self.resolve_calendar(&notification, resource_id);
        if !self.is_monitored(&calendar_id) {
            return Err(format!("Notification for non-monitored calendar: {calendar_id}"));
        }

        debug!(channel_id, calendar_id = %calendar_id, "webhook headers valid");
        Ok(())
    }

    /// Register a push channel with a freshly generated id.
    #[instrument(skip(self, callback_url, token))]
    pub async fn create_subscription(
        &self,
        calendar_id: &str,
        account_id: u32,
        callback_url: &str,
        token: Option<&str>,
    ) -> SubscriptionResult {
        let channel_id = format!("{CHANNEL_ID_PREFIX}-{}", Uuid::new_v4());
        let mut result = SubscriptionResult {
            calendar_id: calendar_id.to_string(),
            account_id,
            success: false,
            channel_id: None,
            resource_id: None,
            expiration: None,
            error: None,
        };

        let registered = match self.engine.registry().get_client(account_id).await {
            Ok(client) => {
                client.create_push_channel(calendar_id, callback_url, &channel_id, token).await
            }
            Err(err) => Err(err),
        };

        match registered {
            Ok(channel) => {
                info!(channel_id = %channel.channel_id, resource_id = %channel.resource_id, "push channel created");
                result.success = true;
                result.channel_id = Some(channel.channel_id);
                result.resource_id = Some(channel.resource_id);
                result.expiration = channel.expiration;
            }
            Err(err) => {
                warn!(error = %err, "failed to create push channel");
                result.error = Some(err.to_string());
            }
        }
        result
    }

    /// Stop a push channel. A channel that no longer exists counts as
    /// stopped. Without an account id the first monitored account is used.
    #[instrument(skip(self))]
    pub async fn delete_subscription(
        &self,
        channel_id: &str,
        resource_id: &str,
        account_id: Option<u32>,
    ) -> Result<bool> {
        let account_id = account_id
            .or_else(|| self.monitored.first().map(|m| m.account_id))
            .ok_or_else(|| BusySyncError::InvalidInput("no account available to stop channel".into()))?;

        let client = self.engine.registry().get_client(account_id).await?;
        let stopped = client.stop_push_channel(channel_id, resource_id).await?;
        if stopped {
            info!("push channel stopped");
        } else {
            debug!("push channel already gone");
        }
        Ok(true)
    }

    /// Create a channel for every monitored calendar.
    #[instrument(skip(self, token))]
    pub async fn setup_subscriptions(
        &self,
        callback_url: &str,
        token: Option<&str>,
    ) -> Vec<SubscriptionResult> {
        let results = join_all(self.monitored.iter().map(|calendar| {
            self.create_subscription(&calendar.calendar_id, calendar.account_id, callback_url, token)
        }))
        .await;

        let succeeded = results.iter().filter(|r| r.success).count();
        info!(total = results.len(), succeeded, "webhook subscriptions set up");
        results
    }
}

/// Extract the calendar id from a `.../calendars/{id}/events...` URI.
pub fn calendar_id_from_uri(uri: &str) -> Option<String> {
    let (_, rest) = uri.split_once("/calendars/")?;
    let encoded = rest.split(['/', '?']).next().filter(|s| !s.is_empty())?;
    urlencoding::decode(encoded).ok().map(|id| id.into_owned())
}
