//! Push-notification payloads and their processing results

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::WEBHOOK_TYPE_GOOGLE_CALENDAR;
use crate::impl_domain_status_conversions;
use crate::types::ProcessingResult;

pub const HEADER_CHANNEL_ID: &str = "x-goog-channel-id";
pub const HEADER_RESOURCE_ID: &str = "x-goog-resource-id";
pub const HEADER_RESOURCE_STATE: &str = "x-goog-resource-state";
pub const HEADER_RESOURCE_URI: &str = "x-goog-resource-uri";
pub const HEADER_CHANNEL_TOKEN: &str = "x-goog-channel-token";
pub const HEADER_CHANNEL_EXPIRATION: &str = "x-goog-channel-expiration";
pub const HEADER_MESSAGE_NUMBER: &str = "x-goog-message-number";

/// `resourceState` values a push channel can deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceState {
    /// Initial confirmation sent when the channel is created.
    Exists,
    Sync,
    Update,
}

impl_domain_status_conversions!(ResourceState {
    Exists => "exists",
    Sync => "sync",
    Update => "update",
});

/// An inbound notification, as received. Validation happens in the handler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookNotification {
    pub resource_id: Option<String>,
    pub channel_id: Option<String>,
    pub resource_state: Option<String>,
    pub resource_uri: Option<String>,
    pub channel_token: Option<String>,
    pub channel_expiration: Option<String>,
    pub message_number: Option<String>,
}

impl WebhookNotification {
    pub fn new(
        resource_id: impl Into<String>,
        channel_id: impl Into<String>,
        resource_state: impl Into<String>,
    ) -> Self {
        Self {
            resource_id: Some(resource_id.into()),
            channel_id: Some(channel_id.into()),
            resource_state: Some(resource_state.into()),
            ..Self::default()
        }
    }

    /// Build a notification from HTTP headers, matching names
    /// case-insensitively.
    pub fn from_headers(headers: &HashMap<String, String>) -> Self {
        let lookup = |name: &str| {
            headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        Self {
            resource_id: lookup(HEADER_RESOURCE_ID),
            channel_id: lookup(HEADER_CHANNEL_ID),
            resource_state: lookup(HEADER_RESOURCE_STATE),
            resource_uri: lookup(HEADER_RESOURCE_URI),
            channel_token: lookup(HEADER_CHANNEL_TOKEN),
            channel_expiration: lookup(HEADER_CHANNEL_EXPIRATION),
            message_number: lookup(HEADER_MESSAGE_NUMBER),
        }
    }
}

/// Result returned to the HTTP layer for one notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookProcessingResult {
    pub success: bool,
    pub webhook_type: String,
    pub processed_events: usize,
    pub results: Vec<ProcessingResult>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl WebhookProcessingResult {
    pub fn succeeded(processed_events: usize, results: Vec<ProcessingResult>) -> Self {
        Self {
            success: true,
            webhook_type: WEBHOOK_TYPE_GOOGLE_CALENDAR.to_string(),
            processed_events,
            results,
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            webhook_type: WEBHOOK_TYPE_GOOGLE_CALENDAR.to_string(),
            processed_events: 0,
            results: Vec::new(),
            error: Some(error.into()),
            timestamp: Utc::now(),
        }
    }
}

/// A source calendar the webhook handler accepts notifications for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoredCalendar {
    pub calendar_id: String,
    pub account_id: u32,
    pub account_name: Option<String>,
    pub flow_name: String,
}

/// Outcome of registering a push channel for one calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionResult {
    pub calendar_id: String,
    pub account_id: u32,
    pub success: bool,
    pub channel_id: Option<String>,
    pub resource_id: Option<String>,
    pub expiration: Option<DateTime<Utc>>,
    pub error: Option<String>,
}
