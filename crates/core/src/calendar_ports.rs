//! Calendar backend port interfaces
//!
//! The core never talks HTTP. Every read and write against a calendar goes
//! through a [`CalendarClient`], one per account, built by a
//! [`CalendarClientFactory`]. All instants crossing this boundary are UTC.

use std::sync::Arc;

use async_trait::async_trait;
use busysync_domain::utils::time::truncate_to_minute;
use busysync_domain::{Account, CalendarInfo, NewEvent, PushChannel, RemoteEvent, Result};
use chrono::{DateTime, Duration, Utc};

/// Padding applied around an exact-match search so events whose bounds
/// drifted by seconds are still returned by the backend.
pub const EXACT_MATCH_SEARCH_PADDING_MINUTES: i64 = 60;

/// Authenticated operations against one account's calendars.
#[async_trait]
pub trait CalendarClient: Send + Sync {
    /// List calendars visible to the account.
    async fn list_calendars(&self) -> Result<Vec<CalendarInfo>>;

    /// List single (expanded) events overlapping `[start, end)`.
    async fn get_events(
        &self,
        calendar_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RemoteEvent>>;

    async fn create_event(&self, calendar_id: &str, event: &NewEvent) -> Result<RemoteEvent>;

    /// Returns `false` when the event was already gone.
    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<bool>;

    /// Live events whose title matches case-insensitively and whose bounds
    /// equal `start`/`end` at minute precision. Cancelled events never match.
    async fn find_events_by_time_and_title(
        &self,
        calendar_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        title: &str,
    ) -> Result<Vec<RemoteEvent>> {
        let padding = Duration::minutes(EXACT_MATCH_SEARCH_PADDING_MINUTES);
        let candidates = self.get_events(calendar_id, start - padding, end + padding).await?;

        let (start, end) = (truncate_to_minute(start), truncate_to_minute(end));
        Ok(candidates
            .into_iter()
            .filter(|event| {
                !event.status.is_cancelled()
                    && event.title.eq_ignore_ascii_case(title)
                    && truncate_to_minute(event.start_time) == start
                    && truncate_to_minute(event.end_time) == end
            })
            .collect())
    }

    /// Register a push-notification channel for a calendar.
    async fn create_push_channel(
        &self,
        calendar_id: &str,
        webhook_url: &str,
        channel_id: &str,
        token: Option<&str>,
    ) -> Result<PushChannel>;

    /// Returns `false` when the channel was not found.
    async fn stop_push_channel(&self, channel_id: &str, resource_id: &str) -> Result<bool>;

    async fn test_connection(&self) -> bool {
        self.list_calendars().await.is_ok()
    }
}

/// Builds a client for an account. Construction must not perform network
/// I/O; the registry probes connectivity itself.
#[async_trait]
pub trait CalendarClientFactory: Send + Sync {
    async fn create_client(&self, account: &Account) -> Result<Arc<dyn CalendarClient>>;
}
