//! Google Calendar v3 implementation of the calendar client port

use std::time::Duration;

use async_trait::async_trait;
use busysync_common::resilience::{
    RateLimiter, RateLimiterConfig, RetryConfig, RetryDecision, RetryError, RetryExecutor,
    RetryPolicy,
};
use busysync_core::CalendarClient;
use busysync_domain::{
    Account, BusySyncError, CalendarInfo, NewEvent, PushChannel, RemoteEvent, Result,
};
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

use super::auth::TokenProvider;
use super::types::{
    CalendarListResponse, ChannelResponse, EventInsert, EventsResponse, StopChannelRequest,
    WatchRequest,
};
use crate::errors::{status_error, InfraError};

pub const GOOGLE_CALENDAR_API_BASE: &str = "https://www.googleapis.com/calendar/v3";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Settings shared by every Google client.
#[derive(Debug, Clone)]
pub struct GoogleClientConfig {
    pub api_base_url: String,
    pub token_url: String,
    pub request_timeout: Duration,
    pub retry: RetryConfig,
    /// Per-account request budget.
    pub requests_per_second: u32,
}

impl Default for GoogleClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: GOOGLE_CALENDAR_API_BASE.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            retry: RetryConfig::default(),
            requests_per_second: 10,
        }
    }
}

impl GoogleClientConfig {
    /// Point both the API and the token endpoint somewhere else.
    pub fn with_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            api_base_url: format!("{base}/calendar/v3"),
            token_url: format!("{base}/token"),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

/// Retries only the transient failure class.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryableErrorPolicy;

impl RetryPolicy<BusySyncError> for RetryableErrorPolicy {
    fn should_retry(&self, error: &BusySyncError, _attempt: u32) -> RetryDecision {
        if error.is_retryable() {
            RetryDecision::Retry
        } else {
            RetryDecision::Stop
        }
    }
}

/// Flatten a retry failure back into the error that caused it.
fn flatten_retry(err: RetryError<BusySyncError>) -> BusySyncError {
    match err {
        RetryError::InvalidConfiguration { message } => {
            BusySyncError::Internal(format!("invalid retry configuration: {message}"))
        }
        RetryError::TimeoutExceeded { elapsed, last_error: None } => {
            BusySyncError::TransientApi(format!("retry budget exhausted after {elapsed:?}"))
        }
        other => other
            .into_last_error()
            .unwrap_or_else(|| BusySyncError::Internal("retry failed without an error".into())),
    }
}

/// Authenticated, rate-limited, retrying client for one Google account.
pub struct GoogleCalendarClient {
    http: Client,
    api_base_url: String,
    account_id: u32,
    tokens: TokenProvider,
    limiter: RateLimiter,
    retry: RetryExecutor<RetryableErrorPolicy>,
}

impl GoogleCalendarClient {
    pub fn new(http: Client, config: &GoogleClientConfig, account: &Account) -> Result<Self> {
        let limiter = RateLimiter::new(RateLimiterConfig::per_second(config.requests_per_second))
            .map_err(|err| BusySyncError::Config(format!("invalid rate limit: {err}")))?;
        Ok(Self {
            tokens: TokenProvider::new(http.clone(), config.token_url.clone(), account),
            http,
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            account_id: account.account_id,
            limiter,
            retry: RetryExecutor::new(config.retry.clone(), RetryableErrorPolicy),
        })
    }

    pub const fn account_id(&self) -> u32 {
        self.account_id
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base_url, path)
    }

    fn events_url(&self, calendar_id: &str) -> String {
        self.url(&format!("/calendars/{}/events", urlencoding::encode(calendar_id)))
    }

    /// Send a request with retries. Non-success statuses become typed errors.
    async fn send<F>(&self, build: F) -> Result<Response>
    where
        F: Fn(&Client) -> RequestBuilder + Send + Sync,
    {
        self.retry.execute(|| self.attempt(&build)).await.map_err(flatten_retry)
    }

    /// One attempt. A 401 refreshes the token and resends once.
    async fn attempt<F>(&self, build: &F) -> Result<Response>
    where
        F: Fn(&Client) -> RequestBuilder + Send + Sync,
    {
        let mut refreshed = false;
        loop {
            self.limiter.acquire().await;
            let token = self.tokens.access_token().await?;
            let response =
                build(&self.http).bearer_auth(token).send().await.map_err(InfraError::from)?;

            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }
            if status == StatusCode::UNAUTHORIZED && !refreshed {
                debug!(account_id = self.account_id, "access token rejected, refreshing");
                self.tokens.invalidate().await;
                refreshed = true;
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }
    }

    async fn send_json<T, F>(&self, build: F) -> Result<T>
    where
        T: DeserializeOwned,
        F: Fn(&Client) -> RequestBuilder + Send + Sync,
    {
        let response = self.send(build).await?;
        Ok(response.json::<T>().await.map_err(InfraError::from)?)
    }
}

fn rfc3339(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[async_trait]
impl CalendarClient for GoogleCalendarClient {
    #[instrument(skip(self), fields(account_id = self.account_id))]
    async fn list_calendars(&self) -> Result<Vec<CalendarInfo>> {
        let url = self.url("/users/me/calendarList");
        let mut calendars = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page: CalendarListResponse = self
                .send_json(|http| {
                    let request = http.get(&url);
                    match &page_token {
                        Some(token) => request.query(&[("pageToken", token.as_str())]),
                        None => request,
                    }
                })
                .await?;
            calendars.extend(page.items.into_iter().map(CalendarInfo::from));
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(count = calendars.len(), "calendars listed");
        Ok(calendars)
    }

    #[instrument(skip(self), fields(account_id = self.account_id))]
    async fn get_events(
        &self,
        calendar_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RemoteEvent>> {
        let url = self.events_url(calendar_id);
        let (time_min, time_max) = (rfc3339(start), rfc3339(end));
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page: EventsResponse = self
                .send_json(|http| {
                    let mut query = vec![
                        ("timeMin", time_min.as_str()),
                        ("timeMax", time_max.as_str()),
                        ("singleEvents", "true"),
                        ("orderBy", "startTime"),
                        // cancelled events are how deletions reach the engine
                        ("showDeleted", "true"),
                    ];
                    if let Some(token) = &page_token {
                        query.push(("pageToken", token.as_str()));
                    }
                    http.get(&url).query(&query)
                })
                .await?;

            for item in page.items {
                match item.into_remote() {
                    Ok(event) => events.push(event),
                    Err(err) => warn!(calendar_id, error = %err, "skipping unreadable event"),
                }
            }
            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(calendar_id, count = events.len(), "events fetched");
        Ok(events)
    }

    #[instrument(skip(self, event), fields(account_id = self.account_id))]
    async fn create_event(&self, calendar_id: &str, event: &NewEvent) -> Result<RemoteEvent> {
        let url = self.events_url(calendar_id);
        let body = EventInsert::from(event);
        let created: super::types::GoogleEvent =
            self.send_json(|http| http.post(&url).json(&body)).await?;
        created.into_remote()
    }

    #[instrument(skip(self), fields(account_id = self.account_id))]
    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<bool> {
        let url = format!("{}/{}", self.events_url(calendar_id), urlencoding::encode(event_id));
        match self.send(|http| http.delete(&url)).await {
            Ok(_) => Ok(true),
            Err(BusySyncError::NotFound(_)) => {
                debug!(calendar_id, event_id, "event already deleted");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    #[instrument(skip(self, webhook_url, token), fields(account_id = self.account_id))]
    async fn create_push_channel(
        &self,
        calendar_id: &str,
        webhook_url: &str,
        channel_id: &str,
        token: Option<&str>,
    ) -> Result<PushChannel> {
        let url = format!("{}/watch", self.events_url(calendar_id));
        let body = WatchRequest { id: channel_id, kind: "web_hook", address: webhook_url, token };
        let channel: ChannelResponse = self.send_json(|http| http.post(&url).json(&body)).await?;
        Ok(channel.into_channel(calendar_id))
    }

    #[instrument(skip(self), fields(account_id = self.account_id))]
    async fn stop_push_channel(&self, channel_id: &str, resource_id: &str) -> Result<bool> {
        let url = self.url("/channels/stop");
        let body = StopChannelRequest { id: channel_id, resource_id };
        match self.send(|http| http.post(&url).json(&body)).await {
            Ok(_) => Ok(true),
            Err(BusySyncError::NotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }
}
