//! In-memory calendar backend for tests
//!
//! [`InMemoryCalendar`] implements [`CalendarClient`] over a map of
//! calendars, records every mutation and can be told to fail per calendar.
//! [`InMemoryClientFactory`] hands out one shared instance per account.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use busysync_domain::{
    Account, BusySyncError, CalendarInfo, NewEvent, PushChannel, RemoteEvent, Result,
};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::calendar_ports::{CalendarClient, CalendarClientFactory};

/// A calendar backend kept entirely in memory.
#[derive(Debug, Default)]
pub struct InMemoryCalendar {
    calendars: Mutex<BTreeMap<String, Vec<RemoteEvent>>>,
    channels: Mutex<HashMap<String, PushChannel>>,
    failing_calendars: Mutex<HashSet<String>>,
    connection_failure: AtomicBool,
    latency: Mutex<Option<Duration>>,
    next_id: AtomicU64,
    creates: AtomicUsize,
    deletes: AtomicUsize,
}

impl InMemoryCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_calendars<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let calendar = Self::new();
        for id in ids {
            calendar.add_calendar(id);
        }
        calendar
    }

    pub fn add_calendar(&self, calendar_id: impl Into<String>) {
        self.calendars.lock().entry(calendar_id.into()).or_default();
    }

    /// Seed an event without counting it as a create.
    pub fn insert_event(&self, calendar_id: &str, event: RemoteEvent) {
        self.calendars.lock().entry(calendar_id.to_string()).or_default().push(event);
    }

    pub fn events(&self, calendar_id: &str) -> Vec<RemoteEvent> {
        self.calendars.lock().get(calendar_id).cloned().unwrap_or_default()
    }

    /// Events titled "Busy" in any casing.
    pub fn busy_events(&self, calendar_id: &str) -> Vec<RemoteEvent> {
        self.events(calendar_id)
            .into_iter()
            .filter(|e| e.title.eq_ignore_ascii_case(busysync_domain::constants::BUSY_BLOCK_TITLE))
            .collect()
    }

    /// Make every call touching `calendar_id` fail with a server error.
    pub fn fail_calendar(&self, calendar_id: &str) {
        self.failing_calendars.lock().insert(calendar_id.to_string());
    }

    pub fn heal_calendar(&self, calendar_id: &str) {
        self.failing_calendars.lock().remove(calendar_id);
    }

    /// Make `list_calendars` (the connectivity probe) fail.
    pub fn set_connection_failure(&self, failing: bool) {
        self.connection_failure.store(failing, Ordering::SeqCst);
    }

    /// Delay every event listing by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = Some(latency);
    }

    pub fn create_calls(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn channels(&self) -> Vec<PushChannel> {
        self.channels.lock().values().cloned().collect()
    }

    fn check(&self, calendar_id: &str) -> Result<()> {
        if self.failing_calendars.lock().contains(calendar_id) {
            return Err(BusySyncError::TransientApi(format!(
                "calendar {calendar_id} is unavailable"
            )));
        }
        Ok(())
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[async_trait]
impl CalendarClient for InMemoryCalendar {
    async fn list_calendars(&self) -> Result<Vec<CalendarInfo>> {
        if self.connection_failure.load(Ordering::SeqCst) {
            return Err(BusySyncError::TransientApi("connection refused".into()));
        }
        Ok(self.calendars.lock().keys().map(|id| CalendarInfo::new(id.clone(), id.clone())).collect())
    }

    async fn get_events(
        &self,
        calendar_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RemoteEvent>> {
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        self.check(calendar_id)?;
        let calendars = self.calendars.lock();
        let events = calendars
            .get(calendar_id)
            .ok_or_else(|| BusySyncError::NotFound(format!("calendar {calendar_id}")))?;
        let mut overlapping: Vec<RemoteEvent> =
            events.iter().filter(|e| e.end_time > start && e.start_time < end).cloned().collect();
        overlapping.sort_by_key(|e| e.start_time);
        Ok(overlapping)
    }

    async fn create_event(&self, calendar_id: &str, event: &NewEvent) -> Result<RemoteEvent> {
        self.check(calendar_id)?;
        let mut created = RemoteEvent::new(
            self.next_id("evt"),
            event.title.clone(),
            event.start_time,
            event.end_time,
        );
        created.description = event.description.clone();
        created.all_day = event.all_day;
        created.participants = event.participants.clone();

        self.calendars
            .lock()
            .get_mut(calendar_id)
            .ok_or_else(|| BusySyncError::NotFound(format!("calendar {calendar_id}")))?
            .push(created.clone());
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(created)
    }

    async fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<bool> {
        self.check(calendar_id)?;
        let mut calendars = self.calendars.lock();
        let Some(events) = calendars.get_mut(calendar_id) else {
            return Ok(false);
        };
        let before = events.len();
        events.retain(|e| e.id != event_id);
        let removed = events.len() < before;
        if removed {
            self.deletes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(removed)
    }

    async fn create_push_channel(
        &self,
        calendar_id: &str,
        webhook_url: &str,
        channel_id: &str,
        _token: Option<&str>,
    ) -> Result<PushChannel> {
        self.check(calendar_id)?;
        let channel = PushChannel {
            channel_id: channel_id.to_string(),
            resource_id: self.next_id("res"),
            resource_uri: Some(format!("{webhook_url}#{calendar_id}")),
            expiration: None,
            kind: Some("api#channel".into()),
            calendar_id: calendar_id.to_string(),
        };
        self.channels.lock().insert(channel_id.to_string(), channel.clone());
        Ok(channel)
    }

    async fn stop_push_channel(&self, channel_id: &str, resource_id: &str) -> Result<bool> {
        let mut channels = self.channels.lock();
        let known = channels.get(channel_id).is_some_and(|c| c.resource_id == resource_id);
        if known {
            channels.remove(channel_id);
        }
        Ok(known)
    }
}

/// Hands out a pre-registered [`InMemoryCalendar`] per account.
#[derive(Debug, Default)]
pub struct InMemoryClientFactory {
    clients: Mutex<HashMap<u32, Arc<InMemoryCalendar>>>,
    created: AtomicUsize,
}

impl InMemoryClientFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, account_id: u32, calendar: Arc<InMemoryCalendar>) {
        self.clients.lock().insert(account_id, calendar);
    }

    pub fn client(&self, account_id: u32) -> Option<Arc<InMemoryCalendar>> {
        self.clients.lock().get(&account_id).cloned()
    }

    /// Number of clients handed out so far.
    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CalendarClientFactory for InMemoryClientFactory {
    async fn create_client(&self, account: &Account) -> Result<Arc<dyn CalendarClient>> {
        let calendar = self.client(account.account_id).ok_or_else(|| {
            BusySyncError::NotFound(format!("no backend for account {}", account.account_id))
        })?;
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(calendar as Arc<dyn CalendarClient>)
    }
}
