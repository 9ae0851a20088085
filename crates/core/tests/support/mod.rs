//! Shared fixtures for `busysync-core` integration tests.
//!
//! Builds a registry over in-memory calendars so scenarios can focus on
//! behaviour instead of wiring.

#![allow(dead_code)]

use std::sync::Arc;

use busysync_core::testing::{InMemoryCalendar, InMemoryClientFactory};
use busysync_core::{AccountRegistry, SyncEngine, WebhookHandler};
use busysync_domain::{Account, CalendarEvent, RemoteEvent, SyncFlow};
use chrono::{DateTime, TimeZone, Utc};

/// 2025-03-10 at the given wall-clock time, UTC.
pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, hour, minute, 0).unwrap()
}

pub fn account(id: u32) -> Account {
    Account::new(id, format!("user{id}@example.com"), "client", "secret", "refresh").unwrap()
}

/// A confirmed, opaque meeting with two attendees.
pub fn meeting(id: &str, calendar_id: &str, account_id: u32) -> CalendarEvent {
    CalendarEvent::new(id, calendar_id, account_id, "Design review", at(10, 0), at(11, 0))
        .unwrap()
        .with_participants(["a@example.com", "b@example.com"])
}

pub fn remote_meeting(id: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> RemoteEvent {
    let mut event = RemoteEvent::new(id, "Design review", start, end);
    event.participants = vec!["a@example.com".into(), "b@example.com".into()];
    event
}

pub struct Harness {
    pub factory: Arc<InMemoryClientFactory>,
    pub registry: Arc<AccountRegistry>,
    pub engine: Arc<SyncEngine>,
}

impl Harness {
    /// Accounts `1..=account_count`, each backed by its own in-memory
    /// calendar holding `primary` plus the ids in `calendars`.
    pub fn new(account_count: u32, calendars: &[&str], flows: Vec<SyncFlow>) -> Self {
        let factory = Arc::new(InMemoryClientFactory::new());
        let accounts: Vec<Account> = (1..=account_count).map(account).collect();
        for id in 1..=account_count {
            let backend = InMemoryCalendar::with_calendars(["primary"]);
            for calendar in calendars {
                backend.add_calendar(*calendar);
            }
            factory.register(id, Arc::new(backend));
        }

        let registry = Arc::new(AccountRegistry::new(accounts, factory.clone()).unwrap());
        let engine = Arc::new(SyncEngine::new(flows, Arc::clone(&registry)));
        Self { factory, registry, engine }
    }

    pub fn backend(&self, account_id: u32) -> Arc<InMemoryCalendar> {
        self.factory.client(account_id).unwrap()
    }

    pub fn webhook_handler(&self) -> WebhookHandler {
        WebhookHandler::new(Arc::clone(&self.engine))
    }
}
