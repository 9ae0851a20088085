//! Shared fixtures for `busysync-api` integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use busysync_api::AppContext;
use busysync_core::testing::{InMemoryCalendar, InMemoryClientFactory};
use busysync_domain::{Account, RemoteEvent, SyncConfig, SyncFlow};
use busysync_infra::PollingSchedulerConfig;
use chrono::Utc;

pub struct Fixture {
    pub source: Arc<InMemoryCalendar>,
    pub target: Arc<InMemoryCalendar>,
    pub ctx: AppContext,
}

/// Account 1 owns `primary` and `work@example.com`, account 2 receives busy
/// blocks on its `primary` calendar from both.
pub fn fixture() -> Fixture {
    fixture_with(|config| config)
}

pub fn fixture_with(customise: impl FnOnce(SyncConfig) -> SyncConfig) -> Fixture {
    let factory = Arc::new(InMemoryClientFactory::new());
    let source = Arc::new(InMemoryCalendar::with_calendars(["primary", "work@example.com"]));
    let target = Arc::new(InMemoryCalendar::with_calendars(["primary"]));
    factory.register(1, Arc::clone(&source));
    factory.register(2, Arc::clone(&target));

    let accounts = vec![
        Account::new(1, "work@example.com", "id", "secret", "refresh").unwrap(),
        Account::new(2, "me@example.com", "id", "secret", "refresh").unwrap(),
    ];
    let flows = vec![
        SyncFlow::new("work-to-personal", (1, "work@example.com"), (2, "primary")).with_offsets(-10, 10),
        SyncFlow::new("primary-to-personal", (1, "primary"), (2, "primary")),
    ];
    let config = customise(SyncConfig::new(accounts, flows).unwrap());

    let scheduler_config =
        PollingSchedulerConfig { interval: Duration::from_secs(3600), ..Default::default() };
    let ctx = AppContext::with_scheduler_config(config, factory, scheduler_config).unwrap();
    Fixture { source, target, ctx }
}

/// A confirmed, opaque meeting with two attendees.
pub fn meeting(id: &str, hours_from_now: i64) -> RemoteEvent {
    let start = Utc::now() + chrono::Duration::hours(hours_from_now);
    let mut event = RemoteEvent::new(id, "Sprint planning", start, start + chrono::Duration::hours(1));
    event.participants = vec!["a@example.com".into(), "b@example.com".into()];
    event
}

pub fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
}

pub async fn wait_for_runs(ctx: &AppContext, runs: u64) {
    for _ in 0..100 {
        if ctx.scheduler.stats().total_runs >= runs {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("scheduler did not reach {runs} runs");
}
