//! Integration tests for AppContext lifecycle
//!
//! Construction validates the configuration; start and shutdown manage the
//! polling scheduler without disturbing in-flight work.

mod support;

use std::sync::Arc;

use busysync_api::AppContext;
use busysync_core::testing::{InMemoryCalendar, InMemoryClientFactory};
use busysync_domain::{Account, BusySyncError, SyncConfig, SyncFlow};
use support::{fixture, meeting, wait_for_runs};

fn config() -> SyncConfig {
    SyncConfig::new(
        vec![
            Account::new(1, "work@example.com", "id", "secret", "refresh").unwrap(),
            Account::new(2, "me@example.com", "id", "secret", "refresh").unwrap(),
        ],
        vec![SyncFlow::new("work-to-personal", (1, "primary"), (2, "primary"))],
    )
    .unwrap()
}

#[test]
fn test_context_uses_configured_interval() {
    let mut config = config();
    config.sync_interval_minutes = 30;

    let ctx = AppContext::new(config, Arc::new(InMemoryClientFactory::new())).unwrap();

    assert_eq!(ctx.scheduler.info().sync_interval_minutes, 30);
    assert_eq!(ctx.webhook_handler.monitored_calendars().len(), 1);
    assert!(ctx.channel_token().is_none());
}

#[test]
fn test_context_rejects_invalid_interval() {
    let mut config = config();
    config.sync_interval_minutes = 0;

    let result = AppContext::new(config, Arc::new(InMemoryClientFactory::new()));

    assert!(matches!(result, Err(BusySyncError::Validation(_))));
}

#[test]
fn test_context_rejects_dangling_flow() {
    let mut config = config();
    config.sync_flows.push(SyncFlow::new("orphan", (1, "primary"), (9, "primary")));

    let result = AppContext::new(config, Arc::new(InMemoryClientFactory::new()));

    assert!(matches!(result, Err(BusySyncError::Config(msg)) if msg.contains("unknown account 9")));
}

#[test]
fn test_blank_channel_token_is_ignored() {
    let ctx = AppContext::new(config(), Arc::new(InMemoryClientFactory::new()))
        .unwrap()
        .with_channel_token(Some(String::new()));

    assert!(ctx.channel_token().is_none());
}

#[tokio::test]
async fn test_start_is_idempotent_and_shutdown_stops_scheduler() {
    let fixture = fixture();

    fixture.ctx.start().await.unwrap();
    fixture.ctx.start().await.unwrap();
    assert!(fixture.ctx.scheduler.is_running());

    fixture.ctx.shutdown().await.unwrap();
    assert!(!fixture.ctx.scheduler.is_running());

    // A second shutdown has nothing left to stop
    fixture.ctx.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_context_can_restart_after_shutdown() {
    let fixture = fixture();
    fixture.source.insert_event("primary", meeting("m-1", 5));

    fixture.ctx.start().await.unwrap();
    fixture.ctx.shutdown().await.unwrap();
    fixture.ctx.start().await.unwrap();
    fixture.ctx.scheduler.force_run_now().unwrap();
    wait_for_runs(&fixture.ctx, 1).await;
    fixture.ctx.shutdown().await.unwrap();

    assert_eq!(fixture.target.busy_events("primary").len(), 1);
}

#[tokio::test]
async fn test_entry_points_share_one_engine() {
    let factory = Arc::new(InMemoryClientFactory::new());
    let backend = Arc::new(InMemoryCalendar::with_calendars(["primary"]));
    factory.register(1, Arc::clone(&backend));
    factory.register(2, Arc::new(InMemoryCalendar::with_calendars(["primary"])));
    let ctx = AppContext::new(config(), factory.clone()).unwrap();
    backend.insert_event("primary", meeting("m-1", 2));

    ctx.scheduler.run_manual_sync(1, 1).await.unwrap();
    let stats_after_manual = ctx.engine.stats();
    ctx.webhook_handler
        .handle_notification(&busysync_domain::WebhookNotification::new("primary", "chan-1", "update"))
        .await;

    assert_eq!(stats_after_manual.busy_blocks_created, 1);
    assert_eq!(ctx.engine.stats().busy_blocks_created, 1);
    assert_eq!(ctx.engine.stats().events_processed, 2);
    assert_eq!(factory.created_count(), 2);
}
