//! Command surface driven against in-memory calendars.

mod support;

use busysync_api::commands::{self, ManualSyncRequest};
use busysync_domain::SyncType;
use support::{fixture, headers, meeting, wait_for_runs};

#[tokio::test]
async fn list_sync_flows_carries_account_names() {
    let fixture = fixture();

    let flows = commands::list_sync_flows(&fixture.ctx).await.unwrap();

    assert_eq!(flows.len(), 2);
    assert_eq!(flows[0].name, "work-to-personal");
    assert_eq!(flows[0].source_account_name.as_deref(), Some("work@example.com"));
    assert_eq!(flows[0].target_account_name.as_deref(), Some("me@example.com"));
    assert_eq!(flows[0].start_offset_minutes, -10);
    assert_eq!(flows[0].end_offset_minutes, 10);
}

#[tokio::test]
async fn list_accounts_isolates_failing_accounts() {
    let fixture = fixture();
    fixture.target.set_connection_failure(true);

    let accounts = commands::list_accounts(&fixture.ctx).await.unwrap();

    assert_eq!(accounts.len(), 2);
    let work = accounts.iter().find(|a| a.account_id == 1).unwrap();
    assert!(work.connection_ok);
    assert_eq!(work.calendar_count, 2);
    let personal = accounts.iter().find(|a| a.account_id == 2).unwrap();
    assert!(!personal.connection_ok);
    assert!(personal.error.is_some());
}

#[tokio::test]
async fn list_calendars_for_account_annotates_owner() {
    let fixture = fixture();

    let calendars = commands::list_calendars_for_account(&fixture.ctx, 1).await.unwrap();

    assert_eq!(calendars.len(), 2);
    assert!(calendars.iter().all(|c| c.account_id == Some(1)));

    let err = commands::list_calendars_for_account(&fixture.ctx, 42).await.unwrap_err();
    assert_eq!(err.kind, "not_found");
}

#[tokio::test]
async fn manual_sync_uses_default_window() {
    let fixture = fixture();
    fixture.source.insert_event("work@example.com", meeting("m-1", 4));
    fixture.source.insert_event("primary", meeting("m-2", 24 * 10));
    // Beyond the 14 day default
    fixture.source.insert_event("primary", meeting("m-3", 24 * 20));

    let response = commands::trigger_manual_sync(&fixture.ctx, ManualSyncRequest::default())
        .await
        .unwrap();

    assert!(response.success);
    assert_eq!(response.message, "Manual sync completed");
    assert_eq!(response.results.sync_type, SyncType::Manual);
    assert_eq!(response.results.calendars_synced, 2);
    assert_eq!(fixture.target.busy_events("primary").len(), 2);
}

#[tokio::test]
async fn manual_sync_rejects_negative_window() {
    let fixture = fixture();

    let err = commands::trigger_manual_sync(
        &fixture.ctx,
        ManualSyncRequest { days_back: Some(-1), days_forward: None },
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind, "invalid_input");
    assert_eq!(fixture.ctx.scheduler.stats().total_runs, 0);
}

#[tokio::test]
async fn manual_sync_reports_failed_calendars() {
    let fixture = fixture();
    fixture.source.insert_event("primary", meeting("m-1", 3));
    fixture.source.fail_calendar("work@example.com");

    let response = commands::trigger_manual_sync(&fixture.ctx, ManualSyncRequest::default())
        .await
        .unwrap();

    assert!(!response.success);
    assert_eq!(response.message, "Manual sync completed with 1 failed calendars");
    assert_eq!(fixture.target.busy_events("primary").len(), 1);
}

#[tokio::test]
async fn sync_status_reflects_manual_runs() {
    let fixture = fixture();
    fixture.source.insert_event("work@example.com", meeting("m-1", 4));
    commands::trigger_manual_sync(&fixture.ctx, ManualSyncRequest::default()).await.unwrap();

    let status = commands::get_sync_status(&fixture.ctx).await.unwrap();

    assert_eq!(status.engine_stats.busy_blocks_created, 1);
    assert_eq!(status.engine_stats.sync_flows_configured, 2);
    assert!(!status.scheduler_info.is_running);
    assert_eq!(status.scheduler_info.stats.total_runs, 1);
    assert_eq!(status.recent_runs.len(), 1);
    assert_eq!(status.monitored_calendars.len(), 2);
}

#[tokio::test]
async fn force_run_requires_running_scheduler() {
    let fixture = fixture();
    fixture.source.insert_event("work@example.com", meeting("m-1", 4));

    let err = commands::force_scheduler_run_now(&fixture.ctx).await.unwrap_err();
    assert_eq!(err.kind, "invalid_input");

    fixture.ctx.start().await.unwrap();
    let response = commands::force_scheduler_run_now(&fixture.ctx).await.unwrap();
    assert!(response.success);
    wait_for_runs(&fixture.ctx, 1).await;
    fixture.ctx.shutdown().await.unwrap();

    assert_eq!(fixture.target.busy_events("primary").len(), 1);
}

#[tokio::test]
async fn update_sync_interval_validates_range() {
    let fixture = fixture();

    let err = commands::sync::update_sync_interval(&fixture.ctx, 0).await.unwrap_err();
    assert_eq!(err.kind, "validation");

    commands::sync::update_sync_interval(&fixture.ctx, 15).await.unwrap();
    assert_eq!(fixture.ctx.scheduler.info().sync_interval_minutes, 15);
}

#[tokio::test]
async fn webhook_update_creates_busy_blocks() {
    let fixture = fixture();
    fixture.source.insert_event("work@example.com", meeting("m-1", 4));

    let result = commands::handle_webhook_notification(
        &fixture.ctx,
        &headers(&[
            ("X-Goog-Channel-ID", "busysync-1"),
            ("X-Goog-Resource-ID", "work@example.com"),
            ("X-Goog-Resource-State", "update"),
        ]),
    )
    .await;

    assert!(result.success, "unexpected error: {:?}", result.error);
    assert_eq!(result.processed_events, 1);
    assert_eq!(fixture.target.busy_events("primary").len(), 1);
}

#[tokio::test]
async fn webhook_with_missing_headers_is_rejected() {
    let fixture = fixture();

    let result = commands::handle_webhook_notification(
        &fixture.ctx,
        &headers(&[("X-Goog-Resource-ID", "work@example.com"), ("X-Goog-Resource-State", "update")]),
    )
    .await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("Missing required header: x-goog-channel-id"));
}

#[tokio::test]
async fn webhook_for_unmonitored_calendar_is_rejected() {
    let fixture = fixture();

    let result = commands::handle_webhook_notification(
        &fixture.ctx,
        &headers(&[
            ("X-Goog-Channel-ID", "busysync-1"),
            ("X-Goog-Resource-ID", "stranger@example.com"),
            ("X-Goog-Resource-State", "update"),
        ]),
    )
    .await;

    assert!(!result.success);
    assert!(result.error.unwrap().contains("non-monitored calendar"));
}

#[tokio::test]
async fn webhook_channel_token_is_enforced() {
    let mut fixture = fixture();
    fixture.ctx = fixture.ctx.with_channel_token(Some("t0ken".into()));
    fixture.source.insert_event("work@example.com", meeting("m-1", 4));
    let base = [
        ("X-Goog-Channel-ID", "busysync-1"),
        ("X-Goog-Resource-ID", "work@example.com"),
        ("X-Goog-Resource-State", "update"),
    ];

    let rejected = commands::handle_webhook_notification(&fixture.ctx, &headers(&base)).await;
    assert!(!rejected.success);
    assert_eq!(rejected.error.as_deref(), Some("Invalid channel token"));
    assert_eq!(fixture.target.create_calls(), 0);

    let mut with_token = base.to_vec();
    with_token.push(("X-Goog-Channel-Token", "t0ken"));
    let accepted = commands::handle_webhook_notification(&fixture.ctx, &headers(&with_token)).await;
    assert!(accepted.success, "unexpected error: {:?}", accepted.error);
    assert_eq!(fixture.target.create_calls(), 1);
}

#[tokio::test]
async fn setup_subscriptions_registers_every_monitored_calendar() {
    let fixture = fixture();

    let results = commands::setup_webhook_subscriptions(&fixture.ctx, "https://hooks.example.com/")
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.success && r.channel_id.is_some()));
    let channels = fixture.source.channels();
    assert_eq!(channels.len(), 2);
    assert!(channels
        .iter()
        .all(|c| c.resource_uri.as_deref().unwrap_or_default().starts_with(
            "https://hooks.example.com/webhooks/google-calendar"
        )));
}

#[tokio::test]
async fn setup_subscriptions_rejects_invalid_base_url() {
    let fixture = fixture();

    let err = commands::setup_webhook_subscriptions(&fixture.ctx, "not a url").await.unwrap_err();

    assert_eq!(err.kind, "invalid_input");
    assert!(fixture.source.channels().is_empty());
}

#[tokio::test]
async fn setup_subscriptions_reports_per_calendar_failures() {
    let fixture = fixture();
    fixture.source.fail_calendar("primary");

    let results = commands::setup_webhook_subscriptions(&fixture.ctx, "https://hooks.example.com")
        .await
        .unwrap();

    let failed: Vec<_> = results.iter().filter(|r| !r.success).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].calendar_id, "primary");
    assert!(failed[0].error.is_some());
}

#[tokio::test]
async fn health_check_tracks_scheduler_state() {
    let fixture = fixture();

    let stopped = commands::health_check(&fixture.ctx).await;
    assert_eq!(stopped.status, "degraded");
    assert!(stopped.services_initialized);
    assert!(!stopped.scheduler_running);

    fixture.ctx.start().await.unwrap();
    let running = commands::health_check(&fixture.ctx).await;
    assert_eq!(running.status, "healthy");
    assert!(running.scheduler_running);

    fixture.ctx.shutdown().await.unwrap();
}
