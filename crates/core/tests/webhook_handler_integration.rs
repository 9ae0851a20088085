//! Webhook handler scenarios: notification state machine, header validation
//! and channel lifecycle.

mod support;

use std::collections::HashMap;

use busysync_domain::{SyncFlow, WebhookNotification};
use chrono::{Duration, DurationRound, Utc};
use support::{remote_meeting, Harness};

fn harness() -> Harness {
    let flows = vec![
        SyncFlow::new("work-to-personal", (1, "work@example.com"), (2, "primary")),
        SyncFlow::new("work-to-side", (1, "work@example.com"), (3, "primary")),
    ];
    Harness::new(3, &["work@example.com"], flows)
}

fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

#[test]
fn monitored_calendars_are_deduplicated() {
    let harness = harness();
    let handler = harness.webhook_handler();

    let monitored = handler.monitored_calendars();
    assert_eq!(monitored.len(), 1);
    assert_eq!(monitored[0].calendar_id, "work@example.com");
    assert_eq!(monitored[0].account_name.as_deref(), Some("user1@example.com"));
    assert_eq!(handler.account_for_calendar("work@example.com"), Some(1));
}

#[tokio::test]
async fn missing_fields_fail_without_processing() {
    let harness = harness();
    let handler = harness.webhook_handler();
    let notification = WebhookNotification {
        resource_id: Some("work@example.com".into()),
        resource_state: Some("sync".into()),
        ..WebhookNotification::default()
    };

    let result = handler.handle_notification(&notification).await;

    assert!(!result.success);
    assert!(result.error.unwrap_or_default().contains("Missing required fields"));
    assert_eq!(harness.engine.stats().events_processed, 0);
}

#[tokio::test]
async fn exists_state_is_acknowledged_and_inert() {
    let harness = harness();
    let handler = harness.webhook_handler();

    let result = handler
        .handle_notification(&WebhookNotification::new("work@example.com", "chan-1", "exists"))
        .await;

    assert!(result.success);
    assert_eq!(result.processed_events, 0);
    assert!(result.results.is_empty());
    assert_eq!(result.webhook_type, "google_calendar");
}

#[tokio::test]
async fn unknown_state_is_rejected() {
    let harness = harness();
    let handler = harness.webhook_handler();

    let result = handler
        .handle_notification(&WebhookNotification::new("work@example.com", "chan-1", "deleted"))
        .await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("Unknown resource state: deleted"));
}

#[tokio::test]
async fn unmapped_calendar_is_rejected() {
    let harness = harness();
    let handler = harness.webhook_handler();

    let result = handler
        .handle_notification(&WebhookNotification::new("stranger@example.com", "chan-1", "update"))
        .await;

    assert!(!result.success);
    assert_eq!(result.error.as_deref(), Some("No account found for calendar stranger@example.com"));
}

#[tokio::test]
async fn update_syncs_the_recent_window_into_every_flow() {
    let harness = harness();
    let handler = harness.webhook_handler();
    let start = Utc::now().duration_trunc(Duration::hours(1)).unwrap() + Duration::hours(2);
    let source = harness.backend(1);
    source.insert_event("work@example.com", remote_meeting("soon", start, start + Duration::hours(1)));
    source.insert_event(
        "work@example.com",
        remote_meeting("far", start + Duration::days(30), start + Duration::days(30) + Duration::hours(1)),
    );

    let result = handler
        .handle_notification(&WebhookNotification::new("work@example.com", "chan-1", "update"))
        .await;

    assert!(result.success, "unexpected error: {:?}", result.error);
    assert_eq!(result.processed_events, 1);
    assert_eq!(result.results.len(), 2);
    assert_eq!(harness.backend(2).busy_events("primary").len(), 1);
    assert_eq!(harness.backend(3).busy_events("primary").len(), 1);

    let again = handler
        .handle_notification(&WebhookNotification::new("work@example.com", "chan-2", "sync"))
        .await;
    assert!(again.success);
    assert_eq!(harness.backend(2).create_calls(), 1);
}

#[tokio::test]
async fn resource_uri_takes_precedence_over_opaque_resource_id() {
    let harness = harness();
    let handler = harness.webhook_handler();
    let notification = WebhookNotification {
        resource_uri: Some(
            "https://www.googleapis.com/calendar/v3/calendars/work%40example.com/events?alt=json"
                .into(),
        ),
        ..WebhookNotification::new("opaque-resource-123", "chan-1", "update")
    };

    let result = handler.handle_notification(&notification).await;

    assert!(result.success, "unexpected error: {:?}", result.error);
}

#[tokio::test]
async fn source_fetch_failure_is_reported() {
    let harness = harness();
    let handler = harness.webhook_handler();
    harness.backend(1).fail_calendar("work@example.com");

    let result = handler
        .handle_notification(&WebhookNotification::new("work@example.com", "chan-1", "update"))
        .await;

    assert!(!result.success);
    assert!(result.error.is_some());
}

#[test]
fn header_validation() {
    let harness = harness();
    let handler = harness.webhook_handler();

    let valid = headers(&[
        ("X-Goog-Channel-ID", "chan-1"),
        ("X-Goog-Resource-ID", "work@example.com"),
        ("X-Goog-Resource-State", "exists"),
    ]);
    assert_eq!(handler.validate_headers(&valid), Ok(()));

    let missing = headers(&[("X-Goog-Channel-ID", "chan-1"), ("X-Goog-Resource-State", "sync")]);
    assert!(handler.validate_headers(&missing).unwrap_err().contains("x-goog-resource-id"));

    let bad_state = headers(&[
        ("x-goog-channel-id", "chan-1"),
        ("x-goog-resource-id", "work@example.com"),
        ("x-goog-resource-state", "bogus"),
    ]);
    assert!(handler.validate_headers(&bad_state).unwrap_err().contains("Invalid resource state"));

    let stranger = headers(&[
        ("x-goog-channel-id", "chan-1"),
        ("x-goog-resource-id", "stranger@example.com"),
        ("x-goog-resource-state", "update"),
    ]);
    assert!(handler.validate_headers(&stranger).unwrap_err().contains("non-monitored calendar"));
}

#[tokio::test]
async fn subscriptions_are_created_and_stopped_idempotently() {
    let harness = harness();
    let handler = harness.webhook_handler();

    let results = handler
        .setup_subscriptions("https://hooks.example.com/webhooks/google-calendar", Some("secret"))
        .await;

    assert_eq!(results.len(), 1);
    let subscription = &results[0];
    assert!(subscription.success);
    let channel_id = subscription.channel_id.clone().unwrap();
    let resource_id = subscription.resource_id.clone().unwrap();
    assert!(channel_id.starts_with("busysync-"));
    assert_eq!(harness.backend(1).channels().len(), 1);

    assert!(handler.delete_subscription(&channel_id, &resource_id, Some(1)).await.unwrap());
    assert!(harness.backend(1).channels().is_empty());
    assert!(handler.delete_subscription(&channel_id, &resource_id, None).await.unwrap());
}

#[tokio::test]
async fn subscription_failure_is_reported_per_calendar() {
    let harness = harness();
    let handler = harness.webhook_handler();
    harness.backend(1).fail_calendar("work@example.com");

    let result = handler
        .create_subscription("work@example.com", 1, "https://hooks.example.com/cb", None)
        .await;

    assert!(!result.success);
    assert!(result.channel_id.is_none());
    assert!(result.error.is_some());
}
