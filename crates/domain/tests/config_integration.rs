//! Integration tests for the configuration aggregate
//!
//! Covers the wire shape accepted from configuration files and the
//! invariants enforced before any service is built.

use busysync_domain::{BusyBlock, BusySyncError, CalendarEvent, SyncConfig};
use chrono::{TimeZone, Utc};
use serde_json::json;

fn config_json() -> serde_json::Value {
    json!({
        "accounts": [
            { "account_id": 1, "email": "work@example.com", "client_id": "id-1",
              "client_secret": "secret-1", "refresh_token": "refresh-1" },
            { "account_id": 2, "name": "me@example.com", "client_id": "id-2",
              "client_secret": "secret-2", "refresh_token": "refresh-2" }
        ],
        "sync_flows": [
            { "name": "work-to-personal", "source_account_id": 1,
              "source_calendar_id": "work@example.com", "target_account_id": 2,
              "target_calendar_id": "primary", "start_offset": -15, "end_offset": 15 }
        ]
    })
}

/// Scenario: a config file using the legacy `email` and offset spellings
#[test]
fn test_config_accepts_aliases_and_defaults() {
    let config: SyncConfig = serde_json::from_value(config_json()).unwrap();

    config.validate().unwrap();
    assert_eq!(config.accounts[0].name, "work@example.com");
    assert_eq!(config.sync_interval_minutes, 5);
    assert!(config.webhook_base_url.is_none());
    assert_eq!(config.sync_flows[0].start_offset_minutes, -15);
    assert_eq!(config.account(2).map(|a| a.name.as_str()), Some("me@example.com"));
}

#[test]
fn test_config_rejects_duplicate_accounts() {
    let mut raw = config_json();
    raw["accounts"][1]["account_id"] = json!(1);
    let config: SyncConfig = serde_json::from_value(raw).unwrap();

    assert!(matches!(config.validate(), Err(BusySyncError::Config(_))));
}

#[test]
fn test_config_rejects_duplicate_flow_names() {
    let mut raw = config_json();
    let flow = raw["sync_flows"][0].clone();
    raw["sync_flows"].as_array_mut().unwrap().push(flow);
    let config: SyncConfig = serde_json::from_value(raw).unwrap();

    let err = config.validate().unwrap_err();
    assert!(matches!(err, BusySyncError::Config(msg) if msg.contains("duplicate sync flow name")));
}

#[test]
fn test_config_rejects_narrowing_offsets() {
    let mut raw = config_json();
    raw["sync_flows"][0]["start_offset"] = json!(10);
    let config: SyncConfig = serde_json::from_value(raw).unwrap();

    assert!(matches!(config.validate(), Err(BusySyncError::Config(_))));
}

#[test]
fn test_config_rejects_out_of_range_interval() {
    let mut raw = config_json();
    raw["sync_interval_minutes"] = json!(1441);
    let config: SyncConfig = serde_json::from_value(raw).unwrap();

    assert!(config.validate().is_err());
}

#[test]
fn test_account_debug_hides_credentials() {
    let config: SyncConfig = serde_json::from_value(config_json()).unwrap();

    let rendered = format!("{:?}", config.accounts[0]);
    assert!(!rendered.contains("secret-1"));
    assert!(!rendered.contains("refresh-1"));
}

/// Scenario: an event on the configured source produces a widened block on
/// the target calendar
#[test]
fn test_flow_offsets_shape_the_busy_block() {
    let config: SyncConfig = serde_json::from_value(config_json()).unwrap();
    let flow = &config.sync_flows[0];
    let start = Utc.with_ymd_and_hms(2025, 3, 10, 10, 0, 42).unwrap();
    let end = Utc.with_ymd_and_hms(2025, 3, 10, 11, 0, 0).unwrap();
    let event = CalendarEvent::new("evt-1", "work@example.com", 1, "Design review", start, end).unwrap();

    let block = BusyBlock::from_event_and_flow(&event, flow).unwrap();

    assert_eq!(block.target_account_id, 2);
    assert_eq!(block.target_calendar_id, "primary");
    assert_eq!(block.title, "Busy");
    assert_eq!(block.start_time, Utc.with_ymd_and_hms(2025, 3, 10, 9, 45, 0).unwrap());
    assert_eq!(block.end_time, Utc.with_ymd_and_hms(2025, 3, 10, 11, 15, 0).unwrap());
}
