//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading configuration from files.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use busysync_domain::BusySyncError;
use busysync_infra::config;
use tempfile::{Builder, NamedTempFile};

// Serialises tests that touch process environment variables
static ENV_LOCK: Mutex<()> = Mutex::new(());

const TOML_CONFIG: &str = r#"
sync_interval_minutes = 10
webhook_base_url = "https://hooks.example.com"

[[accounts]]
account_id = 1
name = "work@example.com"
client_id = "id-1"
client_secret = "secret-1"
refresh_token = "refresh-1"

[[accounts]]
account_id = 2
email = "me@example.com"
client_id = "id-2"
client_secret = "secret-2"
refresh_token = "refresh-2"

[[sync_flows]]
name = "work-to-personal"
source_account_id = 1
source_calendar_id = "work@example.com"
target_account_id = 2
target_calendar_id = "primary"
start_offset = -15
end_offset = 15
"#;

fn write_config(suffix: &str, contents: &str) -> NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().expect("Failed to create temp file");
    file.write_all(contents.as_bytes()).expect("Failed to write to temp file");
    file
}

#[test]
fn test_load_config_from_toml_file() {
    let file = write_config(".toml", TOML_CONFIG);

    let config = config::load_from_file(Some(file.path().to_path_buf()))
        .expect("Failed to load config from TOML file");

    assert_eq!(config.accounts.len(), 2);
    assert_eq!(config.accounts[1].name, "me@example.com");
    assert_eq!(config.sync_flows.len(), 1);
    assert_eq!(config.sync_flows[0].start_offset_minutes, -15);
    assert_eq!(config.sync_flows[0].end_offset_minutes, 15);
    assert_eq!(config.sync_interval_minutes, 10);
    assert_eq!(config.webhook_base_url.as_deref(), Some("https://hooks.example.com"));
}

#[test]
fn test_load_config_from_json_file() {
    let json_content = r#"{
        "accounts": [
            { "account_id": 1, "name": "work@example.com", "client_id": "id-1",
              "client_secret": "secret-1", "refresh_token": "refresh-1" },
            { "account_id": 2, "name": "me@example.com", "client_id": "id-2",
              "client_secret": "secret-2", "refresh_token": "refresh-2" }
        ],
        "sync_flows": [
            { "name": "work-to-personal", "source_account_id": 1,
              "source_calendar_id": "work@example.com", "target_account_id": 2,
              "target_calendar_id": "primary" }
        ]
    }"#;
    let file = write_config(".json", json_content);

    let config = config::load_from_file(Some(file.path().to_path_buf()))
        .expect("Failed to load config from JSON file");

    assert_eq!(config.sync_interval_minutes, 5);
    assert_eq!(config.sync_flows[0].start_offset_minutes, 0);
    assert!(config.webhook_base_url.is_none());
}

#[test]
fn test_invalid_file_configuration_is_rejected() {
    let broken = TOML_CONFIG.replace("target_account_id = 2", "target_account_id = 7");
    let file = write_config(".toml", &broken);

    let result = config::load_from_file(Some(file.path().to_path_buf()));

    assert!(
        matches!(&result, Err(BusySyncError::Config(msg)) if msg.contains("unknown account 7")),
        "unexpected result: {result:?}"
    );
}

#[test]
fn test_malformed_toml_is_rejected() {
    let file = write_config(".toml", "accounts = [ not toml");

    let result = config::load_from_file(Some(file.path().to_path_buf()));

    assert!(matches!(result, Err(BusySyncError::Config(msg)) if msg.contains("Invalid TOML")));
}

#[test]
fn test_missing_file_is_rejected() {
    let result = config::load_from_file(Some(PathBuf::from("/nonexistent/busysync.toml")));

    assert!(matches!(result, Err(BusySyncError::Config(msg)) if msg.contains("not found")));
}

#[test]
fn test_load_prefers_explicit_config_path() {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    let file = write_config(".toml", TOML_CONFIG);

    std::env::set_var(config::CONFIG_PATH_VAR, file.path());
    let result = config::load();
    std::env::remove_var(config::CONFIG_PATH_VAR);

    let config = result.expect("Failed to load config via BUSYSYNC_CONFIG");
    assert_eq!(config.accounts.len(), 2);
}
