//! Configuration loader
//!
//! Loads the account and sync-flow configuration from environment variables
//! or a TOML/JSON file.
//!
//! ## Loading Strategy
//! 1. `BUSYSYNC_CONFIG` names a config file: load that file
//! 2. Otherwise read numbered environment variables (a `.env` file is
//!    loaded first if present)
//! 3. If no account is configured in the environment, probe the standard
//!    file locations
//!
//! Every path ends in [`SyncConfig::validate`]; an invalid configuration is
//! a fatal startup error.
//!
//! ## Environment Variables
//! For N = 1, 2, ... until the first missing index:
//! - `GOOGLE_ACCOUNT_N_NAME` (or `GOOGLE_ACCOUNT_N_EMAIL`)
//! - `GOOGLE_ACCOUNT_N_CLIENT_ID`
//! - `GOOGLE_ACCOUNT_N_CLIENT_SECRET`
//! - `GOOGLE_ACCOUNT_N_REFRESH_TOKEN`
//! - `SYNC_FLOW_N_NAME`
//! - `SYNC_FLOW_N_SOURCE_ACCOUNT_ID` / `SYNC_FLOW_N_SOURCE_CALENDAR_ID`
//! - `SYNC_FLOW_N_TARGET_ACCOUNT_ID` / `SYNC_FLOW_N_TARGET_CALENDAR_ID`
//! - `SYNC_FLOW_N_START_OFFSET` / `SYNC_FLOW_N_END_OFFSET` (minutes,
//!   default 0)
//!
//! Plus `SYNC_INTERVAL_MINUTES` (default 5) and `WEBHOOK_BASE_URL`.
//!
//! ## File Locations
//! The loader probes `./busysync.toml`, `./busysync.json`, `./config.toml`
//! and `./config.json`, then the same names next to the executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use busysync_domain::constants::DEFAULT_SYNC_INTERVAL_MINUTES;
use busysync_domain::{Account, BusySyncError, Result, SyncConfig, SyncFlow};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_VAR: &str = "BUSYSYNC_CONFIG";

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `BusySyncError::Config` if no source yields a valid
/// configuration.
pub fn load() -> Result<SyncConfig> {
    if dotenvy::dotenv().is_ok() {
        tracing::debug!("Loaded .env file");
    }

    if let Some(path) = env_var_opt(CONFIG_PATH_VAR) {
        return load_from_file(Some(PathBuf::from(path)));
    }

    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) if env_var_opt("GOOGLE_ACCOUNT_1_CLIENT_ID").is_none() => {
            tracing::debug!(error = ?e, "No accounts in environment, trying file");
            load_from_file(None).map_err(|file_err| {
                BusySyncError::Config(format!("{e}; {file_err}"))
            })
        }
        Err(e) => Err(e),
    }
}

/// Load configuration from the process environment.
///
/// # Errors
/// Returns `BusySyncError::Config` if required variables are missing or
/// malformed, or the result fails validation.
pub fn load_from_env() -> Result<SyncConfig> {
    load_from_vars(env_var_opt)
}

/// Load configuration from any variable source.
///
/// `lookup` returns the value of a variable, or `None` when unset. Blank
/// values count as unset.
pub fn load_from_vars<F>(lookup: F) -> Result<SyncConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    let accounts = read_accounts(&get)?;
    let sync_flows = read_flows(&get)?;

    let sync_interval_minutes = match get("SYNC_INTERVAL_MINUTES") {
        Some(raw) => parse_number("SYNC_INTERVAL_MINUTES", &raw)?,
        None => DEFAULT_SYNC_INTERVAL_MINUTES,
    };

    let config = SyncConfig {
        accounts,
        sync_flows,
        sync_interval_minutes,
        webhook_base_url: get("WEBHOOK_BASE_URL"),
    };
    config.validate()?;

    tracing::info!(
        accounts = config.accounts.len(),
        sync_flows = config.sync_flows.len(),
        "Loaded configuration"
    );
    Ok(config)
}

fn read_accounts(get: &impl Fn(&str) -> Option<String>) -> Result<Vec<Account>> {
    let mut accounts = Vec::new();
    for index in 1u32.. {
        let prefix = format!("GOOGLE_ACCOUNT_{index}");
        let name = get(&format!("{prefix}_NAME")).or_else(|| get(&format!("{prefix}_EMAIL")));
        let Some(name) = name else {
            break;
        };

        let client_id = required(get, &format!("{prefix}_CLIENT_ID"))?;
        let client_secret = required(get, &format!("{prefix}_CLIENT_SECRET"))?;
        let refresh_token = required(get, &format!("{prefix}_REFRESH_TOKEN"))?;

        let account = Account::new(index, name, client_id, client_secret, refresh_token)?;
        tracing::debug!(account_id = index, name = %account.name, "Loaded account");
        accounts.push(account);
    }

    if accounts.is_empty() {
        return Err(BusySyncError::Config(
            "No Google accounts configured; set GOOGLE_ACCOUNT_1_* variables".to_string(),
        ));
    }
    Ok(accounts)
}

fn read_flows(get: &impl Fn(&str) -> Option<String>) -> Result<Vec<SyncFlow>> {
    let mut flows = Vec::new();
    for index in 1u32.. {
        let prefix = format!("SYNC_FLOW_{index}");
        let Some(name) = get(&format!("{prefix}_NAME")) else {
            break;
        };

        let source_account_key = format!("{prefix}_SOURCE_ACCOUNT_ID");
        let target_account_key = format!("{prefix}_TARGET_ACCOUNT_ID");
        let source_account: u32 =
            parse_number(&source_account_key, &required(get, &source_account_key)?)?;
        let target_account: u32 =
            parse_number(&target_account_key, &required(get, &target_account_key)?)?;
        let source_calendar = required(get, &format!("{prefix}_SOURCE_CALENDAR_ID"))?;
        let target_calendar = required(get, &format!("{prefix}_TARGET_CALENDAR_ID"))?;

        let offset = |suffix: &str| -> Result<i64> {
            let key = format!("{prefix}_{suffix}");
            get(&key).map_or(Ok(0), |raw| parse_number(&key, &raw))
        };

        let flow = SyncFlow::new(name, (source_account, source_calendar), (target_account, target_calendar))
            .with_offsets(offset("START_OFFSET")?, offset("END_OFFSET")?);
        tracing::debug!(flow = %flow.name, "Loaded sync flow");
        flows.push(flow);
    }

    if flows.is_empty() {
        return Err(BusySyncError::Config(
            "No sync flows configured; set SYNC_FLOW_1_* variables".to_string(),
        ));
    }
    Ok(flows)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `BusySyncError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid or the configuration fails validation
pub fn load_from_file(path: Option<PathBuf>) -> Result<SyncConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(BusySyncError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            BusySyncError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| BusySyncError::Config(format!("Failed to read config file: {}", e)))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`). The result is
/// not validated.
pub fn parse_config(contents: &str, path: &Path) -> Result<SyncConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| BusySyncError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| BusySyncError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(BusySyncError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe the standard paths for a configuration file
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    const NAMES: [&str; 4] = ["busysync.toml", "busysync.json", "config.toml", "config.json"];

    let mut dirs = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    if let Some(exe_dir) = std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf)) {
        dirs.push(exe_dir);
    }

    dirs.iter()
        .flat_map(|dir| NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.is_file())
}

/* -------------------------------------------------------------------------- */
/* Helpers */
/* -------------------------------------------------------------------------- */

fn env_var_opt(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn required(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    get(key).ok_or_else(|| BusySyncError::Config(format!("Missing or empty environment variable: {key}")))
}

fn parse_number<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse::<T>().map_err(|e| BusySyncError::Config(format!("Invalid value for {key}: {e}")))
}
