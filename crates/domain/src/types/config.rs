//! The validated configuration aggregate

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_SYNC_INTERVAL_MINUTES, MAX_SYNC_INTERVAL_MINUTES, MIN_SYNC_INTERVAL_MINUTES,
};
use crate::errors::{BusySyncError, Result};
use crate::types::{Account, SyncFlow};

const fn default_sync_interval() -> u32 {
    DEFAULT_SYNC_INTERVAL_MINUTES
}

/// All accounts, all sync flows and the polling cadence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    pub accounts: Vec<Account>,
    pub sync_flows: Vec<SyncFlow>,
    #[serde(default = "default_sync_interval")]
    pub sync_interval_minutes: u32,
    /// Public base URL that push notifications are delivered to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub webhook_base_url: Option<String>,
}

impl SyncConfig {
    /// Build and validate a configuration.
    pub fn new(accounts: Vec<Account>, sync_flows: Vec<SyncFlow>) -> Result<Self> {
        let config = Self {
            accounts,
            sync_flows,
            sync_interval_minutes: DEFAULT_SYNC_INTERVAL_MINUTES,
            webhook_base_url: None,
        };
        config.validate()?;
        Ok(config)
    }

    /// Enforce every configuration invariant. Failures are fatal at startup.
    pub fn validate(&self) -> Result<()> {
        if self.accounts.is_empty() {
            return Err(BusySyncError::Config("at least one account must be configured".into()));
        }
        if self.sync_flows.is_empty() {
            return Err(BusySyncError::Config("at least one sync flow must be configured".into()));
        }

        validate_accounts(&self.accounts)?;

        let account_ids: HashSet<u32> = self.accounts.iter().map(|a| a.account_id).collect();
        let mut flow_names = HashSet::new();
        for flow in &self.sync_flows {
            flow.validate()?;
            if !flow_names.insert(flow.name.as_str()) {
                return Err(BusySyncError::Config(format!(
                    "duplicate sync flow name '{}'",
                    flow.name
                )));
            }
            for account_id in [flow.source_account_id, flow.target_account_id] {
                if !account_ids.contains(&account_id) {
                    return Err(BusySyncError::Config(format!(
                        "sync flow '{}' references unknown account {account_id}",
                        flow.name
                    )));
                }
            }
        }

        validate_interval(self.sync_interval_minutes)
    }

    pub fn account(&self, account_id: u32) -> Option<&Account> {
        self.accounts.iter().find(|a| a.account_id == account_id)
    }
}

/// Reject duplicate ids and incomplete credentials.
pub fn validate_accounts(accounts: &[Account]) -> Result<()> {
    let mut seen = HashSet::new();
    for account in accounts {
        account.validate()?;
        if !seen.insert(account.account_id) {
            return Err(BusySyncError::Config(format!(
                "duplicate account id {}",
                account.account_id
            )));
        }
    }
    Ok(())
}

/// Polling cadence must be between one minute and one day.
pub fn validate_interval(minutes: u32) -> Result<()> {
    if (MIN_SYNC_INTERVAL_MINUTES..=MAX_SYNC_INTERVAL_MINUTES).contains(&minutes) {
        Ok(())
    } else {
        Err(BusySyncError::Config(format!(
            "sync interval must be between {MIN_SYNC_INTERVAL_MINUTES} and \
             {MAX_SYNC_INTERVAL_MINUTES} minutes, got {minutes}"
        )))
    }
}
