//! Sync flows: one-way source to target calendar mappings

use serde::{Deserialize, Serialize};

use crate::constants::MAX_FLOW_OFFSET_MINUTES;
use crate::errors::{BusySyncError, Result};

/// A configured mapping from a source (account, calendar) to a target
/// (account, calendar), with minute offsets applied to timed events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncFlow {
    pub name: String,
    pub source_account_id: u32,
    pub source_calendar_id: String,
    pub target_account_id: u32,
    pub target_calendar_id: String,
    /// Minutes added to the event start. Never positive.
    #[serde(default, alias = "start_offset")]
    pub start_offset_minutes: i64,
    /// Minutes added to the event end. Never negative.
    #[serde(default, alias = "end_offset")]
    pub end_offset_minutes: i64,
}

impl SyncFlow {
    /// Create a flow with no offsets.
    pub fn new(
        name: impl Into<String>,
        source: (u32, impl Into<String>),
        target: (u32, impl Into<String>),
    ) -> Self {
        Self {
            name: name.into(),
            source_account_id: source.0,
            source_calendar_id: source.1.into(),
            target_account_id: target.0,
            target_calendar_id: target.1.into(),
            start_offset_minutes: 0,
            end_offset_minutes: 0,
        }
    }

    #[must_use]
    pub fn with_offsets(mut self, start_offset_minutes: i64, end_offset_minutes: i64) -> Self {
        self.start_offset_minutes = start_offset_minutes;
        self.end_offset_minutes = end_offset_minutes;
        self
    }

    /// Whether events from the given source calendar feed this flow.
    pub fn matches_source(&self, account_id: u32, calendar_id: &str) -> bool {
        self.source_account_id == account_id && self.source_calendar_id == calendar_id
    }

    /// Structural checks that do not need the account set.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(BusySyncError::Config("sync flow name must not be empty".into()));
        }
        if self.source_calendar_id.trim().is_empty() || self.target_calendar_id.trim().is_empty() {
            return Err(BusySyncError::Config(format!(
                "sync flow '{}' must name both source and target calendars",
                self.name
            )));
        }
        if self.source_account_id == 0 || self.target_account_id == 0 {
            return Err(BusySyncError::Config(format!(
                "sync flow '{}' account ids must be positive",
                self.name
            )));
        }
        if self.start_offset_minutes > 0 {
            return Err(BusySyncError::Config(format!(
                "sync flow '{}' start offset must be <= 0, got {}",
                self.name, self.start_offset_minutes
            )));
        }
        if self.end_offset_minutes < 0 {
            return Err(BusySyncError::Config(format!(
                "sync flow '{}' end offset must be >= 0, got {}",
                self.name, self.end_offset_minutes
            )));
        }
        if self.start_offset_minutes < -MAX_FLOW_OFFSET_MINUTES
            || self.end_offset_minutes > MAX_FLOW_OFFSET_MINUTES
        {
            return Err(BusySyncError::Config(format!(
                "sync flow '{}' offsets must be within {MAX_FLOW_OFFSET_MINUTES} minutes",
                self.name
            )));
        }
        Ok(())
    }
}

/// A flow annotated with the display names of both accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncFlowInfo {
    pub name: String,
    pub source_account_id: u32,
    pub source_account_name: Option<String>,
    pub source_calendar_id: String,
    pub target_account_id: u32,
    pub target_account_name: Option<String>,
    pub target_calendar_id: String,
    pub start_offset_minutes: i64,
    pub end_offset_minutes: i64,
}
