//! Reporting artifacts produced by the sync engine. Never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;
use crate::types::{CalendarEvent, SyncFlow};

/// Which entry point triggered a sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncType {
    Webhook,
    Polling,
    Manual,
    Test,
}

impl_domain_status_conversions!(SyncType {
    Webhook => "webhook",
    Polling => "polling",
    Manual => "manual",
    Test => "test",
});

/// What happened to one event for one flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncAction {
    Created,
    Existed,
    Deleted,
    DeleteAttempted,
    Skipped,
    Error,
}

impl_domain_status_conversions!(SyncAction {
    Created => "created",
    Existed => "existed",
    Deleted => "deleted",
    DeleteAttempted => "delete_attempted",
    Skipped => "skipped",
    Error => "error",
});

/// Outcome for one event under one flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingResult {
    pub flow_name: String,
    pub event_id: String,
    pub event_title: String,
    pub sync_type: SyncType,
    pub success: bool,
    pub action: SyncAction,
    pub error: Option<String>,
    pub reason: Option<String>,
}

impl ProcessingResult {
    /// A successful outcome with no further explanation.
    pub fn completed(
        flow: &SyncFlow,
        event: &CalendarEvent,
        sync_type: SyncType,
        action: SyncAction,
    ) -> Self {
        Self {
            flow_name: flow.name.clone(),
            event_id: event.id.clone(),
            event_title: event.title.clone(),
            sync_type,
            success: true,
            action,
            error: None,
            reason: None,
        }
    }

    /// A successful outcome explained by `reason`.
    pub fn with_reason(
        flow: &SyncFlow,
        event: &CalendarEvent,
        sync_type: SyncType,
        action: SyncAction,
        reason: impl Into<String>,
    ) -> Self {
        Self { reason: Some(reason.into()), ..Self::completed(flow, event, sync_type, action) }
    }

    /// A failed flow.
    pub fn failed(
        flow: &SyncFlow,
        event: &CalendarEvent,
        sync_type: SyncType,
        error: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::completed(flow, event, sync_type, SyncAction::Error)
        }
    }
}

/// Outcome of syncing one source calendar over a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarSyncResult {
    pub calendar_id: String,
    pub account_id: u32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub sync_type: SyncType,
    pub events_found: usize,
    /// Events that matched at least one flow.
    pub events_processed: usize,
    pub results: Vec<ProcessingResult>,
    pub error: Option<String>,
}

impl CalendarSyncResult {
    pub fn new(
        calendar_id: impl Into<String>,
        account_id: u32,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        sync_type: SyncType,
    ) -> Self {
        Self {
            calendar_id: calendar_id.into(),
            account_id,
            start_date,
            end_date,
            sync_type,
            events_found: 0,
            events_processed: 0,
            results: Vec::new(),
            error: None,
        }
    }

    pub fn count_action(&self, action: SyncAction) -> usize {
        self.results.iter().filter(|r| r.action == action).count()
    }
}

/// Outcome of syncing every configured source calendar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompleteSyncResult {
    pub sync_type: SyncType,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub calendars_synced: usize,
    pub total_events_found: usize,
    pub total_events_processed: usize,
    pub calendar_results: Vec<CalendarSyncResult>,
    pub sync_duration_seconds: Option<f64>,
    pub sync_start_time: DateTime<Utc>,
}

impl CompleteSyncResult {
    /// Calendars whose fetch failed.
    pub fn failed_calendars(&self) -> impl Iterator<Item = &CalendarSyncResult> {
        self.calendar_results.iter().filter(|r| r.error.is_some())
    }

    pub fn has_errors(&self) -> bool {
        self.failed_calendars().next().is_some()
    }

    pub fn results(&self) -> impl Iterator<Item = &ProcessingResult> {
        self.calendar_results.iter().flat_map(|r| r.results.iter())
    }
}
