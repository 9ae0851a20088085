//! Statistics types for the engine and the scheduler

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

/* -------------------------------------------------------------------------- */
/* Engine Statistics */
/* -------------------------------------------------------------------------- */

/// Cumulative engine counters plus static configuration counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    pub events_processed: u64,
    pub busy_blocks_created: u64,
    pub busy_blocks_deleted: u64,
    pub errors: u64,
    pub accounts_configured: usize,
    pub sync_flows_configured: usize,
}

/* -------------------------------------------------------------------------- */
/* Scheduler Statistics */
/* -------------------------------------------------------------------------- */

/// Run counters maintained by the polling scheduler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    pub total_runs: u64,
    pub successful_runs: u64,
    pub failed_runs: u64,
    pub last_run_time: Option<DateTime<Utc>>,
    pub last_run_success: Option<bool>,
    pub last_run_error: Option<String>,
}

/// Snapshot of the scheduler's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerInfo {
    pub is_running: bool,
    pub sync_interval_minutes: u32,
    pub next_run_time: Option<DateTime<Utc>>,
    pub stats: SchedulerStats,
}

/// What started a scheduler run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunTrigger {
    Scheduled,
    Forced,
    Manual,
}

impl_domain_status_conversions!(RunTrigger {
    Scheduled => "scheduled",
    Forced => "forced",
    Manual => "manual",
});

/// One entry of the scheduler's recent run history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub trigger: RunTrigger,
    pub started_at: DateTime<Utc>,
    pub duration_seconds: f64,
    pub success: bool,
    pub calendars_synced: usize,
    pub events_processed: usize,
    pub error: Option<String>,
}
