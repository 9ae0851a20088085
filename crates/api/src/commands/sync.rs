//! Sync status and on-demand sync commands

use busysync_domain::constants::{POLLING_DAYS_BACK, POLLING_DAYS_FORWARD};
use busysync_domain::{
    BusySyncError, CompleteSyncResult, EngineStats, MonitoredCalendar, RunRecord, SchedulerInfo,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::commands::CommandResult;
use crate::context::AppContext;
use crate::utils::command_helpers::execute_command;

/// Runs included in [`SyncStatus::recent_runs`].
const STATUS_HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncStatus {
    pub engine_stats: EngineStats,
    pub scheduler_info: SchedulerInfo,
    pub monitored_calendars: Vec<MonitoredCalendar>,
    /// Newest first
    pub recent_runs: Vec<RunRecord>,
    pub timestamp: DateTime<Utc>,
}

/// Window for a manual sync, in days around now. Missing values fall back
/// to the polling window.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ManualSyncRequest {
    pub days_back: Option<i64>,
    pub days_forward: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualSyncResponse {
    pub success: bool,
    pub message: String,
    pub results: CompleteSyncResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

pub async fn get_sync_status(ctx: &AppContext) -> CommandResult<SyncStatus> {
    execute_command("sync::get_sync_status", || async {
        Ok(SyncStatus {
            engine_stats: ctx.engine.stats(),
            scheduler_info: ctx.scheduler.info(),
            monitored_calendars: ctx.webhook_handler.monitored_calendars().to_vec(),
            recent_runs: ctx.scheduler.job_history(STATUS_HISTORY_LIMIT),
            timestamp: Utc::now(),
        })
    })
    .await
}

/// Sync every source calendar now, on the caller's task.
///
/// Per-calendar failures do not fail the command; they are reported in the
/// results and flip `success` to false.
///
/// # Errors
///
/// `invalid_input` for a negative window, `internal` when the run times out.
pub async fn trigger_manual_sync(
    ctx: &AppContext,
    request: ManualSyncRequest,
) -> CommandResult<ManualSyncResponse> {
    execute_command("sync::trigger_manual_sync", || async {
        let days_back = request.days_back.unwrap_or(POLLING_DAYS_BACK);
        let days_forward = request.days_forward.unwrap_or(POLLING_DAYS_FORWARD);
        if days_back < 0 || days_forward < 0 {
            return Err(BusySyncError::InvalidInput(format!(
                "sync window must not be negative (days_back={days_back}, days_forward={days_forward})"
            )));
        }

        info!(days_back, days_forward, "manual sync requested");
        let results = ctx.scheduler.run_manual_sync(days_back, days_forward).await?;

        let failed = results.failed_calendars().count();
        let message = if failed == 0 {
            "Manual sync completed".to_string()
        } else {
            format!("Manual sync completed with {failed} failed calendars")
        };
        Ok(ManualSyncResponse { success: failed == 0, message, results })
    })
    .await
}

/// Wake the running scheduler for an immediate run.
///
/// # Errors
///
/// `invalid_input` when the scheduler is not running.
pub async fn force_scheduler_run_now(ctx: &AppContext) -> CommandResult<ActionResponse> {
    execute_command("sync::force_scheduler_run_now", || async {
        ctx.scheduler.force_run_now()?;
        Ok(ActionResponse { success: true, message: "Scheduler run triggered".to_string() })
    })
    .await
}

/// Change the polling interval, restarting a running scheduler.
pub async fn update_sync_interval(ctx: &AppContext, minutes: u32) -> CommandResult<ActionResponse> {
    execute_command("sync::update_sync_interval", || async {
        ctx.scheduler.update_schedule(minutes).await?;
        Ok(ActionResponse {
            success: true,
            message: format!("Sync interval set to {minutes} minutes"),
        })
    })
    .await
}
