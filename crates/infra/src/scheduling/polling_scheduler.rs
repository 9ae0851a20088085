//! Polling scheduler for periodic full syncs.
//!
//! Re-drives [`SyncEngine::sync_all_source_calendars`] over a fixed window
//! every interval. Webhooks are the fast path; this loop is the backstop for
//! notifications that never arrive.
//!
//! Timer ticks, forced runs and manual runs all go through the same run
//! function, so they share statistics and history. A failed run is logged
//! and counted but never stops the loop.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use busysync_infra::scheduling::{PollingScheduler, PollingSchedulerConfig};
//!
//! # async fn example(engine: Arc<busysync_core::SyncEngine>) -> Result<(), String> {
//! let config = PollingSchedulerConfig::from_minutes(5).map_err(|e| e.to_string())?;
//! let scheduler = PollingScheduler::new(engine, config);
//!
//! scheduler.start().await.map_err(|e| e.to_string())?;
//! // ... application runs ...
//! scheduler.stop().await.map_err(|e| e.to_string())?;
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use busysync_core::SyncEngine;
use busysync_domain::constants::{
    MAX_SYNC_INTERVAL_MINUTES, MIN_SYNC_INTERVAL_MINUTES, POLLING_DAYS_BACK, POLLING_DAYS_FORWARD,
};
use busysync_domain::{
    CompleteSyncResult, RunRecord, RunTrigger, SchedulerInfo, SchedulerStats, SyncType,
};
use chrono::{DateTime, Utc};
use parking_lot::{Mutex as SyncMutex, RwLock};
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::scheduling::error::{SchedulerError, SchedulerResult};

/// Configuration for the polling scheduler
#[derive(Debug, Clone)]
pub struct PollingSchedulerConfig {
    /// Time between scheduled runs
    pub interval: Duration,
    /// Days before now included in a scheduled run
    pub days_back: i64,
    /// Days after now included in a scheduled run
    pub days_forward: i64,
    /// Upper bound on a single run
    pub run_timeout: Duration,
    /// How long `stop` waits for the loop to exit
    pub stop_timeout: Duration,
    /// Number of run records kept in memory
    pub history_capacity: usize,
}

impl Default for PollingSchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300), // 5 minutes
            days_back: POLLING_DAYS_BACK,
            days_forward: POLLING_DAYS_FORWARD,
            run_timeout: Duration::from_secs(600),
            stop_timeout: Duration::from_secs(30),
            history_capacity: 50,
        }
    }
}

impl PollingSchedulerConfig {
    /// Default configuration with an interval given in whole minutes.
    pub fn from_minutes(minutes: u32) -> SchedulerResult<Self> {
        Ok(Self { interval: interval_from_minutes(minutes)?, ..Self::default() })
    }
}

fn interval_from_minutes(minutes: u32) -> SchedulerResult<Duration> {
    if !(MIN_SYNC_INTERVAL_MINUTES..=MAX_SYNC_INTERVAL_MINUTES).contains(&minutes) {
        return Err(SchedulerError::InvalidInterval {
            minutes,
            min: MIN_SYNC_INTERVAL_MINUTES,
            max: MAX_SYNC_INTERVAL_MINUTES,
        });
    }
    Ok(Duration::from_secs(u64::from(minutes) * 60))
}

/// State shared between the scheduler handle and its background loop
struct RunState {
    engine: Arc<SyncEngine>,
    stats: RwLock<SchedulerStats>,
    history: SyncMutex<VecDeque<RunRecord>>,
    next_run: SyncMutex<Option<DateTime<Utc>>>,
    force: Notify,
    // one sync at a time, whatever triggered it
    run_lock: Mutex<()>,
}

impl RunState {
    #[instrument(skip(self))]
    async fn run_sync(
        &self,
        trigger: RunTrigger,
        days_back: i64,
        days_forward: i64,
        run_timeout: Duration,
        history_capacity: usize,
    ) -> SchedulerResult<CompleteSyncResult> {
        let _running = self.run_lock.lock().await;

        let started_at = Utc::now();
        let started = Instant::now();
        let start = started_at - chrono::Duration::days(days_back);
        let end = started_at + chrono::Duration::days(days_forward);
        let sync_type = match trigger {
            RunTrigger::Manual => SyncType::Manual,
            RunTrigger::Scheduled | RunTrigger::Forced => SyncType::Polling,
        };

        debug!(%start, %end, "sync run starting");
        let outcome = tokio::time::timeout(
            run_timeout,
            self.engine.sync_all_source_calendars(start, end, sync_type),
        )
        .await;

        let mut record = RunRecord {
            trigger,
            started_at,
            duration_seconds: started.elapsed().as_secs_f64(),
            success: false,
            calendars_synced: 0,
            events_processed: 0,
            error: None,
        };

        let result = match outcome {
            Ok(result) => {
                record.calendars_synced = result.calendars_synced;
                record.events_processed = result.total_events_processed;
                record.error = failure_summary(&result);
                record.success = record.error.is_none();
                match &record.error {
                    None => info!(
                        calendars_synced = record.calendars_synced,
                        events_processed = record.events_processed,
                        duration_seconds = record.duration_seconds,
                        "sync run completed"
                    ),
                    Some(err) => warn!(error = %err, "sync run completed with failures"),
                }
                Ok(result)
            }
            Err(_) => {
                let err = SchedulerError::Timeout { seconds: run_timeout.as_secs() };
                error!(error = %err, "sync run timed out");
                record.error = Some(err.to_string());
                Err(err)
            }
        };

        self.record(record, history_capacity);
        result
    }

    fn record(&self, record: RunRecord, history_capacity: usize) {
        {
            let mut stats = self.stats.write();
            stats.total_runs += 1;
            if record.success {
                stats.successful_runs += 1;
            } else {
                stats.failed_runs += 1;
            }
            stats.last_run_time = Some(record.started_at);
            stats.last_run_success = Some(record.success);
            stats.last_run_error = record.error.clone();
        }

        let mut history = self.history.lock();
        history.push_back(record);
        while history.len() > history_capacity {
            history.pop_front();
        }
    }
}

/// `None` when every calendar synced.
fn failure_summary(result: &CompleteSyncResult) -> Option<String> {
    let failed: Vec<_> = result.failed_calendars().collect();
    let first = failed.first()?;
    Some(format!(
        "{} of {} calendars failed; {}: {}",
        failed.len(),
        result.calendars_synced,
        first.calendar_id,
        first.error.as_deref().unwrap_or("unknown error")
    ))
}

/// Polling scheduler for periodic full syncs
pub struct PollingScheduler {
    state: Arc<RunState>,
    config: RwLock<PollingSchedulerConfig>,
    cancellation_token: SyncMutex<CancellationToken>,
    task_handle: SyncMutex<Option<JoinHandle<()>>>,
    // true from a successful start until stop returns
    running: AtomicBool,
    // serialises start/stop/update_schedule
    lifecycle: Mutex<()>,
}

impl PollingScheduler {
    /// Create a stopped scheduler over `engine`.
    pub fn new(engine: Arc<SyncEngine>, config: PollingSchedulerConfig) -> Self {
        Self {
            state: Arc::new(RunState {
                engine,
                stats: RwLock::new(SchedulerStats::default()),
                history: SyncMutex::new(VecDeque::new()),
                next_run: SyncMutex::new(None),
                force: Notify::new(),
                run_lock: Mutex::new(()),
            }),
            config: RwLock::new(config),
            cancellation_token: SyncMutex::new(CancellationToken::new()),
            task_handle: SyncMutex::new(None),
            running: AtomicBool::new(false),
            lifecycle: Mutex::new(()),
        }
    }

    /// Start the scheduler
    ///
    /// Spawns the background loop. The first scheduled run happens one
    /// interval after start.
    ///
    /// # Errors
    ///
    /// Returns error if scheduler is already running
    #[instrument(skip(self))]
    pub async fn start(&self) -> SchedulerResult<()> {
        let _lifecycle = self.lifecycle.lock().await;
        self.start_locked().await
    }

    async fn start_locked(&self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        // Fresh token so the scheduler can restart after stop
        let cancel = CancellationToken::new();
        *self.cancellation_token.lock() = cancel.clone();

        let config = self.config.read().clone();
        info!(interval_secs = config.interval.as_secs(), "Starting polling scheduler");
        *self.state.next_run.lock() =
            chrono::Duration::from_std(config.interval).ok().map(|d| Utc::now() + d);

        let state = Arc::clone(&self.state);
        let handle = tokio::spawn(async move {
            Self::run_loop(state, config, cancel).await;
        });

        *self.task_handle.lock() = Some(handle);
        self.running.store(true, Ordering::SeqCst);

        info!("Polling scheduler started");
        Ok(())
    }

    /// Stop the scheduler gracefully
    ///
    /// Cancels the loop and waits for it to exit. A run already in progress
    /// is allowed to finish.
    ///
    /// # Errors
    ///
    /// Returns error if scheduler is not running or the loop does not exit
    /// within the stop timeout
    #[instrument(skip(self))]
    pub async fn stop(&self) -> SchedulerResult<()> {
        let _lifecycle = self.lifecycle.lock().await;
        self.stop_locked().await
    }

    async fn stop_locked(&self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        info!("Stopping polling scheduler");
        self.cancellation_token.lock().cancel();

        let stop_timeout = self.config.read().stop_timeout;
        let handle = self.task_handle.lock().take();
        let joined = match handle {
            Some(handle) => tokio::time::timeout(stop_timeout, handle)
                .await
                .map_err(|_| SchedulerError::Timeout { seconds: stop_timeout.as_secs() })
                .and_then(|joined| joined.map_err(SchedulerError::from)),
            None => Ok(()),
        };

        // the loop is cancelled either way
        self.running.store(false, Ordering::SeqCst);
        *self.state.next_run.lock() = None;
        joined?;
        info!("Polling scheduler stopped");
        Ok(())
    }

    /// Check if scheduler is running
    ///
    /// True from a successful `start` until `stop` returns, including while
    /// `stop` waits for an in-flight run. A loop task that died on its own
    /// counts as stopped.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
            && self.task_handle.lock().as_ref().map_or(true, |h| !h.is_finished())
    }

    /// Wake the loop for an immediate run. If a run is in flight the forced
    /// run follows it.
    ///
    /// # Errors
    ///
    /// Returns error if scheduler is not running
    #[instrument(skip(self))]
    pub fn force_run_now(&self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }
        self.state.force.notify_one();
        info!("Forced sync run requested");
        Ok(())
    }

    /// Run a sync right now on the caller's task, outside the timer.
    ///
    /// Works whether or not the loop is running and counts towards the same
    /// statistics.
    #[instrument(skip(self))]
    pub async fn run_manual_sync(
        &self,
        days_back: i64,
        days_forward: i64,
    ) -> SchedulerResult<CompleteSyncResult> {
        let config = self.config.read().clone();
        self.state
            .run_sync(
                RunTrigger::Manual,
                days_back,
                days_forward,
                config.run_timeout,
                config.history_capacity,
            )
            .await
    }

    /// Change the interval. A running scheduler is restarted so the new
    /// interval applies from now.
    ///
    /// # Errors
    ///
    /// Returns error if `minutes` is outside 1..=1440
    #[instrument(skip(self))]
    pub async fn update_schedule(&self, minutes: u32) -> SchedulerResult<()> {
        let interval = interval_from_minutes(minutes)?;
        let _lifecycle = self.lifecycle.lock().await;

        self.config.write().interval = interval;
        info!(minutes, "Sync interval updated");

        if self.is_running() {
            self.stop_locked().await?;
            self.start_locked().await?;
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        self.config.read().interval
    }

    pub fn stats(&self) -> SchedulerStats {
        self.state.stats.read().clone()
    }

    pub fn reset_stats(&self) {
        *self.state.stats.write() = SchedulerStats::default();
        info!("Scheduler statistics reset");
    }

    /// Most recent runs first, at most `limit` of them.
    pub fn job_history(&self, limit: usize) -> Vec<RunRecord> {
        self.state.history.lock().iter().rev().take(limit).cloned().collect()
    }

    pub fn info(&self) -> SchedulerInfo {
        let is_running = self.is_running();
        SchedulerInfo {
            is_running,
            sync_interval_minutes: u32::try_from(self.interval().as_secs() / 60)
                .unwrap_or(u32::MAX),
            next_run_time: if is_running { *self.state.next_run.lock() } else { None },
            stats: self.stats(),
        }
    }

    /// Background polling loop
    ///
    /// Scheduled runs follow one fixed ticker, so forced runs slot in
    /// between ticks without moving them.
    async fn run_loop(state: Arc<RunState>, config: PollingSchedulerConfig, cancel: CancellationToken) {
        let period = chrono::Duration::from_std(config.interval).ok();
        let mut ticker = tokio::time::interval(config.interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the first tick completes immediately
        ticker.tick().await;

        loop {
            let trigger = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!("Polling loop cancelled");
                    break;
                }
                _ = state.force.notified() => RunTrigger::Forced,
                _ = ticker.tick() => {
                    *state.next_run.lock() = period.map(|d| Utc::now() + d);
                    RunTrigger::Scheduled
                }
            };

            // Failures are already counted and logged by the run itself
            let _ = state
                .run_sync(
                    trigger,
                    config.days_back,
                    config.days_forward,
                    config.run_timeout,
                    config.history_capacity,
                )
                .await;
        }
        *state.next_run.lock() = None;
    }
}

impl Drop for PollingScheduler {
    fn drop(&mut self) {
        self.cancellation_token.lock().cancel();
    }
}
