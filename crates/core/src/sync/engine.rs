//! Sync engine - the single place business rules are applied
//!
//! Every entry point (webhook, polling timer, manual run) funnels source
//! events through [`SyncEngine::process_event`]. The engine matches the
//! event against the configured flows, decides whether a busy block should
//! exist, re-checks the target calendar and only then writes.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use busysync_domain::{
    BusyBlock, CalendarEvent, CalendarSyncResult, CompleteSyncResult, EngineStats,
    ProcessingResult, RemoteEvent, Result, SyncAction, SyncFlow, SyncType,
};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{debug, error, info, instrument, warn};

use super::guard::BlockGuards;
use super::stats::EngineCounters;
use crate::accounts::AccountRegistry;
use crate::calendar_ports::CalendarClient;

/// Reason reported when a free event had no block to remove.
const FREE_EVENT_REASON: &str = "Event is marked as free (transparency: transparent)";

/// Reconciles busy blocks on target calendars with source events.
pub struct SyncEngine {
    flows: Vec<SyncFlow>,
    registry: Arc<AccountRegistry>,
    counters: EngineCounters,
    guards: BlockGuards,
}

impl SyncEngine {
    /// Create a new sync engine over the given flows
    pub fn new(flows: Vec<SyncFlow>, registry: Arc<AccountRegistry>) -> Self {
        info!(flow_count = flows.len(), "sync engine initialised");
        Self { flows, registry, counters: EngineCounters::default(), guards: BlockGuards::default() }
    }

    pub fn flows(&self) -> &[SyncFlow] {
        &self.flows
    }

    pub fn registry(&self) -> &Arc<AccountRegistry> {
        &self.registry
    }

    /// Flows fed by the given source calendar, in configuration order.
    pub fn flows_for_calendar(&self, account_id: u32, calendar_id: &str) -> Vec<&SyncFlow> {
        self.flows.iter().filter(|f| f.matches_source(account_id, calendar_id)).collect()
    }

    /// Distinct (account, calendar) source pairs, in configuration order.
    pub fn unique_source_calendars(&self) -> Vec<(u32, String)> {
        let mut seen = HashSet::new();
        self.flows
            .iter()
            .map(|f| (f.source_account_id, f.source_calendar_id.clone()))
            .filter(|pair| seen.insert(pair.clone()))
            .collect()
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            accounts_configured: self.registry.account_count(),
            sync_flows_configured: self.flows.len(),
            ..self.counters.snapshot()
        }
    }

    pub fn reset_stats(&self) {
        self.counters.reset();
        info!("sync engine statistics reset");
    }

    /// Process one source event against every matching flow.
    ///
    /// Returns one result per matching flow; flows fail independently.
    #[instrument(skip(self, event), fields(event_id = %event.id, calendar_id = %event.calendar_id))]
    pub async fn process_event(
        &self,
        event: &CalendarEvent,
        sync_type: SyncType,
    ) -> Vec<ProcessingResult> {
        self.counters.record_event();

        let flows = self.flows_for_calendar(event.account_id, &event.calendar_id);
        if flows.is_empty() {
            debug!("no sync flows match event source");
            return Vec::new();
        }

        join_all(flows.into_iter().map(|flow| self.process_for_flow(event, flow, sync_type))).await
    }

    async fn process_for_flow(
        &self,
        event: &CalendarEvent,
        flow: &SyncFlow,
        sync_type: SyncType,
    ) -> ProcessingResult {
        match self.apply_flow(event, flow, sync_type).await {
            Ok(result) => result,
            Err(err) => {
                self.counters.record_error();
                error!(flow = %flow.name, event_id = %event.id, error = %err, "flow processing failed");
                ProcessingResult::failed(flow, event, sync_type, err.to_string())
            }
        }
    }

    async fn apply_flow(
        &self,
        event: &CalendarEvent,
        flow: &SyncFlow,
        sync_type: SyncType,
    ) -> Result<ProcessingResult> {
        if !event.has_multiple_participants() {
            return Ok(skipped(event, flow, sync_type));
        }

        if event.status.is_cancelled() {
            let deleted = self.delete_busy_blocks(event, flow).await?;
            let action = if deleted > 0 { SyncAction::Deleted } else { SyncAction::DeleteAttempted };
            return Ok(ProcessingResult::completed(flow, event, sync_type, action));
        }

        if !event.status.is_confirmed() {
            return Ok(skipped(event, flow, sync_type));
        }

        if event.is_transparent() {
            let deleted = self.delete_busy_blocks(event, flow).await?;
            return Ok(if deleted > 0 {
                ProcessingResult::with_reason(
                    flow,
                    event,
                    sync_type,
                    SyncAction::Deleted,
                    FREE_EVENT_REASON,
                )
            } else {
                ProcessingResult::with_reason(
                    flow,
                    event,
                    sync_type,
                    SyncAction::Skipped,
                    FREE_EVENT_REASON,
                )
            });
        }

        let action = if self.create_busy_block(event, flow).await? {
            SyncAction::Created
        } else {
            SyncAction::Existed
        };
        Ok(ProcessingResult::completed(flow, event, sync_type, action))
    }

    /// Returns `true` if a block was written, `false` if one already
    /// existed.
    async fn create_busy_block(&self, event: &CalendarEvent, flow: &SyncFlow) -> Result<bool> {
        let block = BusyBlock::from_event_and_flow(event, flow)?;
        let client = self.registry.get_client(flow.target_account_id).await?;

        let _guard = self.guards.lock(&block).await;
        if !find_matching_blocks(client.as_ref(), &block).await?.is_empty() {
            debug!(flow = %flow.name, event_id = %event.id, "busy block already exists");
            return Ok(false);
        }

        let created =
            client.create_event(&block.target_calendar_id, &block.to_new_event(&event.title)).await?;
        self.counters.record_created();
        info!(
            flow = %flow.name,
            event_id = %event.id,
            busy_block_id = %created.id,
            start = %block.start_time,
            end = %block.end_time,
            "busy block created"
        );
        Ok(true)
    }

    /// Delete every block matching or covering the computed window.
    /// Individual delete failures are logged and skipped.
    async fn delete_busy_blocks(&self, event: &CalendarEvent, flow: &SyncFlow) -> Result<u64> {
        let block = BusyBlock::from_event_and_flow(event, flow)?;
        let client = self.registry.get_client(flow.target_account_id).await?;

        let _guard = self.guards.lock(&block).await;
        let existing = find_matching_blocks(client.as_ref(), &block).await?;
        if existing.is_empty() {
            debug!(flow = %flow.name, event_id = %event.id, "no busy block to delete");
            return Ok(0);
        }

        let mut deleted = 0;
        for candidate in &existing {
            match client.delete_event(&block.target_calendar_id, &candidate.id).await {
                Ok(true) => deleted += 1,
                Ok(false) => debug!(busy_block_id = %candidate.id, "busy block already gone"),
                Err(err) => warn!(
                    flow = %flow.name,
                    busy_block_id = %candidate.id,
                    error = %err,
                    "failed to delete busy block"
                ),
            }
        }

        if deleted > 0 {
            self.counters.record_deleted(deleted);
            info!(flow = %flow.name, event_id = %event.id, deleted, "busy blocks deleted");
        }
        Ok(deleted)
    }

    /// Fetch a window from one source calendar and process every event.
    ///
    /// A fetch failure is recorded on the result, never raised.
    #[instrument(skip(self))]
    pub async fn sync_calendar_events(
        &self,
        calendar_id: &str,
        account_id: u32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        sync_type: SyncType,
    ) -> CalendarSyncResult {
        let mut result = CalendarSyncResult::new(calendar_id, account_id, start, end, sync_type);

        let fetched = match self.registry.get_client(account_id).await {
            Ok(client) => client.get_events(calendar_id, start, end).await,
            Err(err) => Err(err),
        };
        let remote_events = match fetched {
            Ok(events) => events,
            Err(err) => {
                self.counters.record_error();
                warn!(calendar_id, account_id, error = %err, "failed to fetch source events");
                result.error = Some(err.to_string());
                return result;
            }
        };

        result.events_found = remote_events.len();
        for remote in remote_events {
            let event_id = remote.id.clone();
            let event = match CalendarEvent::from_remote(remote, calendar_id, account_id) {
                Ok(event) => event,
                Err(err) => {
                    self.counters.record_error();
                    warn!(calendar_id, event_id = %event_id, error = %err, "skipping malformed event");
                    continue;
                }
            };

            let processed = self.process_event(&event, sync_type).await;
            if !processed.is_empty() {
                result.events_processed += 1;
                result.results.extend(processed);
            }
        }

        info!(
            calendar_id,
            account_id,
            %sync_type,
            events_found = result.events_found,
            events_processed = result.events_processed,
            "calendar sync finished"
        );
        result
    }

    /// Sync every configured source calendar over the same window.
    #[instrument(skip(self))]
    pub async fn sync_all_source_calendars(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        sync_type: SyncType,
    ) -> CompleteSyncResult {
        let sync_start_time = Utc::now();
        let started = Instant::now();
        let calendars = self.unique_source_calendars();

        let calendar_results = join_all(calendars.iter().map(|(account_id, calendar_id)| {
            self.sync_calendar_events(calendar_id, *account_id, start, end, sync_type)
        }))
        .await;

        let result = CompleteSyncResult {
            sync_type,
            start_date: start,
            end_date: end,
            calendars_synced: calendar_results.len(),
            total_events_found: calendar_results.iter().map(|r| r.events_found).sum(),
            total_events_processed: calendar_results.iter().map(|r| r.events_processed).sum(),
            calendar_results,
            sync_duration_seconds: Some(started.elapsed().as_secs_f64()),
            sync_start_time,
        };

        info!(
            %sync_type,
            calendars_synced = result.calendars_synced,
            total_events_found = result.total_events_found,
            total_events_processed = result.total_events_processed,
            "full sync finished"
        );
        result
    }
}

fn skipped(event: &CalendarEvent, flow: &SyncFlow, sync_type: SyncType) -> ProcessingResult {
    let mut reason = format!(
        "Event doesn't meet criteria (participants: {}, status: {}",
        event.participant_count(),
        event.status
    );
    if event.is_transparent() {
        reason.push_str(&format!(", transparency: {}", event.transparency));
    }
    reason.push(')');
    ProcessingResult::with_reason(flow, event, sync_type, SyncAction::Skipped, reason)
}

/// Busy events on the target calendar that either match the block exactly
/// or fully cover it, deduplicated by id.
async fn find_matching_blocks(
    client: &dyn CalendarClient,
    block: &BusyBlock,
) -> Result<Vec<RemoteEvent>> {
    let mut matches = client
        .find_events_by_time_and_title(
            &block.target_calendar_id,
            block.start_time,
            block.end_time,
            &block.title,
        )
        .await?;

    let window =
        client.get_events(&block.target_calendar_id, block.start_time, block.end_time).await?;
    let mut seen: HashSet<String> = matches.iter().map(|e| e.id.clone()).collect();
    matches.extend(
        window.into_iter().filter(|e| block.is_covered_by(e) && seen.insert(e.id.clone())),
    );
    Ok(matches)
}
