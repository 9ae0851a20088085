//! Lock-free engine counters

use std::sync::atomic::{AtomicU64, Ordering};

use busysync_domain::EngineStats;

/// Monotonic counters shared by every entry point into the engine.
#[derive(Debug, Default)]
pub struct EngineCounters {
    events_processed: AtomicU64,
    busy_blocks_created: AtomicU64,
    busy_blocks_deleted: AtomicU64,
    errors: AtomicU64,
}

impl EngineCounters {
    pub fn record_event(&self) {
        self.events_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_created(&self) {
        self.busy_blocks_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_deleted(&self, count: u64) {
        self.busy_blocks_deleted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Current counter values. Static configuration counts are left at zero
    /// for the caller to fill in.
    pub fn snapshot(&self) -> EngineStats {
        EngineStats {
            events_processed: self.events_processed.load(Ordering::Relaxed),
            busy_blocks_created: self.busy_blocks_created.load(Ordering::Relaxed),
            busy_blocks_deleted: self.busy_blocks_deleted.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            ..EngineStats::default()
        }
    }

    pub fn reset(&self) {
        self.events_processed.store(0, Ordering::Relaxed);
        self.busy_blocks_created.store(0, Ordering::Relaxed);
        self.busy_blocks_deleted.store(0, Ordering::Relaxed);
        self.errors.store(0, Ordering::Relaxed);
    }
}
