//! Per-block mutual exclusion for check-then-act sequences
//!
//! The webhook path, the polling timer and manual runs may process the same
//! source event at the same time. Holding the guard for a block's key across
//! the existence check and the following write keeps two tasks in this
//! process from both deciding to create the same block.

use std::sync::Arc;

use busysync_domain::BusyBlock;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct BlockKey {
    account_id: u32,
    calendar_id: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl From<&BusyBlock> for BlockKey {
    fn from(block: &BusyBlock) -> Self {
        Self {
            account_id: block.target_account_id,
            calendar_id: block.target_calendar_id.clone(),
            start: block.start_time,
            end: block.end_time,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct BlockGuards {
    locks: DashMap<BlockKey, Arc<Mutex<()>>>,
}

/// Held for the duration of one check-then-act sequence.
pub(crate) struct BlockGuard<'a> {
    owner: &'a BlockGuards,
    key: BlockKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl BlockGuards {
    pub(crate) async fn lock(&self, block: &BusyBlock) -> BlockGuard<'_> {
        let key = BlockKey::from(block);
        let mutex = Arc::clone(self.locks.entry(key.clone()).or_default().value());
        let guard = mutex.lock_owned().await;
        BlockGuard { owner: self, key, guard: Some(guard) }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.locks.len()
    }
}

impl Drop for BlockGuard<'_> {
    fn drop(&mut self) {
        self.guard.take();
        // Only the map still references the mutex once nobody waits on it.
        self.owner.locks.remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}
