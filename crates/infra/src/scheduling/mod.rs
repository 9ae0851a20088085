//! Scheduling infrastructure for automated sync runs
//!
//! The polling scheduler re-drives the sync engine over every source
//! calendar on a fixed interval, as a backstop for missed webhooks:
//! - Explicit lifecycle management (start/stop)
//! - Join handle tracked for the spawned loop
//! - Cancellation token support
//! - Timeout wrapping on stop and on each run

pub mod error;
pub mod polling_scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use polling_scheduler::{PollingScheduler, PollingSchedulerConfig};
