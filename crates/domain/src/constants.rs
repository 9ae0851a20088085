//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

/// Title given to every busy block. Matching against existing events is
/// case-insensitive.
pub const BUSY_BLOCK_TITLE: &str = "Busy";

/// Minimum number of participants for an event to qualify for sync.
pub const MIN_PARTICIPANTS: usize = 2;

// Scheduler configuration
pub const DEFAULT_SYNC_INTERVAL_MINUTES: u32 = 5;
pub const MIN_SYNC_INTERVAL_MINUTES: u32 = 1;
pub const MAX_SYNC_INTERVAL_MINUTES: u32 = 1440;

/// Largest flow offset, in either direction, in minutes
pub const MAX_FLOW_OFFSET_MINUTES: i64 = 1440;

// Sync windows (days relative to now)
pub const WEBHOOK_DAYS_BACK: i64 = 1;
pub const WEBHOOK_DAYS_FORWARD: i64 = 7;
pub const POLLING_DAYS_BACK: i64 = 2;
pub const POLLING_DAYS_FORWARD: i64 = 14;

/// Identifier reported on every webhook processing result.
pub const WEBHOOK_TYPE_GOOGLE_CALENDAR: &str = "google_calendar";
