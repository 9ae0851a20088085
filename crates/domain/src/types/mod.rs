//! Domain types and models

pub mod account;
pub mod busy_block;
pub mod config;
pub mod event;
pub mod flow;
pub mod results;
pub mod stats;
pub mod webhook;

pub use account::{Account, AccountSummary, CalendarInfo};
pub use busy_block::BusyBlock;
pub use config::{validate_accounts, validate_interval, SyncConfig};
pub use event::{CalendarEvent, EventStatus, NewEvent, PushChannel, RemoteEvent, Transparency};
pub use flow::{SyncFlow, SyncFlowInfo};
pub use results::{
    CalendarSyncResult, CompleteSyncResult, ProcessingResult, SyncAction, SyncType,
};
pub use stats::{EngineStats, RunRecord, RunTrigger, SchedulerInfo, SchedulerStats};
pub use webhook::{
    MonitoredCalendar, ResourceState, SubscriptionResult, WebhookNotification,
    WebhookProcessingResult,
};
