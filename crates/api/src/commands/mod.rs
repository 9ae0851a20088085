//! Command surface exposed to the HTTP layer and the binary

pub mod accounts;
pub mod error;
pub mod health;
pub mod sync;
pub mod webhook;

pub use accounts::{list_accounts, list_calendars_for_account, list_sync_flows};
pub use error::{CommandError, CommandResult};
pub use health::health_check;
pub use sync::{
    force_scheduler_run_now, get_sync_status, trigger_manual_sync, ActionResponse,
    ManualSyncRequest, ManualSyncResponse, SyncStatus,
};
pub use webhook::{handle_webhook_notification, setup_webhook_subscriptions, webhook_callback_url};
