//! Account and sync-flow listing commands

use busysync_domain::{AccountSummary, CalendarInfo, SyncFlowInfo};

use crate::commands::CommandResult;
use crate::context::AppContext;
use crate::utils::command_helpers::execute_command;

/// Connection summary for every configured account.
///
/// Each account is probed independently; a failing account shows up with
/// `connection_ok = false` instead of failing the command.
pub async fn list_accounts(ctx: &AppContext) -> CommandResult<Vec<AccountSummary>> {
    execute_command("accounts::list_accounts", || async {
        Ok(ctx.registry.account_summary().await)
    })
    .await
}

/// Calendars visible to one account.
///
/// # Errors
///
/// `not_found` for an unknown account id, `account`/`auth` when the account
/// cannot connect.
pub async fn list_calendars_for_account(
    ctx: &AppContext,
    account_id: u32,
) -> CommandResult<Vec<CalendarInfo>> {
    execute_command("accounts::list_calendars_for_account", || async {
        ctx.registry.list_calendars(account_id).await
    })
    .await
}

/// Configured flows, annotated with both accounts' display names.
pub async fn list_sync_flows(ctx: &AppContext) -> CommandResult<Vec<SyncFlowInfo>> {
    execute_command("accounts::list_sync_flows", || async {
        Ok(ctx
            .engine
            .flows()
            .iter()
            .map(|flow| SyncFlowInfo {
                name: flow.name.clone(),
                source_account_id: flow.source_account_id,
                source_account_name: ctx.registry.account_name(flow.source_account_id),
                source_calendar_id: flow.source_calendar_id.clone(),
                target_account_id: flow.target_account_id,
                target_account_name: ctx.registry.account_name(flow.target_account_id),
                target_calendar_id: flow.target_calendar_id.clone(),
                start_offset_minutes: flow.start_offset_minutes,
                end_offset_minutes: flow.end_offset_minutes,
            })
            .collect())
    })
    .await
}
