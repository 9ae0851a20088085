//! Command execution helpers
//!
//! Wraps command bodies with timing, structured logging and conversion of
//! domain errors into the serialisable [`CommandError`].

use std::future::Future;
use std::time::Instant;

use busysync_domain::Result as DomainResult;

use crate::commands::CommandError;
use crate::utils::logging::log_command_execution;

/// Execute a command body, log its outcome and map the error.
///
/// # Example
///
/// ```rust,ignore
/// pub async fn list_accounts(ctx: &AppContext) -> CommandResult<Vec<AccountSummary>> {
///     execute_command("accounts::list_accounts", || async {
///         Ok(ctx.registry.account_summary().await)
///     })
///     .await
/// }
/// ```
pub async fn execute_command<F, Fut, T>(command_name: &str, command_fn: F) -> Result<T, CommandError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = DomainResult<T>>,
{
    let start = Instant::now();
    let result = command_fn().await;
    log_command_execution(command_name, start.elapsed(), result.is_ok());
    result.map_err(CommandError::from)
}
