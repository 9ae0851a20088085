//! Route handlers. Each one delegates to a command.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use busysync_domain::{
    AccountSummary, CalendarInfo, SubscriptionResult, SyncFlowInfo, WebhookProcessingResult,
};
use serde::Deserialize;

use super::HttpState;
use crate::commands::{
    self, ActionResponse, CommandError, CommandResult, ManualSyncRequest, ManualSyncResponse,
    SyncStatus,
};
use crate::utils::health::HealthStatus;

type JsonResult<T> = CommandResult<Json<T>>;

pub(super) async fn health(State(state): State<HttpState>) -> Json<HealthStatus> {
    Json(commands::health_check(&state.ctx).await)
}

/// Rejected notifications answer 400 so they show up in Google's channel
/// diagnostics; processed ones answer 200 even when a flow failed.
pub(super) async fn webhook(
    State(state): State<HttpState>,
    headers: HeaderMap,
) -> (StatusCode, Json<WebhookProcessingResult>) {
    let headers: HashMap<String, String> = headers
        .iter()
        .filter_map(|(name, value)| {
            value.to_str().ok().map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();

    let result = commands::handle_webhook_notification(&state.ctx, &headers).await;
    let status = if result.success { StatusCode::OK } else { StatusCode::BAD_REQUEST };
    (status, Json(result))
}

pub(super) async fn sync_status(State(state): State<HttpState>) -> JsonResult<SyncStatus> {
    commands::get_sync_status(&state.ctx).await.map(Json)
}

pub(super) async fn manual_sync(
    State(state): State<HttpState>,
    Query(request): Query<ManualSyncRequest>,
) -> JsonResult<ManualSyncResponse> {
    commands::trigger_manual_sync(&state.ctx, request).await.map(Json)
}

pub(super) async fn accounts(State(state): State<HttpState>) -> JsonResult<Vec<AccountSummary>> {
    commands::list_accounts(&state.ctx).await.map(Json)
}

pub(super) async fn account_calendars(
    State(state): State<HttpState>,
    Path(account_id): Path<u32>,
) -> JsonResult<Vec<CalendarInfo>> {
    commands::list_calendars_for_account(&state.ctx, account_id).await.map(Json)
}

pub(super) async fn sync_flows(State(state): State<HttpState>) -> JsonResult<Vec<SyncFlowInfo>> {
    commands::list_sync_flows(&state.ctx).await.map(Json)
}

pub(super) async fn scheduler_run_now(State(state): State<HttpState>) -> JsonResult<ActionResponse> {
    commands::force_scheduler_run_now(&state.ctx).await.map(Json)
}

#[derive(Debug, Deserialize)]
pub(super) struct IntervalRequest {
    minutes: u32,
}

pub(super) async fn scheduler_interval(
    State(state): State<HttpState>,
    Query(request): Query<IntervalRequest>,
) -> JsonResult<ActionResponse> {
    commands::sync::update_sync_interval(&state.ctx, request.minutes).await.map(Json)
}

#[derive(Debug, Deserialize)]
pub(super) struct SubscriptionRequest {
    base_url: Option<String>,
}

/// Falls back to the configured `webhook_base_url`.
pub(super) async fn setup_subscriptions(
    State(state): State<HttpState>,
    Query(request): Query<SubscriptionRequest>,
) -> JsonResult<Vec<SubscriptionResult>> {
    let base_url = request
        .base_url
        .or_else(|| state.ctx.config.webhook_base_url.clone())
        .ok_or_else(|| {
            CommandError::invalid_input("no base_url given and WEBHOOK_BASE_URL is not configured")
        })?;
    commands::setup_webhook_subscriptions(&state.ctx, &base_url).await.map(Json)
}
