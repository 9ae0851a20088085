//! HTTP surface over the command layer
//!
//! Google posts notifications to [`WEBHOOK_PATH`]; the admin routes nested
//! under it are guarded by an optional `X-API-Key`.

mod handlers;
mod server;

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

pub use self::server::HttpServer;
use crate::commands::webhook::WEBHOOK_PATH;
use crate::commands::CommandError;
use crate::context::AppContext;

pub const API_KEY_HEADER: &str = "x-api-key";

#[derive(Clone)]
pub(crate) struct HttpState {
    ctx: Arc<AppContext>,
    api_key: Option<Arc<str>>,
}

/// Build the router. With `api_key` set, admin routes answer 401 unless the
/// request carries the same key.
pub fn router(ctx: Arc<AppContext>, api_key: Option<String>) -> Router {
    let state = HttpState { ctx, api_key: api_key.map(Arc::from) };

    let admin_route = |path: &str| format!("{WEBHOOK_PATH}{path}");
    let admin = Router::new()
        .route(&admin_route("/status"), get(handlers::sync_status))
        .route(&admin_route("/sync/manual"), post(handlers::manual_sync))
        .route(&admin_route("/accounts"), get(handlers::accounts))
        .route(&admin_route("/accounts/{account_id}/calendars"), get(handlers::account_calendars))
        .route(&admin_route("/sync-flows"), get(handlers::sync_flows))
        .route(&admin_route("/scheduler/run-now"), post(handlers::scheduler_run_now))
        .route(&admin_route("/scheduler/interval"), post(handlers::scheduler_interval))
        .route(&admin_route("/subscriptions"), post(handlers::setup_subscriptions))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    Router::new()
        .route("/health", get(handlers::health))
        .route(WEBHOOK_PATH, post(handlers::webhook))
        .merge(admin)
        .with_state(state)
}

async fn require_api_key(State(state): State<HttpState>, request: Request, next: Next) -> Response {
    if let Some(expected) = state.api_key.as_deref() {
        let provided = request.headers().get(API_KEY_HEADER).and_then(|value| value.to_str().ok());
        if provided != Some(expected) {
            let error = CommandError {
                kind: "unauthorized".to_string(),
                message: "Invalid or missing API key".to_string(),
            };
            return (StatusCode::UNAUTHORIZED, Json(error)).into_response();
        }
    }
    next.run(request).await
}

impl IntoResponse for CommandError {
    fn into_response(self) -> Response {
        let status = match self.kind.as_str() {
            "invalid_input" | "validation" => StatusCode::BAD_REQUEST,
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "account" | "auth" | "transient_api" | "permanent_api" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}
