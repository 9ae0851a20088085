//! Health check command

use crate::context::AppContext;
use crate::utils::health::HealthStatus;

/// Get application health status.
///
/// # Example Response
/// ```json
/// {
///   "status": "healthy",
///   "services_initialized": true,
///   "scheduler_running": true,
///   "score": 1.0,
///   "message": null,
///   "components": [
///     { "name": "account_registry", "is_healthy": true, "message": "2 accounts" },
///     { "name": "polling_scheduler", "is_healthy": true, "message": null }
///   ],
///   "timestamp": "2024-05-01T09:30:00Z"
/// }
/// ```
pub async fn health_check(ctx: &AppContext) -> HealthStatus {
    ctx.health_check().await
}
