//! Health check types for AppContext components

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const STATUS_HEALTHY: &str = "healthy";
pub const STATUS_DEGRADED: &str = "degraded";
pub const STATUS_UNHEALTHY: &str = "unhealthy";

/// Overall health of the process.
///
/// # Example
/// ```
/// use busysync_api::utils::health::{ComponentHealth, HealthStatus};
///
/// let mut status = HealthStatus::new()
///     .add_component(ComponentHealth::healthy("sync_engine"))
///     .add_component(ComponentHealth::unhealthy("polling_scheduler", "not running"));
/// status.calculate_score();
///
/// assert_eq!(status.score, 0.5);
/// assert_eq!(status.status, "degraded");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// `healthy`, `degraded` or `unhealthy`
    pub status: String,

    /// Every service was constructed from a validated configuration
    pub services_initialized: bool,

    pub scheduler_running: bool,

    /// Share of healthy components, 0.0 to 1.0
    pub score: f64,

    pub message: Option<String>,

    pub components: Vec<ComponentHealth>,

    pub timestamp: DateTime<Utc>,
}

impl HealthStatus {
    /// Healthy with no components yet.
    pub fn new() -> Self {
        Self {
            status: STATUS_HEALTHY.to_string(),
            services_initialized: true,
            scheduler_running: false,
            score: 1.0,
            message: None,
            components: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Returns self for method chaining
    #[must_use]
    pub fn add_component(mut self, component: ComponentHealth) -> Self {
        self.components.push(component);
        self
    }

    /// Recompute `score` and `status` from the components.
    ///
    /// Any unhealthy component degrades the status.
    pub fn calculate_score(&mut self) {
        if self.components.is_empty() {
            return;
        }

        let healthy_count = self.components.iter().filter(|c| c.is_healthy).count();
        #[allow(clippy::cast_precision_loss)]
        let score = healthy_count as f64 / self.components.len() as f64;

        self.score = score;
        self.status = if healthy_count == self.components.len() {
            STATUS_HEALTHY.to_string()
        } else {
            STATUS_DEGRADED.to_string()
        };
    }

    pub fn is_healthy(&self) -> bool {
        self.status == STATUS_HEALTHY
    }

    /// Services could not be reached at all.
    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self {
            status: STATUS_UNHEALTHY.to_string(),
            services_initialized: false,
            scheduler_running: false,
            score: 0.0,
            message: Some(message.into()),
            components: Vec::new(),
            timestamp: Utc::now(),
        }
    }
}

impl Default for HealthStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// Health status of an individual component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    /// Component identifier (e.g., "account_registry", "polling_scheduler")
    pub name: String,

    pub is_healthy: bool,

    /// Optional message describing health state or error
    pub message: Option<String>,
}

impl ComponentHealth {
    pub fn healthy(name: impl Into<String>) -> Self {
        Self { name: name.into(), is_healthy: true, message: None }
    }

    pub fn healthy_with(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self { name: name.into(), is_healthy: true, message: Some(message.into()) }
    }

    pub fn unhealthy(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self { name: name.into(), is_healthy: false, message: Some(message.into()) }
    }
}
