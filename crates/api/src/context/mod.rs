//! Application context - dependency injection container

use std::sync::Arc;

use busysync_core::{AccountRegistry, CalendarClientFactory, SyncEngine, WebhookHandler};
use busysync_domain::{Result, SyncConfig};
use busysync_infra::{PollingScheduler, PollingSchedulerConfig};
use tracing::{info, warn};

use crate::utils::health::{ComponentHealth, HealthStatus};

/// Holds every service, wired from one validated configuration.
///
/// The registry is shared by the engine, the engine by the webhook handler
/// and the scheduler, so all three entry points drive the same state.
pub struct AppContext {
    pub config: SyncConfig,
    pub registry: Arc<AccountRegistry>,
    pub engine: Arc<SyncEngine>,
    pub webhook_handler: Arc<WebhookHandler>,
    pub scheduler: Arc<PollingScheduler>,
    channel_token: Option<String>,
}

impl AppContext {
    /// Build the context with a scheduler polling at the configured interval.
    ///
    /// # Errors
    ///
    /// Returns `BusySyncError::Config` for an invalid configuration and
    /// `BusySyncError::Validation` for an out-of-range interval.
    pub fn new(config: SyncConfig, factory: Arc<dyn CalendarClientFactory>) -> Result<Self> {
        let scheduler_config = PollingSchedulerConfig::from_minutes(config.sync_interval_minutes)?;
        Self::with_scheduler_config(config, factory, scheduler_config)
    }

    /// Build the context with explicit scheduler settings.
    ///
    /// Tests use this to poll at sub-minute intervals.
    pub fn with_scheduler_config(
        config: SyncConfig,
        factory: Arc<dyn CalendarClientFactory>,
        scheduler_config: PollingSchedulerConfig,
    ) -> Result<Self> {
        config.validate()?;

        let registry = Arc::new(AccountRegistry::new(config.accounts.clone(), factory)?);
        let engine = Arc::new(SyncEngine::new(config.sync_flows.clone(), Arc::clone(&registry)));
        let webhook_handler = Arc::new(WebhookHandler::new(Arc::clone(&engine)));
        let scheduler = Arc::new(PollingScheduler::new(Arc::clone(&engine), scheduler_config));

        info!(
            accounts = config.accounts.len(),
            sync_flows = config.sync_flows.len(),
            monitored_calendars = webhook_handler.monitored_calendars().len(),
            "application context initialised"
        );

        Ok(Self { config, registry, engine, webhook_handler, scheduler, channel_token: None })
    }

    /// Require inbound notifications to carry this channel token.
    #[must_use]
    pub fn with_channel_token(mut self, token: Option<String>) -> Self {
        self.channel_token = token.filter(|t| !t.is_empty());
        self
    }

    pub fn channel_token(&self) -> Option<&str> {
        self.channel_token.as_deref()
    }

    /// Start the polling scheduler. Starting twice is a no-op.
    pub async fn start(&self) -> Result<()> {
        if self.scheduler.is_running() {
            return Ok(());
        }
        self.scheduler.start().await?;
        info!("application context started");
        Ok(())
    }

    /// Stop the scheduler, letting an in-flight run finish.
    pub async fn shutdown(&self) -> Result<()> {
        info!("shutdown called on AppContext");

        if self.scheduler.is_running() {
            if let Err(err) = self.scheduler.stop().await {
                warn!(error = %err, "scheduler did not stop cleanly");
                return Err(err.into());
            }
        }

        let stats = self.engine.stats();
        info!(
            events_processed = stats.events_processed,
            busy_blocks_created = stats.busy_blocks_created,
            busy_blocks_deleted = stats.busy_blocks_deleted,
            errors = stats.errors,
            "application context shut down"
        );
        Ok(())
    }

    /// Component-level health without touching the remote API.
    pub async fn health_check(&self) -> HealthStatus {
        let scheduler_running = self.scheduler.is_running();

        let registry = if self.registry.account_count() > 0 {
            ComponentHealth::healthy_with(
                "account_registry",
                format!("{} accounts", self.registry.account_count()),
            )
        } else {
            ComponentHealth::unhealthy("account_registry", "no accounts configured")
        };

        let engine = if self.engine.flows().is_empty() {
            ComponentHealth::unhealthy("sync_engine", "no sync flows configured")
        } else {
            ComponentHealth::healthy_with(
                "sync_engine",
                format!("{} sync flows", self.engine.flows().len()),
            )
        };

        let webhook = ComponentHealth::healthy_with(
            "webhook_handler",
            format!("{} monitored calendars", self.webhook_handler.monitored_calendars().len()),
        );

        let scheduler = if scheduler_running {
            ComponentHealth::healthy("polling_scheduler")
        } else {
            ComponentHealth::unhealthy("polling_scheduler", "scheduler is not running")
        };

        let mut status = HealthStatus::new()
            .add_component(registry)
            .add_component(engine)
            .add_component(webhook)
            .add_component(scheduler);
        status.scheduler_running = scheduler_running;
        status.calculate_score();
        status
    }
}
