//! Builds Google clients for the account registry

use std::sync::Arc;

use async_trait::async_trait;
use busysync_core::{CalendarClient, CalendarClientFactory};
use busysync_domain::{Account, BusySyncError, Result};
use reqwest::Client;
use tracing::debug;

use super::client::{GoogleCalendarClient, GoogleClientConfig};

/// One HTTP connection pool shared by every account's client.
pub struct GoogleClientFactory {
    http: Client,
    config: GoogleClientConfig,
}

impl GoogleClientFactory {
    pub fn new(config: GoogleClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("busysync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| BusySyncError::Config(format!("failed to build HTTP client: {err}")))?;
        Ok(Self { http, config })
    }

    pub const fn config(&self) -> &GoogleClientConfig {
        &self.config
    }
}

#[async_trait]
impl CalendarClientFactory for GoogleClientFactory {
    async fn create_client(&self, account: &Account) -> Result<Arc<dyn CalendarClient>> {
        debug!(account_id = account.account_id, "building Google calendar client");
        let client = GoogleCalendarClient::new(self.http.clone(), &self.config, account)?;
        Ok(Arc::new(client))
    }
}
