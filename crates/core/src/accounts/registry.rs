//! Account registry - owns accounts and lazily connected clients

use std::collections::BTreeMap;
use std::sync::Arc;

use busysync_domain::{
    validate_accounts, Account, AccountSummary, BusySyncError, CalendarInfo, Result,
};
use dashmap::DashMap;
use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use crate::calendar_ports::{CalendarClient, CalendarClientFactory};

/// Owns the configured accounts and one cached client per account.
///
/// Clients are created on first use and probed once (list calendars)
/// before being cached. Cache entries are independent per account.
pub struct AccountRegistry {
    accounts: BTreeMap<u32, Account>,
    clients: DashMap<u32, Arc<dyn CalendarClient>>,
    factory: Arc<dyn CalendarClientFactory>,
}

impl AccountRegistry {
    /// Create a new registry. Duplicate ids or incomplete credentials are a
    /// configuration error.
    pub fn new(accounts: Vec<Account>, factory: Arc<dyn CalendarClientFactory>) -> Result<Self> {
        validate_accounts(&accounts)?;
        info!(account_count = accounts.len(), "account registry initialised");
        Ok(Self {
            accounts: accounts.into_iter().map(|a| (a.account_id, a)).collect(),
            clients: DashMap::new(),
            factory,
        })
    }

    pub fn account(&self, account_id: u32) -> Option<Account> {
        self.accounts.get(&account_id).cloned()
    }

    pub fn account_name(&self, account_id: u32) -> Option<String> {
        self.accounts.get(&account_id).map(|a| a.name.clone())
    }

    /// All accounts ordered by id.
    pub fn accounts(&self) -> Vec<Account> {
        self.accounts.values().cloned().collect()
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_cached(&self, account_id: u32) -> bool {
        self.clients.contains_key(&account_id)
    }

    /// Get the cached client for an account, connecting on first use.
    #[instrument(skip(self))]
    pub async fn get_client(&self, account_id: u32) -> Result<Arc<dyn CalendarClient>> {
        if let Some(client) = self.clients.get(&account_id).map(|c| Arc::clone(c.value())) {
            return Ok(client);
        }

        let account = self
            .account(account_id)
            .ok_or_else(|| BusySyncError::NotFound(format!("account {account_id} not found")))?;

        let client = self.factory.create_client(&account).await.map_err(|err| {
            BusySyncError::Account {
                account_id,
                message: format!("failed to create client: {err}"),
            }
        })?;

        if let Err(err) = client.list_calendars().await {
            warn!(account_id, error = %err, "connectivity probe failed");
            return Err(match err {
                BusySyncError::Auth(message) => {
                    BusySyncError::Auth(format!("account {account_id}: {message}"))
                }
                other => BusySyncError::Account {
                    account_id,
                    message: format!("failed to connect: {other}"),
                },
            });
        }

        let cached = Arc::clone(self.clients.entry(account_id).or_insert(client).value());
        debug!(account_id, "client connected and cached");
        Ok(cached)
    }

    /// Calendars visible to an account, annotated with the account.
    #[instrument(skip(self))]
    pub async fn list_calendars(&self, account_id: u32) -> Result<Vec<CalendarInfo>> {
        let account = self
            .account(account_id)
            .ok_or_else(|| BusySyncError::NotFound(format!("account {account_id} not found")))?;
        let client = self.get_client(account_id).await?;
        let calendars = client.list_calendars().await?;
        Ok(calendars.into_iter().map(|c| c.with_account(&account)).collect())
    }

    /// Calendars for every account. Accounts that fail report an empty list.
    pub async fn list_all_calendars(&self) -> BTreeMap<u32, Vec<CalendarInfo>> {
        let ids: Vec<u32> = self.accounts.keys().copied().collect();
        let listings = join_all(ids.iter().map(|id| self.list_calendars(*id))).await;
        ids.into_iter()
            .zip(listings)
            .map(|(id, listing)| {
                let calendars = listing.unwrap_or_else(|err| {
                    warn!(account_id = id, error = %err, "failed to list calendars");
                    Vec::new()
                });
                (id, calendars)
            })
            .collect()
    }

    pub async fn test_connection(&self, account_id: u32) -> bool {
        match self.get_client(account_id).await {
            Ok(client) => client.test_connection().await,
            Err(err) => {
                debug!(account_id, error = %err, "connection test failed");
                false
            }
        }
    }

    pub async fn test_all_accounts(&self) -> BTreeMap<u32, bool> {
        let ids: Vec<u32> = self.accounts.keys().copied().collect();
        let outcomes = join_all(ids.iter().map(|id| self.test_connection(*id))).await;
        ids.into_iter().zip(outcomes).collect()
    }

    /// Connection report for every account. One account failing never
    /// affects the others.
    pub async fn account_summary(&self) -> Vec<AccountSummary> {
        let accounts = self.accounts();
        join_all(accounts.iter().map(|account| self.summarize(account))).await
    }

    async fn summarize(&self, account: &Account) -> AccountSummary {
        let listing = self.list_calendars(account.account_id).await;
        let client_cached = self.is_cached(account.account_id);
        match listing {
            Ok(calendars) => AccountSummary {
                account_id: account.account_id,
                name: account.name.clone(),
                connection_ok: true,
                calendar_count: calendars.len(),
                client_cached,
                error: None,
            },
            Err(err) => AccountSummary {
                account_id: account.account_id,
                name: account.name.clone(),
                connection_ok: false,
                calendar_count: 0,
                client_cached,
                error: Some(err.to_string()),
            },
        }
    }

    /// Drop the cached client for one account, or for every account.
    pub fn clear_cache(&self, account_id: Option<u32>) {
        match account_id {
            Some(id) => {
                self.clients.remove(&id);
                debug!(account_id = id, "client cache cleared");
            }
            None => {
                self.clients.clear();
                debug!("all client caches cleared");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{InMemoryCalendar, InMemoryClientFactory};

    fn account(id: u32) -> Account {
        Account::new(id, format!("user{id}@example.com"), "client", "secret", "token").unwrap()
    }

    fn registry_with(ids: &[u32]) -> (AccountRegistry, Arc<InMemoryClientFactory>) {
        let factory = Arc::new(InMemoryClientFactory::new());
        for id in ids {
            factory.register(*id, Arc::new(InMemoryCalendar::with_calendars(["primary"])));
        }
        let accounts = ids.iter().map(|id| account(*id)).collect();
        let registry = AccountRegistry::new(accounts, factory.clone()).unwrap();
        (registry, factory)
    }

    #[test]
    fn rejects_duplicate_ids() {
        let factory = Arc::new(InMemoryClientFactory::new());
        let result = AccountRegistry::new(vec![account(1), account(1)], factory);
        assert!(matches!(result, Err(BusySyncError::Config(_))));
    }

    #[tokio::test]
    async fn client_is_created_once_and_cached() {
        let (registry, factory) = registry_with(&[1]);
        assert!(!registry.is_cached(1));

        registry.get_client(1).await.unwrap();
        registry.get_client(1).await.unwrap();

        assert!(registry.is_cached(1));
        assert_eq!(factory.created_count(), 1);
    }

    #[tokio::test]
    async fn unknown_account_is_not_found() {
        let (registry, _) = registry_with(&[1]);
        assert!(matches!(registry.get_client(9).await, Err(BusySyncError::NotFound(_))));
    }

    #[tokio::test]
    async fn failed_probe_is_wrapped_and_not_cached() {
        let (registry, factory) = registry_with(&[1]);
        factory.client(1).unwrap().set_connection_failure(true);

        let err = registry.get_client(1).await.err().unwrap();
        assert!(matches!(err, BusySyncError::Account { account_id: 1, .. }));
        assert!(!registry.is_cached(1));
    }

    #[tokio::test]
    async fn clearing_one_account_keeps_others() {
        let (registry, _) = registry_with(&[1, 2]);
        registry.get_client(1).await.unwrap();
        registry.get_client(2).await.unwrap();

        registry.clear_cache(Some(1));
        assert!(!registry.is_cached(1));
        assert!(registry.is_cached(2));

        registry.clear_cache(None);
        assert!(!registry.is_cached(2));
    }
}
