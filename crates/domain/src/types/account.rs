//! Calendar accounts and their reported state

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{BusySyncError, Result};

/// A configured calendar account with its OAuth2 credentials.
///
/// Immutable after load. `Debug` redacts every credential.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: u32,
    /// Display identity, usually the account email address.
    #[serde(alias = "email")]
    pub name: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
}

impl Account {
    /// Create a new account, rejecting incomplete credentials.
    pub fn new(
        account_id: u32,
        name: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Result<Self> {
        let account = Self {
            account_id,
            name: name.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
        };
        account.validate()?;
        Ok(account)
    }

    /// Check the account id is positive and every credential is non-blank.
    pub fn validate(&self) -> Result<()> {
        if self.account_id == 0 {
            return Err(BusySyncError::Config("account_id must be a positive integer".into()));
        }
        let required = [
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("refresh_token", &self.refresh_token),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(BusySyncError::Config(format!(
                    "account {} is missing {field}",
                    self.account_id
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("account_id", &self.account_id)
            .field("name", &self.name)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Connection report for one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSummary {
    pub account_id: u32,
    pub name: String,
    pub connection_ok: bool,
    pub calendar_count: usize,
    pub client_cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// A calendar visible to an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarInfo {
    pub id: String,
    pub summary: String,
    pub access_role: String,
    #[serde(default)]
    pub primary: bool,
    /// Filled in by the registry when listing on behalf of an account.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
}

impl CalendarInfo {
    pub fn new(id: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            summary: summary.into(),
            access_role: "owner".into(),
            primary: false,
            account_id: None,
            account_name: None,
        }
    }

    /// Annotate the calendar with its owning account.
    #[must_use]
    pub fn with_account(mut self, account: &Account) -> Self {
        self.account_id = Some(account.account_id);
        self.account_name = Some(account.name.clone());
        self
    }
}
