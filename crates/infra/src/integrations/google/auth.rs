//! OAuth2 access tokens via the refresh-token grant.
//!
//! Each account holds a long-lived refresh token. Short-lived access tokens
//! are fetched on demand, cached until shortly before they expire and
//! dropped when the API rejects them.

use std::time::Duration;

use busysync_domain::{Account, BusySyncError, Result};
use reqwest::{Client, StatusCode};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};

use super::types::TokenResponse;
use crate::errors::{status_error, InfraError};

/// Access tokens are refreshed this long before they expire.
pub const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug)]
struct CachedToken {
    access_token: String,
    refresh_at: Instant,
}

/// Refreshes and caches access tokens for one account.
pub struct TokenProvider {
    http: Client,
    token_url: String,
    account_id: u32,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    // Held across the refresh so concurrent callers share one request.
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(http: Client, token_url: impl Into<String>, account: &Account) -> Self {
        Self {
            http,
            token_url: token_url.into(),
            account_id: account.account_id,
            client_id: account.client_id.clone(),
            client_secret: account.client_secret.clone(),
            refresh_token: account.refresh_token.clone(),
            cached: Mutex::new(None),
        }
    }

    /// A valid access token, refreshing if the cached one is missing or
    /// about to expire.
    pub async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| Instant::now() < t.refresh_at) {
            return Ok(token.access_token.clone());
        }

        let fresh = self.refresh().await?;
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(access_token)
    }

    /// Forget the cached token so the next call refreshes.
    pub async fn invalidate(&self) {
        if self.cached.lock().await.take().is_some() {
            debug!(account_id = self.account_id, "access token invalidated");
        }
    }

    #[instrument(skip(self), fields(account_id = self.account_id))]
    async fn refresh(&self) -> Result<CachedToken> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", self.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(InfraError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "token refresh rejected");
            return Err(match status {
                StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                    BusySyncError::Auth(format!("token refresh failed ({status}): {}", body.trim()))
                }
                _ => status_error(status, &body),
            });
        }

        let token: TokenResponse = response.json().await.map_err(InfraError::from)?;
        let lifetime = Duration::from_secs(u64::try_from(token.expires_in).unwrap_or(0));
        debug!(expires_in = token.expires_in, "access token refreshed");
        Ok(CachedToken {
            access_token: token.access_token,
            refresh_at: Instant::now() + lifetime.saturating_sub(TOKEN_REFRESH_MARGIN),
        })
    }
}
