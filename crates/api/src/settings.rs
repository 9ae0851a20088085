//! Process-level settings for the HTTP surface
//!
//! Read from the environment next to the sync configuration, but kept out of
//! `SyncConfig` since the core never sees them.

use std::net::SocketAddr;

use busysync_domain::{BusySyncError, Result};

pub const BIND_ADDR_VAR: &str = "BUSYSYNC_BIND_ADDR";
pub const API_KEY_VAR: &str = "WEBHOOK_API_KEY";
pub const CHANNEL_TOKEN_VAR: &str = "WEBHOOK_CHANNEL_TOKEN";

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";

#[derive(Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub bind_addr: SocketAddr,
    /// Required in `X-API-Key` on the admin routes when set
    pub api_key: Option<String>,
    /// Sent with every push channel and required back on notifications
    pub channel_token: Option<String>,
}

impl std::fmt::Debug for ServerSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerSettings")
            .field("bind_addr", &self.bind_addr)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("channel_token", &self.channel_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl ServerSettings {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build settings from an arbitrary variable lookup. Blank values count
    /// as unset.
    ///
    /// # Errors
    ///
    /// `BusySyncError::Config` when the bind address does not parse.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let raw_addr = var(BIND_ADDR_VAR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = raw_addr.parse::<SocketAddr>().map_err(|err| {
            BusySyncError::Config(format!("{BIND_ADDR_VAR} '{raw_addr}' is not a socket address: {err}"))
        })?;

        Ok(Self { bind_addr, api_key: var(API_KEY_VAR), channel_token: var(CHANNEL_TOKEN_VAR) })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn settings(vars: &[(&str, &str)]) -> Result<ServerSettings> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        ServerSettings::from_vars(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_without_variables() {
        let settings = settings(&[]).unwrap();
        assert_eq!(settings.bind_addr.port(), 8000);
        assert!(settings.api_key.is_none());
        assert!(settings.channel_token.is_none());
    }

    #[test]
    fn reads_overrides_and_ignores_blank_values() {
        let settings = settings(&[
            (BIND_ADDR_VAR, "127.0.0.1:9090"),
            (API_KEY_VAR, "s3cret"),
            (CHANNEL_TOKEN_VAR, "   "),
        ])
        .unwrap();
        assert_eq!(settings.bind_addr, "127.0.0.1:9090".parse().unwrap());
        assert_eq!(settings.api_key.as_deref(), Some("s3cret"));
        assert!(settings.channel_token.is_none());
    }

    #[test]
    fn rejects_bad_bind_address() {
        let err = settings(&[(BIND_ADDR_VAR, "localhost")]).unwrap_err();
        assert!(matches!(err, BusySyncError::Config(msg) if msg.contains(BIND_ADDR_VAR)));
    }

    #[test]
    fn debug_redacts_secrets() {
        let settings = settings(&[(API_KEY_VAR, "s3cret")]).unwrap();
        assert!(!format!("{settings:?}").contains("s3cret"));
    }
}
