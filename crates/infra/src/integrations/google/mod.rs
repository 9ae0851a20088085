//! Google Calendar integration
//!
//! - `client`: the [`CalendarClient`](busysync_core::CalendarClient)
//!   implementation over the Calendar v3 REST API
//! - `auth`: refresh-token grant and access token caching
//! - `factory`: per-account client construction for the registry
//! - `types`: wire formats

pub mod auth;
pub mod client;
pub mod factory;
mod types;

pub use auth::TokenProvider;
pub use client::{GoogleCalendarClient, GoogleClientConfig, RetryableErrorPolicy};
pub use factory::GoogleClientFactory;
