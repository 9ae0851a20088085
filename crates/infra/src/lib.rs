//! # BusySync Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The Google Calendar client and its client factory
//! - Configuration loading (environment variables, TOML/JSON files)
//! - The polling scheduler that drives periodic full syncs
//! - Conversions from transport errors into domain errors
//!
//! ## Architecture
//! - Implements traits defined in `busysync-core`
//! - Depends on `busysync-common`, `busysync-domain` and `busysync-core`
//! - Contains all "impure" code (network I/O, timers, files)

pub mod config;
pub mod errors;
pub mod integrations;
pub mod scheduling;

// Re-export commonly used items
pub use errors::InfraError;
pub use integrations::{GoogleCalendarClient, GoogleClientConfig, GoogleClientFactory};
pub use scheduling::{PollingScheduler, PollingSchedulerConfig, SchedulerError};
