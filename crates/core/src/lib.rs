//! # BusySync Core
//!
//! Business logic layer - no HTTP, no configuration loading.
//!
//! This crate contains:
//! - The calendar backend ports ([`CalendarClient`], [`CalendarClientFactory`])
//! - The account registry and its per-account client cache
//! - The sync engine that owns every busy-block decision
//! - The webhook handler that feeds push notifications into the engine
//!
//! ## Architecture Principles
//! - Only depends on `busysync-domain`
//! - All external calendar access via traits
//! - Pure, testable business logic

pub mod accounts;
pub mod calendar_ports;
pub mod sync;
pub mod webhook;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use accounts::AccountRegistry;
pub use calendar_ports::{CalendarClient, CalendarClientFactory};
pub use sync::{EngineCounters, SyncEngine};
pub use webhook::WebhookHandler;
