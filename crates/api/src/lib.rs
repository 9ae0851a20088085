//! # BusySync API
//!
//! Application layer - commands, HTTP surface and the binary's wiring.
//!
//! This crate contains:
//! - The command surface (status, manual sync, listings, webhook ingestion)
//! - Application context (dependency injection)
//! - The axum router and server lifecycle
//! - Tracing bootstrap
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires the registry, engine, webhook handler and scheduler together
//! - Commands are plain async functions over `&AppContext`, so the HTTP
//!   layer stays a thin adapter

pub mod commands;
pub mod context;
pub mod http;
pub mod settings;
pub mod utils;

// Re-export for convenience
pub use commands::*;
pub use context::*;
pub use settings::ServerSettings;
