//! # BusySync Domain
//!
//! Business domain types and models for BusySync.
//!
//! This crate contains:
//! - Accounts, sync flows and the validated configuration aggregate
//! - Calendar events and the busy blocks derived from them
//! - Processing, sync and scheduler result types
//! - Domain error types and Result definitions
//!
//! ## Architecture
//! - No dependencies on other BusySync crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use errors::*;
pub use types::*;
