//! Sync engine: applies flows to source events and reconciles busy blocks

pub mod engine;
mod guard;
pub mod stats;

pub use engine::SyncEngine;
pub use stats::EngineCounters;
