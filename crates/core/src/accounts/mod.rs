//! Account registry: configured accounts and their cached clients

pub mod registry;

pub use registry::AccountRegistry;
