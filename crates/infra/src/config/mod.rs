//! Configuration loading
//!
//! Loads the validated [`busysync_domain::SyncConfig`] from environment
//! variables or a TOML/JSON file.

pub mod loader;

// Re-export commonly used items
pub use loader::{
    load, load_from_env, load_from_file, load_from_vars, parse_config, probe_config_paths,
    CONFIG_PATH_VAR,
};
