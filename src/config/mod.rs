//! Configuration module.
//!
//! Values come from hardcoded defaults, an optional TOML file and a small
//! set of environment overrides, in that order.

pub mod loader;

pub use loader::{
    apply_env_overrides, default_config_path, default_log_path, load_config_file,
    load_config_with_precedence, merge_config, resolve, ConfigError, ConfigFile, ResolvedConfig,
};
