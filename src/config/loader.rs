//! Configuration file loading with precedence handling.

use crate::intern::HarvestStrategy;
use crate::list::RowOptions;
use crate::model::{default_columns, ColumnSpec};
use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;
use tracing::warn;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "PKTLIST_CONFIG";

/// Environment variable overriding the harvest strategy.
pub const STRATEGY_ENV: &str = "PKTLIST_STRING_STRATEGY";

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Config file path contains invalid UTF-8 or cannot be resolved.
    #[error("Invalid config path: {0}")]
    InvalidPath(String),

    /// Failed to read config file (file may not exist or have permission issues).
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Config file contains invalid TOML syntax.
    #[error("Invalid TOML in {path}: {reason}")]
    ParseError {
        /// Path with invalid TOML.
        path: PathBuf,
        /// Parse error details.
        reason: String,
    },
}

/// TOML configuration file structure.
///
/// All fields are optional - if not specified, hardcoded defaults are used.
/// Corresponds to `~/.config/pktlist/config.toml`:
///
/// ```toml
/// placeholder = "?"
/// read_error_prefix = "Error reading record"
/// string_strategy = "minimize-copies"
///
/// [[columns]]
/// title = "No."
/// format = "number"
///
/// [[columns]]
/// title = "Host"
/// format = { custom = "http.host" }
/// resolved = false
/// ```
#[derive(Debug, Clone, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Text shown in every column of an unreadable record.
    #[serde(default)]
    pub placeholder: Option<String>,

    /// Leading text of the message in the error column.
    #[serde(default)]
    pub read_error_prefix: Option<String>,

    /// How decoded column text is stored.
    #[serde(default)]
    pub string_strategy: Option<HarvestStrategy>,

    /// Initial capacity of the string pool.
    #[serde(default)]
    pub pool_capacity: Option<usize>,

    /// Visible column layout.
    #[serde(default)]
    pub columns: Option<Vec<ColumnSpec>>,

    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,
}

/// Resolved configuration after applying precedence rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub placeholder: String,
    pub read_error_prefix: String,
    pub string_strategy: HarvestStrategy,
    pub pool_capacity: usize,
    pub columns: Vec<ColumnSpec>,
    pub log_file_path: PathBuf,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        let row = RowOptions::default();
        Self {
            placeholder: row.placeholder,
            read_error_prefix: row.read_error_prefix,
            string_strategy: row.strategy,
            pool_capacity: 4096,
            columns: default_columns(),
            log_file_path: default_log_path(),
        }
    }
}

impl ResolvedConfig {
    /// Row text options derived from this config.
    pub fn row_options(&self) -> RowOptions {
        RowOptions {
            placeholder: self.placeholder.clone(),
            read_error_prefix: self.read_error_prefix.clone(),
            strategy: self.string_strategy,
        }
    }
}

/// Resolve default log file path.
///
/// Returns `~/.local/state/pktlist/pktlist.log` on Unix-like systems,
/// or appropriate platform path on other systems.
///
/// If state directory cannot be determined, falls back to current directory.
pub fn default_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        state_dir.join("pktlist").join("pktlist.log")
    } else {
        PathBuf::from("pktlist.log")
    }
}

/// Load configuration file from a specific path.
///
/// Returns `Ok(None)` if file doesn't exist (not an error - use defaults).
///
/// # Errors
///
/// Returns error if file exists but has read or parse errors.
pub fn load_config_file(path: impl Into<PathBuf>) -> Result<Option<ConfigFile>, ConfigError> {
    let path = path.into();

    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    let config: ConfigFile = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        reason: e.to_string(),
    })?;

    Ok(Some(config))
}

/// Resolve default config file path.
///
/// Returns `~/.config/pktlist/config.toml` on Unix, appropriate path on other platforms.
/// Returns `None` if home directory cannot be determined.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("pktlist").join("config.toml"))
}

/// Load configuration with precedence handling.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument
/// 2. `PKTLIST_CONFIG` environment variable
/// 3. Default path `~/.config/pktlist/config.toml`
///
/// Missing config files are NOT errors - defaults are used.
///
/// # Errors
///
/// Returns error only if a config file exists but cannot be read or parsed.
pub fn load_config_with_precedence(
    config_path: Option<PathBuf>,
) -> Result<Option<ConfigFile>, ConfigError> {
    if let Some(path) = config_path {
        return load_config_file(path);
    }

    if let Ok(env_path) = std::env::var(CONFIG_ENV) {
        return load_config_file(PathBuf::from(env_path));
    }

    if let Some(default_path) = default_config_path() {
        return load_config_file(default_path);
    }

    Ok(None)
}

/// Merge config file into defaults to create resolved config.
///
/// For each field in `ConfigFile`, if `Some(value)`, use it; otherwise use default.
pub fn merge_config(config_file: Option<ConfigFile>) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();

    let Some(config) = config_file else {
        return defaults;
    };

    ResolvedConfig {
        placeholder: config.placeholder.unwrap_or(defaults.placeholder),
        read_error_prefix: config
            .read_error_prefix
            .unwrap_or(defaults.read_error_prefix),
        string_strategy: config.string_strategy.unwrap_or(defaults.string_strategy),
        pool_capacity: config.pool_capacity.unwrap_or(defaults.pool_capacity),
        columns: config.columns.unwrap_or(defaults.columns),
        log_file_path: config.log_file_path.unwrap_or(defaults.log_file_path),
    }
}

/// Apply environment variable overrides to resolved config.
///
/// Checks `PKTLIST_STRING_STRATEGY` (`intern-all` or `minimize-copies`).
/// Unrecognised values are logged and ignored.
pub fn apply_env_overrides(mut config: ResolvedConfig) -> ResolvedConfig {
    if let Ok(value) = std::env::var(STRATEGY_ENV) {
        match HarvestStrategy::parse(&value) {
            Some(strategy) => config.string_strategy = strategy,
            None => warn!(
                value = %value,
                variable = STRATEGY_ENV,
                "Ignoring unknown string strategy"
            ),
        }
    }

    config
}

/// Full chain: defaults, then config file, then environment.
///
/// # Errors
///
/// Returns error only if a config file exists but cannot be read or parsed.
pub fn resolve(config_path: Option<PathBuf>) -> Result<ResolvedConfig, ConfigError> {
    let file = load_config_with_precedence(config_path)?;
    Ok(apply_env_overrides(merge_config(file)))
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
