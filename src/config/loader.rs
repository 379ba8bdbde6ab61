//! Configuration file loading with precedence handling.

use super::Settings;
use crate::model::ReferencePolicy;
use crate::rate_limit::DEFAULT_WINDOW_MS;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Environment variable naming the config file.
pub const ENV_CONFIG: &str = "SCROLL_KEEPER_CONFIG";

/// Environment variable overriding the debounce window in milliseconds.
pub const ENV_DEBOUNCE_MS: &str = "SCROLL_KEEPER_DEBOUNCE_MS";

/// Environment variable overriding the reference policy.
pub const ENV_REFERENCE: &str = "SCROLL_KEEPER_REFERENCE";

/// Errors that can occur during config loading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Failed to read config file (permission issues, not a file).
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError {
        /// Path that failed to read.
        path: PathBuf,
        /// Reason for failure.
        reason: String,
    },

    /// Config file contains invalid TOML syntax or unknown keys.
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
/// Corresponds to `~/.config/scroll-keeper/config.toml`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Quiet period before a debounced restore, in milliseconds.
    #[serde(default)]
    pub debounce_ms: Option<u64>,

    /// Sampling throttle window, in milliseconds.
    #[serde(default)]
    pub throttle_ms: Option<u64>,

    /// Reference line: "top" or "center".
    #[serde(default)]
    pub reference: Option<ReferencePolicy>,

    /// Path to log file for tracing output.
    #[serde(default)]
    pub log_file_path: Option<PathBuf>,
}

/// Resolved configuration after applying precedence rules.
///
/// Created by merging defaults, config file, env vars, and CLI args.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// Debounce window.
    pub debounce: Duration,
    /// Throttle window.
    pub throttle: Duration,
    /// Reference line.
    pub reference: ReferencePolicy,
    /// Path to log file for tracing output.
    pub log_file_path: PathBuf,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(DEFAULT_WINDOW_MS),
            throttle: Duration::from_millis(DEFAULT_WINDOW_MS),
            reference: ReferencePolicy::default(),
            log_file_path: default_log_path(),
        }
    }
}

impl ResolvedConfig {
    /// Runtime settings for the registry.
    pub fn settings(&self) -> Settings {
        Settings::new(self.debounce, self.throttle, self.reference)
    }
}

/// Resolve default log file path.
///
/// Returns `~/.local/state/scroll-keeper/scroll-keeper.log` on Linux, or the
/// platform equivalent. Falls back to the current directory when no state
/// directory is known.
pub fn default_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        state_dir.join("scroll-keeper").join("scroll-keeper.log")
    } else {
        PathBuf::from("scroll-keeper.log")
    }
}

/// Resolve default config file path.
///
/// Returns `~/.config/scroll-keeper/config.toml` on Linux, the platform
/// equivalent elsewhere, `None` if no config directory is known.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("scroll-keeper").join("config.toml"))
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

/// Load configuration with precedence handling.
///
/// Precedence (highest to lowest):
/// 1. Explicit `config_path` argument (CLI `--config`)
/// 2. `SCROLL_KEEPER_CONFIG` environment variable
/// 3. Default path `~/.config/scroll-keeper/config.toml`
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

    if let Ok(env_path) = std::env::var(ENV_CONFIG) {
        return load_config_file(PathBuf::from(env_path));
    }

    if let Some(default_path) = default_config_path() {
        return load_config_file(default_path);
    }

    Ok(None)
}

/// Merge config file into defaults to create resolved config.
pub fn merge_config(config_file: Option<ConfigFile>) -> ResolvedConfig {
    let defaults = ResolvedConfig::default();

    let Some(config) = config_file else {
        return defaults;
    };

    ResolvedConfig {
        debounce: config
            .debounce_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.debounce),
        throttle: config
            .throttle_ms
            .map(Duration::from_millis)
            .unwrap_or(defaults.throttle),
        reference: config.reference.unwrap_or(defaults.reference),
        log_file_path: config.log_file_path.unwrap_or(defaults.log_file_path),
    }
}

/// Apply environment variable overrides to resolved config.
///
/// Checks `SCROLL_KEEPER_DEBOUNCE_MS` and `SCROLL_KEEPER_REFERENCE`. Values
/// that do not parse are logged and ignored.
pub fn apply_env_overrides(mut config: ResolvedConfig) -> ResolvedConfig {
    if let Ok(value) = std::env::var(ENV_DEBOUNCE_MS) {
        match value.trim().parse::<u64>() {
            Ok(ms) => config.debounce = Duration::from_millis(ms),
            Err(e) => warn!(var = ENV_DEBOUNCE_MS, %value, error = %e, "ignoring invalid value"),
        }
    }

    if let Ok(value) = std::env::var(ENV_REFERENCE) {
        match value.parse::<ReferencePolicy>() {
            Ok(reference) => config.reference = reference,
            Err(e) => warn!(var = ENV_REFERENCE, %value, error = %e, "ignoring invalid value"),
        }
    }

    config
}

/// Apply CLI argument overrides to resolved config.
///
/// Precedence chain: Defaults → Config File → Env Vars → CLI Args (highest)
pub fn apply_cli_overrides(
    mut config: ResolvedConfig,
    debounce_ms: Option<u64>,
    reference: Option<ReferencePolicy>,
) -> ResolvedConfig {
    if let Some(ms) = debounce_ms {
        config.debounce = Duration::from_millis(ms);
    }

    if let Some(reference) = reference {
        config.reference = reference;
    }

    config
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
