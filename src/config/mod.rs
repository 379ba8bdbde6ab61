//! Configuration module.

pub mod loader;

pub use loader::{
    apply_cli_overrides, apply_env_overrides, load_config_with_precedence, merge_config,
    ConfigError, ConfigFile, ResolvedConfig,
};

use crate::model::ReferencePolicy;
use crate::rate_limit::{DurationSource, DEFAULT_WINDOW_MS};
use std::time::Duration;

/// Runtime settings shared by the registry and every session.
///
/// The debounce window is a shared source: changing it through
/// [`Settings::set_debounce`] reaches every existing debounce on its next
/// burst.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Quiet period before a debounced restore fires.
    pub debounce: DurationSource,
    /// Window of the leading-edge sampling throttles.
    pub throttle: DurationSource,
    /// Reference line used by sampling and restoring.
    pub reference: ReferencePolicy,
}

impl Default for Settings {
    fn default() -> Self {
        let window = Duration::from_millis(DEFAULT_WINDOW_MS);
        Self::new(window, window, ReferencePolicy::default())
    }
}

impl Settings {
    /// Creates settings with a shared debounce window and a fixed throttle.
    pub fn new(debounce: Duration, throttle: Duration, reference: ReferencePolicy) -> Self {
        Self {
            debounce: DurationSource::shared(debounce),
            throttle: DurationSource::Fixed(throttle),
            reference,
        }
    }

    /// Change the debounce window for every limiter created from these
    /// settings.
    pub fn set_debounce(&mut self, window: Duration) {
        self.debounce.set(window);
    }
}
