//! Loader configuration: retry budgets, deadlines, fallback copy, diagnostics.
//!
//! Values come from `MOUNTGUARD_*` environment variables (native hosts) or
//! from a JSON blob embedded in the page (browser hosts). Unparseable numbers
//! fall back to their defaults; semantically invalid values are rejected by
//! [`LoaderConfig::validate`].

use serde::{Deserialize, Serialize};

use crate::diagnostics::Level;
use crate::error::ConfigError;

pub const DEFAULT_DEP_MAX_RETRIES: u32 = 5;
pub const DEFAULT_DEP_INITIAL_DELAY_MS: u64 = 100;
pub const DEFAULT_DEP_MULTIPLIER: f64 = 2.0;
pub const DEFAULT_DEP_MAX_DELAY_MS: u64 = 2_000;
pub const DEFAULT_DEP_WINDOW_MS: u64 = 10_000;
pub const DEFAULT_MOUNT_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_MOUNT_RETRIES: u32 = 1;
pub const DEFAULT_DIAGNOSTICS_CAPACITY: usize = 1_000;
pub const DEFAULT_FALLBACK_MESSAGE: &str = "Interactive view unavailable. Showing a simplified version.";
pub const DEFAULT_UNAVAILABLE_MESSAGE: &str = "This content is unavailable right now.";

// =============================================================================
// SECTIONS
// =============================================================================

/// Bounded exponential re-check schedule for dependency readiness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub multiplier: f64,
    pub max_delay_ms: u64,
    /// Total sleep budget across all retries.
    pub window_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_DEP_MAX_RETRIES,
            initial_delay_ms: DEFAULT_DEP_INITIAL_DELAY_MS,
            multiplier: DEFAULT_DEP_MULTIPLIER,
            max_delay_ms: DEFAULT_DEP_MAX_DELAY_MS,
            window_ms: DEFAULT_DEP_WINDOW_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    pub enabled: bool,
    /// Least severe level still stored.
    pub min_level: Level,
    pub capacity: usize,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self { enabled: true, min_level: Level::Debug, capacity: DEFAULT_DIAGNOSTICS_CAPACITY }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    pub dependency: BackoffConfig,
    /// Services every component requires, on top of the rendering library.
    pub baseline_services: Vec<String>,
    pub mount_timeout_ms: u64,
    /// Extra mount attempts after a host-side mount failure.
    pub mount_retries: u32,
    pub show_loading_indicator: bool,
    pub fallback_message: String,
    pub unavailable_message: String,
    pub diagnostics: DiagnosticsConfig,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            dependency: BackoffConfig::default(),
            baseline_services: Vec::new(),
            mount_timeout_ms: DEFAULT_MOUNT_TIMEOUT_MS,
            mount_retries: DEFAULT_MOUNT_RETRIES,
            show_loading_indicator: true,
            fallback_message: DEFAULT_FALLBACK_MESSAGE.to_owned(),
            unavailable_message: DEFAULT_UNAVAILABLE_MESSAGE.to_owned(),
            diagnostics: DiagnosticsConfig::default(),
        }
    }
}

// =============================================================================
// LOADING
// =============================================================================

impl LoaderConfig {
    /// Build config from environment variables.
    ///
    /// Optional (defaults in parentheses):
    /// - `MOUNTGUARD_DEP_MAX_RETRIES` (5), `MOUNTGUARD_DEP_INITIAL_DELAY_MS` (100),
    ///   `MOUNTGUARD_DEP_MULTIPLIER` (2.0), `MOUNTGUARD_DEP_MAX_DELAY_MS` (2000),
    ///   `MOUNTGUARD_DEP_WINDOW_MS` (10000)
    /// - `MOUNTGUARD_BASELINE_SERVICES`: comma-separated service names
    /// - `MOUNTGUARD_MOUNT_TIMEOUT_MS` (15000), `MOUNTGUARD_MOUNT_RETRIES` (1)
    /// - `MOUNTGUARD_LOADING_INDICATOR` (true)
    /// - `MOUNTGUARD_FALLBACK_MESSAGE`, `MOUNTGUARD_UNAVAILABLE_MESSAGE`
    /// - `MOUNTGUARD_DIAGNOSTICS_ENABLED` (true), `MOUNTGUARD_LOG_LEVEL` (debug),
    ///   `MOUNTGUARD_DIAGNOSTICS_CAPACITY` (1000)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an unknown log level or values that
    /// fail [`LoaderConfig::validate`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let dependency = BackoffConfig {
            max_retries: env_parse("MOUNTGUARD_DEP_MAX_RETRIES", DEFAULT_DEP_MAX_RETRIES),
            initial_delay_ms: env_parse("MOUNTGUARD_DEP_INITIAL_DELAY_MS", DEFAULT_DEP_INITIAL_DELAY_MS),
            multiplier: env_parse("MOUNTGUARD_DEP_MULTIPLIER", DEFAULT_DEP_MULTIPLIER),
            max_delay_ms: env_parse("MOUNTGUARD_DEP_MAX_DELAY_MS", DEFAULT_DEP_MAX_DELAY_MS),
            window_ms: env_parse("MOUNTGUARD_DEP_WINDOW_MS", DEFAULT_DEP_WINDOW_MS),
        };
        let baseline_services = std::env::var("MOUNTGUARD_BASELINE_SERVICES")
            .map(|raw| parse_list(&raw))
            .unwrap_or_default();
        let min_level = match std::env::var("MOUNTGUARD_LOG_LEVEL") {
            Ok(raw) => raw.parse::<Level>().map_err(|reason| ConfigError::Invalid { key: "MOUNTGUARD_LOG_LEVEL", reason })?,
            Err(_) => defaults.diagnostics.min_level,
        };
        let diagnostics = DiagnosticsConfig {
            enabled: env_parse("MOUNTGUARD_DIAGNOSTICS_ENABLED", defaults.diagnostics.enabled),
            min_level,
            capacity: env_parse("MOUNTGUARD_DIAGNOSTICS_CAPACITY", DEFAULT_DIAGNOSTICS_CAPACITY),
        };

        let config = Self {
            dependency,
            baseline_services,
            mount_timeout_ms: env_parse("MOUNTGUARD_MOUNT_TIMEOUT_MS", DEFAULT_MOUNT_TIMEOUT_MS),
            mount_retries: env_parse("MOUNTGUARD_MOUNT_RETRIES", DEFAULT_MOUNT_RETRIES),
            show_loading_indicator: env_parse("MOUNTGUARD_LOADING_INDICATOR", defaults.show_loading_indicator),
            fallback_message: std::env::var("MOUNTGUARD_FALLBACK_MESSAGE").unwrap_or(defaults.fallback_message),
            unavailable_message: std::env::var("MOUNTGUARD_UNAVAILABLE_MESSAGE").unwrap_or(defaults.unavailable_message),
            diagnostics,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a page-embedded JSON config. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed JSON and
    /// [`ConfigError::Invalid`] for values that fail validation.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dependency.multiplier.is_nan() || self.dependency.multiplier < 1.0 {
            return Err(ConfigError::Invalid {
                key: "dependency.multiplier",
                reason: format!("must be >= 1.0, got {}", self.dependency.multiplier),
            });
        }
        if self.mount_timeout_ms == 0 {
            return Err(ConfigError::Invalid { key: "mount_timeout_ms", reason: "must be > 0".into() });
        }
        if self.diagnostics.capacity == 0 {
            return Err(ConfigError::Invalid { key: "diagnostics.capacity", reason: "must be > 0".into() });
        }
        Ok(())
    }
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
