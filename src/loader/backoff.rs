//! Bounded exponential schedule for dependency re-checks.

use std::time::Duration;

use crate::config::BackoffConfig;

/// Tracks how many re-checks were scheduled and how much of the window they used.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: BackoffConfig,
    retries: u32,
    elapsed_ms: u64,
}

impl Backoff {
    #[must_use]
    pub fn new(config: BackoffConfig) -> Self {
        Self { config, retries: 0, elapsed_ms: 0 }
    }

    /// Delay before the next re-check, or `None` once the retry count or the
    /// total window is exhausted.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.retries >= self.config.max_retries {
            return None;
        }
        let delay_ms = self.delay_for(self.retries);
        if self.elapsed_ms.saturating_add(delay_ms) > self.config.window_ms {
            return None;
        }
        self.retries += 1;
        self.elapsed_ms += delay_ms;
        Some(Duration::from_millis(delay_ms))
    }

    #[must_use]
    pub fn retries(&self) -> u32 {
        self.retries
    }

    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn delay_for(&self, retry: u32) -> u64 {
        let exponent = i32::try_from(retry).unwrap_or(i32::MAX);
        let raw = self.config.initial_delay_ms as f64 * self.config.multiplier.powi(exponent);
        let cap = self.config.max_delay_ms as f64;
        if raw.is_finite() && raw < cap { raw as u64 } else { self.config.max_delay_ms }
    }
}

#[cfg(test)]
#[path = "backoff_test.rs"]
mod tests;
