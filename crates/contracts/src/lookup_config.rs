//! Lookup and buffer configuration contracts that can be shared across crates.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bounded lookup configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Delay between capability checks while waiting (milliseconds)
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Timeout used when a caller does not pass one (milliseconds)
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    5
}

fn default_timeout_ms() -> u64 {
    1000
}

impl LookupConfig {
    #[inline]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    #[inline]
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }

    /// Same config with a different poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = u64::try_from(interval.as_millis()).unwrap_or(u64::MAX);
        self
    }
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            default_timeout_ms: default_timeout_ms(),
        }
    }
}

/// Transform buffer configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BufferConfig {
    /// Retention window in seconds, measured back from the newest sample
    #[serde(default = "default_cache_time_s")]
    pub cache_time_s: f64,

    /// Maximum samples retained per frame
    #[serde(default = "default_max_samples")]
    pub max_samples: usize,
}

fn default_cache_time_s() -> f64 {
    10.0
}

fn default_max_samples() -> usize {
    1000
}

impl BufferConfig {
    /// Retention window, zero for non-positive values.
    pub fn cache_time(&self) -> Duration {
        Duration::try_from_secs_f64(self.cache_time_s).unwrap_or(Duration::ZERO)
    }
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            cache_time_s: default_cache_time_s(),
            max_samples: default_max_samples(),
        }
    }
}
