//! Cache tuning knobs. Every field has a default, so an empty TOML table is valid.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Upper bound for one full read. `None` waits forever.
    pub fetch_timeout_ms: Option<u64>,
    /// Upper bound for one subscribe attempt. An attempt that expires is retried with
    /// backoff, and the initial fetch goes ahead without it.
    pub subscribe_timeout_ms: Option<u64>,
    /// Backoff used when a change subscription cannot be established or drops.
    pub resubscribe: ReconnectConfig,
    /// Capacity of the session-local invalidation bus.
    pub invalidation_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_ms: Some(15_000),
            subscribe_timeout_ms: Some(10_000),
            resubscribe: ReconnectConfig::default(),
            invalidation_capacity: 64,
        }
    }
}

impl CacheConfig {
    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_ms.map(Duration::from_millis)
    }

    pub fn subscribe_timeout(&self) -> Option<Duration> {
        self.subscribe_timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReconnectConfig {
    pub initial_ms: u64,
    pub max_ms: u64,
    pub multiplier: f64,
    pub jitter_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_ms: 500,
            max_ms: 30_000,
            multiplier: 2.0,
            jitter_ms: 250,
        }
    }
}

impl ReconnectConfig {
    /// Delay before retry number `attempt` (0-based), without jitter.
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = self.multiplier.max(1.0).powi(attempt.min(32) as i32);
        let ms = (self.initial_ms as f64 * factor).min(self.max_ms as f64);
        Duration::from_millis(ms as u64)
    }

    /// [`Self::delay`] plus up to `jitter_ms` of noise derived from `seed`.
    pub fn jittered_delay(&self, attempt: u32, seed: u64) -> Duration {
        let jitter = if self.jitter_ms == 0 {
            0
        } else {
            seed % self.jitter_ms
        };
        self.delay(attempt) + Duration::from_millis(jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_and_caps() {
        let config = ReconnectConfig {
            initial_ms: 100,
            max_ms: 1_000,
            multiplier: 2.0,
            jitter_ms: 0,
        };
        assert_eq!(config.delay(0), Duration::from_millis(100));
        assert_eq!(config.delay(2), Duration::from_millis(400));
        assert_eq!(config.delay(10), Duration::from_millis(1_000));
        assert_eq!(config.jittered_delay(1, 12345), Duration::from_millis(200));
    }

    #[test]
    fn test_jitter_is_bounded() {
        let config = ReconnectConfig {
            jitter_ms: 10,
            ..ReconnectConfig::default()
        };
        let base = config.delay(0);
        let delay = config.jittered_delay(0, 987_654_321);
        assert!(delay >= base && delay < base + Duration::from_millis(10));
    }
}
