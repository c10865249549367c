//! Exponential backoff policy for failed outbox events
//!
//! Delay schedule (base = 5s, factor 2, jitter ±10%):
//!
//! ```text
//! retry_count    delay
//! ─────────────────────
//!     0            5s
//!     1           10s
//!     2           20s
//!     3           40s
//!     4           80s
//!    >= max      DEAD
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_DELAY_SECS: u64 = 5;
/// 30 minutes
const DEFAULT_MAX_DELAY_SECS: u64 = 1_800;
const DEFAULT_JITTER_FACTOR: f64 = 0.1;
const DEFAULT_MAX_RETRIES: i32 = 5;

/// Reusable exponential backoff configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Base delay in seconds (default: 5)
    #[serde(default = "default_base_delay")]
    pub base_delay_secs: u64,

    /// Maximum delay in seconds (default: 1800 = 30min)
    #[serde(default = "default_max_delay")]
    pub max_delay_secs: u64,

    /// Jitter factor (0.0-1.0, default: 0.1 = ±10%)
    #[serde(default = "default_jitter")]
    pub jitter_factor: f64,

    /// Maximum retries before an event is parked as DEAD
    #[serde(default = "default_max_retries")]
    pub max_retries: i32,
}

fn default_base_delay() -> u64 {
    DEFAULT_BASE_DELAY_SECS
}

fn default_max_delay() -> u64 {
    DEFAULT_MAX_DELAY_SECS
}

fn default_jitter() -> f64 {
    DEFAULT_JITTER_FACTOR
}

fn default_max_retries() -> i32 {
    DEFAULT_MAX_RETRIES
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay_secs: DEFAULT_BASE_DELAY_SECS,
            max_delay_secs: DEFAULT_MAX_DELAY_SECS,
            jitter_factor: DEFAULT_JITTER_FACTOR,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl BackoffConfig {
    pub fn standard() -> Self {
        Self::default()
    }

    /// Delay before the next retry of an event that has failed
    /// `retry_count` times, without jitter. Capped at `max_delay_secs`.
    pub fn delay_secs(&self, retry_count: i32) -> u64 {
        let exponent = retry_count.max(0).min(30) as u32;
        let raw = self
            .base_delay_secs
            .saturating_mul(1u64.checked_shl(exponent).unwrap_or(u64::MAX));
        raw.min(self.max_delay_secs)
    }

    /// Jittered delay for in-process scheduling.
    pub fn delay_with_jitter(&self, retry_count: i32) -> Duration {
        let base = self.delay_secs(retry_count) as f64;
        let jitter = base * self.jitter_factor;
        let offset = rand::thread_rng().gen_range(-jitter..=jitter.max(f64::MIN_POSITIVE));
        Duration::from_secs_f64((base + offset).max(0.0))
    }

    /// Whether an event with this many failures may be retried at all.
    pub fn can_retry(&self, retry_count: i32) -> bool {
        retry_count < self.max_retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles_per_retry() {
        let config = BackoffConfig::standard();
        assert_eq!(config.delay_secs(0), 5);
        assert_eq!(config.delay_secs(1), 10);
        assert_eq!(config.delay_secs(2), 20);
        assert_eq!(config.delay_secs(3), 40);
    }

    #[test]
    fn test_delay_is_capped() {
        let config = BackoffConfig::standard();
        assert_eq!(config.delay_secs(20), 1_800);
        assert_eq!(config.delay_secs(i32::MAX), 1_800);
    }

    #[test]
    fn test_negative_retry_count_uses_base() {
        let config = BackoffConfig::standard();
        assert_eq!(config.delay_secs(-1), 5);
    }

    #[test]
    fn test_can_retry_ceiling() {
        let config = BackoffConfig::standard();
        assert!(config.can_retry(0));
        assert!(config.can_retry(4));
        assert!(!config.can_retry(5));
        assert!(!config.can_retry(50));
    }

    #[test]
    fn test_jitter_stays_near_base() {
        let config = BackoffConfig::standard();
        for _ in 0..100 {
            let delay = config.delay_with_jitter(2).as_secs_f64();
            assert!((17.9..=22.1).contains(&delay), "delay {} out of range", delay);
        }
    }
}
