//! Retry configuration and backoff arithmetic.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Jitter applied on top of the computed backoff delay.
///
/// Defaults to [`JitterStrategy::None`] so the documented delay law
/// `min(base * multiplier^n, max)` holds exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JitterStrategy {
    /// No jitter.
    #[default]
    None,
    /// Random from 0 to delay.
    Full,
    /// Half fixed, half random.
    Equal,
}

/// Configuration for retry steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum attempts for the failure class before the step refuses to run.
    pub max_attempts: u32,
    /// Base delay between retries in milliseconds.
    pub base_delay_ms: u64,
    /// Maximum delay cap in milliseconds.
    pub max_delay_ms: u64,
    /// Exponential backoff multiplier.
    pub backoff_multiplier: u32,
    /// Jitter strategy.
    pub jitter_strategy: JitterStrategy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30000,
            backoff_multiplier: 2,
            jitter_strategy: JitterStrategy::None,
        }
    }
}

impl RetryConfig {
    /// Creates a new retry config.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a retry config from the engine-wide defaults.
    #[must_use]
    pub fn from_engine(config: &crate::config::RecoveryConfig) -> Self {
        Self {
            max_attempts: config.max_retry_attempts,
            base_delay_ms: config.retry_base_delay_ms,
            max_delay_ms: config.retry_max_delay_ms,
            backoff_multiplier: config.retry_backoff_multiplier,
            jitter_strategy: JitterStrategy::None,
        }
    }

    /// Sets the maximum attempts.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Sets the base delay.
    #[must_use]
    pub fn with_base_delay_ms(mut self, delay: u64) -> Self {
        self.base_delay_ms = delay;
        self
    }

    /// Sets the maximum delay.
    #[must_use]
    pub fn with_max_delay_ms(mut self, delay: u64) -> Self {
        self.max_delay_ms = delay;
        self
    }

    /// Sets the backoff multiplier.
    #[must_use]
    pub fn with_backoff_multiplier(mut self, multiplier: u32) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Sets the jitter strategy.
    #[must_use]
    pub fn with_jitter(mut self, strategy: JitterStrategy) -> Self {
        self.jitter_strategy = strategy;
        self
    }

    /// Computes the backoff delay for attempt index `attempt`:
    /// `min(base * multiplier^attempt, max)`, with jitter applied after the
    /// cap.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = u64::from(self.backoff_multiplier).saturating_pow(attempt);
        let delay = self
            .base_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms);

        let jittered = match self.jitter_strategy {
            JitterStrategy::None => delay,
            JitterStrategy::Full => {
                if delay == 0 {
                    0
                } else {
                    rand::thread_rng().gen_range(0..=delay)
                }
            }
            JitterStrategy::Equal => {
                let half = delay / 2;
                if half == 0 {
                    delay
                } else {
                    half + rand::thread_rng().gen_range(0..=half)
                }
            }
        };

        Duration::from_millis(jittered)
    }

    /// Returns true if the failure class has used up its attempt budget.
    #[must_use]
    pub fn is_exhausted(&self, retry_count: u32) -> bool {
        retry_count >= self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RetryConfig::default();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.base_delay_ms, 1000);
        assert_eq!(config.max_delay_ms, 30000);
        assert_eq!(config.backoff_multiplier, 2);
        assert_eq!(config.jitter_strategy, JitterStrategy::None);
    }

    #[test]
    fn test_delay_follows_documented_law() {
        let config = RetryConfig::default();

        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(1000));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(2000));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(4000));
        assert_eq!(config.delay_for_attempt(3), Duration::from_millis(8000));
        // Capped at max.
        assert_eq!(config.delay_for_attempt(10), Duration::from_millis(30000));
    }

    #[test]
    fn test_delay_with_custom_multiplier() {
        let config = RetryConfig::new()
            .with_base_delay_ms(100)
            .with_backoff_multiplier(3)
            .with_max_delay_ms(5000);

        assert_eq!(config.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(300));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(900));
        assert_eq!(config.delay_for_attempt(4), Duration::from_millis(5000));
    }

    #[test]
    fn test_delay_saturates_instead_of_overflowing() {
        let config = RetryConfig::new()
            .with_base_delay_ms(u64::MAX)
            .with_max_delay_ms(u64::MAX);
        assert_eq!(
            config.delay_for_attempt(63),
            Duration::from_millis(u64::MAX)
        );
    }

    #[test]
    fn test_full_jitter_bounded_by_delay() {
        let config = RetryConfig::new()
            .with_base_delay_ms(100)
            .with_jitter(JitterStrategy::Full);

        for _ in 0..10 {
            assert!(config.delay_for_attempt(0) <= Duration::from_millis(100));
        }
    }

    #[test]
    fn test_equal_jitter_at_least_half() {
        let config = RetryConfig::new()
            .with_base_delay_ms(100)
            .with_jitter(JitterStrategy::Equal);

        for _ in 0..10 {
            let delay = config.delay_for_attempt(0);
            assert!(delay >= Duration::from_millis(50));
            assert!(delay <= Duration::from_millis(100));
        }
    }

    #[test]
    fn test_exhaustion() {
        let config = RetryConfig::new().with_max_attempts(3);
        assert!(!config.is_exhausted(2));
        assert!(config.is_exhausted(3));
        assert!(config.is_exhausted(4));
    }
}
