//! Engine configuration surface.

use crate::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Recognized engine options, all overridable at construction and mutable
/// via [`crate::engine::RecoveryEngine::update_config`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryConfig {
    /// Retries permitted per failure class before the selector prefers a
    /// fallback.
    pub max_retry_attempts: u32,
    /// Base retry delay in milliseconds.
    pub retry_base_delay_ms: u64,
    /// Retry delay cap in milliseconds.
    pub retry_max_delay_ms: u64,
    /// Exponential backoff multiplier.
    pub retry_backoff_multiplier: u32,
    /// Consecutive failures before a breaker opens.
    pub circuit_breaker_threshold: u32,
    /// How long an open breaker blocks before permitting a trial attempt,
    /// in milliseconds.
    pub circuit_breaker_reset_timeout_ms: u64,
    /// Default bound on a whole plan execution, in milliseconds.
    pub recovery_timeout_ms: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_retry_attempts: 3,
            retry_base_delay_ms: 1000,
            retry_max_delay_ms: 30000,
            retry_backoff_multiplier: 2,
            circuit_breaker_threshold: 5,
            circuit_breaker_reset_timeout_ms: 60000,
            recovery_timeout_ms: 30000,
        }
    }
}

impl RecoveryConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the retry attempt budget.
    #[must_use]
    pub fn with_max_retry_attempts(mut self, attempts: u32) -> Self {
        self.max_retry_attempts = attempts;
        self
    }

    /// Sets the base retry delay.
    #[must_use]
    pub fn with_retry_base_delay_ms(mut self, delay: u64) -> Self {
        self.retry_base_delay_ms = delay;
        self
    }

    /// Sets the retry delay cap.
    #[must_use]
    pub fn with_retry_max_delay_ms(mut self, delay: u64) -> Self {
        self.retry_max_delay_ms = delay;
        self
    }

    /// Sets the backoff multiplier.
    #[must_use]
    pub fn with_retry_backoff_multiplier(mut self, multiplier: u32) -> Self {
        self.retry_backoff_multiplier = multiplier;
        self
    }

    /// Sets the breaker failure threshold.
    #[must_use]
    pub fn with_circuit_breaker_threshold(mut self, threshold: u32) -> Self {
        self.circuit_breaker_threshold = threshold;
        self
    }

    /// Sets the breaker reset timeout.
    #[must_use]
    pub fn with_circuit_breaker_reset_timeout_ms(mut self, timeout: u64) -> Self {
        self.circuit_breaker_reset_timeout_ms = timeout;
        self
    }

    /// Sets the default recovery timeout.
    #[must_use]
    pub fn with_recovery_timeout_ms(mut self, timeout: u64) -> Self {
        self.recovery_timeout_ms = timeout;
        self
    }

    /// The breaker reset timeout as a duration.
    #[must_use]
    pub fn circuit_breaker_reset_timeout(&self) -> Duration {
        Duration::from_millis(self.circuit_breaker_reset_timeout_ms)
    }

    /// The default recovery timeout as a duration.
    #[must_use]
    pub fn recovery_timeout(&self) -> Duration {
        Duration::from_millis(self.recovery_timeout_ms)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.circuit_breaker_threshold == 0 {
            return Err(EngineError::InvalidConfig(
                "circuit_breaker_threshold must be >= 1".to_string(),
            ));
        }
        if self.retry_backoff_multiplier == 0 {
            return Err(EngineError::InvalidConfig(
                "retry_backoff_multiplier must be >= 1".to_string(),
            ));
        }
        if self.retry_max_delay_ms < self.retry_base_delay_ms {
            return Err(EngineError::InvalidConfig(
                "retry_max_delay_ms must be >= retry_base_delay_ms".to_string(),
            ));
        }
        if self.recovery_timeout_ms == 0 {
            return Err(EngineError::InvalidConfig(
                "recovery_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = RecoveryConfig::default();
        assert_eq!(config.max_retry_attempts, 3);
        assert_eq!(config.retry_base_delay_ms, 1000);
        assert_eq!(config.retry_max_delay_ms, 30000);
        assert_eq!(config.retry_backoff_multiplier, 2);
        assert_eq!(config.circuit_breaker_threshold, 5);
        assert_eq!(config.circuit_breaker_reset_timeout_ms, 60000);
        assert_eq!(config.recovery_timeout_ms, 30000);
    }

    #[test]
    fn test_builder() {
        let config = RecoveryConfig::new()
            .with_max_retry_attempts(5)
            .with_circuit_breaker_threshold(2)
            .with_recovery_timeout_ms(100);

        assert_eq!(config.max_retry_attempts, 5);
        assert_eq!(config.circuit_breaker_threshold, 2);
        assert_eq!(config.recovery_timeout(), Duration::from_millis(100));
    }

    #[test]
    fn test_validation_rejects_zero_threshold() {
        let config = RecoveryConfig::new().with_circuit_breaker_threshold(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_inverted_delays() {
        let config = RecoveryConfig::new()
            .with_retry_base_delay_ms(5000)
            .with_retry_max_delay_ms(1000);
        assert!(config.validate().is_err());
    }
}
