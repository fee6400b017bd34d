//! Per-failure-class circuit breakers.
//!
//! One breaker exists per [`FailureKey`], created lazily on the first
//! recorded failure. Staleness of an open breaker is resolved lazily on the
//! next check (transition to half-open) rather than via a background timer.
//! Breaker operations never fail; an absent entry is treated as closed and
//! healthy. Mutations to a given key's entry are serialized by the map's
//! per-shard locking; entries for different keys are independent.

mod state;

pub use state::CircuitState;

use crate::clock::Clock;
use crate::core::FailureKey;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
struct BreakerEntry {
    state: CircuitState,
    failure_count: u32,
    last_failure_at: Option<Instant>,
    next_attempt_at: Option<Instant>,
    threshold: u32,
    reset_timeout: Duration,
}

impl BreakerEntry {
    fn new(threshold: u32, reset_timeout: Duration) -> Self {
        Self {
            state: CircuitState::Closed,
            failure_count: 0,
            last_failure_at: None,
            next_attempt_at: None,
            threshold,
            reset_timeout,
        }
    }
}

/// Read-only view of one breaker, for inspection and context mirroring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakerSnapshot {
    /// The current state.
    pub state: CircuitState,
    /// Consecutive failures recorded.
    pub failure_count: u32,
    /// Failures needed to open.
    pub threshold: u32,
}

/// Registry of circuit breakers keyed by failure class.
#[derive(Debug)]
pub struct BreakerRegistry {
    breakers: DashMap<FailureKey, BreakerEntry>,
    clock: Arc<dyn Clock>,
}

impl BreakerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            breakers: DashMap::new(),
            clock,
        }
    }

    /// Returns true if attempts against `key` are currently blocked.
    ///
    /// An open breaker whose reset timeout has elapsed transitions to
    /// half-open here and permits the caller's attempt as the trial.
    pub fn is_open(&self, key: &FailureKey) -> bool {
        let Some(mut entry) = self.breakers.get_mut(key) else {
            return false;
        };

        match entry.state {
            CircuitState::Closed | CircuitState::HalfOpen => false,
            CircuitState::Open => {
                let now = self.clock.now();
                let elapsed = entry.next_attempt_at.is_some_and(|at| now >= at);
                if elapsed {
                    info!(key = %key, "circuit breaker transitioning to half-open");
                    entry.state = CircuitState::HalfOpen;
                    false
                } else {
                    true
                }
            }
        }
    }

    /// Records a failed attempt, opening the breaker at threshold.
    ///
    /// A failure while half-open re-opens immediately with a fresh
    /// `next_attempt_at`.
    pub fn record_failure(&self, key: &FailureKey, threshold: u32, reset_timeout: Duration) {
        let now = self.clock.now();
        let mut entry = self
            .breakers
            .entry(key.clone())
            .or_insert_with(|| BreakerEntry::new(threshold, reset_timeout));

        entry.failure_count += 1;
        entry.last_failure_at = Some(now);

        let reopen = entry.state == CircuitState::HalfOpen;
        if reopen || entry.failure_count >= entry.threshold {
            if entry.state != CircuitState::Open {
                warn!(
                    key = %key,
                    failures = entry.failure_count,
                    "circuit breaker opened"
                );
            }
            entry.state = CircuitState::Open;
            entry.next_attempt_at = Some(now + entry.reset_timeout);
        }
    }

    /// Records a successful attempt, closing the breaker.
    pub fn record_success(&self, key: &FailureKey) {
        if let Some(mut entry) = self.breakers.get_mut(key) {
            if entry.state != CircuitState::Closed {
                debug!(key = %key, "circuit breaker closed after success");
            }
            entry.state = CircuitState::Closed;
            entry.failure_count = 0;
            entry.next_attempt_at = None;
        }
    }

    /// Returns the state for `key`, closed when no breaker exists.
    #[must_use]
    pub fn state_of(&self, key: &FailureKey) -> CircuitState {
        self.breakers
            .get(key)
            .map_or(CircuitState::Closed, |entry| entry.state)
    }

    /// Returns a read-only snapshot of the breaker for `key`.
    #[must_use]
    pub fn snapshot(&self, key: &FailureKey) -> Option<BreakerSnapshot> {
        self.breakers.get(key).map(|entry| BreakerSnapshot {
            state: entry.state,
            failure_count: entry.failure_count,
            threshold: entry.threshold,
        })
    }

    /// Number of tracked breakers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    /// Returns true if no breakers are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }

    /// Clears all breakers.
    pub fn clear(&self) {
        self.breakers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::core::{FailureDetails, FailureKind, Severity};

    const RESET: Duration = Duration::from_secs(60);

    fn key() -> FailureKey {
        FailureDetails::new(FailureKind::Network, Severity::Warning, "sync")
            .with_operation("fetch")
            .key()
    }

    fn registry() -> (BreakerRegistry, ManualClock) {
        let clock = ManualClock::new();
        let registry = BreakerRegistry::new(Arc::new(clock.clone()));
        (registry, clock)
    }

    #[test]
    fn test_absent_breaker_is_closed() {
        let (registry, _clock) = registry();
        assert!(!registry.is_open(&key()));
        assert_eq!(registry.state_of(&key()), CircuitState::Closed);
    }

    #[test]
    fn test_opens_at_threshold() {
        let (registry, _clock) = registry();
        let key = key();

        registry.record_failure(&key, 3, RESET);
        registry.record_failure(&key, 3, RESET);
        assert!(!registry.is_open(&key));

        registry.record_failure(&key, 3, RESET);
        assert!(registry.is_open(&key));
        assert_eq!(registry.state_of(&key), CircuitState::Open);
    }

    #[test]
    fn test_success_resets_count() {
        let (registry, _clock) = registry();
        let key = key();

        registry.record_failure(&key, 3, RESET);
        registry.record_failure(&key, 3, RESET);
        registry.record_success(&key);
        registry.record_failure(&key, 3, RESET);
        registry.record_failure(&key, 3, RESET);

        assert!(!registry.is_open(&key));
    }

    #[test]
    fn test_half_open_after_reset_timeout() {
        let (registry, clock) = registry();
        let key = key();

        registry.record_failure(&key, 1, RESET);
        assert!(registry.is_open(&key));

        clock.advance(RESET);
        // First check after the timeout permits a trial attempt.
        assert!(!registry.is_open(&key));
        assert_eq!(registry.state_of(&key), CircuitState::HalfOpen);
    }

    #[test]
    fn test_half_open_failure_reopens_with_fresh_deadline() {
        let (registry, clock) = registry();
        let key = key();

        registry.record_failure(&key, 1, RESET);
        clock.advance(RESET);
        assert!(!registry.is_open(&key));

        registry.record_failure(&key, 1, RESET);
        assert!(registry.is_open(&key));

        // The deadline was refreshed, so just short of a full reset
        // timeout it still blocks.
        clock.advance(RESET - Duration::from_secs(1));
        assert!(registry.is_open(&key));
        clock.advance(Duration::from_secs(1));
        assert!(!registry.is_open(&key));
    }

    #[test]
    fn test_half_open_success_closes() {
        let (registry, clock) = registry();
        let key = key();

        registry.record_failure(&key, 1, RESET);
        clock.advance(RESET);
        assert!(!registry.is_open(&key));

        registry.record_success(&key);
        assert_eq!(registry.state_of(&key), CircuitState::Closed);
        let snapshot = registry.snapshot(&key).unwrap();
        assert_eq!(snapshot.failure_count, 0);
    }

    #[test]
    fn test_independent_keys() {
        let (registry, _clock) = registry();
        let other = FailureDetails::new(FailureKind::Ui, Severity::Warning, "renderer").key();

        registry.record_failure(&key(), 1, RESET);
        assert!(registry.is_open(&key()));
        assert!(!registry.is_open(&other));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_clear() {
        let (registry, _clock) = registry();
        registry.record_failure(&key(), 1, RESET);
        registry.clear();
        assert!(registry.is_empty());
        assert!(!registry.is_open(&key()));
    }
}
