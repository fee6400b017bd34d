//! Circuit breaker state machine states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The three states of a per-key circuit breaker.
///
/// closed -> (failures reach threshold) -> open -> (reset timeout elapses,
/// observed lazily on the next check) -> half-open -> closed on success, or
/// back to open on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation, attempts allowed.
    Closed,
    /// Too many failures, attempts rejected.
    Open,
    /// Cool-down elapsed, a trial attempt is permitted.
    HalfOpen,
}

impl Default for CircuitState {
    fn default() -> Self {
        Self::Closed
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::HalfOpen => write!(f, "half_open"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_closed() {
        assert_eq!(CircuitState::default(), CircuitState::Closed);
    }

    #[test]
    fn test_display() {
        assert_eq!(CircuitState::HalfOpen.to_string(), "half_open");
    }
}
