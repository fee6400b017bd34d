//! Recovery strategy tags.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The remediation strategy applied to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Re-run the failed operation with backoff.
    Retry,
    /// Reload the client surface.
    Refresh,
    /// Restart the hosting process.
    Restart,
    /// Degrade to an alternate action.
    Fallback,
    /// A human must act; recovery cannot proceed automatically.
    UserAction,
    /// No strategy was applied (e.g. the circuit was open).
    None,
}

impl Default for Strategy {
    fn default() -> Self {
        Self::Retry
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retry => write!(f, "retry"),
            Self::Refresh => write!(f, "refresh"),
            Self::Restart => write!(f, "restart"),
            Self::Fallback => write!(f, "fallback"),
            Self::UserAction => write!(f, "user_action"),
            Self::None => write!(f, "none"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Strategy::Retry.to_string(), "retry");
        assert_eq!(Strategy::UserAction.to_string(), "user_action");
        assert_eq!(Strategy::None.to_string(), "none");
    }

    #[test]
    fn test_default_is_retry() {
        assert_eq!(Strategy::default(), Strategy::Retry);
    }
}
