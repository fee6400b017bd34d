//! Action outcome type with factory methods.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The outcome of a single remediation action.
///
/// `ActionOutcome` is immutable once created. The engine only inspects the
/// success flag, the optional data payload, and the optional error string;
/// everything else about an action is opaque to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionOutcome {
    /// Whether the action succeeded.
    pub success: bool,

    /// Data produced by the action (cached for successful fallbacks).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<HashMap<String, serde_json::Value>>,

    /// Human-readable success detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Error detail (for failed actions).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Default for ActionOutcome {
    fn default() -> Self {
        Self::ok_empty()
    }
}

impl ActionOutcome {
    /// Creates a successful outcome with data.
    #[must_use]
    pub fn ok(data: HashMap<String, serde_json::Value>) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        }
    }

    /// Creates a successful outcome with no data.
    #[must_use]
    pub fn ok_empty() -> Self {
        Self {
            success: true,
            data: None,
            message: None,
            error: None,
        }
    }

    /// Creates a successful outcome with a single value.
    #[must_use]
    pub fn ok_value(key: impl Into<String>, value: serde_json::Value) -> Self {
        let mut data = HashMap::new();
        data.insert(key.into(), value);
        Self::ok(data)
    }

    /// Creates a successful outcome with a message.
    #[must_use]
    pub fn ok_message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
            error: None,
        }
    }

    /// Creates a failed outcome with an error detail.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            message: None,
            error: Some(error.into()),
        }
    }

    /// Attaches a message to the outcome.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_value() {
        let outcome = ActionOutcome::ok_value("reconnected", serde_json::json!(true));
        assert!(outcome.success);
        assert_eq!(
            outcome.data.and_then(|d| d.get("reconnected").cloned()),
            Some(serde_json::json!(true))
        );
    }

    #[test]
    fn test_failed_carries_error() {
        let outcome = ActionOutcome::failed("socket closed");
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("socket closed"));
        assert!(outcome.data.is_none());
    }

    #[test]
    fn test_default_is_ok_empty() {
        let outcome = ActionOutcome::default();
        assert!(outcome.success);
        assert!(outcome.data.is_none());
    }
}
