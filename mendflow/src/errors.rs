//! Error types for engine construction and plan validation.
//!
//! Step and fallback failures are reported through [`crate::RecoveryResult`]
//! and never cross the engine boundary as errors; the types here cover
//! configuration and registration problems only.

use thiserror::Error;

/// Errors raised while building or configuring the engine.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// A plan failed validation.
    #[error("Invalid plan for '{kind}': {reason}")]
    InvalidPlan {
        /// The failure kind the plan was registered for.
        kind: String,
        /// Why validation rejected it.
        reason: String,
    },

    /// A configuration value was out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl EngineError {
    /// Creates an invalid-plan error.
    #[must_use]
    pub fn invalid_plan(kind: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPlan {
            kind: kind.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_plan_message() {
        let err = EngineError::invalid_plan("network", "no steps or fallbacks");
        assert_eq!(
            err.to_string(),
            "Invalid plan for 'network': no steps or fallbacks"
        );
    }
}
