//! Recovery result reporting.

use super::Strategy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Classification of a failed recovery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryFailureKind {
    /// The circuit was open; no step was attempted.
    Blocked,
    /// A remediation action failed.
    StepFailure,
    /// The plan did not complete within its time bound.
    Timeout,
    /// Every step and fallback failed.
    PlanExhausted,
    /// A human must act before recovery can proceed.
    UserActionRequired,
}

impl fmt::Display for RecoveryFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Blocked => write!(f, "blocked"),
            Self::StepFailure => write!(f, "step_failure"),
            Self::Timeout => write!(f, "timeout"),
            Self::PlanExhausted => write!(f, "plan_exhausted"),
            Self::UserActionRequired => write!(f, "user_action_required"),
        }
    }
}

/// Detail about why a recovery attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryFailure {
    /// The failure classification.
    pub kind: RecoveryFailureKind,
    /// Human-readable detail.
    pub detail: String,
}

impl RecoveryFailure {
    /// Creates a new recovery failure.
    #[must_use]
    pub fn new(kind: RecoveryFailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for RecoveryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}

/// The outcome of one recovery invocation.
///
/// Immutable once constructed; every caller joined to the same in-flight
/// execution receives a clone of the same value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryResult {
    /// Unique id of this recovery attempt, for log correlation.
    pub attempt_id: Uuid,
    /// Whether recovery succeeded.
    pub success: bool,
    /// The strategy actually used.
    pub strategy: Strategy,
    /// Number of remediation actions invoked.
    pub attempts: u32,
    /// Wall time spent on the attempt.
    pub duration: Duration,
    /// Human-readable success detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Failure detail (for unsuccessful attempts).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RecoveryFailure>,
}

impl RecoveryResult {
    /// Creates a successful result.
    #[must_use]
    pub fn succeeded(
        strategy: Strategy,
        attempts: u32,
        duration: Duration,
        message: Option<String>,
    ) -> Self {
        Self {
            attempt_id: Uuid::new_v4(),
            success: true,
            strategy,
            attempts,
            duration,
            message,
            error: None,
        }
    }

    /// Creates a failed result.
    #[must_use]
    pub fn failed(
        strategy: Strategy,
        attempts: u32,
        duration: Duration,
        error: RecoveryFailure,
    ) -> Self {
        Self {
            attempt_id: Uuid::new_v4(),
            success: false,
            strategy,
            attempts,
            duration,
            message: None,
            error: Some(error),
        }
    }

    /// Creates a blocked result (circuit open, nothing attempted).
    #[must_use]
    pub fn blocked(duration: Duration) -> Self {
        Self::failed(
            Strategy::None,
            0,
            duration,
            RecoveryFailure::new(RecoveryFailureKind::Blocked, "blocked by open circuit"),
        )
    }

    /// Returns the failure kind, if the attempt failed.
    #[must_use]
    pub fn failure_kind(&self) -> Option<RecoveryFailureKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}
