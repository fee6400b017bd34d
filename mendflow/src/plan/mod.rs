//! Recovery plans: ordered steps, fallbacks, guards, and the catalog.

mod catalog;
mod retry;
mod selector;

pub use catalog::PlanCatalog;
pub use retry::{JitterStrategy, RetryConfig};
pub use selector::select_strategy;

use crate::actions::RecoveryAction;
use crate::core::{FailureDetails, FailureKind, Severity, Strategy};
use crate::errors::EngineError;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default delay before a scheduled refresh fires.
pub const DEFAULT_REFRESH_DELAY: Duration = Duration::from_secs(2);

/// Guard condition deciding whether a step or fallback applies to a failure.
#[derive(Clone, Default)]
pub enum Guard {
    /// Always applies.
    #[default]
    Always,
    /// Applies only to the given failure kind.
    KindIs(FailureKind),
    /// Applies only at or above the given severity.
    SeverityAtLeast(Severity),
    /// Caller-supplied predicate.
    Custom(Arc<dyn Fn(&FailureDetails) -> bool + Send + Sync>),
}

impl Guard {
    /// Returns true if the guard accepts the failure.
    #[must_use]
    pub fn accepts(&self, failure: &FailureDetails) -> bool {
        match self {
            Self::Always => true,
            Self::KindIs(kind) => failure.kind == *kind,
            Self::SeverityAtLeast(severity) => failure.severity >= *severity,
            Self::Custom(predicate) => predicate(failure),
        }
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Always => write!(f, "Always"),
            Self::KindIs(kind) => write!(f, "KindIs({kind})"),
            Self::SeverityAtLeast(severity) => write!(f, "SeverityAtLeast({severity})"),
            Self::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// The kind of work a recovery step performs.
///
/// An exhaustive enum rather than a string-keyed dispatch, so every handler
/// is checked at compile time.
#[derive(Debug, Clone)]
pub enum StepKind {
    /// Wait out the backoff delay, then invoke the caller-supplied action.
    Retry {
        /// Backoff and exhaustion configuration.
        config: RetryConfig,
        /// The operation to retry; when absent, the per-attempt default
        /// action from the caller's options is used.
        action: Option<Arc<dyn RecoveryAction>>,
    },
    /// Invoke an alternate action directly.
    Fallback {
        /// The fallback operation; when absent, the per-attempt default
        /// action is used.
        action: Option<Arc<dyn RecoveryAction>>,
    },
    /// Schedule a delayed reload of the client surface and succeed
    /// immediately. The reload itself is fire-and-forget.
    Refresh {
        /// Delay before the reload fires.
        delay: Duration,
    },
    /// Invoke the host-level restart primitive.
    Restart,
    /// Signal that a human must act. Never resolves automatically.
    UserAction {
        /// Description surfaced to the user.
        description: String,
    },
}

impl StepKind {
    /// The strategy tag this step reports when it decides the outcome.
    #[must_use]
    pub fn strategy(&self) -> Strategy {
        match self {
            Self::Retry { .. } => Strategy::Retry,
            Self::Fallback { .. } => Strategy::Fallback,
            Self::Refresh { .. } => Strategy::Refresh,
            Self::Restart => Strategy::Restart,
            Self::UserAction { .. } => Strategy::UserAction,
        }
    }
}

/// One step in a recovery plan.
#[derive(Debug, Clone)]
pub struct RecoveryStep {
    /// Step name, for logging.
    pub name: String,
    /// Guard condition; a rejected step is skipped.
    pub guard: Guard,
    /// What the step does.
    pub kind: StepKind,
}

impl RecoveryStep {
    /// Creates a new step.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: StepKind) -> Self {
        Self {
            name: name.into(),
            guard: Guard::Always,
            kind,
        }
    }

    /// Creates a retry step with the given config.
    #[must_use]
    pub fn retry(name: impl Into<String>, config: RetryConfig) -> Self {
        Self::new(name, StepKind::Retry {
            config,
            action: None,
        })
    }

    /// Creates a refresh step with the default delay.
    #[must_use]
    pub fn refresh(name: impl Into<String>) -> Self {
        Self::new(name, StepKind::Refresh {
            delay: DEFAULT_REFRESH_DELAY,
        })
    }

    /// Creates a restart step.
    #[must_use]
    pub fn restart(name: impl Into<String>) -> Self {
        Self::new(name, StepKind::Restart)
    }

    /// Creates a user-action step.
    #[must_use]
    pub fn user_action(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, StepKind::UserAction {
            description: description.into(),
        })
    }

    /// Sets the guard condition.
    #[must_use]
    pub fn with_guard(mut self, guard: Guard) -> Self {
        self.guard = guard;
        self
    }

    /// Binds an action to a retry or fallback step. Ignored for other kinds.
    #[must_use]
    pub fn with_action(mut self, action: Arc<dyn RecoveryAction>) -> Self {
        match &mut self.kind {
            StepKind::Retry { action: slot, .. } | StepKind::Fallback { action: slot } => {
                *slot = Some(action);
            }
            StepKind::Refresh { .. } | StepKind::Restart | StepKind::UserAction { .. } => {}
        }
        self
    }
}

/// An alternate action taken when the primary steps are exhausted.
#[derive(Debug, Clone)]
pub struct FallbackSpec {
    /// Fallback name, for logging.
    pub name: String,
    /// Ordering: fallbacks run in ascending priority.
    pub priority: u32,
    /// Guard condition; a rejected fallback is skipped.
    pub guard: Guard,
    /// The fallback operation.
    pub action: Arc<dyn RecoveryAction>,
}

impl FallbackSpec {
    /// Creates a new fallback.
    #[must_use]
    pub fn new(name: impl Into<String>, priority: u32, action: Arc<dyn RecoveryAction>) -> Self {
        Self {
            name: name.into(),
            priority,
            guard: Guard::Always,
            action,
        }
    }

    /// Sets the guard condition.
    #[must_use]
    pub fn with_guard(mut self, guard: Guard) -> Self {
        self.guard = guard;
        self
    }
}

/// An ordered recipe of remediation steps and fallbacks for one failure kind.
///
/// Plans are registered once at startup and read-only thereafter.
#[derive(Debug, Clone)]
pub struct RecoveryPlan {
    /// Preferred strategy tag for this plan.
    pub strategy: Strategy,
    /// Steps, run in order; the first success wins.
    pub steps: Vec<RecoveryStep>,
    /// Fallbacks, run in ascending priority when all steps fail or skip.
    pub fallbacks: Vec<FallbackSpec>,
    /// Bound on the whole plan execution; the engine default applies when
    /// absent.
    pub timeout: Option<Duration>,
}

impl RecoveryPlan {
    /// Creates an empty plan with the given preferred strategy.
    #[must_use]
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            steps: Vec::new(),
            fallbacks: Vec::new(),
            timeout: None,
        }
    }

    /// Appends a step.
    #[must_use]
    pub fn with_step(mut self, step: RecoveryStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Appends a fallback.
    #[must_use]
    pub fn with_fallback(mut self, fallback: FallbackSpec) -> Self {
        self.fallbacks.push(fallback);
        self
    }

    /// Sets the plan timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Fallbacks sorted by ascending priority.
    #[must_use]
    pub fn ordered_fallbacks(&self) -> Vec<&FallbackSpec> {
        let mut ordered: Vec<&FallbackSpec> = self.fallbacks.iter().collect();
        ordered.sort_by_key(|fallback| fallback.priority);
        ordered
    }

    /// Validates the plan.
    pub fn validate(&self, kind: FailureKind) -> Result<(), EngineError> {
        if self.steps.is_empty() && self.fallbacks.is_empty() {
            return Err(EngineError::invalid_plan(
                kind.to_string(),
                "plan has no steps or fallbacks",
            ));
        }
        if let Some(timeout) = self.timeout {
            if timeout.is_zero() {
                return Err(EngineError::invalid_plan(
                    kind.to_string(),
                    "timeout must be positive when provided",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::FnAction;
    use crate::core::ActionOutcome;

    fn noop_action() -> Arc<dyn RecoveryAction> {
        Arc::new(FnAction::new("noop", ActionOutcome::ok_empty))
    }

    #[test]
    fn test_guard_kind() {
        let guard = Guard::KindIs(FailureKind::Network);
        let network = FailureDetails::new(FailureKind::Network, Severity::Warning, "sync");
        let ui = FailureDetails::new(FailureKind::Ui, Severity::Warning, "renderer");

        assert!(guard.accepts(&network));
        assert!(!guard.accepts(&ui));
    }

    #[test]
    fn test_guard_severity() {
        let guard = Guard::SeverityAtLeast(Severity::Critical);
        let warning = FailureDetails::new(FailureKind::System, Severity::Warning, "disk");
        let critical = FailureDetails::new(FailureKind::System, Severity::Critical, "disk");

        assert!(!guard.accepts(&warning));
        assert!(guard.accepts(&critical));
    }

    #[test]
    fn test_guard_custom() {
        let guard = Guard::Custom(Arc::new(|failure: &FailureDetails| {
            failure.operation.as_deref() == Some("fetch")
        }));
        let hit = FailureDetails::new(FailureKind::Network, Severity::Info, "sync")
            .with_operation("fetch");
        let miss = FailureDetails::new(FailureKind::Network, Severity::Info, "sync");

        assert!(guard.accepts(&hit));
        assert!(!guard.accepts(&miss));
    }

    #[test]
    fn test_step_strategy_tags() {
        assert_eq!(
            RecoveryStep::retry("r", RetryConfig::default()).kind.strategy(),
            Strategy::Retry
        );
        assert_eq!(RecoveryStep::refresh("f").kind.strategy(), Strategy::Refresh);
        assert_eq!(RecoveryStep::restart("r").kind.strategy(), Strategy::Restart);
        assert_eq!(
            RecoveryStep::user_action("u", "call support").kind.strategy(),
            Strategy::UserAction
        );
    }

    #[test]
    fn test_fallbacks_ordered_by_priority() {
        let plan = RecoveryPlan::new(Strategy::Retry)
            .with_fallback(FallbackSpec::new("last", 9, noop_action()))
            .with_fallback(FallbackSpec::new("first", 1, noop_action()))
            .with_fallback(FallbackSpec::new("middle", 5, noop_action()));

        let names: Vec<&str> = plan
            .ordered_fallbacks()
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, vec!["first", "middle", "last"]);
    }

    #[test]
    fn test_empty_plan_rejected() {
        let plan = RecoveryPlan::new(Strategy::Retry);
        assert!(plan.validate(FailureKind::Network).is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let plan = RecoveryPlan::new(Strategy::Retry)
            .with_step(RecoveryStep::retry("r", RetryConfig::default()))
            .with_timeout(Duration::ZERO);
        assert!(plan.validate(FailureKind::Network).is_err());
    }

    #[test]
    fn test_with_action_binds_retry() {
        let step = RecoveryStep::retry("r", RetryConfig::default()).with_action(noop_action());
        match step.kind {
            StepKind::Retry { action, .. } => assert!(action.is_some()),
            _ => panic!("expected retry step"),
        }
    }
}
