//! Plan body execution.
//!
//! A [`PlanRun`] owns everything it needs so the engine can spawn it on its
//! own task and race it against the plan timeout. When the timeout wins, the
//! task is detached, never joined: an action may still be running after the
//! engine has reported the timeout, so actions must tolerate abandonment.

use crate::actions::RecoveryAction;
use crate::core::{
    ActionOutcome, FailureDetails, RecoveryFailure, RecoveryFailureKind, Strategy,
};
use crate::events::{self, EventSink};
use crate::host::HostBridge;
use crate::plan::{RecoveryPlan, StepKind};
use dashmap::DashMap;
use serde_json::json;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Cache key for successful fallback results.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FallbackCacheKey {
    /// The failure kind.
    pub kind: crate::core::FailureKind,
    /// The failed operation, when known.
    pub operation: Option<String>,
}

impl FallbackCacheKey {
    /// Builds a cache key from a failure report.
    #[must_use]
    pub fn from_failure(failure: &FailureDetails) -> Self {
        Self {
            kind: failure.kind,
            operation: failure.operation.clone(),
        }
    }
}

/// Outcome of one plan body execution.
#[derive(Debug, Clone)]
pub(crate) struct PlanOutcome {
    pub success: bool,
    pub strategy: Strategy,
    pub message: Option<String>,
    pub error: Option<RecoveryFailure>,
}

impl PlanOutcome {
    fn succeeded(strategy: Strategy, message: Option<String>) -> Self {
        Self {
            success: true,
            strategy,
            message,
            error: None,
        }
    }

    fn failed(strategy: Strategy, kind: RecoveryFailureKind, detail: impl Into<String>) -> Self {
        Self {
            success: false,
            strategy,
            message: None,
            error: Some(RecoveryFailure::new(kind, detail)),
        }
    }
}

enum StepResult {
    Succeeded {
        strategy: Strategy,
        message: Option<String>,
    },
    Failed {
        detail: String,
    },
    NeedsUser {
        description: String,
    },
}

/// One spawned plan execution.
pub(crate) struct PlanRun {
    pub plan: Arc<RecoveryPlan>,
    pub failure: FailureDetails,
    /// Snapshot of the per-class retry count at admission time.
    pub retry_count: u32,
    pub default_action: Option<Arc<dyn RecoveryAction>>,
    pub host: Arc<dyn HostBridge>,
    pub sink: Arc<dyn EventSink>,
    pub fallback_cache: Arc<DashMap<FallbackCacheKey, ActionOutcome>>,
    /// Shared with the engine so a timed-out run still reports how many
    /// actions it managed to invoke.
    pub attempts: Arc<AtomicU32>,
}

impl PlanRun {
    pub(crate) async fn run(self) -> PlanOutcome {
        let mut pending_user_action: Option<String> = None;

        for step in &self.plan.steps {
            if !step.guard.accepts(&self.failure) {
                debug!(step = %step.name, "step skipped by guard");
                continue;
            }

            match self.run_step(step).await {
                StepResult::Succeeded { strategy, message } => {
                    return PlanOutcome::succeeded(strategy, message);
                }
                StepResult::Failed { detail } => {
                    warn!(step = %step.name, detail = %detail, "recovery step failed");
                    self.sink.try_emit(
                        events::RECOVERY_STEP_FAILED,
                        Some(json!({ "step": step.name, "detail": detail })),
                    );
                }
                StepResult::NeedsUser { description } => {
                    debug!(step = %step.name, "step requires user action");
                    pending_user_action.get_or_insert(description);
                }
            }
        }

        for fallback in self.plan.ordered_fallbacks() {
            if !fallback.guard.accepts(&self.failure) {
                debug!(fallback = %fallback.name, "fallback skipped by guard");
                continue;
            }

            self.attempts.fetch_add(1, Ordering::SeqCst);
            let outcome = fallback.action.run().await;
            if outcome.success {
                self.fallback_cache
                    .insert(FallbackCacheKey::from_failure(&self.failure), outcome.clone());
                self.sink.try_emit(
                    events::RECOVERY_FALLBACK_USED,
                    Some(json!({ "fallback": fallback.name })),
                );
                return PlanOutcome::succeeded(
                    Strategy::Fallback,
                    outcome
                        .message
                        .or_else(|| Some(format!("fallback '{}' succeeded", fallback.name))),
                );
            }

            warn!(
                fallback = %fallback.name,
                error = outcome.error.as_deref().unwrap_or("unknown"),
                "fallback failed"
            );
        }

        if let Some(description) = pending_user_action {
            return PlanOutcome::failed(
                Strategy::UserAction,
                RecoveryFailureKind::UserActionRequired,
                description,
            );
        }

        PlanOutcome::failed(
            self.plan.strategy,
            RecoveryFailureKind::PlanExhausted,
            "all recovery steps failed",
        )
    }

    async fn run_step(&self, step: &crate::plan::RecoveryStep) -> StepResult {
        match &step.kind {
            StepKind::Retry { config, action } => {
                if config.is_exhausted(self.retry_count) {
                    return StepResult::Failed {
                        detail: format!(
                            "retry budget exhausted ({}/{} attempts)",
                            self.retry_count, config.max_attempts
                        ),
                    };
                }

                let Some(action) = action.as_ref().or(self.default_action.as_ref()) else {
                    return StepResult::Failed {
                        detail: "no retry action supplied".to_string(),
                    };
                };

                let delay = config.delay_for_attempt(self.retry_count);
                debug!(
                    step = %step.name,
                    delay_ms = delay.as_millis() as u64,
                    attempt = self.retry_count,
                    "backing off before retry"
                );
                tokio::time::sleep(delay).await;

                self.attempts.fetch_add(1, Ordering::SeqCst);
                Self::from_action(Strategy::Retry, action.run().await)
            }

            StepKind::Fallback { action } => {
                let Some(action) = action.as_ref().or(self.default_action.as_ref()) else {
                    return StepResult::Failed {
                        detail: "no fallback action supplied".to_string(),
                    };
                };

                self.attempts.fetch_add(1, Ordering::SeqCst);
                let outcome = action.run().await;
                if outcome.success {
                    self.fallback_cache
                        .insert(FallbackCacheKey::from_failure(&self.failure), outcome.clone());
                }
                Self::from_action(Strategy::Fallback, outcome)
            }

            StepKind::Refresh { delay } => {
                let host = Arc::clone(&self.host);
                let delay = *delay;
                // Fire-and-forget: the step succeeds once the reload is
                // scheduled, not when it completes.
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    if let Err(e) = host.reload().await {
                        warn!(error = %e, "scheduled reload failed");
                    }
                });

                self.attempts.fetch_add(1, Ordering::SeqCst);
                StepResult::Succeeded {
                    strategy: Strategy::Refresh,
                    message: Some(format!("reload scheduled in {}ms", delay.as_millis())),
                }
            }

            StepKind::Restart => {
                self.attempts.fetch_add(1, Ordering::SeqCst);
                match self.host.restart().await {
                    Ok(()) => StepResult::Succeeded {
                        strategy: Strategy::Restart,
                        message: Some("restart requested".to_string()),
                    },
                    Err(e) => StepResult::Failed {
                        detail: format!("restart rejected: {e}"),
                    },
                }
            }

            StepKind::UserAction { description } => StepResult::NeedsUser {
                description: description.clone(),
            },
        }
    }

    fn from_action(strategy: Strategy, outcome: ActionOutcome) -> StepResult {
        if outcome.success {
            StepResult::Succeeded {
                strategy,
                message: outcome.message,
            }
        } else {
            StepResult::Failed {
                detail: outcome
                    .error
                    .unwrap_or_else(|| "action failed without detail".to_string()),
            }
        }
    }
}
