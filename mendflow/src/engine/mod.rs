//! The recovery engine: executor, deduplication gate, and inspection API.

mod inflight;
mod run;


pub use inflight::{Admission, InFlightGate};
pub use run::FallbackCacheKey;

use crate::actions::RecoveryAction;
use crate::breaker::BreakerRegistry;
use crate::clock::{Clock, SystemClock};
use crate::config::RecoveryConfig;
use crate::context::ContextStore;
use crate::core::{
    ActionOutcome, FailureDetails, FailureKey, FailureKind, RecoveryFailure, RecoveryFailureKind,
    RecoveryResult, Strategy,
};
use crate::errors::EngineError;
use crate::events::{self, EventSink, NoOpEventSink};
use crate::host::{HostBridge, NoOpHost};
use crate::plan::{
    select_strategy, PlanCatalog, RecoveryPlan, RecoveryStep, RetryConfig, StepKind,
};
use dashmap::DashMap;
use run::{PlanOutcome, PlanRun};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Per-attempt overrides for [`RecoveryEngine::attempt_recovery`].
#[derive(Clone, Default)]
pub struct AttemptOptions {
    /// Overrides the computed strategy.
    pub strategy: Option<Strategy>,
    /// Overrides the plan timeout.
    pub timeout: Option<Duration>,
    /// Metadata merged into the failure class context.
    pub metadata: HashMap<String, serde_json::Value>,
    /// Default action for retry/fallback steps that have none bound, and for
    /// plans the engine synthesizes when no catalog entry exists.
    pub action: Option<Arc<dyn RecoveryAction>>,
}

impl AttemptOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Overrides the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Adds a context metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Supplies the default action.
    #[must_use]
    pub fn with_action(mut self, action: Arc<dyn RecoveryAction>) -> Self {
        self.action = Some(action);
        self
    }
}

impl fmt::Debug for AttemptOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttemptOptions")
            .field("strategy", &self.strategy)
            .field("timeout", &self.timeout)
            .field("metadata", &self.metadata)
            .field("action", &self.action.is_some())
            .finish()
    }
}

/// Read-only engine statistics for dashboards and telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngineStats {
    /// Recoveries currently in flight.
    pub in_flight: usize,
    /// Tracked recovery contexts.
    pub contexts: usize,
    /// Tracked circuit breakers.
    pub breakers: usize,
    /// Cached fallback results.
    pub fallback_cache: usize,
}

/// Builder for [`RecoveryEngine`].
#[derive(Default)]
pub struct EngineBuilder {
    config: RecoveryConfig,
    plans: Vec<(FailureKind, RecoveryPlan)>,
    host: Option<Arc<dyn HostBridge>>,
    sink: Option<Arc<dyn EventSink>>,
    clock: Option<Arc<dyn Clock>>,
}

impl EngineBuilder {
    /// Sets the engine configuration.
    #[must_use]
    pub fn config(mut self, config: RecoveryConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers a plan for a failure kind.
    #[must_use]
    pub fn plan(mut self, kind: FailureKind, plan: RecoveryPlan) -> Self {
        self.plans.push((kind, plan));
        self
    }

    /// Sets the host bridge.
    #[must_use]
    pub fn host(mut self, host: Arc<dyn HostBridge>) -> Self {
        self.host = Some(host);
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Sets the clock.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Builds the engine, validating the configuration and every plan.
    pub fn build(self) -> Result<RecoveryEngine, EngineError> {
        self.config.validate()?;

        let mut catalog = PlanCatalog::new();
        for (kind, plan) in self.plans {
            catalog.register(kind, plan)?;
        }

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        Ok(RecoveryEngine {
            config: parking_lot::RwLock::new(self.config),
            catalog,
            contexts: ContextStore::new(),
            breakers: BreakerRegistry::new(Arc::clone(&clock)),
            gate: InFlightGate::new(),
            fallback_cache: Arc::new(DashMap::new()),
            host: self.host.unwrap_or_else(|| Arc::new(NoOpHost)),
            sink: self.sink.unwrap_or_else(|| Arc::new(NoOpEventSink)),
            clock,
        })
    }
}

/// The error-recovery engine.
///
/// Owns four maps keyed by [`FailureKey`] - contexts, breakers, the in-flight
/// gate, and the fallback cache - each on per-shard locking so entries for
/// different keys stay fully independent.
pub struct RecoveryEngine {
    config: parking_lot::RwLock<RecoveryConfig>,
    catalog: PlanCatalog,
    contexts: ContextStore,
    breakers: BreakerRegistry,
    gate: InFlightGate,
    fallback_cache: Arc<DashMap<FallbackCacheKey, ActionOutcome>>,
    host: Arc<dyn HostBridge>,
    sink: Arc<dyn EventSink>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for RecoveryEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecoveryEngine")
            .field("config", &*self.config.read())
            .field("plans", &self.catalog.len())
            .field("stats", &self.stats())
            .finish()
    }
}

impl Default for RecoveryEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RecoveryEngine {
    /// Creates an engine with default configuration and collaborators.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        EngineBuilder::default()
            .build()
            .expect("default configuration is valid")
    }

    /// Starts building a customized engine.
    #[must_use]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Attempts to recover from a reported failure.
    ///
    /// This is the sole entry point. At most one recovery executes per
    /// failure key; concurrent callers for the same key join the in-flight
    /// execution and receive its exact result.
    #[instrument(skip(self, options), fields(key = %failure.key()))]
    pub async fn attempt_recovery(
        &self,
        failure: FailureDetails,
        options: AttemptOptions,
    ) -> RecoveryResult {
        let key = failure.key();

        match self.gate.begin(&key) {
            Admission::Joined(receiver) => {
                debug!("joining in-flight recovery");
                InFlightGate::wait(receiver).await
            }
            Admission::Leader(sender) => {
                let result = self.run_recovery(&key, failure, options).await;
                self.gate.finish(&key, &sender, result.clone());
                result
            }
        }
    }

    async fn run_recovery(
        &self,
        key: &FailureKey,
        failure: FailureDetails,
        options: AttemptOptions,
    ) -> RecoveryResult {
        let started = self.clock.now();

        if self.breakers.is_open(key) {
            debug!("recovery blocked by open circuit");
            self.sink.try_emit(
                events::RECOVERY_BLOCKED,
                Some(json!({ "key": key.to_string() })),
            );
            return RecoveryResult::blocked(self.clock.now() - started);
        }

        self.sink.try_emit(
            events::RECOVERY_STARTED,
            Some(json!({ "key": key.to_string(), "kind": failure.kind.to_string() })),
        );

        let config = self.config.read().clone();
        self.contexts.seed_metadata(key, options.metadata.clone());
        let context = self.contexts.get_or_create(key);

        let strategy = options
            .strategy
            .unwrap_or_else(|| select_strategy(&failure, context.retry_count, &config));

        let plan = self
            .catalog
            .plan_for(failure.kind)
            .unwrap_or_else(|| Arc::new(Self::default_plan(strategy, &config)));

        let timeout = options
            .timeout
            .or(plan.timeout)
            .unwrap_or_else(|| config.recovery_timeout());

        let attempts = Arc::new(AtomicU32::new(0));
        let body = PlanRun {
            plan,
            failure: failure.clone(),
            retry_count: context.retry_count,
            default_action: options.action,
            host: Arc::clone(&self.host),
            sink: Arc::clone(&self.sink),
            fallback_cache: Arc::clone(&self.fallback_cache),
            attempts: Arc::clone(&attempts),
        };

        // The body runs on its own task; whichever side of the race finishes
        // first decides the outcome. On timeout the task is detached, not
        // joined, so an in-progress action may still complete in the
        // background with its result ignored.
        let handle = tokio::spawn(body.run());
        let outcome = tokio::select! {
            joined = handle => match joined {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!(error = %e, "recovery task aborted");
                    PlanOutcome {
                        success: false,
                        strategy,
                        message: None,
                        error: Some(RecoveryFailure::new(
                            RecoveryFailureKind::StepFailure,
                            "recovery task aborted",
                        )),
                    }
                }
            },
            () = tokio::time::sleep(timeout) => {
                self.sink.try_emit(
                    events::RECOVERY_TIMEOUT,
                    Some(json!({ "key": key.to_string(), "timeout_ms": timeout.as_millis() as u64 })),
                );
                PlanOutcome {
                    success: false,
                    strategy,
                    message: None,
                    error: Some(RecoveryFailure::new(
                        RecoveryFailureKind::Timeout,
                        format!("recovery timed out after {}ms", timeout.as_millis()),
                    )),
                }
            }
        };

        self.settle(key, &outcome);

        let duration = self.clock.now() - started;
        let attempts = attempts.load(Ordering::SeqCst);
        if outcome.success {
            info!(strategy = %outcome.strategy, attempts, "recovery succeeded");
            self.sink.try_emit(
                events::RECOVERY_SUCCEEDED,
                Some(json!({
                    "key": key.to_string(),
                    "strategy": outcome.strategy.to_string(),
                    "attempts": attempts,
                })),
            );
            RecoveryResult::succeeded(outcome.strategy, attempts, duration, outcome.message)
        } else {
            let error = outcome.error.unwrap_or_else(|| {
                RecoveryFailure::new(RecoveryFailureKind::PlanExhausted, "all recovery steps failed")
            });
            warn!(strategy = %outcome.strategy, error = %error, "recovery failed");
            self.sink.try_emit(
                events::RECOVERY_FAILED,
                Some(json!({
                    "key": key.to_string(),
                    "strategy": outcome.strategy.to_string(),
                    "error": error.to_string(),
                })),
            );
            RecoveryResult::failed(outcome.strategy, attempts, duration, error)
        }
    }

    /// Breaker and context bookkeeping after a completed (non-blocked) run.
    fn settle(&self, key: &FailureKey, outcome: &PlanOutcome) {
        if outcome.success {
            self.breakers.record_success(key);
            self.contexts.on_success(key);
            if outcome.strategy == Strategy::Fallback {
                self.contexts.mark_fallback(key);
            }
        } else {
            let config = self.config.read();
            self.breakers.record_failure(
                key,
                config.circuit_breaker_threshold,
                config.circuit_breaker_reset_timeout(),
            );
            self.contexts.on_failure(key);
        }
        self.contexts.mirror_breaker(key, self.breakers.state_of(key));
    }

    /// Synthesizes a single-step plan from the selected strategy when no
    /// catalog entry exists for the failure kind.
    fn default_plan(strategy: Strategy, config: &RecoveryConfig) -> RecoveryPlan {
        let step = match strategy {
            Strategy::Retry | Strategy::None => {
                RecoveryStep::retry("default_retry", RetryConfig::from_engine(config))
            }
            Strategy::Refresh => RecoveryStep::refresh("default_refresh"),
            Strategy::Restart => RecoveryStep::restart("default_restart"),
            Strategy::Fallback => {
                RecoveryStep::new("default_fallback", StepKind::Fallback { action: None })
            }
            Strategy::UserAction => {
                RecoveryStep::user_action("default_user_action", "manual intervention required")
            }
        };

        RecoveryPlan::new(strategy).with_step(step)
    }

    /// Returns the cached result of the last successful fallback for the
    /// given failure kind and operation, if any.
    #[must_use]
    pub fn cached_fallback(
        &self,
        kind: FailureKind,
        operation: Option<&str>,
    ) -> Option<ActionOutcome> {
        let key = FallbackCacheKey {
            kind,
            operation: operation.map(ToString::to_string),
        };
        self.fallback_cache.get(&key).map(|entry| entry.clone())
    }

    /// Read-only engine statistics.
    #[must_use]
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            in_flight: self.gate.len(),
            contexts: self.contexts.len(),
            breakers: self.breakers.len(),
            fallback_cache: self.fallback_cache.len(),
        }
    }

    /// Snapshot of the live configuration.
    #[must_use]
    pub fn config(&self) -> RecoveryConfig {
        self.config.read().clone()
    }

    /// Replaces the live configuration. Existing breakers keep the threshold
    /// and reset timeout they were created with.
    pub fn update_config(&self, config: RecoveryConfig) -> Result<(), EngineError> {
        config.validate()?;
        *self.config.write() = config;
        Ok(())
    }

    /// Clears contexts, breakers, and the fallback cache. In-flight
    /// recoveries are unaffected.
    pub fn cleanup(&self) {
        self.contexts.cleanup();
        self.breakers.clear();
        self.fallback_cache.clear();
        info!("recovery state cleared");
    }

    /// Read access to the context store, for inspection.
    #[must_use]
    pub fn contexts(&self) -> &ContextStore {
        &self.contexts
    }

    /// Read access to the breaker registry, for inspection.
    #[must_use]
    pub fn breakers(&self) -> &BreakerRegistry {
        &self.breakers
    }
}
