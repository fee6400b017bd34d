//! # Mendflow
//!
//! An error-recovery engine for long-running client applications.
//!
//! Mendflow keeps an application operating through transient failures
//! (network faults, subsystem crashes, rendering errors) without a restart
//! or manual intervention for every failure:
//!
//! - **Failure classification**: reported failures are keyed by
//!   kind, operation, and component, and correlated with persistent
//!   per-class state
//! - **Recovery plans**: ordered remediation steps and prioritized fallbacks
//!   per failure kind, raced against a timeout
//! - **Circuit breakers**: per-class closed/open/half-open guards that stop
//!   repeated attempts against a known-bad operation until a cool-down
//!   elapses
//! - **Deduplication**: at most one recovery in flight per failure class;
//!   concurrent reporters join the in-flight outcome
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mendflow::prelude::*;
//! use std::sync::Arc;
//!
//! let engine = RecoveryEngine::builder()
//!     .config(RecoveryConfig::default())
//!     .plan(
//!         FailureKind::Network,
//!         RecoveryPlan::new(Strategy::Retry)
//!             .with_step(RecoveryStep::retry("reconnect", RetryConfig::default())
//!                 .with_action(Arc::new(FnAction::new("reconnect", || {
//!                     ActionOutcome::ok_empty()
//!                 })))),
//!     )
//!     .build()?;
//!
//! let failure = FailureDetails::new(FailureKind::Network, Severity::Warning, "sync");
//! let result = engine.attempt_recovery(failure, AttemptOptions::new()).await;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod actions;
pub mod breaker;
pub mod clock;
pub mod config;
pub mod context;
pub mod core;
pub mod engine;
pub mod errors;
pub mod events;
pub mod host;
pub mod observability;
pub mod plan;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::actions::{AsyncFnAction, FnAction, RecoveryAction};
    pub use crate::breaker::{BreakerRegistry, BreakerSnapshot, CircuitState};
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::config::RecoveryConfig;
    pub use crate::context::{ContextStore, RecoveryContext};
    pub use crate::core::{
        ActionOutcome, FailureDetails, FailureKey, FailureKind, RecoveryFailure,
        RecoveryFailureKind, RecoveryResult, Severity, Strategy,
    };
    pub use crate::engine::{AttemptOptions, EngineStats, RecoveryEngine};
    pub use crate::errors::EngineError;
    pub use crate::events::{EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::host::{HostBridge, NoOpHost};
    pub use crate::plan::{
        select_strategy, FallbackSpec, Guard, JitterStrategy, PlanCatalog, RecoveryPlan,
        RecoveryStep, RetryConfig, StepKind,
    };
}
