//! Static mapping from failure kind to recovery plan.

use super::RecoveryPlan;
use crate::core::FailureKind;
use crate::errors::EngineError;
use std::collections::HashMap;
use std::sync::Arc;

/// Registered recovery plans, keyed by failure kind.
///
/// Plans are registered once at startup; the catalog is read-only after the
/// engine is built.
#[derive(Debug, Clone, Default)]
pub struct PlanCatalog {
    plans: HashMap<FailureKind, Arc<RecoveryPlan>>,
}

impl PlanCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a plan for a failure kind, replacing any previous one.
    pub fn register(&mut self, kind: FailureKind, plan: RecoveryPlan) -> Result<(), EngineError> {
        plan.validate(kind)?;
        self.plans.insert(kind, Arc::new(plan));
        Ok(())
    }

    /// Returns the registered plan for `kind`, if any. The engine synthesizes
    /// a default single-step plan from the selected strategy when no entry
    /// exists.
    #[must_use]
    pub fn plan_for(&self, kind: FailureKind) -> Option<Arc<RecoveryPlan>> {
        self.plans.get(&kind).cloned()
    }

    /// Number of registered plans.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plans.len()
    }

    /// Returns true if no plans are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}
