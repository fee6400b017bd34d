//! Per-failure-class recovery context.

use crate::breaker::CircuitState;
use crate::core::FailureKey;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Mutable per-class recovery state, created lazily on the first failure of
/// a class and kept for the process lifetime (or until [`ContextStore::cleanup`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecoveryContext {
    /// Retries attempted since the last successful recovery.
    pub retry_count: u32,
    /// When the last recovery attempt finished.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_attempt_at: Option<DateTime<Utc>>,
    /// Mirror of the breaker state, for inspection only.
    pub breaker_state: CircuitState,
    /// Whether the class is currently served by a fallback.
    pub fallback_active: bool,
    /// Opaque caller-supplied metadata.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, serde_json::Value>,
}

/// Store of recovery contexts keyed by failure class.
#[derive(Debug, Default)]
pub struct ContextStore {
    contexts: DashMap<FailureKey, RecoveryContext>,
}

impl ContextStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a clone of the context for `key`, creating it if absent.
    pub fn get_or_create(&self, key: &FailureKey) -> RecoveryContext {
        self.contexts
            .entry(key.clone())
            .or_default()
            .value()
            .clone()
    }

    /// Merges caller-supplied metadata into the context for `key`.
    pub fn seed_metadata(&self, key: &FailureKey, metadata: HashMap<String, serde_json::Value>) {
        if metadata.is_empty() {
            return;
        }
        let mut entry = self.contexts.entry(key.clone()).or_default();
        entry.metadata.extend(metadata);
    }

    /// Records a successful recovery: zero retries, fallback cleared.
    pub fn on_success(&self, key: &FailureKey) {
        let mut entry = self.contexts.entry(key.clone()).or_default();
        entry.retry_count = 0;
        entry.fallback_active = false;
        entry.last_attempt_at = Some(Utc::now());
    }

    /// Records a failed recovery attempt.
    pub fn on_failure(&self, key: &FailureKey) {
        let mut entry = self.contexts.entry(key.clone()).or_default();
        entry.retry_count += 1;
        entry.last_attempt_at = Some(Utc::now());
    }

    /// Marks the class as served by a fallback.
    pub fn mark_fallback(&self, key: &FailureKey) {
        let mut entry = self.contexts.entry(key.clone()).or_default();
        entry.fallback_active = true;
    }

    /// Mirrors the breaker state into the context for inspection.
    pub fn mirror_breaker(&self, key: &FailureKey, state: CircuitState) {
        if let Some(mut entry) = self.contexts.get_mut(key) {
            entry.breaker_state = state;
        }
    }

    /// Returns a snapshot of the context for `key`, if one exists.
    #[must_use]
    pub fn get(&self, key: &FailureKey) -> Option<RecoveryContext> {
        self.contexts.get(key).map(|entry| entry.clone())
    }

    /// Number of tracked contexts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    /// Returns true if no contexts are tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    /// Clears all contexts. Used for explicit teardown, e.g. on logout or
    /// test reset.
    pub fn cleanup(&self) {
        self.contexts.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FailureDetails, FailureKind, Severity};

    fn key() -> FailureKey {
        FailureDetails::new(FailureKind::Logic, Severity::Warning, "planner")
            .with_operation("evaluate")
            .key()
    }

    #[test]
    fn test_created_lazily_with_zero_retries() {
        let store = ContextStore::new();
        assert!(store.get(&key()).is_none());

        let ctx = store.get_or_create(&key());
        assert_eq!(ctx.retry_count, 0);
        assert!(!ctx.fallback_active);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_on_failure_increments() {
        let store = ContextStore::new();
        store.on_failure(&key());
        store.on_failure(&key());

        let ctx = store.get(&key()).unwrap();
        assert_eq!(ctx.retry_count, 2);
        assert!(ctx.last_attempt_at.is_some());
    }

    #[test]
    fn test_on_success_resets() {
        let store = ContextStore::new();
        store.on_failure(&key());
        store.mark_fallback(&key());
        store.on_success(&key());

        let ctx = store.get(&key()).unwrap();
        assert_eq!(ctx.retry_count, 0);
        assert!(!ctx.fallback_active);
    }

    #[test]
    fn test_seed_metadata_merges() {
        let store = ContextStore::new();
        store.seed_metadata(
            &key(),
            [("tab".to_string(), serde_json::json!("inbox"))].into(),
        );
        store.seed_metadata(
            &key(),
            [("window".to_string(), serde_json::json!(2))].into(),
        );

        let ctx = store.get(&key()).unwrap();
        assert_eq!(ctx.metadata.len(), 2);
    }

    #[test]
    fn test_cleanup_starts_fresh() {
        let store = ContextStore::new();
        store.on_failure(&key());
        store.cleanup();
        assert!(store.is_empty());

        let ctx = store.get_or_create(&key());
        assert_eq!(ctx.retry_count, 0);
    }
}
