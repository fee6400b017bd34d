//! Deduplication gate: at most one recovery in flight per failure key.
//!
//! The first caller for a key becomes the leader and runs the plan; later
//! callers for the same key join and receive a clone of the leader's result
//! through a watch channel. Entries for different keys are independent.

use crate::core::{FailureKey, RecoveryFailure, RecoveryFailureKind, RecoveryResult, Strategy};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::time::Duration;
use tokio::sync::watch;

type ResultReceiver = watch::Receiver<Option<RecoveryResult>>;
type ResultSender = watch::Sender<Option<RecoveryResult>>;

/// How a caller was admitted through the gate.
#[derive(Debug)]
pub enum Admission {
    /// This caller runs the recovery and must call [`InFlightGate::finish`].
    Leader(ResultSender),
    /// Another execution is in flight; await its result.
    Joined(ResultReceiver),
}

/// Gate tracking in-flight recoveries by failure key.
#[derive(Debug, Default)]
pub struct InFlightGate {
    inflight: DashMap<FailureKey, ResultReceiver>,
}

impl InFlightGate {
    /// Creates an empty gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits a caller for `key`.
    pub fn begin(&self, key: &FailureKey) -> Admission {
        match self.inflight.entry(key.clone()) {
            Entry::Occupied(entry) => Admission::Joined(entry.get().clone()),
            Entry::Vacant(entry) => {
                let (tx, rx) = watch::channel(None);
                entry.insert(rx);
                Admission::Leader(tx)
            }
        }
    }

    /// Delivers the leader's result to all joined callers and releases the
    /// entry. The send happens before the removal so joiners never observe
    /// an empty slot.
    pub fn finish(&self, key: &FailureKey, sender: &ResultSender, result: RecoveryResult) {
        let _ = sender.send(Some(result));
        self.inflight.remove(key);
    }

    /// Awaits the in-flight result for a joined caller.
    ///
    /// If the leader disappears without delivering (its sender is dropped),
    /// joiners receive a step-failure result rather than hanging.
    pub async fn wait(mut receiver: ResultReceiver) -> RecoveryResult {
        loop {
            if let Some(result) = receiver.borrow_and_update().clone() {
                return result;
            }
            if receiver.changed().await.is_err() {
                return RecoveryResult::failed(
                    Strategy::None,
                    0,
                    Duration::ZERO,
                    RecoveryFailure::new(
                        RecoveryFailureKind::StepFailure,
                        "in-flight recovery abandoned without a result",
                    ),
                );
            }
        }
    }

    /// Number of in-flight recoveries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inflight.len()
    }

    /// Returns true if nothing is in flight.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inflight.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FailureDetails, FailureKind, Severity};

    fn key() -> FailureKey {
        FailureDetails::new(FailureKind::Network, Severity::Warning, "sync").key()
    }

    #[tokio::test]
    async fn test_leader_then_joiner() {
        let gate = InFlightGate::new();

        let Admission::Leader(tx) = gate.begin(&key()) else {
            panic!("first caller should lead");
        };
        let Admission::Joined(rx) = gate.begin(&key()) else {
            panic!("second caller should join");
        };
        assert_eq!(gate.len(), 1);

        let delivered =
            RecoveryResult::succeeded(Strategy::Retry, 1, Duration::from_millis(5), None);
        gate.finish(&key(), &tx, delivered.clone());

        let received = InFlightGate::wait(rx).await;
        assert_eq!(received.attempt_id, delivered.attempt_id);
        assert!(gate.is_empty());
    }

    #[tokio::test]
    async fn test_released_key_leads_again() {
        let gate = InFlightGate::new();

        let Admission::Leader(tx) = gate.begin(&key()) else {
            panic!("first caller should lead");
        };
        gate.finish(
            &key(),
            &tx,
            RecoveryResult::succeeded(Strategy::Retry, 1, Duration::ZERO, None),
        );

        assert!(matches!(gate.begin(&key()), Admission::Leader(_)));
    }

    #[tokio::test]
    async fn test_abandoned_leader_unblocks_joiners() {
        let gate = InFlightGate::new();

        let Admission::Leader(tx) = gate.begin(&key()) else {
            panic!("first caller should lead");
        };
        let Admission::Joined(rx) = gate.begin(&key()) else {
            panic!("second caller should join");
        };
        drop(tx);

        let result = InFlightGate::wait(rx).await;
        assert!(!result.success);
        assert_eq!(
            result.failure_kind(),
            Some(RecoveryFailureKind::StepFailure)
        );
    }

    #[tokio::test]
    async fn test_different_keys_are_independent() {
        let gate = InFlightGate::new();
        let other = FailureDetails::new(FailureKind::Ui, Severity::Warning, "renderer").key();

        assert!(matches!(gate.begin(&key()), Admission::Leader(_)));
        assert!(matches!(gate.begin(&other), Admission::Leader(_)));
        assert_eq!(gate.len(), 2);
    }
}
