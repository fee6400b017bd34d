//! Mock actions and sinks for testing.

use crate::actions::RecoveryAction;
use crate::core::ActionOutcome;
use crate::events::EventSink;
use async_trait::async_trait;
use parking_lot::Mutex;

/// A mock action that records calls and returns a configurable outcome.
#[derive(Debug)]
pub struct MockAction {
    name: String,
    outcome: Mutex<ActionOutcome>,
    call_count: Mutex<usize>,
}

impl MockAction {
    /// Creates a new mock action with a success outcome.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outcome: Mutex::new(ActionOutcome::ok_empty()),
            call_count: Mutex::new(0),
        }
    }

    /// The action's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the outcome to return.
    pub fn set_outcome(&self, outcome: ActionOutcome) {
        *self.outcome.lock() = outcome;
    }

    /// Returns the number of times the action was invoked.
    #[must_use]
    pub fn call_count(&self) -> usize {
        *self.call_count.lock()
    }

    /// Resets call tracking.
    pub fn reset(&self) {
        *self.call_count.lock() = 0;
    }
}

#[async_trait]
impl RecoveryAction for MockAction {
    async fn run(&self) -> ActionOutcome {
        *self.call_count.lock() += 1;
        self.outcome.lock().clone()
    }
}

/// An action that always succeeds.
#[derive(Debug)]
pub struct SuccessAction {
    message: String,
}

impl SuccessAction {
    /// Creates a new success action.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl RecoveryAction for SuccessAction {
    async fn run(&self) -> ActionOutcome {
        ActionOutcome::ok_message(self.message.clone())
    }
}

/// An action that always fails.
#[derive(Debug)]
pub struct FailAction {
    error: String,
}

impl FailAction {
    /// Creates a new failing action.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[async_trait]
impl RecoveryAction for FailAction {
    async fn run(&self) -> ActionOutcome {
        ActionOutcome::failed(self.error.clone())
    }
}

/// An action that never resolves. Used to exercise the timeout race.
#[derive(Debug, Default)]
pub struct PendingAction;

#[async_trait]
impl RecoveryAction for PendingAction {
    async fn run(&self) -> ActionOutcome {
        std::future::pending::<()>().await;
        ActionOutcome::ok_empty()
    }
}

/// An event sink that records every emitted event.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<(String, Option<serde_json::Value>)>>,
}

impl RecordingSink {
    /// Creates an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the recorded event types, in emission order.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        self.events.lock().iter().map(|(t, _)| t.clone()).collect()
    }

    /// Returns true if the given event type was emitted.
    #[must_use]
    pub fn saw(&self, event_type: &str) -> bool {
        self.events.lock().iter().any(|(t, _)| t == event_type)
    }
}

#[async_trait]
impl EventSink for RecordingSink {
    async fn emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.events.lock().push((event_type.to_string(), data));
    }

    fn try_emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.events.lock().push((event_type.to_string(), data));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_action_records_calls() {
        let action = MockAction::new("probe");
        assert_eq!(action.call_count(), 0);

        action.run().await;
        action.run().await;
        assert_eq!(action.call_count(), 2);

        action.set_outcome(ActionOutcome::failed("broken"));
        assert!(!action.run().await.success);

        action.reset();
        assert_eq!(action.call_count(), 0);
    }

    #[tokio::test]
    async fn test_recording_sink_orders_events() {
        let sink = RecordingSink::new();
        sink.try_emit("a", None);
        sink.emit("b", None).await;

        assert_eq!(sink.event_types(), vec!["a".to_string(), "b".to_string()]);
        assert!(sink.saw("a"));
        assert!(!sink.saw("c"));
    }
}
