//! Event sink trait and implementations.
//!
//! The engine emits `recovery.*` events for observability. Sinks must never
//! fail the engine: emission errors are logged and suppressed.

use async_trait::async_trait;
use tracing::{debug, info, Level};

/// Event type emitted when a recovery attempt starts.
pub const RECOVERY_STARTED: &str = "recovery.started";
/// Event type emitted when an attempt is rejected by an open circuit.
pub const RECOVERY_BLOCKED: &str = "recovery.blocked";
/// Event type emitted when a step fails and the next step is tried.
pub const RECOVERY_STEP_FAILED: &str = "recovery.step_failed";
/// Event type emitted when a fallback succeeds.
pub const RECOVERY_FALLBACK_USED: &str = "recovery.fallback_used";
/// Event type emitted when an attempt succeeds.
pub const RECOVERY_SUCCEEDED: &str = "recovery.succeeded";
/// Event type emitted when an attempt fails.
pub const RECOVERY_FAILED: &str = "recovery.failed";
/// Event type emitted when an attempt times out.
pub const RECOVERY_TIMEOUT: &str = "recovery.timeout";

/// Trait for event sinks that receive recovery events.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emits an event asynchronously.
    async fn emit(&self, event_type: &str, data: Option<serde_json::Value>);

    /// Tries to emit an event without blocking.
    ///
    /// This method must never panic; errors are logged but suppressed.
    fn try_emit(&self, event_type: &str, data: Option<serde_json::Value>);
}

/// A no-op event sink that discards all events.
///
/// Used as the default when no sink is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event_type: &str, _data: Option<serde_json::Value>) {
        // Intentionally empty - discards all events
    }

    fn try_emit(&self, _event_type: &str, _data: Option<serde_json::Value>) {
        // Intentionally empty - discards all events
    }
}

/// An event sink that logs events using the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a new logging event sink with the specified level.
    #[must_use]
    pub fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    /// Creates an info-level logging sink.
    #[must_use]
    pub fn info() -> Self {
        Self::new(Level::INFO)
    }

    fn log_event(&self, event_type: &str, data: &Option<serde_json::Value>) {
        match self.level {
            Level::DEBUG => {
                debug!(
                    event_type = %event_type,
                    event_data = ?data,
                    "Event: {}", event_type
                );
            }
            _ => {
                info!(
                    event_type = %event_type,
                    event_data = ?data,
                    "Event: {}", event_type
                );
            }
        }
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.log_event(event_type, &data);
    }

    fn try_emit(&self, event_type: &str, data: Option<serde_json::Value>) {
        self.log_event(event_type, &data);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_sink_discards() {
        let sink = NoOpEventSink;
        sink.emit(RECOVERY_STARTED, None).await;
        sink.try_emit(RECOVERY_FAILED, Some(serde_json::json!({"key": "k"})));
    }

    #[tokio::test]
    async fn test_logging_sink_does_not_panic() {
        let sink = LoggingEventSink::debug();
        sink.emit(RECOVERY_SUCCEEDED, Some(serde_json::json!({"attempts": 1})))
            .await;
        sink.try_emit(RECOVERY_TIMEOUT, None);
    }
}
