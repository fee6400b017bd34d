//! Strategy selection.

use crate::config::RecoveryConfig;
use crate::core::{FailureDetails, FailureKind, Severity, Strategy};

/// Picks the recovery strategy for a failure.
///
/// This is a deliberate priority chain, not a lookup table, so that severity
/// and retry exhaustion override category defaults. The order is preserved
/// from the original system for compatibility:
/// network -> ui -> critical severity -> retry exhaustion -> retry.
/// Callers may override the computed strategy explicitly via attempt options.
#[must_use]
pub fn select_strategy(
    failure: &FailureDetails,
    retry_count: u32,
    config: &RecoveryConfig,
) -> Strategy {
    if failure.kind == FailureKind::Network {
        Strategy::Retry
    } else if failure.kind == FailureKind::Ui {
        Strategy::Refresh
    } else if failure.severity == Severity::Critical {
        Strategy::Restart
    } else if retry_count >= config.max_retry_attempts {
        Strategy::Fallback
    } else {
        Strategy::Retry
    }
}
