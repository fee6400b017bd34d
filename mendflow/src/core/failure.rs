//! Failure classification and identity types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The category of a reported failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Connectivity or remote-endpoint failures.
    Network,
    /// Rendering or client-surface failures.
    Ui,
    /// Host or subsystem failures.
    System,
    /// Application logic failures.
    Logic,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Ui => write!(f, "ui"),
            Self::System => write!(f, "system"),
            Self::Logic => write!(f, "logic"),
        }
    }
}

/// Ordered failure severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational; recovery is opportunistic.
    Info,
    /// Degraded but operating.
    Warning,
    /// Operation cannot continue without intervention.
    Critical,
}

impl Default for Severity {
    fn default() -> Self {
        Self::Warning
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// Classification of a reported problem.
///
/// `FailureDetails` is immutable once constructed; one value is created per
/// report and discarded after the recovery attempt completes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetails {
    /// The failure category.
    pub kind: FailureKind,
    /// The failure severity.
    pub severity: Severity,
    /// The subsystem that reported the failure.
    pub source: String,
    /// Optional logical owner of the failing surface.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    /// Optional named operation that failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
    /// Optional human-readable detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FailureDetails {
    /// Creates a new failure report.
    #[must_use]
    pub fn new(kind: FailureKind, severity: Severity, source: impl Into<String>) -> Self {
        Self {
            kind,
            severity,
            source: source.into(),
            component: None,
            operation: None,
            message: None,
        }
    }

    /// Sets the owning component.
    #[must_use]
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    /// Sets the failed operation name.
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Sets the human-readable detail.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Derives the identity used to correlate this failure with persistent
    /// per-class state.
    #[must_use]
    pub fn key(&self) -> FailureKey {
        FailureKey::from_details(self)
    }
}

/// Identity of a recoverable failure class: `kind|name|component`.
///
/// The name part is the failure's operation when present, otherwise its
/// source. Two failures with the same key share context, breaker, and
/// in-flight state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FailureKey {
    /// The failure category.
    pub kind: FailureKind,
    /// The operation or source name.
    pub name: String,
    /// The owning component, empty when unknown.
    pub component: String,
}

impl FailureKey {
    /// Builds a key from a failure report.
    #[must_use]
    pub fn from_details(details: &FailureDetails) -> Self {
        let name = details
            .operation
            .clone()
            .unwrap_or_else(|| details.source.clone());
        Self {
            kind: details.kind,
            name,
            component: details.component.clone().unwrap_or_default(),
        }
    }
}

impl fmt::Display for FailureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}|{}", self.kind, self.name, self.component)
    }
}
