//! Core types shared across the recovery engine.

mod failure;
mod outcome;
mod result;
mod strategy;

pub use failure::{FailureDetails, FailureKey, FailureKind, Severity};
pub use outcome::ActionOutcome;
pub use result::{RecoveryFailure, RecoveryFailureKind, RecoveryResult};
pub use strategy::Strategy;
