//! Test utilities: mock actions, a pending action, and a recording sink.

mod mocks;

pub use mocks::{FailAction, MockAction, PendingAction, RecordingSink, SuccessAction};
