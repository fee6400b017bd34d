//! Action trait and function adapters.
//!
//! Actions are the externally supplied operations a plan invokes. The engine
//! never knows an action's internal behavior, only its outcome. Actions must
//! be safely abandonable: when a plan times out, the losing task is detached,
//! so an action may still be running after the engine has reported the
//! timeout.

use crate::core::ActionOutcome;
use async_trait::async_trait;
use std::fmt::Debug;

/// Trait for remediation actions.
#[async_trait]
pub trait RecoveryAction: Send + Sync + Debug {
    /// Executes the action.
    async fn run(&self) -> ActionOutcome;
}

/// A synchronous function-based action.
pub struct FnAction<F>
where
    F: Fn() -> ActionOutcome + Send + Sync,
{
    name: String,
    func: F,
}

impl<F> FnAction<F>
where
    F: Fn() -> ActionOutcome + Send + Sync,
{
    /// Creates a new function-based action.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Debug for FnAction<F>
where
    F: Fn() -> ActionOutcome + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnAction").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<F> RecoveryAction for FnAction<F>
where
    F: Fn() -> ActionOutcome + Send + Sync,
{
    async fn run(&self) -> ActionOutcome {
        (self.func)()
    }
}

/// An async function-based action.
pub struct AsyncFnAction<F, Fut>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: std::future::Future<Output = ActionOutcome> + Send,
{
    name: String,
    func: F,
    _phantom: std::marker::PhantomData<fn() -> Fut>,
}

impl<F, Fut> AsyncFnAction<F, Fut>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: std::future::Future<Output = ActionOutcome> + Send,
{
    /// Creates a new async function-based action.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<F, Fut> Debug for AsyncFnAction<F, Fut>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: std::future::Future<Output = ActionOutcome> + Send,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncFnAction")
            .field("name", &self.name)
            .finish()
    }
}

#[async_trait]
impl<F, Fut> RecoveryAction for AsyncFnAction<F, Fut>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: std::future::Future<Output = ActionOutcome> + Send,
{
    async fn run(&self) -> ActionOutcome {
        (self.func)().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fn_action() {
        let action = FnAction::new("reconnect", || ActionOutcome::ok_message("done"));
        let outcome = action.run().await;
        assert!(outcome.success);
        assert_eq!(outcome.message.as_deref(), Some("done"));
    }

    #[tokio::test]
    async fn test_async_fn_action() {
        let action = AsyncFnAction::new("reload", || async { ActionOutcome::failed("nope") });
        let outcome = action.run().await;
        assert!(!outcome.success);
    }

    #[test]
    fn test_debug_shows_name() {
        let action = FnAction::new("reconnect", ActionOutcome::ok_empty);
        assert!(format!("{action:?}").contains("reconnect"));
    }
}
