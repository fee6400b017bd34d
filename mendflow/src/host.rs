//! Host-level primitives consumed by restart and refresh steps.
//!
//! The hosting environment provides these; the engine invokes them but does
//! not implement them.

use async_trait::async_trait;

/// Bridge to host-level actions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HostBridge: Send + Sync {
    /// Restarts the hosting process. `Ok` means the request was accepted,
    /// not that the restart completed.
    async fn restart(&self) -> anyhow::Result<()>;

    /// Reloads the client surface.
    async fn reload(&self) -> anyhow::Result<()>;
}

/// A host bridge that accepts every request and does nothing.
///
/// Used as the default when no bridge is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpHost;

#[async_trait]
impl HostBridge for NoOpHost {
    async fn restart(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn reload(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_host_accepts_everything() {
        let host = NoOpHost;
        assert!(host.restart().await.is_ok());
        assert!(host.reload().await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_host() {
        let mut host = MockHostBridge::new();
        host.expect_restart()
            .times(1)
            .returning(|| Err(anyhow::anyhow!("not permitted")));

        assert!(host.restart().await.is_err());
    }
}
