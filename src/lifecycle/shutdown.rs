//! Shutdown coordination.
//!
//! # Design Decisions
//! - The trigger is latched in a `watch` channel: a listener created after
//!   `trigger` still resolves, so a server started late cannot miss it
//! - Dropping the coordinator releases every listener as well

use tokio::sync::watch;

/// Owner of the shutdown latch.
#[derive(Debug)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

/// Handle that resolves once shutdown has been requested.
#[derive(Debug, Clone)]
pub struct ShutdownListener {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Hand out a listener for the server or a background task.
    pub fn listener(&self) -> ShutdownListener {
        ShutdownListener {
            rx: self.tx.subscribe(),
        }
    }

    /// Request shutdown. Idempotent.
    pub fn trigger(&self) {
        if !self.tx.send_replace(true) {
            tracing::info!(listeners = self.tx.receiver_count(), "Shutdown requested");
        }
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownListener {
    /// Wait until shutdown is requested or the coordinator is gone.
    pub async fn wait(mut self) {
        // Err means the sender was dropped, which ends the service too.
        let _ = self.rx.wait_for(|triggered| *triggered).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_trigger_releases_all_listeners() {
        let shutdown = Shutdown::new();
        let a = shutdown.listener();
        let b = a.clone();
        assert!(!shutdown.is_triggered());

        shutdown.trigger();
        assert!(shutdown.is_triggered());
        timeout(Duration::from_secs(1), a.wait()).await.unwrap();
        timeout(Duration::from_secs(1), b.wait()).await.unwrap();
    }

    #[tokio::test]
    async fn test_listener_after_trigger_resolves() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        shutdown.trigger();
        timeout(Duration::from_secs(1), shutdown.listener().wait())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_pending_until_triggered() {
        let shutdown = Shutdown::new();
        let pending = timeout(Duration::from_millis(50), shutdown.listener().wait()).await;
        assert!(pending.is_err());
    }

    #[tokio::test]
    async fn test_dropped_coordinator_releases_listener() {
        let shutdown = Shutdown::new();
        let listener = shutdown.listener();
        drop(shutdown);
        timeout(Duration::from_secs(1), listener.wait()).await.unwrap();
    }
}
