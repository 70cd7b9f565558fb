//! User-initiated cancellation.

use tokio::sync::watch;

/// Reason recorded on agents interrupted by a stop request.
pub const STOPPED_BY_USER: &str = "stopped by user";

/// Cloneable stop flag shared by the loop, the phase executor, and agents.
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: watch::Sender<bool>,
}

impl StopHandle {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Request a stop. Idempotent.
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once a stop has been requested.
    pub async fn stopped(&self) {
        let mut rx = self.tx.subscribe();
        // Sender is owned by `self`; it cannot close while we wait.
        let _ = rx.wait_for(|stopped| *stopped).await;
    }
}

impl Default for StopHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_stop_wakes_waiters() {
        let handle = StopHandle::new();
        let waiter = handle.clone();
        let task = tokio::spawn(async move { waiter.stopped().await });

        assert!(!handle.is_stopped());
        handle.stop();

        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("waiter should wake")
            .expect("task should not panic");
        assert!(handle.is_stopped());
    }

    #[tokio::test]
    async fn test_stopped_returns_immediately_when_already_stopped() {
        let handle = StopHandle::new();
        handle.stop();
        tokio::time::timeout(Duration::from_millis(100), handle.stopped())
            .await
            .expect("should resolve immediately");
    }
}
