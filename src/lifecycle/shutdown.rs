//! Stop request shared between the signal handler and a running weight ramp.
//!
//! The request is latched: a listener created after `trigger` still sees it,
//! so a signal that arrives before the ticker starts is not lost.

use std::sync::Arc;

use tokio::sync::watch;

/// Latched stop request. Clones share the same flag.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Listener for the tick source of a weight ramp.
    pub fn listener(&self) -> ShutdownListener {
        ShutdownListener {
            rx: self.tx.subscribe(),
        }
    }

    /// Request a stop. Returns false if one was requested before.
    pub fn trigger(&self) -> bool {
        let first = !self.tx.send_replace(true);
        tracing::debug!(first, listeners = self.tx.receiver_count(), "Stop requested");
        first
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

/// Receiving side of a `Shutdown`.
#[derive(Debug)]
pub struct ShutdownListener {
    rx: watch::Receiver<bool>,
}

impl ShutdownListener {
    /// Resolve once a stop was requested, immediately if it already was.
    ///
    /// Never resolves when every `Shutdown` is gone without a request.
    pub async fn wait(&mut self) {
        if self.rx.wait_for(|stop| *stop).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_reaches_listeners() {
        let shutdown = Shutdown::new();
        let mut early = shutdown.listener();
        assert!(!shutdown.is_triggered());

        assert!(shutdown.clone().trigger());
        assert!(!shutdown.trigger());
        assert!(shutdown.is_triggered());

        early.wait().await;
        // latched for listeners created afterwards
        shutdown.listener().wait().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_pends_without_trigger() {
        let shutdown = Shutdown::new();
        let mut listener = shutdown.listener();
        drop(shutdown);

        let waited = tokio::time::timeout(Duration::from_secs(5), listener.wait()).await;
        assert!(waited.is_err());
    }
}
