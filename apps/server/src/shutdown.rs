use std::sync::Arc;

use tokio::sync::watch;

/// Raised by the panic handler; the server stops accepting connections
/// and exits non-zero once in-flight requests drain.
#[derive(Clone, Debug)]
pub struct PanicSignal {
    tx: Arc<watch::Sender<bool>>,
}

impl Default for PanicSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl PanicSignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    pub async fn triggered(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so this only ends once triggered
        let _ = rx.wait_for(|panicked| *panicked).await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    Interrupt,
    Terminate,
    Panic,
}

impl ShutdownReason {
    pub fn exit_code(self) -> i32 {
        match self {
            ShutdownReason::Interrupt | ShutdownReason::Terminate => 0,
            ShutdownReason::Panic => 1,
        }
    }
}

/// Resolves on SIGINT, SIGTERM (unix) or a handler panic.
pub async fn shutdown_signal(panic_signal: PanicSignal) -> ShutdownReason {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let reason = tokio::select! {
        _ = ctrl_c => ShutdownReason::Interrupt,
        _ = terminate => ShutdownReason::Terminate,
        _ = panic_signal.triggered() => ShutdownReason::Panic,
    };

    tracing::info!(?reason, "shutting down");
    reason
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn trigger_wakes_waiters() {
        let signal = PanicSignal::new();
        let waiter = tokio::spawn({
            let signal = signal.clone();
            async move { signal.triggered().await }
        });

        assert!(!signal.is_triggered());
        signal.trigger();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter woke up")
            .unwrap();
        assert!(signal.is_triggered());
    }

    #[tokio::test]
    async fn waiting_after_trigger_returns_immediately() {
        let signal = PanicSignal::new();
        signal.trigger();

        tokio::time::timeout(Duration::from_secs(1), signal.triggered())
            .await
            .expect("already triggered");
    }

    #[tokio::test]
    async fn panic_shutdown_exits_non_zero() {
        let signal = PanicSignal::new();
        signal.trigger();

        let reason = shutdown_signal(signal).await;

        assert_eq!(reason, ShutdownReason::Panic);
        assert_eq!(reason.exit_code(), 1);
    }
}
