//! Graceful-shutdown plumbing.
//!
//! A watch channel carries a single boolean: the signal task sets it, the
//! controller reads it at tick boundaries and inside the inter-tick sleep.
//! The signal task performs no I/O and no cleanup - all teardown happens
//! in the controller's own control flow after it observes the flag.

use tokio::sync::watch;
use tracing::{info, warn};

/// Sending half: owned by the signal task (and by tests).
#[derive(Clone)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

/// Receiving half: observed by the controller.
#[derive(Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

/// Create a connected trigger/token pair.
pub fn channel() -> (ShutdownTrigger, ShutdownToken) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, ShutdownToken { rx })
}

impl ShutdownTrigger {
    /// Request shutdown. Only sets the flag; never blocks, safe from any
    /// context.
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }
}

impl ShutdownToken {
    /// Whether shutdown has been requested.
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown is requested (immediately if it already was).
    /// Also resolves if every trigger has been dropped, so a lost signal
    /// task cannot leave the loop unstoppable.
    pub async fn cancelled(&mut self) {
        while !*self.rx.borrow_and_update() {
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Spawn the task that turns SIGINT/SIGTERM into a shutdown request.
pub fn spawn_signal_listener(trigger: ShutdownTrigger) {
    tokio::spawn(async move {
        wait_for_signal().await;
        trigger.trigger();
    });
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(stream) => stream,
        Err(e) => {
            warn!(error = %e, "failed to register SIGTERM handler, listening for ctrl-c only");
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("SIGINT received, shutting down gracefully");
            }
            return;
        }
    };

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("SIGINT received, shutting down gracefully"),
        _ = sigterm.recv() => info!("SIGTERM received, shutting down gracefully"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("ctrl-c received, shutting down gracefully");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_sets_flag() {
        let (trigger, token) = channel();
        assert!(!token.is_shutdown());
        trigger.trigger();
        assert!(token.is_shutdown());
    }

    #[tokio::test]
    async fn test_cancelled_resolves_on_trigger() {
        let (trigger, mut token) = channel();
        let waiter = tokio::spawn(async move {
            token.cancelled().await;
        });
        trigger.trigger();
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_resolves_if_trigger_dropped() {
        let (trigger, mut token) = channel();
        drop(trigger);
        token.cancelled().await;
    }

    #[tokio::test]
    async fn test_cancelled_resolves_immediately_when_already_triggered() {
        let (trigger, mut token) = channel();
        trigger.trigger();
        token.cancelled().await;
    }
}
