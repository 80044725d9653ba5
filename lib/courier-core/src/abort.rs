//! Cooperative cancellation.
//!
//! An [`AbortController`] owns the switch; every [`AbortSignal`] handed out by
//! it observes the same state. Signals travel with the request down to the
//! transport, which stops the in-flight exchange once the switch is flipped.

use tokio::sync::watch;

/// Owner side of an abort switch.
#[derive(Debug)]
pub struct AbortController {
    sender: watch::Sender<bool>,
}

impl Default for AbortController {
    fn default() -> Self {
        Self::new()
    }
}

impl AbortController {
    /// Create a controller in the non-aborted state.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self { sender }
    }

    /// A signal observing this controller.
    #[must_use]
    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            receiver: self.sender.subscribe(),
        }
    }

    /// Abort every exchange carrying one of this controller's signals.
    pub fn abort(&self) {
        self.sender.send_replace(true);
    }
}

/// Observer side of an abort switch.
#[derive(Debug, Clone)]
pub struct AbortSignal {
    receiver: watch::Receiver<bool>,
}

impl AbortSignal {
    /// Returns `true` once the controller aborted.
    #[must_use]
    pub fn is_aborted(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves when the controller aborts.
    ///
    /// Never resolves if the controller is dropped without aborting.
    pub async fn aborted(&self) {
        let mut receiver = self.receiver.clone();
        if receiver.wait_for(|aborted| *aborted).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn signal_reflects_controller_state() {
        let controller = AbortController::new();
        let signal = controller.signal();
        let cloned = signal.clone();

        assert!(!signal.is_aborted());
        controller.abort();
        assert!(signal.is_aborted());
        assert!(cloned.is_aborted());
    }

    #[tokio::test]
    async fn aborted_resolves_after_abort() {
        let controller = AbortController::new();
        let signal = controller.signal();

        controller.abort();

        tokio::time::timeout(Duration::from_secs(1), signal.aborted())
            .await
            .expect("signal should resolve");
    }

    #[tokio::test]
    async fn aborted_stays_pending_when_controller_dropped() {
        let controller = AbortController::new();
        let signal = controller.signal();
        drop(controller);

        let result = tokio::time::timeout(Duration::from_millis(20), signal.aborted()).await;
        assert!(result.is_err());
    }
}
