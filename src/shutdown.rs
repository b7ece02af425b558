//! Stop signal for consumer loops.

use tokio::sync::watch;

/// Cloneable stop token; every consumer holding a clone sees the same signal.
#[derive(Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
}

impl ShutdownToken {
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once shutdown is requested. Never resolves if the sender is
    /// dropped without signalling.
    pub async fn wait(&mut self) {
        let signalled = self.rx.wait_for(|stopped| *stopped).await.is_ok();
        if !signalled {
            std::future::pending::<()>().await;
        }
    }
}

pub struct ShutdownSender {
    tx: watch::Sender<bool>,
}

impl ShutdownSender {
    /// Ask every consumer sharing this channel to stop.
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

pub fn shutdown_channel() -> (ShutdownSender, ShutdownToken) {
    let (tx, rx) = watch::channel(false);
    (ShutdownSender { tx }, ShutdownToken { rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_clone_observes_shutdown() {
        let (tx, token) = shutdown_channel();
        let mut a = token.clone();
        let b = token.clone();
        assert!(!b.is_shutdown());

        tx.shutdown();
        a.wait().await;
        assert!(b.is_shutdown());
        assert!(token.is_shutdown());
    }
}
