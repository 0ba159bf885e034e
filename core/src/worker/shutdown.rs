use std::sync::Arc;

use tokio::sync::watch;

/// Fires the process-wide shutdown once. Cheap to clone.
#[derive(Clone)]
pub struct ShutdownTrigger {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

#[derive(Clone)]
pub struct ShutdownListener {
    rx: watch::Receiver<bool>,
}

impl ShutdownListener {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown fires. Never resolves if every trigger is dropped
    /// without firing.
    pub async fn triggered(&mut self) {
        if self.rx.wait_for(|fired| *fired).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownListener) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx: Arc::new(tx) }, ShutdownListener { rx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn listeners_observe_trigger() {
        let (trigger, listener) = shutdown_channel();
        let mut other = listener.clone();
        assert!(!listener.is_triggered());

        trigger.trigger();
        tokio::time::timeout(Duration::from_secs(1), other.triggered())
            .await
            .unwrap();
        assert!(listener.is_triggered());
    }
}
