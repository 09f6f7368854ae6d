//! Background polling loop for [`ExecutionTracker`](super::ExecutionTracker).

use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task;
use tracing::warn;

use super::ExecutionTracker;

/// Handle to the spawned poll task. Dropping it stops polling.
pub struct PollHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: task::JoinHandle<()>,
}

impl PollHandle {
    /// Spawn a task that calls [`ExecutionTracker::tick`] on the
    /// configured interval until the handle is stopped or dropped.
    pub fn spawn(tracker: Arc<ExecutionTracker>) -> Self {
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
        let interval = tracker.poll_interval;

        let handle = task::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    _ = ticker.tick() => {
                        if let Err(error) = tracker.tick().await {
                            warn!(%error, "execution poll tick failed");
                        }
                    }
                }
            }
        });

        Self {
            shutdown_tx: Some(shutdown_tx),
            handle,
        }
    }

    /// Stop the poll task and wait for it to exit.
    pub async fn stop(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = (&mut self.handle).await;
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        self.handle.abort();
    }
}
