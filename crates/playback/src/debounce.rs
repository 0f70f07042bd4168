//! Trailing-edge debounce for viewport resizes.
//!
//! Window managers emit resize events in bursts. Each event only replaces the
//! pending viewport; the manager is resized once the burst has been quiet for
//! the configured delay.

use std::sync::Arc;
use std::time::Duration;

use bd_common::Viewport;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::trace;

use crate::manager::VideoManager;

pub struct ResizeDebouncer {
    tx: watch::Sender<Option<Viewport>>,
    task: JoinHandle<()>,
}

impl ResizeDebouncer {
    pub fn spawn(manager: Arc<VideoManager>, delay: Duration) -> Self {
        let (tx, rx) = watch::channel(None);
        let task = tokio::spawn(run(manager, rx, delay));
        Self { tx, task }
    }

    /// Record a resize event. Only the last one of a burst is applied.
    pub fn notify(&self, viewport: Viewport) {
        trace!(%viewport, "Resize event");
        self.tx.send_replace(Some(viewport));
    }
}

impl Drop for ResizeDebouncer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(manager: Arc<VideoManager>, mut rx: watch::Receiver<Option<Viewport>>, delay: Duration) {
    // Outer loop: wait for the first event of a burst.
    while rx.changed().await.is_ok() {
        // Inner loop: restart the quiet period on every further event.
        loop {
            tokio::select! {
                _ = tokio::time::sleep(delay) => break,
                changed = rx.changed() => {
                    if changed.is_err() {
                        return;
                    }
                }
            }
        }
        let pending = *rx.borrow_and_update();
        if let Some(viewport) = pending {
            manager.resize(viewport).await;
        }
    }
}
