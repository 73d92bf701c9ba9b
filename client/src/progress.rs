//! Batch progress reporting
//!
//! Observers subscribe to a watch channel and always see the latest state.
//! Pipelines publish the next item before its service call starts.

use shared::Progress;
use tokio::sync::watch;

pub struct ProgressReporter {
    tx: watch::Sender<Progress>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Progress::idle());
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<Progress> {
        self.tx.subscribe()
    }

    /// Latest published state
    pub fn snapshot(&self) -> Progress {
        self.tx.borrow().clone()
    }

    /// Announce item `current` (1-based) of `total`
    pub fn begin(&self, current: usize, total: usize, message: impl Into<String>) {
        let progress = Progress::new(current, total, message);
        tracing::debug!(current, total, message = %progress.message, "Batch progress");
        self.tx.send_replace(progress);
    }

    /// Return to idle once a batch ends
    pub fn finish(&self) {
        self.tx.send_replace(Progress::idle());
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}
