//! Trailing-edge debounce for controller-name writes.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

/// Runs the most recently scheduled task once `delay` has passed without a
/// newer one being scheduled. Each call to [`Debouncer::schedule`] cancels
/// the pending task and restarts the timer.
///
/// Dropping the debouncer cancels whatever is still pending, so a write can
/// never outlive its owner.
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `task`, replacing any pending one. Must be called from
    /// within a tokio runtime.
    pub fn schedule<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let delay = self.delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task.await;
        });
        if let Some(previous) = self.lock().replace(handle) {
            if !previous.is_finished() {
                debug!("debounced task superseded");
            }
            previous.abort();
        }
    }

    /// Cancel the pending task. Returns true if one was still waiting.
    pub fn cancel(&self) -> bool {
        match self.lock().take() {
            Some(handle) => {
                let waiting = !handle.is_finished();
                handle.abort();
                if waiting {
                    debug!("debounced task cancelled");
                }
                waiting
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.lock().as_ref().is_some_and(|h| !h.is_finished())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.pending.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
