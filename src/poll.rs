//! Cancellable polling tasks
//!
//! Refresh loops (balances, allowances, claim eligibility) run as owned
//! tasks that stop when their handle is dropped. A timer that keeps polling
//! a torn-down view is a leak, so cancellation is part of the type, not a
//! convention.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Handle to a periodic background task. Dropping the handle aborts the
/// task; there is no detached mode.
pub struct Poller {
    handle: JoinHandle<()>,
}

impl Poller {
    /// Run `tick` immediately and then every `interval` until the returned
    /// handle is dropped or cancelled.
    pub fn spawn<F, Fut>(interval: Duration, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            loop {
                timer.tick().await;
                tick().await;
            }
        });
        Poller { handle }
    }

    /// Stop the task explicitly.
    pub fn cancel(self) {
        debug!("cancelling poller");
        self.handle.abort();
    }

    /// Whether the underlying task has stopped.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
