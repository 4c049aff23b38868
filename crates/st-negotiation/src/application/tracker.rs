//! # Transaction Tracker
//!
//! Session-wide status of the most recent mutating operation.
//!
//! ```text
//! idle ──pending──→ pending ──succeed/fail──→ success|error ──timer──→ idle
//!   ↑                                               │
//!   └──────── any new status cancels the timer ─────┘
//! ```
//!
//! Each terminal status spawns one auto-clear task. Setting any new status
//! aborts that task and bumps a generation counter, so a clear that was
//! already running never hides a newer status.

use crate::domain::{TransactionState, TransactionStatus};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::debug;

struct TrackerInner {
    generation: u64,
    clear_task: Option<JoinHandle<()>>,
}

/// Owner of the single [`TransactionStatus`] of a session.
pub struct TransactionTracker {
    inner: Arc<Mutex<TrackerInner>>,
    status_tx: Arc<watch::Sender<TransactionStatus>>,
    success_clear_after: Duration,
    error_clear_after: Duration,
}

impl TransactionTracker {
    /// Create an idle tracker.
    pub fn new(success_clear_after: Duration, error_clear_after: Duration) -> Self {
        let (status_tx, _) = watch::channel(TransactionStatus::hidden());
        Self {
            inner: Arc::new(Mutex::new(TrackerInner {
                generation: 0,
                clear_task: None,
            })),
            status_tx: Arc::new(status_tx),
            success_clear_after,
            error_clear_after,
        }
    }

    /// Current status.
    pub fn status(&self) -> TransactionStatus {
        self.status_tx.borrow().clone()
    }

    /// Subscribe to status changes.
    pub fn subscribe(&self) -> watch::Receiver<TransactionStatus> {
        self.status_tx.subscribe()
    }

    /// Show an in-flight status. Never auto-clears.
    pub fn pending(&self, message: impl Into<String>) {
        self.set(TransactionStatus::shown(TransactionState::Pending, message), None);
    }

    /// Show a success status, cleared after the success delay.
    pub fn succeed(&self, message: impl Into<String>) {
        let delay = self.success_clear_after;
        self.set(
            TransactionStatus::shown(TransactionState::Success, message),
            Some(delay),
        );
    }

    /// Show an error status, cleared after the error delay.
    pub fn fail(&self, message: impl Into<String>) {
        let delay = self.error_clear_after;
        self.set(
            TransactionStatus::shown(TransactionState::Error, message),
            Some(delay),
        );
    }

    /// Hide the status immediately.
    pub fn clear(&self) {
        self.set(TransactionStatus::hidden(), None);
    }

    fn set(&self, status: TransactionStatus, clear_after: Option<Duration>) {
        let mut inner = self.inner.lock();
        if let Some(task) = inner.clear_task.take() {
            task.abort();
        }
        inner.generation += 1;
        let generation = inner.generation;

        debug!(
            state = ?status.state,
            message = %status.message,
            generation,
            "[st-negotiation] Transaction status changed"
        );
        self.status_tx.send_replace(status);

        let Some(delay) = clear_after else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("[st-negotiation] No runtime, status will not auto-clear");
            return;
        };

        let shared = Arc::clone(&self.inner);
        let status_tx = Arc::clone(&self.status_tx);
        inner.clear_task = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let mut inner = shared.lock();
            if inner.generation == generation {
                inner.clear_task = None;
                status_tx.send_replace(TransactionStatus::hidden());
            }
        }));
    }
}

impl Drop for TransactionTracker {
    fn drop(&mut self) {
        if let Some(task) = self.inner.lock().clear_task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> TransactionTracker {
        TransactionTracker::new(Duration::from_secs(2), Duration::from_secs(3))
    }

    #[tokio::test(start_paused = true)]
    async fn test_starts_idle() {
        assert!(tracker().status().is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_does_not_expire() {
        let t = tracker();
        t.pending("Creating encrypted salary offer...");
        tokio::time::sleep(Duration::from_secs(10)).await;
        let status = t.status();
        assert!(status.visible);
        assert_eq!(status.state, TransactionState::Pending);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_clears_after_two_seconds() {
        let t = tracker();
        t.succeed("done");
        tokio::time::sleep(Duration::from_millis(1_900)).await;
        assert!(t.status().visible);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(t.status().is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_clears_after_three_seconds() {
        let t = tracker();
        t.fail("Creation failed");
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(t.status().state, TransactionState::Error);
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert!(t.status().is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_operation_cancels_stale_clear() {
        let t = tracker();
        t.succeed("first");
        tokio::time::sleep(Duration::from_millis(1_500)).await;
        t.pending("second");
        tokio::time::sleep(Duration::from_secs(5)).await;

        let status = t.status();
        assert!(status.visible);
        assert_eq!(status.message, "second");
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseding_terminal_restarts_timer() {
        let t = tracker();
        t.fail("first");
        tokio::time::sleep(Duration::from_millis(2_500)).await;
        t.succeed("second");
        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(t.status().message, "second");
        tokio::time::sleep(Duration::from_millis(1_100)).await;
        assert!(t.status().is_idle());
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_changes() {
        let t = tracker();
        let mut rx = t.subscribe();
        t.fail("Decryption failed");
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().message, "Decryption failed");
    }

    #[test]
    fn test_terminal_without_runtime_stays_visible() {
        let t = tracker();
        t.succeed("no runtime");
        assert!(t.status().visible);
    }
}
