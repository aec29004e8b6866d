//! Cancellation utilities
//!
//! First-class cancellation handles for generation sessions.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A handle that can be used to request cancellation.
#[derive(Clone, Debug)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    /// Create a new cancel handle.
    pub(crate) fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// Request cancellation. The session stops delivering callbacks and tears
    /// down its HTTP connection so the server stops generating.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Check if cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// A future that resolves when cancellation is requested.
    pub fn cancelled(&self) -> tokio_util::sync::WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// Cancel once `after` has elapsed, unless cancellation happened first.
    ///
    /// This is how timeouts are expressed: as an external cancellation
    /// trigger, so a timed out session ends `Cancelled`.
    pub fn cancel_after(&self, after: Duration) {
        self.spawn_timer(after, None);
    }

    /// Like [`cancel_after`](Self::cancel_after), but the timer also stops
    /// once `finished` is cancelled, so an ended session leaves no timer
    /// task behind.
    pub(crate) fn cancel_after_unless(
        &self,
        after: Duration,
        finished: CancellationToken,
    ) -> JoinHandle<()> {
        self.spawn_timer(after, Some(finished))
    }

    fn spawn_timer(&self, after: Duration, finished: Option<CancellationToken>) -> JoinHandle<()> {
        let token = self.token.clone();
        tokio::spawn(async move {
            let finished = async {
                match &finished {
                    Some(finished) => finished.cancelled().await,
                    None => std::future::pending().await,
                }
            };
            tokio::select! {
                _ = token.cancelled() => {}
                _ = finished => {}
                _ = tokio::time::sleep(after) => {
                    tracing::debug!(after_ms = after.as_millis() as u64, "cancel timer fired");
                    token.cancel();
                }
            }
        })
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// Create a standalone cancel handle that can be shared across tasks.
pub fn new_cancel_handle() -> CancelHandle {
    CancelHandle::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn cancel_wakes_pending_waiter_immediately() {
        let handle = new_cancel_handle();
        let waiter = {
            let handle = handle.clone();
            tokio::spawn(async move { handle.cancelled().await })
        };

        tokio::task::yield_now().await;
        handle.cancel();

        tokio::time::timeout(Duration::from_millis(200), waiter)
            .await
            .expect("cancel should wake the waiting task")
            .expect("task ok");
        assert!(handle.is_cancelled());
    }

    #[tokio::test]
    async fn cancel_after_fires_once_elapsed() {
        let handle = new_cancel_handle();
        handle.cancel_after(Duration::from_millis(20));
        assert!(!handle.is_cancelled());

        tokio::time::timeout(Duration::from_secs(2), handle.cancelled())
            .await
            .expect("timer should cancel the handle");
    }

    #[tokio::test]
    async fn finished_session_stops_its_timer() {
        let handle = new_cancel_handle();
        let finished = CancellationToken::new();
        let timer = handle.cancel_after_unless(Duration::from_secs(3600), finished.clone());

        finished.cancel();
        tokio::time::timeout(Duration::from_secs(2), timer)
            .await
            .expect("timer task should exit once the session finished")
            .expect("task ok");
        assert!(!handle.is_cancelled());
    }

    #[tokio::test]
    async fn child_tokens_observe_the_handle() {
        let handle = new_cancel_handle();
        let child = handle.token().child_token();
        handle.cancel();
        assert!(child.is_cancelled());
    }
}
