//! Shutdown coordination for the HTTP listener and background deliveries.
//!
//! Deliveries cannot be cancelled once started, so shutdown stops accepting
//! new work, then waits a bounded time for tracked tasks to finish.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Default drain timeout before giving up on in-flight deliveries.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Tracks background delivery tasks and the process-wide shutdown signal.
pub struct ShutdownCoordinator {
    token: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl ShutdownCoordinator {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Get a clone of the cancellation token.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Initiate shutdown.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// Whether a shutdown has been initiated.
    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Register a background task to be awaited on shutdown.
    pub fn track(&self, handle: JoinHandle<()>) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.retain(|h| !h.is_finished());
        tasks.push(handle);
    }

    /// Tracked tasks that have not finished yet.
    pub fn in_flight(&self) -> usize {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|h| !h.is_finished())
            .count()
    }

    /// Cancel, then wait up to `timeout` for every tracked task.
    pub async fn drain(&self, timeout: Option<Duration>) {
        let handles = std::mem::take(&mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner));
        self.graceful_shutdown(handles, timeout).await;
    }

    /// Perform a graceful shutdown of `handles`.
    ///
    /// 1. Cancel the shutdown token
    /// 2. Wait up to `timeout` for all handles to complete
    pub async fn graceful_shutdown(&self, handles: Vec<JoinHandle<()>>, timeout: Option<Duration>) {
        let timeout = timeout.unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT);

        self.shutdown();
        info!(
            task_count = handles.len(),
            timeout_secs = timeout.as_secs(),
            "waiting for deliveries to complete"
        );

        let drain = futures::future::join_all(handles);

        if tokio::time::timeout(timeout, drain).await.is_err() {
            warn!("shutdown timed out after {timeout:?}, some deliveries may still be running");
        }
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn initial_state_not_shutting_down() {
        let coord = ShutdownCoordinator::new();
        assert!(!coord.is_shutting_down());
        assert_eq!(coord.in_flight(), 0);
    }

    #[test]
    fn shutdown_is_idempotent_and_propagates() {
        let coord = ShutdownCoordinator::default();
        let token = coord.token();
        coord.shutdown();
        coord.shutdown();
        assert!(coord.is_shutting_down());
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn drain_waits_for_tracked_tasks() {
        let coord = ShutdownCoordinator::new();
        let done = Arc::new(AtomicBool::new(false));
        let flag = done.clone();
        coord.track(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            flag.store(true, Ordering::SeqCst);
        }));

        coord.drain(Some(Duration::from_secs(5))).await;
        assert!(done.load(Ordering::SeqCst));
        assert!(coord.is_shutting_down());
        assert_eq!(coord.in_flight(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn drain_gives_up_after_timeout() {
        let coord = ShutdownCoordinator::new();
        coord.track(tokio::spawn(std::future::pending::<()>()));

        let started = tokio::time::Instant::now();
        coord.drain(Some(Duration::from_secs(2))).await;
        assert!(started.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn track_prunes_finished_tasks() {
        let coord = ShutdownCoordinator::new();
        let finished = tokio::spawn(async {});
        while !finished.is_finished() {
            tokio::task::yield_now().await;
        }
        coord.track(finished);
        coord.track(tokio::spawn(std::future::pending::<()>()));
        assert_eq!(coord.in_flight(), 1);
    }
}
