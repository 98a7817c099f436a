//! Execution of best-effort cache maintenance

use crate::error::Result;
use crate::logging::log_discarded;
use std::future::Future;
use tokio::sync::Mutex;
use tokio::task::JoinSet;

/// Runs cache side effects inline or in the background
///
/// Errors from a task are logged and dropped; nothing is retried.
pub enum TaskRunner {
    /// Each task completes before `run` returns
    Sync,
    /// Each task is spawned; `wait` drains everything scheduled so far
    Async { tasks: Mutex<JoinSet<()>> },
}

impl TaskRunner {
    pub fn sync() -> Self {
        Self::Sync
    }

    pub fn background() -> Self {
        Self::Async {
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    pub fn is_async(&self) -> bool {
        matches!(self, Self::Async { .. })
    }

    pub async fn run<F>(&self, operation: &'static str, task: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        match self {
            Self::Sync => {
                if let Err(e) = task.await {
                    log_discarded(operation, &e);
                }
            }
            Self::Async { tasks } => {
                let mut tasks = tasks.lock().await;
                // Reap finished tasks so the set does not grow unbounded
                while let Some(done) = tasks.try_join_next() {
                    log_join_failure(done);
                }
                tasks.spawn(async move {
                    if let Err(e) = task.await {
                        log_discarded(operation, &e);
                    }
                });
                tracing::trace!(operation, pending = tasks.len(), "Scheduled cache task");
            }
        }
    }

    /// Block until every task scheduled before this call has finished
    ///
    /// The set stays in place while it drains, so concurrent waiters all
    /// return only once it is empty and dropping a waiter aborts nothing.
    pub async fn wait(&self) {
        if let Self::Async { tasks } = self {
            while let Some(done) = tasks.lock().await.join_next().await {
                log_join_failure(done);
            }
        }
    }

    /// Tasks scheduled but not yet reaped
    pub async fn pending(&self) -> usize {
        match self {
            Self::Sync => 0,
            Self::Async { tasks } => tasks.lock().await.len(),
        }
    }
}

fn log_join_failure(result: std::result::Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        tracing::warn!(error = %e, "Cache task panicked or was aborted");
    }
}

impl std::fmt::Debug for TaskRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sync => f.write_str("TaskRunner::Sync"),
            Self::Async { .. } => f.write_str("TaskRunner::Async"),
        }
    }
}
