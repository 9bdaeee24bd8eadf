//! ConnectionPool - tracks per-connection writer tasks

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, error, warn};

/// Set of live connection writer tasks
///
/// Entries are added on accept and reaped when their task exits. The pool is
/// owned by the accept loop, so no locking is involved.
#[derive(Debug)]
pub struct ConnectionPool {
    tasks: JoinSet<()>,
    max_connections: Option<usize>,
}

impl ConnectionPool {
    /// Create a pool; `None` means unbounded
    pub fn new(max_connections: Option<usize>) -> Self {
        Self {
            tasks: JoinSet::new(),
            max_connections,
        }
    }

    /// Number of writer tasks not yet reaped
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether another connection may be admitted (after reaping)
    pub fn has_capacity(&mut self) -> bool {
        self.reap();
        self.max_connections.is_none_or(|max| self.tasks.len() < max)
    }

    /// Track a new writer task
    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.spawn(task);
    }

    /// Remove finished tasks, returning how many were removed
    pub fn reap(&mut self) -> usize {
        let mut reaped = 0;
        while let Some(result) = self.tasks.try_join_next() {
            if let Err(e) = result {
                if e.is_panic() {
                    error!(error = %e, "Connection writer panicked");
                }
            }
            reaped += 1;
        }
        reaped
    }

    /// Wait up to `grace` for every writer to exit, then abort the rest
    pub async fn drain(mut self, grace: Duration) {
        let pending = self.tasks.len();
        if pending == 0 {
            return;
        }

        debug!(pending, "Draining connection writers");
        let finished = tokio::time::timeout(grace, async {
            while self.tasks.join_next().await.is_some() {}
        })
        .await;

        if finished.is_err() {
            warn!(
                remaining = self.tasks.len(),
                grace_ms = grace.as_millis() as u64,
                "Connection writers still busy after grace period, aborting"
            );
            self.tasks.shutdown().await;
        }
    }
}
