//! Bounded task pool.
//!
//! At most `limit` tasks are in flight at any instant. A permit is taken
//! before each task is spawned, so submission waits (backpressure) until
//! a running task finishes and frees its slot. Tasks start in submission
//! order; completion order is whatever the tasks make it.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct BoundedPool {
    limit: usize,
    permits: Arc<Semaphore>,
}

impl BoundedPool {
    /// A pool with room for `limit` concurrent tasks (at least one).
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            limit,
            permits: Arc::new(Semaphore::new(limit)),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Runs every task and returns their outcomes in completion order.
    ///
    /// A task that panics is reported as `Err(JoinError)`; the others
    /// keep running.
    pub async fn run<I, F, Fut, T>(&self, tasks: I) -> Vec<Result<T, JoinError>>
    where
        I: IntoIterator<Item = F>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let mut running = JoinSet::new();
        let mut outcomes = Vec::new();

        for task in tasks {
            let permit = match Arc::clone(&self.permits).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    warn!("Task pool closed: {}", e);
                    break;
                }
            };
            let future = task();
            running.spawn(async move {
                let output = future.await;
                drop(permit);
                output
            });

            // Collect whatever already finished so the set stays small.
            while let Some(done) = running.try_join_next() {
                outcomes.push(done);
            }
        }

        while let Some(done) = running.join_next().await {
            outcomes.push(done);
        }
        outcomes
    }
}

impl Default for BoundedPool {
    fn default() -> Self {
        Self::new(fdoc_core::config::DEFAULT_CONCURRENCY)
    }
}
