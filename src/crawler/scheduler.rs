//! Bounded worker pool
//!
//! This module handles:
//! - Global concurrency limiting via a semaphore
//! - Tracking every spawned task so none outlives the crawl
//! - Collecting finished outcomes without blocking the dispatch loop
//! - Draining with a grace period, then aborting stragglers

use crate::TrawlerError;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

/// Result of draining the pool
#[derive(Debug)]
pub struct DrainReport<T> {
    /// Outcomes of tasks that finished within the grace period
    pub completed: Vec<T>,
    /// Tasks that were still running when the grace period ended
    pub aborted: usize,
}

/// Fixed-size pool of crawl tasks
///
/// `spawn` waits for a free slot, so at most `size` tasks run at once.
pub struct WorkerPool<T> {
    tasks: JoinSet<T>,
    slots: Arc<Semaphore>,
    size: usize,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Creates a pool with `size` slots
    ///
    /// # Returns
    ///
    /// * `Err(TrawlerError::WorkerPool)` - If `size` is zero
    pub fn new(size: usize) -> Result<Self, TrawlerError> {
        if size == 0 {
            return Err(TrawlerError::WorkerPool(
                "pool size must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            tasks: JoinSet::new(),
            slots: Arc::new(Semaphore::new(size)),
            size,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Tasks spawned and not yet collected
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Number of free slots
    pub fn available(&self) -> usize {
        self.slots.available_permits()
    }

    /// Runs `task` once a slot is free
    pub async fn spawn<F>(&mut self, task: F) -> Result<(), TrawlerError>
    where
        F: Future<Output = T> + Send + 'static,
    {
        let permit = Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .map_err(|e| TrawlerError::WorkerPool(e.to_string()))?;

        self.tasks.spawn(async move {
            let outcome = task.await;
            drop(permit);
            outcome
        });
        Ok(())
    }

    /// Collects the outcomes of all tasks that already finished
    pub fn reap(&mut self) -> Vec<T> {
        let mut finished = Vec::new();
        while let Some(result) = self.tasks.try_join_next() {
            if let Some(outcome) = unwrap_join(result) {
                finished.push(outcome);
            }
        }
        finished
    }

    /// Waits up to `grace` for running tasks, then aborts the rest
    pub async fn drain(&mut self, grace: Duration) -> DrainReport<T> {
        let mut completed = Vec::new();

        let deadline = tokio::time::Instant::now() + grace;
        while !self.tasks.is_empty() {
            match tokio::time::timeout_at(deadline, self.tasks.join_next()).await {
                Ok(Some(result)) => completed.extend(unwrap_join(result)),
                Ok(None) => break,
                Err(_) => break,
            }
        }

        let aborted = self.tasks.len();
        if aborted > 0 {
            tracing::info!("Aborting {} workers still running after {:?}", aborted, grace);
            self.tasks.abort_all();
            while let Some(result) = self.tasks.join_next().await {
                // Tasks that finished between the deadline and the abort still count
                completed.extend(unwrap_join(result));
            }
        }

        DrainReport { completed, aborted }
    }
}

/// Panicked tasks are logged; cancelled tasks vanish quietly
fn unwrap_join<T>(result: Result<T, JoinError>) -> Option<T> {
    match result {
        Ok(outcome) => Some(outcome),
        Err(e) if e.is_panic() => {
            tracing::error!("Crawl worker panicked: {}", e);
            None
        }
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_zero_size_pool_is_rejected() {
        let result = WorkerPool::<()>::new(0);
        assert!(matches!(result, Err(TrawlerError::WorkerPool(_))));
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let mut pool = WorkerPool::new(2).unwrap();
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        for _ in 0..8 {
            let running = Arc::clone(&running);
            let peak = Arc::clone(&peak);
            pool.spawn(async move {
                let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(20)).await;
                running.fetch_sub(1, Ordering::SeqCst);
            })
            .await
            .unwrap();
        }

        let report = pool.drain(Duration::from_secs(5)).await;
        assert_eq!(report.completed.len() + pool.reap().len(), 8);
        assert_eq!(report.aborted, 0);
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_reap_collects_finished() {
        let mut pool = WorkerPool::new(4).unwrap();
        pool.spawn(async { 1 }).await.unwrap();
        pool.spawn(async { 2 }).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let mut finished = pool.reap();
        finished.sort();
        assert_eq!(finished, vec![1, 2]);
        assert_eq!(pool.in_flight(), 0);
        assert_eq!(pool.available(), 4);
    }

    #[tokio::test]
    async fn test_drain_aborts_stragglers() {
        let mut pool = WorkerPool::new(4).unwrap();
        pool.spawn(async { "quick" }).await.unwrap();
        pool.spawn(async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            "slow"
        })
        .await
        .unwrap();

        let report = pool.drain(Duration::from_millis(100)).await;
        assert_eq!(report.completed, vec!["quick"]);
        assert_eq!(report.aborted, 1);
        assert_eq!(pool.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_panicking_task_is_contained() {
        let mut pool = WorkerPool::<i32>::new(2).unwrap();
        pool.spawn(async {
            let missing: Option<i32> = None;
            missing.expect("boom")
        })
        .await
        .unwrap();
        pool.spawn(async { 7 }).await.unwrap();

        let report = pool.drain(Duration::from_secs(5)).await;
        assert_eq!(report.completed, vec![7]);
        assert_eq!(report.aborted, 0);
    }
}
