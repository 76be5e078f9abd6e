//! Periodic progress reporting
//!
//! The monitor only reads frontier counters, with one exception: once the
//! queue alone reaches the crawl budget it halts intake, since the remaining
//! budget can never consume what is already planned.

use crate::state::{Frontier, FrontierCounts};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

/// Logs crawl progress at a fixed interval
#[derive(Clone)]
pub struct ProgressMonitor {
    frontier: Arc<Frontier>,
    limit: usize,
    started: Instant,
}

impl ProgressMonitor {
    pub fn new(frontier: Arc<Frontier>, limit: usize) -> Self {
        Self {
            frontier,
            limit,
            started: Instant::now(),
        }
    }

    /// Takes one progress snapshot and logs it
    pub fn tick(&self) -> FrontierCounts {
        let counts = self.frontier.counts();

        if counts.planned >= self.limit && !self.frontier.is_halted() {
            tracing::info!(
                "Queue holds {} URLs (limit {}), no longer accepting new URLs",
                counts.planned,
                self.limit
            );
            self.frontier.halt_intake();
        }

        tracing::info!(
            "Time elapsed: {:.1}s | Processed: {} (visited {}, blocked {}) | Abandoned: {} | Approximate items left in queue: {}",
            self.started.elapsed().as_secs_f64(),
            counts.processed(),
            counts.visited,
            counts.blocked,
            counts.abandoned,
            counts.planned
        );

        counts
    }

    /// Runs `tick` every `interval` until the returned handle is aborted
    pub fn spawn(self, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick of an interval completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.tick();
            }
        })
    }
}
