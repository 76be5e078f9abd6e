//! Crawler coordinator - the dispatch loop
//!
//! The coordinator owns the worker pool and decides when the crawl ends:
//! - Dispatching planned URLs into the pool as slots free up
//! - Stopping once the visit budget is spent
//! - Declaring the crawl stuck after a long enough idle period
//! - Draining in-flight workers with a grace period

use crate::config::CrawlerConfig;
use crate::crawler::scheduler::WorkerPool;
use crate::crawler::worker::{crawl_url, CrawlContext, WorkerOutcome};
use crate::TrawlerError;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Lifecycle of a coordinator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    /// Dispatching URLs
    Running,
    /// Intake halted, waiting for in-flight workers
    Draining,
    /// All workers finished or aborted
    Stopped,
}

/// Why the dispatch loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Visited plus blocked reached the limit
    Budget,
    /// Nothing was dispatched for the whole stuck timeout
    Stuck,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::Budget => write!(f, "limit reached"),
            StopReason::Stuck => write!(f, "likely stuck"),
        }
    }
}

/// Stop conditions and timings of the dispatch loop
#[derive(Debug, Clone, Copy)]
pub struct CoordinatorSettings {
    pub limit: usize,
    pub stuck_timeout: Duration,
    pub settle_delay: Duration,
    pub idle_poll: Duration,
}

impl From<&CrawlerConfig> for CoordinatorSettings {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            limit: config.limit,
            stuck_timeout: config.stuck_timeout(),
            settle_delay: config.settle_delay(),
            idle_poll: config.idle_poll(),
        }
    }
}

/// Per-outcome counts of finished workers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeTally {
    pub visited: usize,
    pub ignored: usize,
    pub disallowed: usize,
    pub abandoned: usize,
    pub duplicate: usize,
    /// Links seen on visited pages
    pub discovered: usize,
    /// Links that were new to the frontier
    pub enqueued: usize,
}

impl OutcomeTally {
    pub fn add(&mut self, outcome: WorkerOutcome) {
        match outcome {
            WorkerOutcome::Ignored => self.ignored += 1,
            WorkerOutcome::Disallowed => self.disallowed += 1,
            WorkerOutcome::Abandoned => self.abandoned += 1,
            WorkerOutcome::Duplicate => self.duplicate += 1,
            WorkerOutcome::Visited {
                discovered,
                enqueued,
            } => {
                self.visited += 1;
                self.discovered += discovered;
                self.enqueued += enqueued;
            }
        }
    }

    /// Number of workers accounted for
    pub fn total(&self) -> usize {
        self.visited + self.ignored + self.disallowed + self.abandoned + self.duplicate
    }
}

impl Extend<WorkerOutcome> for OutcomeTally {
    fn extend<I: IntoIterator<Item = WorkerOutcome>>(&mut self, outcomes: I) {
        for outcome in outcomes {
            self.add(outcome);
        }
    }
}

/// What a finished coordinator did
#[derive(Debug, Clone)]
pub struct CoordinatorReport {
    pub stop_reason: StopReason,
    /// URLs handed to workers
    pub dispatched: usize,
    pub outcomes: OutcomeTally,
    /// Workers cut off at the end of the settle delay
    pub aborted: usize,
    pub elapsed: Duration,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    ctx: Arc<CrawlContext>,
    settings: CoordinatorSettings,
    pool: WorkerPool<WorkerOutcome>,
    phase: CrawlPhase,
}

impl Coordinator {
    /// Creates a coordinator with a pool of `max_workers` slots
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(TrawlerError::WorkerPool)` - If `max_workers` is zero
    pub fn new(
        ctx: Arc<CrawlContext>,
        settings: CoordinatorSettings,
        max_workers: usize,
    ) -> Result<Self, TrawlerError> {
        Ok(Self {
            ctx,
            settings,
            pool: WorkerPool::new(max_workers)?,
            phase: CrawlPhase::Running,
        })
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    /// Runs the crawl until the budget is spent or the frontier stays empty
    ///
    /// # Loop
    ///
    /// 1. Collect finished workers
    /// 2. Budget spent → drain
    /// 3. Queue alone covers the budget → halt intake
    /// 4. Dispatch the next URL, waiting for a free slot
    /// 5. Nothing to dispatch for the stuck timeout → drain, else poll again
    pub async fn run(&mut self) -> Result<CoordinatorReport, TrawlerError> {
        let frontier = Arc::clone(&self.ctx.frontier);
        let limit = self.settings.limit;
        let started = Instant::now();
        let mut last_activity = Instant::now();
        let mut outcomes = OutcomeTally::default();
        let mut dispatched = 0;

        tracing::info!(
            "Starting crawl: limit {}, {} workers, {} URLs planned",
            limit,
            self.pool.size(),
            frontier.queue_len()
        );

        let stop_reason = loop {
            outcomes.extend(self.pool.reap());

            if frontier.processed() >= limit {
                tracing::info!("Crawl limit of {} reached", limit);
                break StopReason::Budget;
            }

            if frontier.queue_len() >= limit && !frontier.is_halted() {
                tracing::debug!("Queue covers the remaining budget, halting intake");
                frontier.halt_intake();
            }

            if let Some(url) = frontier.dequeue() {
                last_activity = Instant::now();
                dispatched += 1;
                tracing::trace!("Dispatching {}", url);

                let ctx = Arc::clone(&self.ctx);
                self.pool
                    .spawn(async move { crawl_url(&ctx, url).await })
                    .await?;
                continue;
            }

            let idle = last_activity.elapsed();
            if idle >= self.settings.stuck_timeout {
                tracing::info!(
                    "Nothing to dispatch for {:.1}s, likely stuck",
                    idle.as_secs_f64()
                );
                break StopReason::Stuck;
            }

            tokio::time::sleep(self.settings.idle_poll).await;
        };

        self.phase = CrawlPhase::Draining;
        frontier.halt_intake();
        tracing::info!(
            "Draining {} in-flight workers ({})",
            self.pool.in_flight(),
            stop_reason
        );

        let drained = self.pool.drain(self.settings.settle_delay).await;
        outcomes.extend(drained.completed);
        self.phase = CrawlPhase::Stopped;

        let elapsed = started.elapsed();
        tracing::info!(
            "Crawl stopped after {:.1}s: {} dispatched, {} visited, {} aborted",
            elapsed.as_secs_f64(),
            dispatched,
            outcomes.visited,
            drained.aborted
        );

        Ok(CoordinatorReport {
            stop_reason,
            dispatched,
            outcomes,
            aborted: drained.aborted,
            elapsed,
        })
    }
}
