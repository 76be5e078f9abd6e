//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with DNS and region metadata
//! - HTML parsing and link extraction
//! - The bounded worker pool and the dispatch loop
//! - Progress reporting and post-crawl bookkeeping

mod coordinator;
mod fetcher;
mod monitor;
mod parser;
mod scheduler;
mod worker;

pub use coordinator::{
    Coordinator, CoordinatorReport, CoordinatorSettings, CrawlPhase, OutcomeTally, StopReason,
};
pub use fetcher::{build_http_client, resolve_ip, FetchError, FetchedPage, Fetcher};
pub use monitor::ProgressMonitor;
pub use parser::{extract_links, ParseError};
pub use scheduler::{DrainReport, WorkerPool};
pub use worker::{crawl_url, CrawlContext, WorkerOutcome};

use crate::classify::{
    Classifier, ContentExtractor, FrequencySummarizer, HtmlContentExtractor, Summarizer,
};
use crate::config::{Config, GeoProvider};
use crate::geo::{GeoResolver, Geolocator, IpApiGeolocator, NoopGeolocator};
use crate::robots::PolitenessGate;
use crate::state::{CrawlSets, Frontier, FrontierCounts};
use crate::storage::{open_storage, CrawlRecord, RecordStore, RunStatus};
use crate::url::normalize_url;
use crate::{ConfigError, TrawlerError};
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Pluggable collaborators of a crawl
pub struct CrawlServices {
    pub geolocator: Arc<dyn Geolocator>,
    pub store: Arc<dyn RecordStore>,
    pub extractor: Arc<dyn ContentExtractor>,
    pub summarizer: Arc<dyn Summarizer>,
}

impl CrawlServices {
    /// Default collaborators: the configured geolocator, HTML extraction and
    /// frequency summaries, recording into `store`
    pub fn from_config(
        config: &Config,
        client: &Client,
        store: Arc<dyn RecordStore>,
    ) -> Result<Self, TrawlerError> {
        let geolocator: Arc<dyn Geolocator> = match config.geolocation.provider {
            GeoProvider::None => Arc::new(NoopGeolocator),
            GeoProvider::IpApi => Arc::new(
                IpApiGeolocator::new(client.clone(), &config.geolocation.endpoint)
                    .map_err(|e| ConfigError::InvalidUrl(e.to_string()))?,
            ),
        };

        Ok(Self {
            geolocator,
            store,
            extractor: Arc::new(HtmlContentExtractor::new(client.clone())),
            summarizer: Arc::new(FrequencySummarizer::default()),
        })
    }
}

/// Final state of a finished crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Exportable URL sets, including the confident set
    pub sets: CrawlSets,
    pub counts: FrontierCounts,
    pub stop_reason: StopReason,
    pub outcomes: OutcomeTally,
    /// Planned URLs recorded as not fetched
    pub recorded_remaining: usize,
    pub elapsed: Duration,
}

impl CrawlReport {
    /// Fetches that failed and were never retried
    pub fn abandoned(&self) -> usize {
        self.counts.abandoned
    }
}

/// Runs a complete crawl with the given collaborators
///
/// # Phases
///
/// 1. Seed the frontier
/// 2. Dispatch workers until the budget is spent or the crawl is stuck
/// 3. Record every still-planned URL as not fetched
/// 4. Confirm interesting URLs against their summarized content
pub async fn run_crawl_with(
    config: &Config,
    client: Client,
    services: CrawlServices,
) -> Result<CrawlReport, TrawlerError> {
    let max_len = config.crawler.max_url_length;
    let seeds = config
        .seeds
        .urls
        .iter()
        .map(|seed| normalize_url(seed, max_len))
        .collect::<Result<Vec<_>, _>>()?;

    let frontier = Arc::new(Frontier::with_seeds(seeds));
    let geo = Arc::new(GeoResolver::new(
        services.geolocator,
        config.geolocation.cache_size,
    ));
    let ctx = Arc::new(CrawlContext {
        frontier: Arc::clone(&frontier),
        gate: Arc::new(PolitenessGate::new(
            client.clone(),
            config.user_agent.crawler_name.as_str(),
            &config.filters.ignore,
        )),
        fetcher: Arc::new(Fetcher::new(client, geo)),
        store: services.store,
        keywords: config.filters.keywords.clone(),
        pacing_delay: config.crawler.pacing_delay(),
        max_url_length: max_len,
    });

    let mut coordinator = Coordinator::new(
        Arc::clone(&ctx),
        CoordinatorSettings::from(&config.crawler),
        config.crawler.max_workers,
    )?;
    let monitor = ProgressMonitor::new(Arc::clone(&frontier), config.crawler.limit)
        .spawn(config.crawler.progress_interval());

    let result = coordinator.run().await;
    monitor.abort();
    let report = result?;

    let recorded_remaining = record_remaining(&ctx, config.crawler.max_workers).await;

    let mut sets = frontier.snapshot();
    let classifier = Classifier::new(
        services.extractor,
        services.summarizer,
        config.filters.keywords.clone(),
        config.crawler.classifier_workers,
    );
    sets.confident = classifier.confident(frontier.interesting_urls()).await;

    Ok(CrawlReport {
        sets,
        counts: frontier.counts(),
        stop_reason: report.stop_reason,
        outcomes: report.outcomes,
        recorded_remaining,
        elapsed: report.elapsed,
    })
}

/// Writes a not-fetched record for every URL still in the queue
///
/// IP and region are resolved best-effort; storage failures are logged.
async fn record_remaining(ctx: &CrawlContext, concurrency: usize) -> usize {
    let planned = ctx.frontier.planned_urls();
    tracing::info!("Recording {} URLs that were never fetched", planned.len());

    stream::iter(planned)
        .map(|url| async move {
            let (ip, region) = ctx.fetcher.locate(&url).await;
            let record = CrawlRecord::not_fetched(url.as_str(), ip, region);
            match ctx.store.record(&record) {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("Failed to record {}: {}", url, e);
                    false
                }
            }
        })
        .buffer_unordered(concurrency.max(1))
        .filter(|recorded| futures::future::ready(*recorded))
        .count()
        .await
}

/// Runs a crawl against the configured SQLite database
///
/// The run is marked completed or failed in the database depending on the
/// outcome.
///
/// # Example
///
/// ```no_run
/// use trawler::config::load_config_with_hash;
/// use trawler::crawler::run_crawl;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("trawler.toml"))?;
/// let report = run_crawl(&config, &hash).await?;
/// println!("{} pages visited", report.sets.visited.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: &Config, config_hash: &str) -> Result<CrawlReport, TrawlerError> {
    let storage = Arc::new(open_storage(Path::new(&config.output.database_path))?);
    let run_id = storage.begin_run(config_hash)?;
    tracing::info!("Starting crawl run {}", run_id);

    let client = build_http_client(config)?;
    let services = CrawlServices::from_config(config, &client, storage.clone())?;

    let result = run_crawl_with(config, client, services).await;
    match &result {
        Ok(_) => storage.finish_run(RunStatus::Completed)?,
        Err(e) => {
            tracing::error!("Crawl run {} failed: {}", run_id, e);
            if let Err(finish_err) = storage.finish_run(RunStatus::Failed) {
                tracing::warn!("Failed to mark run {} as failed: {}", run_id, finish_err);
            }
        }
    }
    result
}
