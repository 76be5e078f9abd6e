//! Crawl summaries and database statistics
//!
//! This module turns the final URL sets into the end-of-crawl report and
//! formats per-run statistics from the storage layer for `--stats`.

use crate::state::CrawlSets;
use crate::storage::RunStats;
use crate::url::extract_domain;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;
use url::Url;

/// End-of-crawl report
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CrawlSummary {
    pub visited: usize,
    pub interesting: usize,
    pub blocked: usize,
    pub remaining: usize,
    pub confident: usize,
    pub abandoned: usize,
    /// Domain with the most interesting URLs, and their count
    pub top_hit_domain: Option<(String, usize)>,
}

impl CrawlSummary {
    pub fn from_sets(sets: &CrawlSets, abandoned: usize) -> Self {
        Self {
            visited: sets.visited.len(),
            interesting: sets.interesting.len(),
            blocked: sets.blocked.len(),
            remaining: sets.remaining.len(),
            confident: sets.confident.len(),
            abandoned,
            top_hit_domain: top_domain(&sets.interesting),
        }
    }

    /// Visited plus blocked
    pub fn total_processed(&self) -> usize {
        self.visited + self.blocked
    }

    /// Share of visited pages whose URL matched a keyword
    pub fn interesting_ratio(&self) -> f64 {
        if self.visited == 0 {
            0.0
        } else {
            self.interesting as f64 / self.visited as f64
        }
    }
}

/// Most frequent domain among `urls`; alphabetical order breaks ties
fn top_domain(urls: &BTreeSet<String>) -> Option<(String, usize)> {
    let mut hits: BTreeMap<String, usize> = BTreeMap::new();
    for url in urls {
        if let Some(domain) = Url::parse(url).ok().as_ref().and_then(extract_domain) {
            *hits.entry(domain).or_insert(0) += 1;
        }
    }

    hits.into_iter()
        .fold(None, |best: Option<(String, usize)>, (domain, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((domain, count)),
        })
}

/// Formats the end-of-crawl report
pub fn format_summary(summary: &CrawlSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Crawl Summary ===\n");
    let _ = writeln!(out, "Visited: {}", summary.visited);
    let _ = writeln!(out, "Interesting: {}", summary.interesting);
    let _ = writeln!(
        out,
        "Interesting ratio: {:.2}%",
        summary.interesting_ratio() * 100.0
    );
    match &summary.top_hit_domain {
        Some((domain, count)) => {
            let _ = writeln!(out, "Top hit domain: {} ({} interesting)", domain, count);
        }
        None => {
            let _ = writeln!(out, "Top hit domain: none");
        }
    }
    let _ = writeln!(out, "Blocked: {}", summary.blocked);
    let _ = writeln!(out, "Total processed: {}", summary.total_processed());
    let _ = writeln!(out, "Remaining: {}", summary.remaining);
    let _ = writeln!(out, "Confident: {}", summary.confident);
    let _ = writeln!(out, "Abandoned: {}", summary.abandoned);
    out
}

/// Prints the end-of-crawl report to stdout
pub fn print_summary(summary: &CrawlSummary) {
    print!("{}", format_summary(summary));
}

/// Formats statistics of one stored run
pub fn format_run_stats(stats: &RunStats) -> String {
    let run = &stats.run;
    let mut out = String::new();
    let _ = writeln!(out, "=== Crawl Statistics ===\n");

    let _ = writeln!(out, "Run {} ({})", run.id, run.status.to_db_string());
    let _ = writeln!(out, "  Started: {}", run.started_at);
    if let Some(finished) = &run.finished_at {
        let _ = writeln!(out, "  Finished: {}", finished);
    }
    if let Some(seconds) = run_duration_seconds(&run.started_at, run.finished_at.as_deref()) {
        let _ = writeln!(out, "  Duration: {}s", seconds);
    }
    let _ = writeln!(out, "  Config hash: {}", run.config_hash);
    let _ = writeln!(out);

    let _ = writeln!(out, "Records:");
    let _ = writeln!(out, "  Total: {}", stats.total_records);
    let _ = writeln!(out, "  Fetched: {}", stats.fetched);
    let _ = writeln!(out, "  Discovered, not fetched: {}", stats.not_fetched);
    match stats.avg_response_time {
        Some(avg) => {
            let _ = writeln!(out, "  Average response time: {:.3}s", avg);
        }
        None => {
            let _ = writeln!(out, "  Average response time: n/a");
        }
    }
    let _ = writeln!(out, "  Distinct IPs: {}", stats.distinct_ips);

    if !stats.top_regions.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "Top Regions:");
        for (region, count) in &stats.top_regions {
            let _ = writeln!(out, "  {}: {}", region, count);
        }
    }
    out
}

/// Prints statistics of one stored run to stdout
pub fn print_run_stats(stats: &RunStats) {
    print!("{}", format_run_stats(stats));
}

fn run_duration_seconds(started: &str, finished: Option<&str>) -> Option<i64> {
    let started = started.parse::<chrono::DateTime<chrono::Utc>>().ok()?;
    let finished = finished?.parse::<chrono::DateTime<chrono::Utc>>().ok()?;
    Some((finished - started).num_seconds())
}
