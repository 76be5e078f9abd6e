//! Single-URL crawl task
//!
//! A worker takes one dequeued URL through the whole pipeline: ignore-list,
//! robots.txt, pacing, fetch, record, and link discovery. Every failure is
//! absorbed here; nothing a single URL does can stop the crawl.

use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser::extract_links;
use crate::robots::PolitenessGate;
use crate::state::Frontier;
use crate::storage::{CrawlRecord, RecordStore};
use crate::url::{first_substring_match, normalize_parsed};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Everything a worker needs, shared by all workers of a crawl
pub struct CrawlContext {
    pub frontier: Arc<Frontier>,
    pub gate: Arc<PolitenessGate>,
    pub fetcher: Arc<Fetcher>,
    pub store: Arc<dyn RecordStore>,
    /// Lowercase keywords marking a URL as interesting
    pub keywords: Vec<String>,
    /// Sleep before each fetch
    pub pacing_delay: Duration,
    pub max_url_length: usize,
}

/// What happened to a dispatched URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerOutcome {
    /// Matched the ignore-list; recorded as blocked
    Ignored,
    /// Refused by robots.txt; recorded as blocked
    Disallowed,
    /// Fetch failed; neither visited nor retried
    Abandoned,
    /// Another worker settled the URL first
    Duplicate,
    /// Fetched and recorded
    Visited {
        /// Links found on the page
        discovered: usize,
        /// Links that were new to the frontier
        enqueued: usize,
    },
}

/// Crawls one URL
///
/// # Steps
///
/// 1. Ignore-list match → blocked
/// 2. robots.txt refusal → blocked (recorded by the gate)
/// 3. Pacing sleep
/// 4. Fetch; failure → abandoned
/// 5. Mark visited, flagging keyword matches as interesting
/// 6. Persist the crawl record; a storage failure is logged and ignored
/// 7. Enqueue every link on the page, plus the target of a redirect
///
/// A redirect target is never fetched here. It is enqueued like any other
/// link and meets the ignore-list and robots.txt when it is dispatched.
pub async fn crawl_url(ctx: &CrawlContext, url: Url) -> WorkerOutcome {
    if ctx.gate.is_ignored(&url) {
        tracing::debug!("Ignoring {}: matches ignore-list", url);
        ctx.frontier.mark_blocked(&url);
        return WorkerOutcome::Ignored;
    }

    if !ctx.gate.allowed(&url, &ctx.frontier).await {
        return WorkerOutcome::Disallowed;
    }

    if !ctx.pacing_delay.is_zero() {
        tokio::time::sleep(ctx.pacing_delay).await;
    }

    let page = match ctx.fetcher.fetch(&url).await {
        Ok(page) => page,
        Err(e) => {
            tracing::debug!("Abandoning {}: {}", url, e);
            ctx.frontier.record_abandoned(&url);
            return WorkerOutcome::Abandoned;
        }
    };

    let keyword = first_substring_match(url.as_str(), &ctx.keywords);
    if !ctx.frontier.mark_visited(&url, keyword.is_some()) {
        return WorkerOutcome::Duplicate;
    }
    if let Some(keyword) = keyword {
        tracing::debug!("Interesting URL {} (keyword '{}')", url, keyword);
    }

    let record = CrawlRecord::fetched(url.as_str(), page.elapsed_secs, page.ip, page.region.clone());
    if let Err(e) = ctx.store.record(&record) {
        tracing::warn!("Failed to record {}: {}", url, e);
    }

    let mut discovered = 0;
    let mut enqueued = 0;
    let target = page.redirect.and_then(|target| {
        normalize_parsed(target, ctx.max_url_length)
            .map_err(|e| tracing::debug!("Dropping redirect from {}: {}", url, e))
            .ok()
    });
    if let Some(target) = &target {
        tracing::debug!("{} redirects to {}", url, target);
    }

    let links = extract_links(&page.url, &page.content, ctx.max_url_length);
    for link in links.chain(target) {
        discovered += 1;
        if ctx.frontier.enqueue(link) {
            enqueued += 1;
        }
    }

    tracing::trace!(
        "Visited {} (status {}): {} links, {} new",
        url,
        page.status_code,
        discovered,
        enqueued
    );

    WorkerOutcome::Visited {
        discovered,
        enqueued,
    }
}
