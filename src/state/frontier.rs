//! Shared crawl frontier
//!
//! The frontier owns every piece of mutable crawl state that workers share:
//! the pending queue, the state of every URL ever seen, the interesting set,
//! and the intake stop flag. All set and queue mutations happen under one
//! mutex, so "check then insert" sequences are atomic and a URL can be
//! dispatched to a worker at most once.

use crate::state::UrlState;
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use url::Url;

/// Point-in-time counters, cheap to copy into log lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrontierCounts {
    pub planned: usize,
    pub dispatched: usize,
    pub visited: usize,
    pub blocked: usize,
    pub abandoned: usize,
    pub interesting: usize,
}

impl FrontierCounts {
    /// URLs counted against the crawl budget
    pub fn processed(&self) -> usize {
        self.visited + self.blocked
    }
}

/// Frozen url sets, as exported at the end of a crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSets {
    /// Still planned when the crawl stopped
    pub remaining: BTreeSet<String>,
    pub visited: BTreeSet<String>,
    pub interesting: BTreeSet<String>,
    pub confident: BTreeSet<String>,
    pub blocked: BTreeSet<String>,
}

impl CrawlSets {
    /// Every URL the crawl touched: visited, blocked, or planned at stop
    pub fn touched(&self) -> BTreeSet<String> {
        self.visited
            .iter()
            .chain(&self.blocked)
            .chain(&self.remaining)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Default)]
struct FrontierInner {
    queue: VecDeque<Url>,
    states: HashMap<Url, UrlState>,
    interesting: HashSet<Url>,
    counts: FrontierCounts,
}

impl FrontierInner {
    fn unplan(&mut self, url: &Url) {
        self.queue.retain(|queued| queued != url);
        self.counts.planned = self.queue.len();
    }

    /// Moves a URL into a terminal processed state; false if it already settled
    fn settle(&mut self, url: &Url, target: UrlState) -> bool {
        debug_assert!(target.is_terminal());
        match self.states.get(url).copied() {
            Some(state) if state.is_terminal() => return false,
            Some(UrlState::Planned) => self.unplan(url),
            Some(_) => self.counts.dispatched -= 1,
            None => {}
        }

        self.states.insert(url.clone(), target);
        match target {
            UrlState::Visited => self.counts.visited += 1,
            UrlState::Blocked => self.counts.blocked += 1,
            UrlState::Abandoned => self.counts.abandoned += 1,
            UrlState::Planned | UrlState::Dispatched => {}
        }
        true
    }

    fn collect(&self, wanted: UrlState) -> BTreeSet<String> {
        self.states
            .iter()
            .filter(|(_, state)| **state == wanted)
            .map(|(url, _)| url.to_string())
            .collect()
    }
}

/// Thread-safe frontier shared by the coordinator, workers and monitor
#[derive(Debug, Default)]
pub struct Frontier {
    inner: Mutex<FrontierInner>,
    intake_halted: AtomicBool,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a frontier pre-loaded with seed URLs, in order
    pub fn with_seeds<I>(seeds: I) -> Self
    where
        I: IntoIterator<Item = Url>,
    {
        let frontier = Self::new();
        for seed in seeds {
            frontier.enqueue(seed);
        }
        frontier
    }

    fn lock(&self) -> MutexGuard<'_, FrontierInner> {
        // State is only mutated through short, non-panicking critical sections,
        // so a poisoned lock still guards consistent data.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Plans a URL for crawling
    ///
    /// No-op when the URL was ever planned, dispatched or settled before, or
    /// when intake has been halted.
    ///
    /// # Returns
    ///
    /// `true` if the URL was newly planned
    pub fn enqueue(&self, url: Url) -> bool {
        if self.is_halted() {
            return false;
        }

        let mut inner = self.lock();
        if inner.states.contains_key(&url) {
            return false;
        }

        inner.states.insert(url.clone(), UrlState::Planned);
        inner.queue.push_back(url);
        inner.counts.planned = inner.queue.len();
        true
    }

    /// Pops the next pending URL without waiting
    pub fn dequeue(&self) -> Option<Url> {
        let mut inner = self.lock();
        let url = inner.queue.pop_front()?;
        inner.counts.planned = inner.queue.len();
        inner.states.insert(url.clone(), UrlState::Dispatched);
        inner.counts.dispatched += 1;
        Some(url)
    }

    /// Records a completed fetch
    ///
    /// # Returns
    ///
    /// `true` if this call is the one that settled the URL as visited;
    /// `false` if the URL was already visited, blocked or abandoned
    pub fn mark_visited(&self, url: &Url, interesting: bool) -> bool {
        let mut inner = self.lock();
        if !inner.settle(url, UrlState::Visited) {
            return false;
        }
        if interesting {
            inner.interesting.insert(url.clone());
            inner.counts.interesting = inner.interesting.len();
        }
        true
    }

    /// Records a URL excluded by politeness rules or the ignore-list
    pub fn mark_blocked(&self, url: &Url) -> bool {
        self.lock().settle(url, UrlState::Blocked)
    }

    /// Records a dispatched URL whose fetch failed
    pub fn record_abandoned(&self, url: &Url) -> bool {
        let mut inner = self.lock();
        if inner.states.get(url) != Some(&UrlState::Dispatched) {
            return false;
        }
        inner.settle(url, UrlState::Abandoned)
    }

    /// Stops all further `enqueue` calls; one-way
    pub fn halt_intake(&self) {
        self.intake_halted.store(true, Ordering::SeqCst);
    }

    pub fn is_halted(&self) -> bool {
        self.intake_halted.load(Ordering::SeqCst)
    }

    pub fn state_of(&self, url: &Url) -> Option<UrlState> {
        self.lock().states.get(url).copied()
    }

    pub fn is_interesting(&self, url: &Url) -> bool {
        self.lock().interesting.contains(url)
    }

    /// Number of URLs waiting in the queue
    pub fn queue_len(&self) -> usize {
        self.lock().counts.planned
    }

    pub fn is_empty(&self) -> bool {
        self.queue_len() == 0
    }

    /// Visited plus blocked
    pub fn processed(&self) -> usize {
        self.lock().counts.processed()
    }

    pub fn counts(&self) -> FrontierCounts {
        self.lock().counts
    }

    /// Interesting URLs in sorted order
    pub fn interesting_urls(&self) -> Vec<Url> {
        let mut urls: Vec<Url> = self.lock().interesting.iter().cloned().collect();
        urls.sort();
        urls
    }

    /// URLs still waiting in the queue, in queue order
    pub fn planned_urls(&self) -> Vec<Url> {
        self.lock().queue.iter().cloned().collect()
    }

    /// Copies the current sets out for export
    ///
    /// The confident set is left empty; it is produced by the classifier.
    pub fn snapshot(&self) -> CrawlSets {
        let inner = self.lock();
        CrawlSets {
            remaining: inner.collect(UrlState::Planned),
            visited: inner.collect(UrlState::Visited),
            interesting: inner.interesting.iter().map(Url::to_string).collect(),
            confident: BTreeSet::new(),
            blocked: inner.collect(UrlState::Blocked),
        }
    }
}
