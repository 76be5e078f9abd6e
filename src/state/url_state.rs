//! Lifecycle state of a URL inside the frontier
use std::fmt;

/// Represents where a URL is in the crawl
///
/// ```text
/// Planned --dequeue--> Dispatched --+--> Visited
///                                   +--> Blocked
///                                   +--> Abandoned
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UrlState {
    // ===== Active States =====
    /// Enqueued and waiting in the pending queue
    Planned,

    /// Handed to a worker, outcome not known yet
    Dispatched,

    // ===== Terminal States =====
    /// Fetch completed
    Visited,

    /// Excluded by robots.txt or the ignore-list
    Blocked,

    /// Fetch failed; never retried
    Abandoned,
}

impl UrlState {
    /// Returns true if the URL will not be processed again
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Planned | Self::Dispatched)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::Dispatched => "dispatched",
            Self::Visited => "visited",
            Self::Blocked => "blocked",
            Self::Abandoned => "abandoned",
        }
    }
}

impl fmt::Display for UrlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
