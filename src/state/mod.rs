//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `UrlState`: lifecycle of a single URL (planned, dispatched, visited, ...)
//! - `Frontier`: the shared pending queue plus the visited/blocked/planned sets
//! - `CrawlSets`: a frozen, exportable copy of the frontier's sets

mod frontier;
mod url_state;

pub use frontier::{CrawlSets, Frontier, FrontierCounts};
pub use url_state::UrlState;
