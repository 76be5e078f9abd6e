//! Output module for crawl results
//!
//! This module handles:
//! - Exporting the final URL sets as JSON files
//! - The end-of-crawl summary report
//! - Per-run statistics read back from the database

mod export;
pub mod stats;

pub use export::{
    export_sets, load_exported, ExportError, ExportResult, BLOCKED_FILE, CONFIDENT_FILE,
    HISTORY_FILE, INTERESTING_FILE, REMAINING_FILE,
};
pub use stats::{format_run_stats, format_summary, print_run_stats, print_summary, CrawlSummary};
