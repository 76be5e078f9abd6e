//! Storage module for persisting crawl data
//!
//! This module handles all database operations for the crawler, including:
//! - SQLite database initialization and schema management
//! - Run tracking (start, finish, configuration hash)
//! - Per-URL crawl records with network metadata
//! - Statistics for the `--stats` report

mod schema;
mod sqlite;
mod traits;

pub use sqlite::{RunStats, SqliteStorage};
pub use traits::{RecordStore, StorageError, StorageResult};

use std::net::IpAddr;
use std::path::Path;

/// Response time stored for URLs that were discovered but never fetched
pub const NOT_FETCHED: f64 = -1.0;

/// Initializes or opens a storage database
///
/// # Arguments
///
/// * `path` - Path to the SQLite database file
///
/// # Returns
///
/// * `Ok(SqliteStorage)` - Successfully initialized storage
/// * `Err(StorageError)` - Failed to initialize storage
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// Network metadata recorded for one URL
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlRecord {
    pub url: String,
    /// Seconds until the response arrived; `None` when the URL was never fetched
    pub response_time_secs: Option<f64>,
    pub ip: Option<IpAddr>,
    pub region: Option<String>,
}

impl CrawlRecord {
    /// Record of a page that was fetched
    pub fn fetched(
        url: impl Into<String>,
        response_time_secs: f64,
        ip: Option<IpAddr>,
        region: Option<String>,
    ) -> Self {
        Self {
            url: url.into(),
            response_time_secs: Some(response_time_secs),
            ip,
            region,
        }
    }

    /// Record of a URL still planned when the crawl stopped
    pub fn not_fetched(url: impl Into<String>, ip: Option<IpAddr>, region: Option<String>) -> Self {
        Self {
            url: url.into(),
            response_time_secs: None,
            ip,
            region,
        }
    }

    /// Response time as stored: seconds, or [`NOT_FETCHED`]
    pub fn stored_response_time(&self) -> f64 {
        self.response_time_secs.unwrap_or(NOT_FETCHED)
    }

    pub fn was_fetched(&self) -> bool {
        self.response_time_secs.is_some()
    }
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_status_roundtrip() {
        for status in &[RunStatus::Running, RunStatus::Completed, RunStatus::Failed] {
            let db_str = status.to_db_string();
            assert_eq!(Some(*status), RunStatus::from_db_string(db_str));
        }
    }

    #[test]
    fn test_run_status_invalid() {
        assert_eq!(RunStatus::from_db_string("invalid"), None);
    }

    #[test]
    fn test_not_fetched_sentinel() {
        let record = CrawlRecord::not_fetched("http://a.test/", None, None);
        assert!(!record.was_fetched());
        assert_eq!(record.stored_response_time(), NOT_FETCHED);

        let fetched = CrawlRecord::fetched("http://a.test/", 0.25, None, None);
        assert_eq!(fetched.stored_response_time(), 0.25);
    }
}
