//! Storage traits and error types
//!
//! This module defines the append-only record sink the crawler writes to and
//! the associated error types.

use crate::storage::CrawlRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("No crawl run has been started on this storage")]
    NoActiveRun,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Append-only sink for crawl records
///
/// Implementations are shared by all workers and must serialize concurrent
/// writes themselves. Recording the same URL twice in one run keeps the
/// first record.
pub trait RecordStore: Send + Sync {
    /// Persists one record for the current run
    fn record(&self, record: &CrawlRecord) -> StorageResult<()>;
}
