//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the RecordStore trait,
//! plus run bookkeeping and the statistics queries behind `--stats`.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{RecordStore, StorageError, StorageResult};
use crate::storage::{CrawlRecord, RunRecord, RunStatus, NOT_FETCHED};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// Number of regions listed in run statistics
const TOP_REGIONS: usize = 5;

/// Aggregate numbers for one crawl run
#[derive(Debug, Clone)]
pub struct RunStats {
    pub run: RunRecord,
    pub total_records: u64,
    pub fetched: u64,
    pub not_fetched: u64,
    /// Mean response time of fetched pages, in seconds
    pub avg_response_time: Option<f64>,
    pub distinct_ips: u64,
    /// Most common regions with their record counts
    pub top_regions: Vec<(String, u64)>,
}

struct Inner {
    conn: Connection,
    run_id: Option<i64>,
}

/// SQLite storage backend
///
/// The connection is guarded by a mutex so the store can be shared between
/// worker tasks.
pub struct SqliteStorage {
    inner: Mutex<Inner>,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        // Configure SQLite for better performance
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self::from_connection(conn))
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            inner: Mutex::new(Inner { conn, run_id: None }),
        }
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| StorageError::Database("connection lock poisoned".to_string()))
    }

    // ===== Run Management =====

    /// Starts a new crawl run; subsequent records belong to it
    ///
    /// # Arguments
    ///
    /// * `config_hash` - Hash of the configuration file
    ///
    /// # Returns
    ///
    /// The ID of the newly created run
    pub fn begin_run(&self, config_hash: &str) -> StorageResult<i64> {
        let mut inner = self.lock()?;
        let now = Utc::now().to_rfc3339();
        inner.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        let run_id = inner.conn.last_insert_rowid();
        inner.run_id = Some(run_id);
        Ok(run_id)
    }

    /// Marks the current run finished with `status`
    pub fn finish_run(&self, status: RunStatus) -> StorageResult<()> {
        let inner = self.lock()?;
        let run_id = inner.run_id.ok_or(StorageError::NoActiveRun)?;
        let now = Utc::now().to_rfc3339();
        inner.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, run_id],
        )?;
        Ok(())
    }

    /// ID of the run records are currently written to
    pub fn current_run(&self) -> Option<i64> {
        self.lock().ok().and_then(|inner| inner.run_id)
    }

    /// Gets a run by ID
    pub fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let inner = self.lock()?;
        inner
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs WHERE id = ?1",
                params![run_id],
                run_from_row,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    /// Gets the most recent run
    pub fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let inner = self.lock()?;
        let run = inner
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs ORDER BY id DESC LIMIT 1",
                [],
                run_from_row,
            )
            .optional()?;
        Ok(run)
    }

    // ===== Records =====

    /// All records of a run, ordered by URL
    pub fn records_for_run(&self, run_id: i64) -> StorageResult<Vec<CrawlRecord>> {
        let inner = self.lock()?;
        let mut stmt = inner.conn.prepare(
            "SELECT url, response_time, ip_address, region FROM crawl_records
             WHERE run_id = ?1 ORDER BY url",
        )?;

        let records = stmt
            .query_map(params![run_id], |row| {
                let response_time: f64 = row.get(1)?;
                let ip: Option<String> = row.get(2)?;
                Ok(CrawlRecord {
                    url: row.get(0)?,
                    response_time_secs: (response_time >= 0.0).then_some(response_time),
                    ip: ip.and_then(|ip| ip.parse().ok()),
                    region: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    // ===== Statistics =====

    /// Gathers statistics for one run
    pub fn run_stats(&self, run_id: i64) -> StorageResult<RunStats> {
        let run = self.get_run(run_id)?;
        let inner = self.lock()?;

        let (total_records, fetched, avg_response_time, distinct_ips) = inner.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(CASE WHEN response_time >= 0 THEN 1 ELSE 0 END), 0),
                    AVG(CASE WHEN response_time >= 0 THEN response_time END),
                    COUNT(DISTINCT ip_address)
             FROM crawl_records WHERE run_id = ?1",
            params![run_id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)? as u64,
                    row.get::<_, i64>(1)? as u64,
                    row.get::<_, Option<f64>>(2)?,
                    row.get::<_, i64>(3)? as u64,
                ))
            },
        )?;

        let mut stmt = inner.conn.prepare(
            "SELECT region, COUNT(*) AS hits FROM crawl_records
             WHERE run_id = ?1 AND region IS NOT NULL
             GROUP BY region ORDER BY hits DESC, region ASC LIMIT ?2",
        )?;
        let top_regions = stmt
            .query_map(params![run_id, TOP_REGIONS as i64], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RunStats {
            run,
            total_records,
            fetched,
            not_fetched: total_records - fetched,
            avg_response_time,
            distinct_ips,
            top_regions,
        })
    }
}

impl RecordStore for SqliteStorage {
    fn record(&self, record: &CrawlRecord) -> StorageResult<()> {
        let inner = self.lock()?;
        let run_id = inner.run_id.ok_or(StorageError::NoActiveRun)?;
        let now = Utc::now().to_rfc3339();

        inner.conn.execute(
            "INSERT OR IGNORE INTO crawl_records
                (run_id, url, response_time, ip_address, region, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                run_id,
                record.url,
                record.response_time_secs.unwrap_or(NOT_FETCHED),
                record.ip.map(|ip| ip.to_string()),
                record.region,
                now
            ],
        )?;
        Ok(())
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?).unwrap_or(RunStatus::Running),
    })
}
