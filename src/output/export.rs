//! JSON export of the final URL sets
//!
//! Each set is written to its own file as a sorted JSON array of URL strings.

use crate::state::CrawlSets;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const REMAINING_FILE: &str = "remaining.json";
pub const HISTORY_FILE: &str = "history.json";
pub const INTERESTING_FILE: &str = "interesting.json";
pub const CONFIDENT_FILE: &str = "confident.json";
pub const BLOCKED_FILE: &str = "blocked.json";

/// Errors that can occur while exporting or re-loading URL sets
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;

/// Writes every set of `sets` into `dir`, creating the directory if needed
///
/// # Returns
///
/// The paths of the written files
pub fn export_sets(sets: &CrawlSets, dir: &Path) -> ExportResult<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let files = [
        (REMAINING_FILE, &sets.remaining),
        (HISTORY_FILE, &sets.visited),
        (INTERESTING_FILE, &sets.interesting),
        (CONFIDENT_FILE, &sets.confident),
        (BLOCKED_FILE, &sets.blocked),
    ];

    let mut written = Vec::with_capacity(files.len());
    for (name, urls) in files {
        let path = dir.join(name);
        write_set(&path, urls)?;
        tracing::debug!("Exported {} URLs to {}", urls.len(), path.display());
        written.push(path);
    }
    Ok(written)
}

/// Reads sets previously written by [`export_sets`]
pub fn load_exported(dir: &Path) -> ExportResult<CrawlSets> {
    Ok(CrawlSets {
        remaining: read_set(&dir.join(REMAINING_FILE))?,
        visited: read_set(&dir.join(HISTORY_FILE))?,
        interesting: read_set(&dir.join(INTERESTING_FILE))?,
        confident: read_set(&dir.join(CONFIDENT_FILE))?,
        blocked: read_set(&dir.join(BLOCKED_FILE))?,
    })
}

fn write_set(path: &Path, urls: &BTreeSet<String>) -> ExportResult<()> {
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, urls).map_err(|source| ExportError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    writer.write_all(b"\n").map_err(io_err)?;
    writer.flush().map_err(io_err)
}

fn read_set(path: &Path) -> ExportResult<BTreeSet<String>> {
    let file = File::open(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| ExportError::Json {
        path: path.to_path_buf(),
        source,
    })
}
