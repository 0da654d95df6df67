use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::errors::StorageError;

pub const HISTORY_FILE: &str = "seen_pages.txt";

/// Append-only record of every article identifier that has been shown.
///
/// One identifier per line in `seen_pages.txt`. The file is never rewritten;
/// two processes appending at the same time interleave whole lines but are
/// not otherwise coordinated.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    file_path: PathBuf,
}

impl HistoryStore {
    /// Open the store inside `dir`, creating the directory when missing.
    /// Directory creation failures are only logged; the first read or
    /// write will report the real problem.
    pub fn open(dir: &Path) -> Self {
        if !dir.exists() {
            match fs::create_dir_all(dir) {
                Ok(()) => info!(dir = %dir.display(), "Created storage directory"),
                Err(e) => warn!(dir = %dir.display(), error = %e, "Could not create storage directory"),
            }
        }

        Self {
            file_path: dir.join(HISTORY_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Read every recorded identifier. A missing file is an empty history.
    pub fn load(&self) -> Result<HashSet<String>, StorageError> {
        let content = match fs::read_to_string(&self.file_path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(history_file = %self.file_path.display(), "No history file yet");
                return Ok(HashSet::new());
            }
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.file_path.clone(),
                    source,
                });
            }
        };

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Durably record one identifier. The line is written with a single
    /// call and flushed before returning.
    pub fn append(&self, identifier: &str) -> Result<(), StorageError> {
        let write_err = |source| StorageError::Write {
            path: self.file_path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)
            .map_err(write_err)?;

        let line = format!("{}\n", identifier.trim());
        file.write_all(line.as_bytes()).map_err(write_err)?;
        file.flush().map_err(write_err)?;
        file.sync_data().map_err(write_err)?;

        debug!(identifier, history_file = %self.file_path.display(), "Recorded identifier");
        Ok(())
    }

    /// Number of distinct identifiers recorded so far.
    pub fn len(&self) -> Result<usize, StorageError> {
        self.load().map(|seen| seen.len())
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        self.len().map(|n| n == 0)
    }
}
