use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use jiff::Zoned;
use jiff::civil::Date;
use tracing::warn;

use super::errors::StorageError;
use super::fetch_loop::{LoopEvent, ProgressReporter};
use crate::utils::datetime::{date_prefix, log_timestamp};

pub const ACTIVITY_FILE: &str = "activity_log.txt";

/// Marker that identifies a successful run in the activity log.
pub const SUCCESS_MARKER: &str = "SUCCESS:";

/// `[YYYY-MM-DD HH:MM:SS] message`
pub fn format_line(now: &Zoned, message: &str) -> String {
    format!("[{}] {}", log_timestamp(now), message)
}

/// Human readable audit trail of every run, kept next to the history file.
///
/// Writes never fail the caller: a log line that cannot be written is
/// reported through `tracing` and dropped.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    file_path: PathBuf,
}

impl ActivityLog {
    pub fn open(dir: &Path) -> Self {
        if !dir.exists()
            && let Err(e) = fs::create_dir_all(dir)
        {
            warn!(dir = %dir.display(), error = %e, "Could not create activity log directory");
        }

        Self {
            file_path: dir.join(ACTIVITY_FILE),
        }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Append `message` stamped with the current local time.
    pub fn append(&self, message: &str) {
        let line = format_line(&Zoned::now(), message);
        if let Err(e) = self.write_line(&line) {
            warn!(error = %e, "Dropped activity log line");
        }
    }

    fn write_line(&self, line: &str) -> Result<(), StorageError> {
        let write_err = |source| StorageError::Write {
            path: self.file_path.clone(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)
            .map_err(write_err)?;
        file.write_all(format!("{}\n", line).as_bytes())
            .map_err(write_err)?;
        file.flush().map_err(write_err)
    }

    fn read_lines(&self) -> Result<Vec<String>, StorageError> {
        match fs::read_to_string(&self.file_path) {
            Ok(content) => Ok(content.lines().map(str::to_string).collect()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(source) => Err(StorageError::Read {
                path: self.file_path.clone(),
                source,
            }),
        }
    }

    /// Last `n` lines, oldest first.
    pub fn tail(&self, n: usize) -> Vec<String> {
        match self.read_lines() {
            Ok(lines) => {
                let start = lines.len().saturating_sub(n);
                lines[start..].to_vec()
            }
            Err(e) => {
                warn!(error = %e, "Could not read activity log");
                Vec::new()
            }
        }
    }

    /// Successful runs logged on `date`.
    pub fn count_successes_on(&self, date: Date) -> usize {
        let prefix = format!("[{}", date_prefix(date));
        match self.read_lines() {
            Ok(lines) => lines
                .iter()
                .filter(|line| line.starts_with(&prefix) && line.contains(SUCCESS_MARKER))
                .count(),
            Err(e) => {
                warn!(error = %e, "Could not read activity log");
                0
            }
        }
    }
}

impl ProgressReporter for ActivityLog {
    fn report(&mut self, event: &LoopEvent) {
        self.append(&event.message());
    }
}
