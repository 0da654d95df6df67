use std::path::PathBuf;

use thiserror::Error;

/// Failure to produce a single candidate. Always recoverable by retrying.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("could not parse response from {url}: {reason}")]
    Parse { url: String, reason: String },
    #[error("response from {0} contained no pages")]
    Empty(String),
    #[error("unresolved: {0} is not an article page")]
    Unresolved(String),
}

/// Failure reading or writing a persisted file.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
