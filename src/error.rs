//! Error types for the converter

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for converter operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the converter
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("'{path}' is not a directory")]
    NotADirectory { path: PathBuf },

    #[error("{path} is not a valid image file")]
    InvalidImage { path: PathBuf },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Insufficient disk space for {path}: need {needed} bytes, {available} available")]
    InsufficientSpace {
        path: PathBuf,
        needed: u64,
        available: u64,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to delete {path}: {source}")]
    Delete {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Error {
    /// Whether this error aborts the whole run rather than a single item.
    ///
    /// Per-item errors are logged and counted by the run loop; only a missing
    /// or non-directory root is fatal before any file is touched.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::NotADirectory { .. })
    }
}
