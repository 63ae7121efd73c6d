//! Errors that abort a batch before any write happens.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenumberError {
    /// The chosen start entry has no usable prefix or group.
    #[error("Cannot start from '{name}' (index {index}): {reason}")]
    InvalidStart {
        index: usize,
        name: String,
        reason: &'static str,
    },

    #[error("Start index {index} is out of range for {len} entries")]
    StartOutOfRange { index: usize, len: usize },

    #[error("No entry named '{0}'")]
    UnknownStart(String),

    #[error("No entries to renumber")]
    NoEntries,

    /// Another batch holds the lock for this directory.
    #[error(
        "Directory is locked by another batch: {}. Remove the lock file if no batch is running",
        .0.display()
    )]
    Locked(PathBuf),

    #[error("Invalid metadata record {}: {reason}", path.display())]
    InvalidRecord { path: PathBuf, reason: String },
}
