//! Single-writer lock for a directory being renumbered.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::renumber::error::RenumberError;

pub const LOCK_FILE_NAME: &str = ".group-renumber.lock";

/// Held for the duration of one batch. Removes the lock file when dropped.
#[derive(Debug)]
pub struct DirectoryLock {
    path: PathBuf,
}

impl DirectoryLock {
    /// Create the lock file in `dir`.
    ///
    /// # Errors
    /// Returns [`RenumberError::Locked`] if another batch holds the lock,
    /// or an I/O error if the lock file cannot be created.
    pub fn acquire(dir: &Path) -> Result<Self> {
        let path = dir.join(LOCK_FILE_NAME);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                let lock = Self { path };
                writeln!(file, "{}", std::process::id())
                    .with_context(|| format!("Failed to write lock file {}", lock.path.display()))?;
                Ok(lock)
            }
            Err(error) if error.kind() == ErrorKind::AlreadyExists => Err(RenumberError::Locked(path).into()),
            Err(error) => Err(error).with_context(|| format!("Failed to create lock file {}", path.display())),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for DirectoryLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod lock_tests {
    use super::*;

    #[test]
    fn lock_file_holds_process_id() {
        let dir = tempfile::tempdir().unwrap();
        let lock = DirectoryLock::acquire(dir.path()).unwrap();
        let content = fs::read_to_string(lock.path()).unwrap();
        assert_eq!(content.trim(), std::process::id().to_string());
    }

    #[test]
    fn second_lock_fails_until_first_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let lock = DirectoryLock::acquire(dir.path()).unwrap();
        assert!(lock.path().exists());

        let error = DirectoryLock::acquire(dir.path()).unwrap_err();
        assert!(matches!(
            error.downcast_ref::<RenumberError>(),
            Some(RenumberError::Locked(_))
        ));

        assert!(error.to_string().contains(&lock.path().display().to_string()));
        assert!(error.to_string().contains("Remove the lock file if no batch is running"));

        drop(lock);
        assert!(!dir.path().join(LOCK_FILE_NAME).exists());
        assert!(DirectoryLock::acquire(dir.path()).is_ok());
    }
}
