//! Apply a rename plan to the file system.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::renumber::sink::LogSink;
use crate::renumber::types::{BatchSummary, Entry, RenamePair, RenamePlan};

/// Applies a plan. One call per batch, no rollback of partial work.
pub trait RenameExecutor {
    /// Perform every non-identity rename of the plan in order.
    ///
    /// # Errors
    /// Returns an error only if the plan does not line up with the entries.
    /// Per-entry failures are logged and counted instead.
    fn execute(&self, plan: &RenamePlan, entries: &[Entry], sink: &dyn LogSink) -> Result<BatchSummary>;
}

/// Outcome of a single entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EntryOutcome {
    Renamed,
    Collision(String),
    Failed(String),
}

impl EntryOutcome {
    /// Log the outcome and add it to the summary.
    pub(crate) fn record(self, pair: &RenamePair, summary: &mut BatchSummary, sink: &dyn LogSink) {
        match self {
            Self::Renamed => {
                sink.emit(&format!("Renamed: {} -> {}", pair.original_name, pair.new_name));
                summary.renamed += 1;
            }
            Self::Collision(target) => {
                sink.warn(&format!("Skipping {} (target {target} already exists)", pair.original_name));
                summary.skipped += 1;
            }
            Self::Failed(message) => {
                sink.error(&format!("Failed to rename {}: {message}", pair.original_name));
                summary.failed += 1;
            }
        }
    }
}

/// Renames files in place inside one directory.
#[derive(Debug, Clone)]
pub struct FsExecutor {
    root: PathBuf,
}

impl FsExecutor {
    #[must_use]
    pub const fn new(root: PathBuf) -> Self {
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn rename_entry(&self, entry: &Entry, pair: &RenamePair) -> EntryOutcome {
        let source = self.root.join(&entry.file_name);
        let target = self.root.join(&pair.new_name);
        if path_exists(&target) {
            return EntryOutcome::Collision(pair.new_name.clone());
        }
        match fs::rename(&source, &target) {
            Ok(()) => EntryOutcome::Renamed,
            Err(error) => EntryOutcome::Failed(error.to_string()),
        }
    }
}

impl RenameExecutor for FsExecutor {
    fn execute(&self, plan: &RenamePlan, entries: &[Entry], sink: &dyn LogSink) -> Result<BatchSummary> {
        check_alignment(plan, entries)?;
        let mut summary = BatchSummary::default();
        let total = plan.rename_count();

        for (done, (index, pair)) in plan.renames().enumerate() {
            self.rename_entry(&entries[index], pair).record(pair, &mut summary, sink);
            sink.progress(done + 1, total);
        }

        Ok(summary)
    }
}

/// True if anything exists at the path, including a broken symlink.
pub(crate) fn path_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

pub(crate) fn check_alignment(plan: &RenamePlan, entries: &[Entry]) -> Result<()> {
    if plan.len() != entries.len() {
        anyhow::bail!(
            "Rename plan has {} pairs but there are {} entries",
            plan.len(),
            entries.len()
        );
    }
    if let Some((index, pair)) = plan
        .pairs
        .iter()
        .zip(entries)
        .enumerate()
        .find_map(|(index, (pair, entry))| (pair.original_name != entry.original_name).then_some((index, pair)))
    {
        anyhow::bail!(
            "Rename plan does not match entries at index {index}: '{}'",
            pair.original_name
        );
    }
    Ok(())
}
