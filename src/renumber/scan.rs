//! Build fresh entry lists from a directory or a library.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::renumber::lock::LOCK_FILE_NAME;
use crate::renumber::parse::PrefixParser;
use crate::renumber::sidecar::{SIDECAR_DIR_EXTENSION, SIDECAR_FILE_NAME, SidecarRecord};
use crate::renumber::sink::LogSink;
use crate::renumber::types::Entry;

/// List the direct children of a directory as entries, sorted by name.
///
/// Subdirectories are included and flagged so they keep their place in the ordering.
///
/// # Errors
/// Returns an error if the path is not a directory or cannot be read.
pub fn scan_directory(path: &Path, parser: &PrefixParser) -> Result<Vec<Entry>> {
    if !path.is_dir() {
        anyhow::bail!("Not a directory: {}", path.display());
    }

    let mut entries = Vec::new();
    for dir_entry in WalkDir::new(path).min_depth(1).max_depth(1) {
        let dir_entry = dir_entry.with_context(|| format!("Failed to read directory {}", path.display()))?;
        if dir_entry.file_name() == LOCK_FILE_NAME {
            continue;
        }
        entries.push(Entry::from_file_name(
            dir_entry.file_name(),
            dir_entry.file_type().is_dir(),
            parser,
        ));
    }

    entries.sort_by(|a, b| a.original_name.cmp(&b.original_name));
    Ok(entries)
}

/// List library items: every `<id>.info` folder holding a readable `metadata.json` record.
///
/// Records that cannot be loaded are reported through the sink and left out.
/// Entries are sorted by their record name.
///
/// # Errors
/// Returns an error if the path is not a directory or cannot be read.
pub fn scan_library(path: &Path, parser: &PrefixParser, sink: &dyn LogSink) -> Result<Vec<Entry>> {
    if !path.is_dir() {
        anyhow::bail!("Not a directory: {}", path.display());
    }

    let mut entries = Vec::new();
    for dir_entry in WalkDir::new(path).min_depth(1).max_depth(1) {
        let dir_entry = dir_entry.with_context(|| format!("Failed to read directory {}", path.display()))?;
        let item_dir = dir_entry.path();
        if !dir_entry.file_type().is_dir()
            || item_dir.extension().is_none_or(|extension| extension != SIDECAR_DIR_EXTENSION)
        {
            continue;
        }
        let sidecar_path = item_dir.join(SIDECAR_FILE_NAME);
        if !sidecar_path.is_file() {
            continue;
        }

        let record = match SidecarRecord::load(&sidecar_path) {
            Ok(record) => record,
            Err(error) => {
                sink.warn(&format!("Skipping {}: {error:#}", sidecar_path.display()));
                continue;
            }
        };
        let Some(name) = record.name() else {
            sink.warn(&format!("Skipping {}: record has no name", sidecar_path.display()));
            continue;
        };

        let companion_file = record.companion_name().map(|file_name| item_dir.join(file_name));
        let companion_file = companion_file.filter(|companion| fs::symlink_metadata(companion).is_ok());
        entries.push(Entry::with_sidecar(name, parser, sidecar_path.clone(), companion_file));
    }

    entries.sort_by(|a, b| a.original_name.cmp(&b.original_name));
    Ok(entries)
}
