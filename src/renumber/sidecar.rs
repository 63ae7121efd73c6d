//! Library items described by a per-item `metadata.json` sidecar record.
//!
//! Renaming a library item is a dual write: the record's `name` field is updated
//! after saving a backup of the previous record, then the companion file is renamed to match.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::renumber::error::RenumberError;
use crate::renumber::execute::{EntryOutcome, RenameExecutor, check_alignment, path_exists};
use crate::renumber::sink::LogSink;
use crate::renumber::types::{BatchSummary, Entry, RenamePair, RenamePlan};

pub const SIDECAR_FILE_NAME: &str = "metadata.json";
pub const SIDECAR_DIR_EXTENSION: &str = "info";
pub const BACKUP_EXTENSION: &str = "bak";

/// Loosely typed sidecar record.
///
/// Only `name` is interpreted. Every other field is carried through untouched and in its original order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SidecarRecord {
    fields: Map<String, Value>,
}

impl SidecarRecord {
    /// Read a record from disk.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not a JSON object.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Self::from_slice(&bytes).map_err(|error| RenumberError::InvalidRecord {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })?)
    }

    /// Parse a record from raw JSON bytes.
    ///
    /// # Errors
    /// Returns an error if the bytes are not a JSON object.
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }

    #[must_use]
    pub fn ext(&self) -> Option<&str> {
        self.fields.get("ext").and_then(Value::as_str)
    }

    /// Replace the `name` field in place, keeping its position.
    pub fn set_name(&mut self, name: &str) {
        self.fields.insert("name".to_string(), Value::String(name.to_string()));
    }

    /// File name of the companion file: `<name>.<ext>`.
    #[must_use]
    pub fn companion_name(&self) -> Option<String> {
        match (self.name(), self.ext()) {
            (Some(name), Some(ext)) if !ext.is_empty() => Some(format!("{name}.{ext}")),
            (Some(name), _) => Some(name.to_string()),
            _ => None,
        }
    }

    #[must_use]
    pub const fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Serialize to compact UTF-8 JSON.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Path of the single backup kept next to a sidecar record.
#[must_use]
pub fn backup_path(sidecar_path: &Path) -> PathBuf {
    let mut path = sidecar_path.as_os_str().to_os_string();
    path.push(".");
    path.push(BACKUP_EXTENSION);
    PathBuf::from(path)
}

/// Renames library items through their sidecar records.
#[derive(Debug, Clone, Copy, Default)]
pub struct SidecarExecutor;

impl SidecarExecutor {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn rename_entry(entry: &Entry, pair: &RenamePair) -> EntryOutcome {
        let Some(sidecar_path) = entry.sidecar_path.as_deref() else {
            return EntryOutcome::Failed("entry has no metadata record".to_string());
        };

        let companion = entry
            .companion_file
            .as_deref()
            .map(|source| (source, companion_target(source, &pair.new_name)));

        if let Some((_, target)) = &companion
            && path_exists(target)
        {
            return EntryOutcome::Collision(crate::path_to_filename_string(target));
        }

        if let Err(error) = Self::rewrite_record(sidecar_path, &pair.new_name) {
            return EntryOutcome::Failed(format!("{error:#}"));
        }

        if let Some((source, target)) = companion
            && let Err(error) = fs::rename(source, &target)
        {
            return EntryOutcome::Failed(format!(
                "metadata updated but companion file rename failed: {error}. Previous record is in {}",
                backup_path(sidecar_path).display()
            ));
        }

        EntryOutcome::Renamed
    }

    /// Back up the current record bytes, then overwrite the record with the new name.
    fn rewrite_record(sidecar_path: &Path, new_name: &str) -> Result<()> {
        let original = fs::read(sidecar_path).with_context(|| format!("Failed to read {}", sidecar_path.display()))?;
        let mut record = SidecarRecord::from_slice(&original).map_err(|error| RenumberError::InvalidRecord {
            path: sidecar_path.to_path_buf(),
            reason: error.to_string(),
        })?;
        record.set_name(new_name);
        let json = record.to_json().context("Failed to serialize metadata record")?;

        let backup = backup_path(sidecar_path);
        fs::write(&backup, &original).with_context(|| format!("Failed to write backup {}", backup.display()))?;
        fs::write(sidecar_path, json).with_context(|| format!("Failed to write {}", sidecar_path.display()))?;
        Ok(())
    }
}

impl RenameExecutor for SidecarExecutor {
    fn execute(&self, plan: &RenamePlan, entries: &[Entry], sink: &dyn LogSink) -> Result<BatchSummary> {
        check_alignment(plan, entries)?;
        let mut summary = BatchSummary::default();
        let total = plan.rename_count();

        for (done, (index, pair)) in plan.renames().enumerate() {
            Self::rename_entry(&entries[index], pair).record(pair, &mut summary, sink);
            sink.progress(done + 1, total);
        }

        Ok(summary)
    }
}

/// Companion file path for the new name, keeping the companion's own extension.
fn companion_target(source: &Path, new_name: &str) -> PathBuf {
    let file_name = match source.extension() {
        Some(extension) => format!("{new_name}.{}", extension.to_string_lossy()),
        None => new_name.to_string(),
    };
    source.with_file_name(file_name)
}

#[cfg(test)]
mod sidecar_tests {
    use super::*;

    use std::fs::File;

    use tempfile::TempDir;

    use crate::renumber::parse::PrefixParser;
    use crate::renumber::plan::plan;
    use crate::renumber::scan::scan_library;
    use crate::renumber::sink::MemorySink;
    use crate::renumber::types::Mode;

    fn create_item(library: &Path, id: &str, json: &str, companion: Option<&str>) -> PathBuf {
        let item_dir = library.join(format!("{id}.{SIDECAR_DIR_EXTENSION}"));
        fs::create_dir_all(&item_dir).unwrap();
        fs::write(item_dir.join(SIDECAR_FILE_NAME), json).unwrap();
        if let Some(name) = companion {
            fs::write(item_dir.join(name), b"image bytes").unwrap();
        }
        item_dir
    }

    #[test]
    fn record_preserves_field_order_and_values() {
        let json = r#"{"id":"K1","name":"05foo","size":12,"tags":["a","b"],"ext":"png"}"#;
        let mut record = SidecarRecord::from_slice(json.as_bytes()).unwrap();
        assert_eq!(record.name(), Some("05foo"));
        assert_eq!(record.ext(), Some("png"));

        record.set_name("06foo");
        assert_eq!(
            record.to_json().unwrap(),
            r#"{"id":"K1","name":"06foo","size":12,"tags":["a","b"],"ext":"png"}"#
        );
    }

    #[test]
    fn record_keeps_numbers_exactly() {
        let json = r#"{"name":"05foo","ext":"png","big":123456789012345678901234567890,"ratio":0.10000000000000000555}"#;
        let mut record = SidecarRecord::from_slice(json.as_bytes()).unwrap();
        record.set_name("06foo");
        assert_eq!(
            record.to_json().unwrap(),
            r#"{"name":"06foo","ext":"png","big":123456789012345678901234567890,"ratio":0.10000000000000000555}"#
        );
    }

    #[test]
    fn record_must_be_an_object() {
        assert!(SidecarRecord::from_slice(b"[1, 2]").is_err());
        assert!(SidecarRecord::from_slice(b"nope").is_err());
    }

    #[test]
    fn companion_name_uses_ext() {
        let record = SidecarRecord::from_slice(br#"{"name":"05foo","ext":"png"}"#).unwrap();
        assert_eq!(record.companion_name().as_deref(), Some("05foo.png"));
        let record = SidecarRecord::from_slice(br#"{"name":"05foo"}"#).unwrap();
        assert_eq!(record.companion_name().as_deref(), Some("05foo"));
    }

    #[test]
    fn load_reports_invalid_record() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(SIDECAR_FILE_NAME);
        fs::write(&path, "{broken").unwrap();
        let error = SidecarRecord::load(&path).unwrap_err();
        assert!(error.downcast_ref::<RenumberError>().is_some());
    }

    #[test]
    fn dual_write_updates_record_backup_and_companion() {
        let temp_dir = TempDir::new().unwrap();
        let original_json = r#"{"name":"05foo","ext":"png"}"#;
        let item_dir = create_item(temp_dir.path(), "A1", original_json, Some("05foo.png"));

        let sink = MemorySink::new();
        let entries = scan_library(temp_dir.path(), &PrefixParser::default(), &sink).unwrap();
        let plan = plan(&entries, 0, 5, Mode::Increment, &sink).unwrap();
        assert_eq!(plan.pairs[0].new_name, "06foo");

        let summary = SidecarExecutor::new().execute(&plan, &entries, &sink).unwrap();
        assert_eq!(summary.renamed, 1);
        assert_eq!(summary.failed, 0);

        let backup = fs::read(item_dir.join("metadata.json.bak")).unwrap();
        assert_eq!(backup, original_json.as_bytes());

        let live = fs::read_to_string(item_dir.join(SIDECAR_FILE_NAME)).unwrap();
        assert_eq!(live, r#"{"name":"06foo","ext":"png"}"#);

        assert!(item_dir.join("06foo.png").exists());
        assert!(!item_dir.join("05foo.png").exists());
        assert_eq!(fs::read(item_dir.join("06foo.png")).unwrap(), b"image bytes");
    }

    #[test]
    fn record_without_companion_still_counts_as_renamed() {
        let temp_dir = TempDir::new().unwrap();
        let item_dir = create_item(temp_dir.path(), "A1", r#"{"name":"01solo","ext":"jpg"}"#, None);

        let sink = MemorySink::new();
        let entries = scan_library(temp_dir.path(), &PrefixParser::default(), &sink).unwrap();
        let plan = plan(&entries, 0, 1, Mode::Increment, &sink).unwrap();
        let summary = SidecarExecutor::new().execute(&plan, &entries, &sink).unwrap();

        assert_eq!(summary.renamed, 1);
        let record = SidecarRecord::load(&item_dir.join(SIDECAR_FILE_NAME)).unwrap();
        assert_eq!(record.name(), Some("02solo"));
    }

    #[test]
    fn existing_companion_target_is_skipped_without_writes() {
        let temp_dir = TempDir::new().unwrap();
        let original_json = r#"{"name":"03xxx","ext":"png"}"#;
        let item_dir = create_item(temp_dir.path(), "A1", original_json, Some("03xxx.png"));
        File::create(item_dir.join("04xxx.png")).unwrap();

        let sink = MemorySink::new();
        let entries = scan_library(temp_dir.path(), &PrefixParser::default(), &sink).unwrap();
        let plan = plan(&entries, 0, 3, Mode::Increment, &sink).unwrap();
        let summary = SidecarExecutor::new().execute(&plan, &entries, &sink).unwrap();

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(
            fs::read_to_string(item_dir.join(SIDECAR_FILE_NAME)).unwrap(),
            original_json
        );
        assert!(!item_dir.join("metadata.json.bak").exists());
    }

    #[test]
    fn second_rename_overwrites_previous_backup() {
        let temp_dir = TempDir::new().unwrap();
        let item_dir = create_item(temp_dir.path(), "A1", r#"{"name":"01a","ext":"png"}"#, Some("01a.png"));

        let sink = MemorySink::new();
        for start_prefix in [1, 2] {
            let entries = scan_library(temp_dir.path(), &PrefixParser::default(), &sink).unwrap();
            let plan = plan(&entries, 0, start_prefix, Mode::Increment, &sink).unwrap();
            SidecarExecutor::new().execute(&plan, &entries, &sink).unwrap();
        }

        assert_eq!(
            fs::read_to_string(item_dir.join("metadata.json.bak")).unwrap(),
            r#"{"name":"02a","ext":"png"}"#
        );
        assert!(item_dir.join("03a.png").exists());
    }

    #[test]
    fn companion_target_keeps_extension() {
        let source = Path::new("lib/A1.info/05foo.bar.png");
        assert_eq!(
            companion_target(source, "06foo.bar"),
            PathBuf::from("lib/A1.info/06foo.bar.png")
        );
        assert_eq!(
            companion_target(Path::new("lib/A1.info/05foo"), "06foo"),
            PathBuf::from("lib/A1.info/06foo")
        );
    }
}
