//! Export library folders to numbered output folders.
//!
//! Each selected folder becomes `<output>/<prefix>_<name>` and its files are copied in as `001.ext`, `002.ext`, ...

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::renumber::parse::DEFAULT_PREFIX_WIDTH;
use crate::renumber::sidecar::{SIDECAR_DIR_EXTENSION, SIDECAR_FILE_NAME};
use crate::renumber::sink::LogSink;

pub const DEFAULT_FILE_WIDTH: usize = 3;
const IMAGES_DIR: &str = "images";

/// Folder record from the library `metadata.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LibraryFolder {
    #[serde(default)]
    pub id: String,
    #[serde(default = "default_folder_name")]
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct LibraryMetadata {
    folders: Option<Vec<LibraryFolder>>,
}

fn default_folder_name() -> String {
    "Untitled folder".to_string()
}

/// Numbering used for exported folders and files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    /// Prefix of the first exported folder.
    pub first_index: u32,
    pub folder_width: usize,
    pub file_width: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            first_index: 1,
            folder_width: DEFAULT_PREFIX_WIDTH,
            file_width: DEFAULT_FILE_WIDTH,
        }
    }
}

/// One folder to export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportItem {
    pub folder: LibraryFolder,
    pub new_name: String,
    pub source_dir: PathBuf,
    /// Files to copy, `None` if the source folder does not exist.
    pub files: Option<Vec<PathBuf>>,
}

impl fmt::Display for ExportItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.files {
            Some(files) => write!(f, "{} -> {} ({} files)", self.folder.name, self.new_name, files.len()),
            None => write!(f, "{} -> {} (folder missing or empty)", self.folder.name, self.new_name),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub exported: usize,
    pub failed: usize,
}

impl fmt::Display for ExportSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Exported {} folders, {} failures", self.exported, self.failed)
    }
}

/// Read the folder list from `<library>/metadata.json`, sorted by name.
///
/// # Errors
/// Returns an error if the library metadata is missing, unreadable, or has no folder list.
pub fn load_folders(library: &Path) -> Result<Vec<LibraryFolder>> {
    let metadata_path = library.join(SIDECAR_FILE_NAME);
    if !metadata_path.is_file() {
        anyhow::bail!("Not a library folder, missing {}", metadata_path.display());
    }
    let content = fs::read_to_string(&metadata_path)
        .with_context(|| format!("Failed to read {}", metadata_path.display()))?;
    let metadata: LibraryMetadata = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", metadata_path.display()))?;
    let mut folders = metadata.folders.context("Library metadata has no folders")?;
    folders.sort_by_key(|folder| folder.name.to_lowercase());
    Ok(folders)
}

/// Pick folders by name, or all of them if no names are given.
///
/// # Errors
/// Returns an error if a requested name does not match any folder.
pub fn select_folders(folders: &[LibraryFolder], names: &[String]) -> Result<Vec<LibraryFolder>> {
    if names.is_empty() {
        return Ok(folders.to_vec());
    }
    names
        .iter()
        .map(|name| {
            folders
                .iter()
                .find(|folder| folder.name == *name)
                .cloned()
                .with_context(|| format!("No library folder named '{name}'"))
        })
        .collect()
}

/// Compute output names and source files for the selected folders.
///
/// # Errors
/// Returns an error if an existing source folder cannot be read.
pub fn plan_export(library: &Path, folders: &[LibraryFolder], options: ExportOptions) -> Result<Vec<ExportItem>> {
    let mut index = options.first_index;
    let mut items = Vec::with_capacity(folders.len());
    for folder in folders {
        let width = options.folder_width;
        let new_name = format!("{index:0width$}_{}", safe_folder_name(&folder.name));
        let source_dir = library.join(IMAGES_DIR).join(&folder.id);
        let files = if folder.id.is_empty() || !source_dir.is_dir() {
            None
        } else {
            Some(folder_files(&source_dir)?)
        };
        items.push(ExportItem {
            folder: folder.clone(),
            new_name,
            source_dir,
            files,
        });
        index = index.saturating_add(1);
    }
    Ok(items)
}

/// Copy every planned folder into `output`.
///
/// Missing source folders and failed copies are counted and logged; processing continues.
///
/// # Errors
/// Returns an error if the output directory cannot be created.
pub fn export(items: &[ExportItem], output: &Path, options: ExportOptions, sink: &dyn LogSink) -> Result<ExportSummary> {
    fs::create_dir_all(output).with_context(|| format!("Failed to create output folder {}", output.display()))?;
    let mut summary = ExportSummary::default();

    for (done, item) in items.iter().enumerate() {
        match &item.files {
            Some(files) => {
                let target_dir = output.join(&item.new_name);
                if let Err(error) = fs::create_dir_all(&target_dir) {
                    sink.error(&format!("Failed to create {}: {error}", target_dir.display()));
                    summary.failed += 1;
                } else {
                    summary.failed += copy_files(files, &target_dir, &item.new_name, options.file_width, sink);
                    sink.emit(&format!(
                        "Exported folder: {} -> {} ({} files)",
                        item.folder.name,
                        item.new_name,
                        files.len()
                    ));
                    summary.exported += 1;
                }
            }
            None => {
                sink.warn(&format!("Folder missing or empty: {}", item.folder.name));
                summary.failed += 1;
            }
        }
        sink.progress(done + 1, items.len());
    }

    Ok(summary)
}

/// Folder name usable as a single path component below the output directory.
fn safe_folder_name(name: &str) -> String {
    name.chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect()
}

/// Copy files as `001.ext`, `002.ext`, ... and return the number of failures.
fn copy_files(files: &[PathBuf], target_dir: &Path, folder_name: &str, width: usize, sink: &dyn LogSink) -> usize {
    let mut failed = 0;
    for (number, source) in files.iter().enumerate() {
        let file_name = crate::path_to_filename_string(source);
        let new_name = match source.extension() {
            Some(extension) => format!("{:0width$}.{}", number + 1, extension.to_string_lossy()),
            None => format!("{:0width$}", number + 1),
        };
        match fs::copy(source, target_dir.join(&new_name)) {
            Ok(_) => sink.emit(&format!("Copied: {file_name} -> {folder_name}/{new_name}")),
            Err(error) => {
                sink.error(&format!("Failed to copy {file_name} -> {new_name}: {error}"));
                failed += 1;
            }
        }
    }
    failed
}

/// Regular files of a folder, excluding `.info` entries, sorted by name.
fn folder_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let suffix = format!(".{SIDECAR_DIR_EXTENSION}");
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && !crate::path_to_filename_string(path).ends_with(&suffix))
        .collect();
    files.sort();
    Ok(files)
}
