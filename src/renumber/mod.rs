//! Group-aware renumbering of two-digit filename prefixes.
//!
//! Entries are scanned from a directory or a library of `.info` item folders,
//! a rename plan is computed from a start entry and direction,
//! and the plan is applied either to the filesystem directly
//! or to library sidecar records with a backup of each previous record.

mod error;
mod execute;
mod export;
mod lock;
mod parse;
mod plan;
mod report;
mod scan;
mod sidecar;
mod sink;
mod types;

pub use error::RenumberError;
pub use execute::{FsExecutor, RenameExecutor};
pub use export::{
    DEFAULT_FILE_WIDTH, ExportItem, ExportOptions, ExportSummary, LibraryFolder, export, load_folders, plan_export,
    select_folders,
};
pub use lock::{DirectoryLock, LOCK_FILE_NAME};
pub use parse::{
    DEFAULT_PREFIX_WIDTH, MAX_PREFIX_WIDTH, ParsedName, PrefixParser, format_prefixed, group_label,
    max_prefix_for_width, parse,
};
pub use plan::{StartSelector, plan};
pub use report::{ReportLine, render, report};
pub use scan::{scan_directory, scan_library};
pub use sidecar::{
    BACKUP_EXTENSION, SIDECAR_DIR_EXTENSION, SIDECAR_FILE_NAME, SidecarExecutor, SidecarRecord, backup_path,
};
pub use sink::{ConsoleSink, FileSink, LogSink, MemorySink};
pub use types::{BatchSummary, Entry, Mode, PairStatus, RenamePair, RenamePlan, Unchanged};
