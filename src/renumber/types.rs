use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

use colored::Colorize;

use crate::renumber::parse::{ParsedName, PrefixParser};

/// Direction applied to the first prefix of a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Increment,
    Decrement,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Increment => write!(f, "increment"),
            Self::Decrement => write!(f, "decrement"),
        }
    }
}

/// One renameable unit: a file system entry or a library item described by a sidecar record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Name used for parsing, planning and display, NFC-normalized.
    pub original_name: String,
    /// Name as stored on disk, used as the rename source.
    pub file_name: OsString,
    pub numeric_prefix: Option<u32>,
    /// Digits matched for `numeric_prefix`, used when writing the new prefix back.
    pub prefix_width: usize,
    pub group_label: Option<String>,
    pub remainder: String,
    pub is_directory: bool,
    /// Sidecar record path for library items.
    pub sidecar_path: Option<PathBuf>,
    /// File next to the sidecar whose name mirrors the logical name.
    pub companion_file: Option<PathBuf>,
}

impl Entry {
    /// Create a file entry by parsing its name.
    #[must_use]
    pub fn new(name: &str, parser: &PrefixParser) -> Self {
        Self::from_parsed(name, parser.parse(name), false)
    }

    /// Create a directory entry. Directories are listed but never renamed.
    #[must_use]
    pub fn directory(name: &str, parser: &PrefixParser) -> Self {
        Self::from_parsed(name, parser.parse(name), true)
    }

    /// Create an entry from a name read from disk.
    ///
    /// The on-disk name is kept for file operations even when it is not NFC or not valid UTF-8.
    #[must_use]
    pub fn from_file_name(file_name: &OsStr, is_directory: bool, parser: &PrefixParser) -> Self {
        let name = crate::normalized_name(file_name);
        Self {
            file_name: file_name.to_os_string(),
            ..Self::from_parsed(&name, parser.parse(&name), is_directory)
        }
    }

    /// Create a library entry backed by a sidecar record.
    #[must_use]
    pub fn with_sidecar(
        name: &str,
        parser: &PrefixParser,
        sidecar_path: PathBuf,
        companion_file: Option<PathBuf>,
    ) -> Self {
        Self {
            sidecar_path: Some(sidecar_path),
            companion_file,
            ..Self::from_parsed(name, parser.parse(name), false)
        }
    }

    fn from_parsed(name: &str, parsed: ParsedName, is_directory: bool) -> Self {
        Self {
            original_name: name.to_string(),
            file_name: OsString::from(name),
            numeric_prefix: parsed.prefix,
            prefix_width: parsed.width,
            group_label: parsed.group,
            remainder: parsed.remainder,
            is_directory,
            sidecar_path: None,
            companion_file: None,
        }
    }

    /// Both prefix and group were recognized.
    #[must_use]
    pub const fn is_recognized(&self) -> bool {
        self.numeric_prefix.is_some() && self.group_label.is_some()
    }

    /// Folder holding the sidecar record, if this is a library entry.
    #[must_use]
    pub fn sidecar_dir(&self) -> Option<&Path> {
        self.sidecar_path.as_deref().and_then(Path::parent)
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_directory {
            return write!(f, "{} {}", self.original_name, "(directory)".dimmed());
        }
        match (self.numeric_prefix, &self.group_label) {
            (Some(prefix), Some(group)) => write!(
                f,
                "{} (prefix: {prefix:0width$}, group: {})",
                self.original_name,
                group.cyan(),
                width = self.prefix_width
            ),
            (Some(prefix), None) => write!(
                f,
                "{} (prefix: {prefix:0width$}, {})",
                self.original_name,
                "group unrecognized".yellow(),
                width = self.prefix_width
            ),
            _ => write!(f, "{} {}", self.original_name, "(no prefix)".yellow()),
        }
    }
}

/// Why a plan position keeps its original name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unchanged {
    /// Before the start index.
    BeforeStart,
    Directory,
    /// Prefix or group could not be determined.
    Unrecognized,
    /// The computed name equals the original.
    SameName,
}

/// Planned outcome for one position of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairStatus {
    Rename,
    Unchanged(Unchanged),
}

/// One (original, new) pair of a plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamePair {
    pub original_name: String,
    pub new_name: String,
    pub status: PairStatus,
}

impl RenamePair {
    pub(crate) fn identity(name: &str, reason: Unchanged) -> Self {
        Self {
            original_name: name.to_string(),
            new_name: name.to_string(),
            status: PairStatus::Unchanged(reason),
        }
    }

    /// Identity pairs are no-ops for the executor.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.original_name == self.new_name
    }
}

/// Ordered rename mapping, index-aligned with the entries it was planned from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenamePlan {
    pub pairs: Vec<RenamePair>,
}

impl RenamePlan {
    #[must_use]
    pub const fn len(&self) -> usize {
        self.pairs.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Pairs that actually change a name, with their index in the input.
    pub fn renames(&self) -> impl Iterator<Item = (usize, &RenamePair)> {
        self.pairs.iter().enumerate().filter(|(_, pair)| !pair.is_identity())
    }

    /// Number of pairs that change a name.
    #[must_use]
    pub fn rename_count(&self) -> usize {
        self.renames().count()
    }
}

/// End-of-batch tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub renamed: usize,
    /// Not renamed because the target already existed.
    pub skipped: usize,
    pub failed: usize,
}

impl fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Renamed {} {}, skipped {}, failed {}",
            self.renamed,
            if self.renamed == 1 { "entry" } else { "entries" },
            self.skipped,
            self.failed
        )
    }
}
