use std::fmt;
use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use itertools::Itertools;
use serde::Deserialize;

use group_renumber::renumber::{DEFAULT_FILE_WIDTH, DEFAULT_PREFIX_WIDTH, ExportOptions, Mode, StartSelector};

use crate::{Args, Command};

/// What a run operates on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Target {
    /// Files directly inside the input directory.
    #[default]
    Directory,
    /// Library items described by `<id>.info/metadata.json` records.
    Library,
    /// Copy library folders to numbered output folders.
    Export { output: PathBuf, folders: Vec<String> },
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory => write!(f, "directory"),
            Self::Library => write!(f, "library"),
            Self::Export { output, folders } if folders.is_empty() => {
                write!(f, "export all folders to {}", output.display())
            }
            Self::Export { output, folders } => {
                write!(f, "export {} to {}", folders.iter().join(", "), output.display())
            }
        }
    }
}

/// Final config created from CLI arguments and user config file.
#[derive(Debug, Default)]
pub struct Config {
    pub(crate) target: Target,
    pub(crate) dryrun: bool,
    pub(crate) export: ExportOptions,
    pub(crate) list: bool,
    pub(crate) log_file: bool,
    pub(crate) mode: Mode,
    pub(crate) start: Option<StartSelector>,
    pub(crate) start_prefix: Option<u32>,
    pub(crate) verbose: bool,
    pub(crate) width: usize,
}

/// Config from a config file
#[derive(Debug, Default, Deserialize)]
struct RenumberConfig {
    #[serde(default)]
    decrement: bool,
    #[serde(default)]
    dryrun: bool,
    #[serde(default)]
    export_file_width: Option<usize>,
    #[serde(default)]
    export_width: Option<usize>,
    #[serde(default)]
    log_file: bool,
    #[serde(default)]
    verbose: bool,
    #[serde(default)]
    width: Option<usize>,
}

/// Wrapper needed for parsing the config file section.
#[derive(Debug, Default, Deserialize)]
struct UserConfig {
    #[serde(default)]
    renumber: RenumberConfig,
}

impl RenumberConfig {
    /// Try to read user config from the file if it exists.
    /// Otherwise, fall back to default config.
    ///
    /// # Errors
    /// Returns an error if config file exists but cannot be read or parsed.
    fn get_user_config() -> anyhow::Result<Self> {
        let Some(path) = group_renumber::config_path() else {
            return Ok(Self::default());
        };

        match fs::read_to_string(path) {
            Ok(content) => Self::from_toml_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse config file {}:\n{e}", path.display())),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(error) => Err(anyhow::anyhow!(
                "Failed to read config file {}: {error}",
                path.display()
            )),
        }
    }

    /// Parse config from a TOML string.
    ///
    /// # Errors
    /// Returns an error if the TOML string is invalid.
    fn from_toml_str(toml_str: &str) -> anyhow::Result<Self> {
        toml::from_str::<UserConfig>(toml_str)
            .map(|config| config.renumber)
            .context("Failed to parse renumber config TOML")
    }
}

impl Config {
    /// Create config from given command line args and user config file.
    ///
    /// # Errors
    /// Returns an error if the config file cannot be read or parsed.
    pub fn from_args(args: Args) -> anyhow::Result<Self> {
        let user_config = RenumberConfig::get_user_config()?;
        Ok(Self::merge(args, user_config))
    }

    /// Combine args with the user config (args > config > default).
    fn merge(args: Args, user_config: RenumberConfig) -> Self {
        let (target, first_index, folder_width, file_width) = match args.command {
            None => (Target::Directory, 1, None, None),
            Some(Command::Library) => (Target::Library, 1, None, None),
            Some(Command::Export {
                output,
                folders,
                first,
                folder_width,
                file_width,
            }) => {
                let folders = folders.into_iter().unique().collect();
                (Target::Export { output, folders }, first, folder_width, file_width)
            }
        };

        let mode = if args.decrement || user_config.decrement {
            Mode::Decrement
        } else {
            Mode::Increment
        };

        let export = ExportOptions {
            first_index,
            folder_width: folder_width
                .or(user_config.export_width)
                .unwrap_or(DEFAULT_PREFIX_WIDTH),
            file_width: file_width
                .or(user_config.export_file_width)
                .unwrap_or(DEFAULT_FILE_WIDTH),
        };

        Self {
            target,
            dryrun: args.print || user_config.dryrun,
            export,
            list: args.list,
            log_file: args.log || user_config.log_file,
            mode,
            start: args.start.as_deref().and_then(|value| value.parse().ok()),
            start_prefix: args.prefix,
            verbose: args.verbose || user_config.verbose,
            width: args.width.or(user_config.width).unwrap_or(DEFAULT_PREFIX_WIDTH),
        }
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Config:")?;
        writeln!(f, "  target: {}", self.target)?;
        writeln!(f, "  mode: {}", self.mode)?;
        writeln!(f, "  width: {}", self.width)?;
        writeln!(f, "  dryrun: {}", group_renumber::colorize_bool(self.dryrun))?;
        writeln!(f, "  log_file: {}", group_renumber::colorize_bool(self.log_file))?;
        write!(f, "  verbose: {}", group_renumber::colorize_bool(self.verbose))
    }
}
