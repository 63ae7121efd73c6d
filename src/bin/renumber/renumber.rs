use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;

use group_renumber::print_warning;
use group_renumber::renumber::{
    BatchSummary, ConsoleSink, DirectoryLock, Entry, FileSink, FsExecutor, LogSink, PrefixParser, RenameExecutor,
    SidecarExecutor, export, load_folders, plan, plan_export, render, report, scan_directory, scan_library,
    select_folders,
};

use crate::Args;
use crate::config::{Config, Target};

/// Runs one renumber, listing or export batch for the input directory.
pub struct Renumber {
    root: PathBuf,
    config: Config,
}

impl Renumber {
    /// Create runner from command line args and user config.
    ///
    /// # Errors
    /// Returns an error if the input path or the config file is invalid.
    pub fn new(args: Args) -> Result<Self> {
        let root = group_renumber::resolve_input_path(args.path.as_deref())?;
        let config = Config::from_args(args)?;
        Ok(Self { root, config })
    }

    /// Run the batch selected by the config.
    ///
    /// # Errors
    /// Returns an error if scanning, planning or a batch-level write fails.
    pub fn run(&self) -> Result<()> {
        if self.config.verbose {
            println!("{}", self.config);
            println!("Input: {}", self.root.display());
        }
        match &self.config.target {
            Target::Export { output, folders } => self.export(output, folders),
            Target::Directory | Target::Library => self.renumber(),
        }
    }

    fn renumber(&self) -> Result<()> {
        let parser = PrefixParser::new(self.config.width)?;
        let sink = self.create_sink()?;

        let entries = match self.config.target {
            Target::Library => scan_library(&self.root, &parser, sink.as_ref())?,
            _ => scan_directory(&self.root, &parser)?,
        };

        if self.config.list {
            print_entries(&entries);
            return Ok(());
        }

        let selector = self
            .config
            .start
            .as_ref()
            .context("No start entry given, use --start with an index or name, or --list to see entries")?;
        let start_index = selector.resolve(&entries)?;
        let start_prefix = self
            .config
            .start_prefix
            .or_else(|| entries.get(start_index).and_then(|entry| entry.numeric_prefix))
            .unwrap_or_default();

        let plan = plan(&entries, start_index, start_prefix, self.config.mode, sink.as_ref())?;
        let lines = report(&plan);
        if lines.is_empty() {
            print_warning!("Nothing to rename");
            return Ok(());
        }

        if self.config.dryrun {
            for line in render(&lines, "Dryrun") {
                println!("{line}");
            }
            println!("{}", format!("Dryrun: {} to rename", lines.len()).cyan().bold());
            return Ok(());
        }

        let _lock = DirectoryLock::acquire(&self.root)?;
        if self.config.verbose {
            for line in render(&lines, "Rename") {
                println!("{line}");
            }
        }

        let summary = match self.config.target {
            Target::Library => SidecarExecutor::new().execute(&plan, &entries, sink.as_ref())?,
            _ => FsExecutor::new(self.root.clone()).execute(&plan, &entries, sink.as_ref())?,
        };
        log_summary(sink.as_ref(), &summary);
        Ok(())
    }

    fn export(&self, output: &Path, folders: &[String]) -> Result<()> {
        let all_folders = load_folders(&self.root)?;
        if self.config.list {
            for (index, folder) in all_folders.iter().enumerate() {
                println!("{index}. {} ({})", folder.name, folder.id.dimmed());
            }
            return Ok(());
        }

        let selected = select_folders(&all_folders, folders)?;
        let items = plan_export(&self.root, &selected, self.config.export)?;
        if items.is_empty() {
            print_warning!("No folders to export");
            return Ok(());
        }

        if self.config.dryrun {
            for item in &items {
                println!("{item}");
            }
            println!("{}", format!("Dryrun: {} folders to export", items.len()).cyan().bold());
            return Ok(());
        }

        let sink = self.create_sink()?;
        let summary = export(&items, output, self.config.export, sink.as_ref())?;
        if summary.failed > 0 {
            sink.warn(&summary.to_string());
        } else {
            sink.emit(&summary.to_string());
        }
        Ok(())
    }

    /// Console output, mirrored to a log file when enabled.
    fn create_sink(&self) -> Result<Box<dyn LogSink>> {
        let console = ConsoleSink::with_progress();
        if self.config.log_file {
            let sink = FileSink::new(console)?;
            if self.config.verbose {
                println!("Log file: {}", sink.path().display());
            }
            Ok(Box::new(sink))
        } else {
            Ok(Box::new(console))
        }
    }
}

fn print_entries(entries: &[Entry]) {
    if entries.is_empty() {
        print_warning!("No entries found");
        return;
    }
    let digits = entries.len().checked_ilog10().map_or(1, |d| d as usize + 1);
    for (index, entry) in entries.iter().enumerate() {
        println!("{index:>digits$}. {entry}");
    }
}

/// Final tally, coloured by its worst outcome.
fn log_summary(sink: &dyn LogSink, summary: &BatchSummary) {
    let line = summary.to_string();
    if summary.failed > 0 {
        sink.error(&line);
    } else if summary.skipped > 0 {
        sink.warn(&line);
    } else {
        sink.emit(&line);
    }
}

#[cfg(test)]
mod renumber_runner_tests {
    use super::*;

    use std::fs;

    use group_renumber::renumber::{RenumberError, StartSelector};
    use tempfile::tempdir;

    fn runner(root: &Path) -> Renumber {
        Renumber {
            root: root.to_path_buf(),
            config: Config {
                start: Some(StartSelector::Index(0)),
                width: 2,
                ..Config::default()
            },
        }
    }

    #[test]
    fn locked_directory_is_not_renamed() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("01a.txt"), "a").unwrap();

        let lock = DirectoryLock::acquire(dir.path()).unwrap();
        let error = runner(dir.path()).run().unwrap_err();
        assert!(matches!(
            error.downcast_ref::<RenumberError>(),
            Some(RenumberError::Locked(_))
        ));
        assert!(dir.path().join("01a.txt").exists());
        assert!(!dir.path().join("02a.txt").exists());

        drop(lock);
        runner(dir.path()).run().unwrap();
        assert!(!dir.path().join("01a.txt").exists());
        assert!(dir.path().join("02a.txt").exists());
    }

    #[test]
    fn dryrun_ignores_lock() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("01a.txt"), "a").unwrap();

        let _lock = DirectoryLock::acquire(dir.path()).unwrap();
        let mut renumber = runner(dir.path());
        renumber.config.dryrun = true;
        renumber.run().unwrap();
        assert!(dir.path().join("01a.txt").exists());
    }
}
