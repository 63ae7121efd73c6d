//! Output sinks for batch log lines.
//!
//! The engine never prints on its own: every line goes through a [`LogSink`] supplied by the caller.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use anyhow::{Context, Result};
use chrono::Local;
use colored::Colorize;
use indicatif::ProgressBar;
#[cfg(not(test))]
use indicatif::ProgressStyle;

#[cfg(not(test))]
const PROGRESS_BAR_CHARS: &str = "=> ";
#[cfg(not(test))]
const PROGRESS_BAR_TEMPLATE: &str = "[{elapsed_precise}] {bar:80.cyan/blue} {pos}/{len} {percent}%";

/// Destination for plain-text log lines.
pub trait LogSink: Send + Sync {
    fn emit(&self, line: &str);

    /// Line describing a skipped entry.
    fn warn(&self, line: &str) {
        self.emit(line);
    }

    /// Line describing a failed write.
    fn error(&self, line: &str) {
        self.emit(line);
    }

    /// Batch progress after `done` of `total` entries.
    fn progress(&self, _done: usize, _total: usize) {}
}

/// Coloured terminal output with an optional progress bar.
#[derive(Debug, Default)]
pub struct ConsoleSink {
    show_progress: bool,
    progress_bar: OnceLock<ProgressBar>,
}

impl ConsoleSink {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            show_progress: false,
            progress_bar: OnceLock::new(),
        }
    }

    /// Show a progress bar while a batch is running.
    #[must_use]
    pub const fn with_progress() -> Self {
        Self {
            show_progress: true,
            progress_bar: OnceLock::new(),
        }
    }

    fn print(&self, line: &str) {
        match self.progress_bar.get() {
            Some(bar) if !bar.is_finished() => bar.println(line),
            _ => println!("{line}"),
        }
    }

    /// Create a progress bar that is hidden during tests.
    fn create_progress_bar(len: u64) -> ProgressBar {
        #[cfg(test)]
        {
            let _ = len;
            ProgressBar::hidden()
        }
        #[cfg(not(test))]
        {
            let progress_bar = ProgressBar::new(len);
            progress_bar.set_style(
                ProgressStyle::default_bar()
                    .template(PROGRESS_BAR_TEMPLATE)
                    .expect("Failed to set progress bar template")
                    .progress_chars(PROGRESS_BAR_CHARS),
            );
            progress_bar
        }
    }
}

impl LogSink for ConsoleSink {
    fn emit(&self, line: &str) {
        self.print(line);
    }

    fn warn(&self, line: &str) {
        self.print(&line.yellow().to_string());
    }

    fn error(&self, line: &str) {
        self.print(&line.red().to_string());
    }

    fn progress(&self, done: usize, total: usize) {
        if !self.show_progress {
            return;
        }
        let bar = self
            .progress_bar
            .get_or_init(|| Self::create_progress_bar(total as u64));
        bar.set_position(done as u64);
        if done >= total {
            bar.finish_and_clear();
        }
    }
}

/// Collects lines in memory, for callers that forward them to their own UI thread.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all lines emitted so far.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|lines| lines.clone()).unwrap_or_default()
    }

    /// True if any emitted line contains `text`.
    #[must_use]
    pub fn contains(&self, text: &str) -> bool {
        self.lines().iter().any(|line| line.contains(text))
    }
}

impl LogSink for MemorySink {
    fn emit(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}

/// Appends timestamped lines to a log file and forwards them to an inner sink.
pub struct FileSink<S: LogSink> {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
    inner: S,
}

impl<S: LogSink> FileSink<S> {
    /// Create a new log file under `~/logs/group-renumber/renumber_<timestamp>.log`.
    ///
    /// # Errors
    /// Returns an error if the home directory is unknown or the file cannot be created.
    pub fn new(inner: S) -> Result<Self> {
        let log_dir = crate::config::LOG_DIR
            .as_ref()
            .context("Failed to get home directory")?;

        if !log_dir.exists() {
            fs::create_dir_all(log_dir).context("Failed to create log directory")?;
        }

        let log_path = log_dir.join(format!("renumber_{}.log", Local::now().format("%Y-%m-%d_%H-%M-%S")));
        Self::at(&log_path, inner)
    }

    /// Append to the given log file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened.
    pub fn at(path: &Path, inner: S) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to create log file: {}", path.display()))?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(BufWriter::new(file)),
            inner,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn timestamp() -> String {
        Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
    }

    fn write_line(&self, level: &str, line: &str) {
        if let Ok(mut writer) = self.writer.lock() {
            let _ = writeln!(writer, "[{}] {level:<5} {line}", Self::timestamp());
            let _ = writer.flush();
        }
    }
}

impl<S: LogSink> LogSink for FileSink<S> {
    fn emit(&self, line: &str) {
        self.write_line("INFO", line);
        self.inner.emit(line);
    }

    fn warn(&self, line: &str) {
        self.write_line("SKIP", line);
        self.inner.warn(line);
    }

    fn error(&self, line: &str) {
        self.write_line("ERROR", line);
        self.inner.error(line);
    }

    fn progress(&self, done: usize, total: usize) {
        self.inner.progress(done, total);
    }
}
