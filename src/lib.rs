pub mod config;
pub mod renumber;

use std::env;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Command;
use clap_complete::Shell;
use colored::{ColoredString, Colorize};
use difference::{Changeset, Difference};
use unicode_normalization::UnicodeNormalization;

/// Get the user config file path if the home directory is known.
#[must_use]
pub fn config_path() -> Option<&'static PathBuf> {
    config::CONFIG_PATH.as_ref()
}

/// Format bool value as a coloured string.
#[must_use]
pub fn colorize_bool(value: bool) -> ColoredString {
    if value { "true".green() } else { "false".red() }
}

/// Display form of a file name: NFC-composed, invalid Unicode replaced.
///
/// Only for parsing and printing. File operations need the original `OsStr`.
#[must_use]
pub fn normalized_name(name: &OsStr) -> String {
    name.to_string_lossy().nfc().collect()
}

/// Display form of the last path component, empty if there is none.
#[must_use]
pub fn path_to_filename_string(path: &Path) -> String {
    path.file_name().map(normalized_name).unwrap_or_default()
}

/// Resolve the input directory to an absolute path.
///
/// `None` or an empty path means the current working directory.
///
/// # Errors
/// Returns an error if the path does not exist or cannot be accessed.
pub fn resolve_input_path(path: Option<&Path>) -> Result<PathBuf> {
    let path = match path {
        Some(path) if !path.as_os_str().is_empty() => path.to_path_buf(),
        _ => env::current_dir().context("Failed to get current working directory")?,
    };
    dunce::canonicalize(&path)
        .with_context(|| format!("Input path does not exist or is not accessible: '{}'", path.display()))
}

#[inline]
pub fn print_error(message: &str) {
    eprintln!("{}", format!("Error: {message}").red());
}

#[macro_export]
macro_rules! print_error {
    ($($arg:tt)*) => {
        $crate::print_error(&format!($($arg)*))
    };
}

#[inline]
pub fn print_warning(message: &str) {
    eprintln!("{}", message.yellow());
}

#[macro_export]
macro_rules! print_warning {
    ($($arg:tt)*) => {
        $crate::print_warning(&format!($($arg)*))
    };
}

/// Colour the characters that differ between an original and a renamed name.
///
/// Returns `(old, new)`: removed characters red in the old name, added characters green in the new one.
/// Renamed names keep their length apart from prefix width changes, so the two lines stay aligned.
#[must_use]
pub fn color_diff(old: &str, new: &str) -> (String, String) {
    let mut old_diff = String::with_capacity(old.len());
    let mut new_diff = String::with_capacity(new.len());
    for diff in Changeset::new(old, new, "").diffs {
        match diff {
            Difference::Same(text) => {
                old_diff.push_str(&text);
                new_diff.push_str(&text);
            }
            Difference::Rem(text) => old_diff.push_str(&text.red().bold().to_string()),
            Difference::Add(text) => new_diff.push_str(&text.green().bold().to_string()),
        }
    }
    (old_diff, new_diff)
}

/// Write a completion script for `shell` into the user's completion directory.
///
/// # Errors
/// Returns an error if the shell is not supported or the script cannot be written.
pub fn generate_shell_completion(shell: Shell, mut command: Command, command_name: &str) -> Result<()> {
    let out_dir = shell_completion_dir(shell)?;
    fs::create_dir_all(&out_dir).with_context(|| format!("Failed to create {}", out_dir.display()))?;
    let path = clap_complete::generate_to(shell, &mut command, command_name, &out_dir)
        .with_context(|| format!("Failed to write {shell} completion to {}", out_dir.display()))?;
    println!("Completion file generated to: {}", path.display());
    Ok(())
}

fn shell_completion_dir(shell: Shell) -> Result<PathBuf> {
    let home = dirs::home_dir().context("Failed to get home directory")?;
    let dir = match shell {
        Shell::Bash => home.join(".bash_completion.d"),
        Shell::Elvish => home.join(".elvish").join("lib"),
        Shell::Fish => home.join(".config").join("fish").join("completions"),
        Shell::PowerShell => home.join(".config").join("powershell").join("completions"),
        Shell::Zsh => home.join(".zsh").join("completions"),
        _ => anyhow::bail!("Unsupported shell: {shell}"),
    };
    Ok(dir)
}

#[cfg(test)]
mod lib_tests {
    use super::*;

    use std::ffi::OsString;

    use tempfile::tempdir;

    #[test]
    fn normalized_name_composes_characters() {
        let decomposed = OsString::from("01a\u{30a}ngstrom.txt");
        assert_eq!(normalized_name(&decomposed), "01\u{e5}ngstrom.txt");
    }

    #[cfg(unix)]
    #[test]
    fn normalized_name_replaces_invalid_unicode() {
        use std::os::unix::ffi::OsStrExt;

        let name = OsStr::from_bytes(b"01caf\xe9.txt");
        assert_eq!(normalized_name(name), "01caf\u{FFFD}.txt");
    }

    #[test]
    fn filename_string_of_root_is_empty() {
        assert_eq!(path_to_filename_string(Path::new("/")), "");
        assert_eq!(path_to_filename_string(Path::new("dir/01a.txt")), "01a.txt");
    }

    #[test]
    fn resolve_input_path_existing_directory() {
        let dir = tempdir().unwrap();
        let resolved = resolve_input_path(Some(dir.path())).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.is_dir());
    }

    #[test]
    fn resolve_input_path_missing_directory() {
        let dir = tempdir().unwrap();
        assert!(resolve_input_path(Some(&dir.path().join("missing"))).is_err());
    }

    #[test]
    fn resolve_input_path_defaults_to_current_dir() {
        let current = dunce::canonicalize(env::current_dir().unwrap()).unwrap();
        assert_eq!(resolve_input_path(None).unwrap(), current);
        assert_eq!(resolve_input_path(Some(Path::new(""))).unwrap(), current);
    }

    #[test]
    fn color_diff_without_colours_keeps_names() {
        colored::control::set_override(false);
        let (old, new) = color_diff("01cats.jpg", "02cats.jpg");
        assert_eq!(old, "01cats.jpg");
        assert_eq!(new, "02cats.jpg");
    }

    #[test]
    fn zsh_completions_go_to_user_dir() {
        let dir = shell_completion_dir(Shell::Zsh).unwrap();
        assert!(dir.ends_with(".zsh/completions"));
    }
}
