mod config;
mod renumber;

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use group_renumber::print_error;

use crate::renumber::Renumber;

#[derive(Parser)]
#[command(
    author,
    version,
    name = env!("CARGO_BIN_NAME"),
    about = "Renumber two-digit filename prefixes group by group"
)]
pub(crate) struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Optional input directory
    #[arg(value_hint = clap::ValueHint::DirPath, global = true)]
    path: Option<PathBuf>,

    /// Start entry as zero-based index or exact name
    #[arg(short = 's', long, name = "INDEX|NAME", global = true)]
    start: Option<String>,

    /// Prefix value to count from instead of the start entry's own prefix
    #[arg(short = 'x', long, name = "PREFIX", global = true)]
    prefix: Option<u32>,

    /// Decrement the first prefix instead of incrementing it
    #[arg(short = 'd', long, global = true)]
    decrement: bool,

    /// Number of prefix digits when renumbering
    #[arg(short = 'w', long, name = "DIGITS", global = true)]
    width: Option<usize>,

    /// List entries with their prefix and group
    #[arg(short = 'L', long, global = true)]
    list: bool,

    /// Write a log file in addition to terminal output
    #[arg(short = 'g', long, global = true)]
    log: bool,

    /// Only print changes without renaming
    #[arg(short = 'p', long, global = true)]
    print: bool,

    /// Generate shell completion
    #[arg(short = 'l', long, name = "SHELL")]
    completion: Option<Shell>,

    /// Print verbose output
    #[arg(short = 'v', long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Renumber library items through their metadata records
    #[command(name = "library")]
    Library,

    /// Export library folders to numbered output folders
    #[command(name = "export")]
    Export {
        /// Output directory
        #[arg(short = 'o', long, value_hint = clap::ValueHint::DirPath)]
        output: PathBuf,

        /// Library folder name to export, all folders if not given
        #[arg(short = 'f', long = "folder", num_args = 1, action = clap::ArgAction::Append, name = "FOLDER")]
        folders: Vec<String>,

        /// Prefix of the first exported folder
        #[arg(short = 'n', long, name = "NUMBER", default_value_t = 1)]
        first: u32,

        /// Number of digits in exported folder prefixes
        #[arg(short = 'W', long, name = "FOLDER_DIGITS")]
        folder_width: Option<usize>,

        /// Number of digits in exported file names
        #[arg(short = 'F', long, name = "FILE_DIGITS")]
        file_width: Option<usize>,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if let Some(ref shell) = args.completion {
        return group_renumber::generate_shell_completion(*shell, Args::command(), env!("CARGO_BIN_NAME"));
    }
    if let Err(error) = Renumber::new(args).and_then(|renumber| renumber.run()) {
        print_error!("{error:#}");
        std::process::exit(1);
    }
    Ok(())
}
