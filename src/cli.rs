//! Command-line interface definitions for hashstamp.
//!
//! Global options (verbosity, config file) plus two subcommands sharing the
//! same file selection flags. Selection flags are all optional here so that
//! values from the config file and environment are only overridden when a
//! flag is actually given.
//!
//! # Example
//!
//! ```bash
//! # Stamp a tree, byte-compiling every stale module
//! hashstamp -v stamp /usr/lib/python3 --regen-cmd "python3 -m py_compile"
//!
//! # Check a tree without touching it
//! hashstamp verify /usr/lib/python3 --output json
//!
//! # Custom suffixes and a different algorithm
//! hashstamp stamp ./src --suffix .c --suffix .h --hash blake3
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Content-addressed staleness tracking with extended attributes.
///
/// hashstamp stores each file's content digest in an extended attribute on
/// the file itself and regenerates derived artifacts only for files whose
/// contents changed since the last successful run.
#[derive(Debug, Parser)]
#[command(name = "hashstamp")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Print changed files (-v), a summary (-vv) and debug logs (-vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Configuration file (defaults to the platform config directory)
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Output format given on the command line, if any.
    #[must_use]
    pub fn output_flag(&self) -> Option<OutputFormat> {
        self.command.selection().output
    }
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Regenerate stale files and store their new digest
    Stamp(StampArgs),
    /// Report stale files without regenerating or writing anything
    Verify(VerifyArgs),
}

impl Commands {
    /// The selection flags of either subcommand.
    #[must_use]
    pub fn selection(&self) -> &SelectionArgs {
        match self {
            Self::Stamp(args) => &args.selection,
            Self::Verify(args) => &args.selection,
        }
    }
}

/// Arguments for the stamp subcommand.
#[derive(Debug, Args)]
pub struct StampArgs {
    /// File selection and digest options
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Command run for each stale file (e.g. "python3 -m py_compile")
    ///
    /// Split on whitespace. Every `{}` is replaced by the file path; without
    /// a placeholder the path is appended.
    #[arg(long, value_name = "COMMAND")]
    pub regen_cmd: Option<String>,

    /// Exit with code 3 if any file was skipped
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for the verify subcommand.
#[derive(Debug, Args)]
pub struct VerifyArgs {
    /// File selection and digest options
    #[command(flatten)]
    pub selection: SelectionArgs,
}

/// Options shared by both subcommands.
#[derive(Debug, Default, Args)]
pub struct SelectionArgs {
    /// Directory to process
    #[arg(value_name = "ROOT", conflicts_with = "root")]
    pub path: Option<PathBuf>,

    /// Directory to process (alternative to the positional ROOT)
    #[arg(long = "root", value_name = "DIR")]
    pub root: Option<PathBuf>,

    /// Extended attribute holding the digest [default: user.io.hashstamp.digest]
    #[arg(long, value_name = "NAME")]
    pub attr_name: Option<String>,

    /// Digest algorithm: sha224, sha256, sha384, sha512, blake3 [default: sha256]
    #[arg(long = "hash", value_name = "ALGORITHM")]
    pub hash: Option<String>,

    /// File name suffix to select (repeatable) [default: .py .pyc]
    #[arg(short, long = "suffix", value_name = "SUFFIX")]
    pub suffixes: Vec<String>,

    /// Number of worker threads [default: 1]
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// Follow symbolic links during traversal
    #[arg(long, overrides_with = "no_follow_symlinks")]
    pub follow_symlinks: bool,

    /// Do not follow symbolic links (overrides config)
    #[arg(long, overrides_with = "follow_symlinks")]
    pub no_follow_symlinks: bool,

    /// Skip files larger than this (e.g., 2MiB)
    ///
    /// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub max_size: Option<u64>,

    /// Output format [default: text]
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,
}

impl SelectionArgs {
    /// The root given either positionally or with `--root`.
    #[must_use]
    pub fn root(&self) -> Option<&PathBuf> {
        self.path.as_ref().or(self.root.as_ref())
    }

    /// The symlink policy, if a flag was given.
    #[must_use]
    pub fn follow_symlinks(&self) -> Option<bool> {
        if self.follow_symlinks {
            Some(true)
        } else if self.no_follow_symlinks {
            Some(false)
        } else {
            None
        }
    }
}

/// Output format for run reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Transition lines with -v, silent otherwise
    #[default]
    Text,
    /// Full JSON report
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use hashstamp::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("2MiB").unwrap(), 2_097_152);
/// ```
///
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }
    if s.starts_with('-') {
        return Err("Size cannot be negative".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
