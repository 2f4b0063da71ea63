//! Digest stamping: staleness detection and cache advancement.
//!
//! This module provides functionality for:
//! - The pure staleness decision ([`staleness`])
//! - The per-file pipeline and its tagged outcomes ([`pipeline`])
//!
//! Each file goes through read → digest → attribute read → compare and, when
//! stale, regenerate → attribute write. The cache only advances past a file
//! once its regeneration has succeeded.

pub mod pipeline;
pub mod staleness;

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::regen::RegenError;
use crate::scanner::{HashAlgorithm, HashError, ScanError};
use crate::store::StoreError;

pub use pipeline::{Stamper, StamperConfig};
pub use staleness::{is_stale, Verdict};

/// Whether a run may modify anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Regenerate stale files and advance their stored digest.
    Stamp,
    /// Report staleness only; never regenerate nor write.
    Verify,
}

/// What happened to a file that was processed successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Stored digest matched.
    Unchanged,
    /// No digest was stored; one was added (or would be, in verify mode).
    Added,
    /// A different digest was stored; it was updated (or would be).
    Updated,
}

impl From<Verdict> for Action {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Fresh => Self::Unchanged,
            Verdict::Missing => Self::Added,
            Verdict::Changed => Self::Updated,
        }
    }
}

/// Why a file was skipped. The stored digest is left untouched.
#[derive(thiserror::Error, Debug)]
pub enum SkipReason {
    /// The directory walk failed at this path.
    #[error(transparent)]
    Walk(ScanError),
    /// The file could not be read.
    #[error(transparent)]
    Read(HashError),
    /// The stored attribute could not be read.
    #[error(transparent)]
    ReadAttribute(StoreError),
    /// Regeneration failed.
    #[error(transparent)]
    Regenerate(RegenError),
    /// The new digest could not be written.
    #[error(transparent)]
    WriteAttribute(StoreError),
    /// The run was interrupted before this file was handled.
    #[error("interrupted")]
    Interrupted,
}

impl SkipReason {
    /// Short machine-readable tag.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Walk(_) => "walk",
            Self::Read(_) => "read",
            Self::ReadAttribute(_) => "read_attribute",
            Self::Regenerate(_) => "regenerate",
            Self::WriteAttribute(_) => "write_attribute",
            Self::Interrupted => "interrupted",
        }
    }
}

/// Tagged result for a single file.
#[derive(Debug)]
pub enum FileOutcome {
    /// The file was handled.
    Processed(Action),
    /// The file was skipped; the walk continues.
    Skipped(SkipReason),
    /// A configuration-level failure; the run is aborted.
    Fatal(StoreError),
}

/// Per-file entry of a [`RunReport`].
#[derive(Debug)]
pub struct FileReport {
    /// Path of the file (or of the directory, for walk errors)
    pub path: PathBuf,
    /// What happened
    pub outcome: FileOutcome,
    /// Digest of the contents, when it could be computed
    pub digest: Option<String>,
}

impl FileReport {
    /// The action taken, if the file was processed.
    #[must_use]
    pub fn action(&self) -> Option<Action> {
        match self.outcome {
            FileOutcome::Processed(action) => Some(action),
            _ => None,
        }
    }

    /// Whether the file's cache state changed (or would change).
    #[must_use]
    pub fn is_transition(&self) -> bool {
        matches!(self.action(), Some(Action::Added | Action::Updated))
    }

    /// The skip reason, if the file was skipped.
    #[must_use]
    pub fn skip_reason(&self) -> Option<&SkipReason> {
        match &self.outcome {
            FileOutcome::Skipped(reason) => Some(reason),
            _ => None,
        }
    }
}

/// Counters for a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Candidate files handed to the pipeline
    pub scanned: usize,
    /// Files whose digest matched
    pub unchanged: usize,
    /// Files that received their first digest
    pub added: usize,
    /// Files whose digest was replaced
    pub updated: usize,
    /// Files skipped because of a per-file failure
    pub skipped: usize,
    /// Directory walk errors
    pub walk_errors: usize,
    /// Whether the run was interrupted
    pub interrupted: bool,
    /// Wall-clock duration of the run
    #[serde(skip)]
    pub duration: Duration,
}

impl RunSummary {
    /// Tally the given reports.
    #[must_use]
    pub fn from_reports(files: &[FileReport], duration: Duration) -> Self {
        let mut summary = Self {
            duration,
            ..Self::default()
        };
        for report in files {
            match &report.outcome {
                FileOutcome::Processed(action) => {
                    summary.scanned += 1;
                    match action {
                        Action::Unchanged => summary.unchanged += 1,
                        Action::Added => summary.added += 1,
                        Action::Updated => summary.updated += 1,
                    }
                }
                FileOutcome::Skipped(SkipReason::Walk(_)) => summary.walk_errors += 1,
                FileOutcome::Skipped(SkipReason::Interrupted) => {
                    summary.scanned += 1;
                    summary.skipped += 1;
                    summary.interrupted = true;
                }
                FileOutcome::Skipped(_) => {
                    summary.scanned += 1;
                    summary.skipped += 1;
                }
                FileOutcome::Fatal(_) => {}
            }
        }
        summary
    }

    /// Files whose cache state changed (or would change).
    #[must_use]
    pub fn transitions(&self) -> usize {
        self.added + self.updated
    }
}

/// Result of a complete pass over a tree.
#[derive(Debug)]
pub struct RunReport {
    /// Whether the run could modify files
    pub mode: RunMode,
    /// Absolute traversal root
    pub root: PathBuf,
    /// Digest algorithm in use
    pub algorithm: HashAlgorithm,
    /// Attribute name in use
    pub attr_name: String,
    /// Per-file reports in walk order
    pub files: Vec<FileReport>,
    /// Aggregated counters
    pub summary: RunSummary,
}

impl RunReport {
    /// Reports of files whose cache state changed, in walk order.
    pub fn transitions(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| f.is_transition())
    }

    /// Find the report for `path`.
    #[must_use]
    pub fn file(&self, path: &std::path::Path) -> Option<&FileReport> {
        self.files.iter().find(|f| f.path == path)
    }
}

/// Errors that abort a run.
#[derive(thiserror::Error, Debug)]
pub enum StampError {
    /// The traversal root is unusable.
    #[error("Invalid root")]
    Root(#[source] ScanError),

    /// Attribute storage is unusable for this tree.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The worker pool could not be created.
    #[error("Failed to build worker pool")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}
