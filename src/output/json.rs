//! JSON output formatter for run reports.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "mode": "stamp",
//!   "root": "/usr/lib/python3",
//!   "algorithm": "sha256",
//!   "attr_name": "user.io.hashstamp.digest",
//!   "files": [
//!     { "path": "/usr/lib/python3/a.py", "status": "added", "digest": "ab12..." },
//!     { "path": "/usr/lib/python3/b.py", "status": "skipped",
//!       "skip_kind": "regenerate", "error": "..." }
//!   ],
//!   "summary": {
//!     "scanned": 2, "unchanged": 0, "added": 1, "updated": 0, "skipped": 1,
//!     "walk_errors": 0, "interrupted": false, "duration_ms": 12,
//!     "exit_code": 0, "exit_code_name": "HS000"
//!   }
//! }
//! ```
//!
//! Unchanged files are listed only when `include_unchanged` is set.

use std::io::Write;

use serde::Serialize;

use crate::error::{chain_message, ExitCode};
use crate::stamp::{Action, FileOutcome, FileReport, RunMode, RunReport, RunSummary};

/// A single file in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonFile {
    /// Absolute path
    pub path: String,
    /// `unchanged`, `added`, `updated` or `skipped`
    pub status: &'static str,
    /// Hex digest of the contents, when computed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
    /// Skip category, for skipped files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_kind: Option<&'static str>,
    /// Error message, for skipped files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl JsonFile {
    /// Convert a per-file report.
    #[must_use]
    pub fn from_report(report: &FileReport) -> Self {
        let (status, skip_kind, error) = match &report.outcome {
            FileOutcome::Processed(action) => (action_name(*action), None, None),
            FileOutcome::Skipped(reason) => {
                ("skipped", Some(reason.kind()), Some(chain_message(reason)))
            }
            FileOutcome::Fatal(err) => ("fatal", None, Some(chain_message(err))),
        };
        Self {
            path: report.path.to_string_lossy().into_owned(),
            status,
            digest: report.digest.clone(),
            skip_kind,
            error,
        }
    }
}

fn action_name(action: Action) -> &'static str {
    match action {
        Action::Unchanged => "unchanged",
        Action::Added => "added",
        Action::Updated => "updated",
    }
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Counters
    #[serde(flatten)]
    pub counts: RunSummary,
    /// Duration of the run in milliseconds
    pub duration_ms: u64,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "HS000")
    pub exit_code_name: String,
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Whether files could be modified
    pub mode: RunMode,
    /// Absolute traversal root
    pub root: String,
    /// Digest algorithm name
    pub algorithm: &'static str,
    /// Attribute name
    pub attr_name: String,
    /// Per-file entries in walk order
    pub files: Vec<JsonFile>,
    /// Summary statistics
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Build the JSON view of a report.
    #[must_use]
    pub fn new(report: &RunReport, exit_code: ExitCode, include_unchanged: bool) -> Self {
        Self {
            mode: report.mode,
            root: report.root.to_string_lossy().into_owned(),
            algorithm: report.algorithm.name(),
            attr_name: report.attr_name.clone(),
            files: report
                .files
                .iter()
                .filter(|f| include_unchanged || f.action() != Some(Action::Unchanged))
                .map(JsonFile::from_report)
                .collect(),
            summary: JsonSummary {
                counts: report.summary.clone(),
                duration_ms: report.summary.duration.as_millis() as u64,
                exit_code: exit_code.as_i32(),
                exit_code_name: exit_code.code_prefix().to_string(),
            },
        }
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<(), JsonOutputError> {
        let json = self.to_json_pretty()?;
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation")]
    Io(#[from] std::io::Error),
}
