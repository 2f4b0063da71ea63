//! Plain-text output.
//!
//! Silent by default. With verbosity, one line per file whose cache state
//! changed, in walk order:
//!
//! ```text
//! Adding digest to '/lib/pkg/a.py'
//! Updating digest of '/lib/pkg/b.py'
//! ```
//!
//! Verify runs use `Missing digest on` and `Digest mismatch on` instead.
//! From `-vv` a one-line summary follows.

use std::io::{self, Write};

use crate::stamp::{Action, FileReport, RunMode, RunReport};

/// Render the transition line for a file, if it has one.
#[must_use]
pub fn transition_line(mode: RunMode, report: &FileReport) -> Option<String> {
    let path = report.path.display();
    match (mode, report.action()?) {
        (_, Action::Unchanged) => None,
        (RunMode::Stamp, Action::Added) => Some(format!("Adding digest to '{path}'")),
        (RunMode::Stamp, Action::Updated) => Some(format!("Updating digest of '{path}'")),
        (RunMode::Verify, Action::Added) => Some(format!("Missing digest on '{path}'")),
        (RunMode::Verify, Action::Updated) => Some(format!("Digest mismatch on '{path}'")),
    }
}

/// Text renderer for a finished run.
#[derive(Debug)]
pub struct TextOutput<'a> {
    report: &'a RunReport,
    verbose: u8,
}

impl<'a> TextOutput<'a> {
    /// Create a renderer for `report` at the given verbosity.
    #[must_use]
    pub fn new(report: &'a RunReport, verbose: u8) -> Self {
        Self { report, verbose }
    }

    /// Write the transition lines and, from `-vv`, the summary.
    ///
    /// # Errors
    ///
    /// Returns any error from the writer.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        if self.verbose == 0 {
            return Ok(());
        }
        for file in &self.report.files {
            if let Some(line) = transition_line(self.report.mode, file) {
                writeln!(writer, "{line}")?;
            }
        }
        if self.verbose >= 2 {
            let s = &self.report.summary;
            writeln!(
                writer,
                "{} files: {} unchanged, {} added, {} updated, {} skipped ({:.2?})",
                s.scanned, s.unchanged, s.added, s.updated, s.skipped, s.duration
            )?;
        }
        Ok(())
    }
}
