//! Output formatters for run reports.
//!
//! - [`text`]: verbose transition lines for humans and log scraping
//! - [`json`]: the full report for automation
//!
//! Everything here writes to stdout; diagnostics go through `log` to stderr.

pub mod json;
pub mod text;

use std::io::Write;

use crate::cli::OutputFormat;
use crate::error::ExitCode;
use crate::stamp::RunReport;

pub use json::{JsonOutput, JsonOutputError};
pub use text::TextOutput;

/// Write `report` in the requested format.
///
/// JSON lists unchanged files only from `-v` up.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn write_report<W: Write>(
    writer: &mut W,
    report: &RunReport,
    format: OutputFormat,
    verbose: u8,
    exit_code: ExitCode,
) -> Result<(), JsonOutputError> {
    match format {
        OutputFormat::Text => TextOutput::new(report, verbose).write_to(writer)?,
        OutputFormat::Json => JsonOutput::new(report, exit_code, verbose > 0).write_to(writer)?,
    }
    Ok(())
}
