//! Structured error handling and exit codes.

use serde::Serialize;

/// Exit codes for hashstamp.
///
/// - 0: Success (the pass completed)
/// - 1: General error (bad root, unsupported attributes, bad config)
/// - 2: Stale files found (verify only)
/// - 3: Partial success (strict mode, some files were skipped)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: the pass completed.
    Success = 0,
    /// General error: the pass could not run or was aborted.
    GeneralError = 1,
    /// Verify found files whose stored digest is missing or out of date.
    StaleFound = 2,
    /// Partial success: strict mode and at least one file was skipped.
    PartialSuccess = 3,
    /// Interrupted: the pass was interrupted by the user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "HS000",
            Self::GeneralError => "HS001",
            Self::StaleFound => "HS002",
            Self::PartialSuccess => "HS003",
            Self::Interrupted => "HS130",
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "HS001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}

/// Render `err` followed by each of its sources, joined with ": ".
///
/// Matches anyhow's `{:#}` for errors that are not wrapped in `anyhow::Error`.
#[must_use]
pub fn chain_message(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
