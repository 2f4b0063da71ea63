//! Regeneration of derived artifacts for stale files.
//!
//! A [`Regenerator`] is invoked synchronously with the path of a stale file
//! and is expected to rebuild whatever is derived from it (a compiled form,
//! for instance). The pipeline only advances the stored digest after the
//! regenerator returns `Ok`.
//!
//! - [`CommandRegenerator`] runs an external program.
//! - [`NoopRegenerator`] does nothing and always succeeds.
//! - Any `Fn(&Path) -> Result<(), RegenError>` closure is a regenerator too,
//!   which is convenient for embedding and tests.

pub mod command;

use std::path::{Path, PathBuf};

pub use command::CommandRegenerator;

/// Rebuilds the derived artifact of a single file.
pub trait Regenerator: Send + Sync {
    /// Regenerate the artifact derived from `path`.
    ///
    /// # Errors
    ///
    /// Any error withholds the digest update for `path`, so the file is
    /// reported stale again on the next run.
    fn regenerate(&self, path: &Path) -> Result<(), RegenError>;
}

impl<F> Regenerator for F
where
    F: Fn(&Path) -> Result<(), RegenError> + Send + Sync,
{
    fn regenerate(&self, path: &Path) -> Result<(), RegenError> {
        self(path)
    }
}

/// Regenerator that performs no work.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRegenerator;

impl Regenerator for NoopRegenerator {
    fn regenerate(&self, path: &Path) -> Result<(), RegenError> {
        log::trace!("No regeneration configured for {}", path.display());
        Ok(())
    }
}

/// Errors from a regeneration attempt.
#[derive(thiserror::Error, Debug)]
pub enum RegenError {
    /// The configured command line is empty.
    #[error("Regeneration command is empty")]
    EmptyCommand,

    /// The regeneration program could not be started.
    #[error("Failed to start '{program}'")]
    Spawn {
        /// Program that was being started
        program: String,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The regeneration step ran and reported failure.
    #[error("Regeneration of {path} failed: {status}")]
    Failed {
        /// File whose artifact could not be regenerated
        path: PathBuf,
        /// Exit status or other failure description
        status: String,
    },
}
