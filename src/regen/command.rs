//! External-command regenerator.
//!
//! The command is a program followed by arguments. Every argument equal to
//! or containing `{}` has the placeholder replaced by the stale file's path;
//! when no argument carries a placeholder the path is appended as the last
//! argument. For example `python3 -m py_compile` becomes
//! `python3 -m py_compile /lib/pkg/mod.py`.

use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};

use super::{RegenError, Regenerator};

const PLACEHOLDER: &str = "{}";

/// Runs an external program for each stale file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRegenerator {
    program: String,
    args: Vec<String>,
}

impl CommandRegenerator {
    /// Create a regenerator from a program and its arguments.
    ///
    /// # Errors
    ///
    /// Returns [`RegenError::EmptyCommand`] if `argv` is empty or the
    /// program name is blank.
    pub fn new(argv: Vec<String>) -> Result<Self, RegenError> {
        let mut words = argv.into_iter();
        let program = words
            .next()
            .filter(|p| !p.trim().is_empty())
            .ok_or(RegenError::EmptyCommand)?;
        Ok(Self {
            program,
            args: words.collect(),
        })
    }

    /// Create a regenerator from a whitespace-separated command line.
    ///
    /// No shell quoting is interpreted.
    ///
    /// # Errors
    ///
    /// Returns [`RegenError::EmptyCommand`] for a blank command line.
    pub fn parse(command_line: &str) -> Result<Self, RegenError> {
        Self::new(command_line.split_whitespace().map(str::to_string).collect())
    }

    /// The program that will be run.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments passed for `path`, with placeholders substituted.
    #[must_use]
    pub fn args_for(&self, path: &Path) -> Vec<OsString> {
        let mut substituted = false;
        let mut args: Vec<OsString> = self
            .args
            .iter()
            .map(|arg| {
                if arg == PLACEHOLDER {
                    substituted = true;
                    path.as_os_str().to_os_string()
                } else if arg.contains(PLACEHOLDER) {
                    substituted = true;
                    OsString::from(arg.replace(PLACEHOLDER, &path.to_string_lossy()))
                } else {
                    OsString::from(arg)
                }
            })
            .collect();
        if !substituted {
            args.push(path.as_os_str().to_os_string());
        }
        args
    }
}

impl Regenerator for CommandRegenerator {
    fn regenerate(&self, path: &Path) -> Result<(), RegenError> {
        let output = Command::new(&self.program)
            .args(self.args_for(path))
            .stdin(Stdio::null())
            .output()
            .map_err(|source| RegenError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if output.status.success() {
            log::debug!("Regenerated {} via {}", path.display(), self.program);
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            log::warn!("{} reported: {}", self.program, stderr.trim());
        }
        Err(RegenError::Failed {
            path: path.to_path_buf(),
            status: output.status.to_string(),
        })
    }
}
