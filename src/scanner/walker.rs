//! Directory walker implementation using walkdir.
//!
//! # Overview
//!
//! This module provides the [`Walker`] struct for enumerating candidate
//! files under a root directory. Traversal is single-threaded and fully
//! deterministic:
//!
//! - Directories are visited top-down.
//! - Within a directory, files come first in ascending byte order of their
//!   names, then subdirectories in ascending order.
//!
//! A fixed directory snapshot therefore always produces the same sequence,
//! which keeps logs reproducible.
//!
//! # Symlinks
//!
//! With `follow_symlinks` on, a file reachable under several names (a link
//! to a sibling, or a linked directory) is yielded once, under the first
//! name the walk reaches.
//!
//! # Error handling
//!
//! Unreadable directories and broken entries are yielded as [`ScanError`]
//! items and iteration continues with their siblings; a failure to descend
//! into one subtree never aborts the walk.
//!
//! # Example
//!
//! ```no_run
//! use hashstamp::scanner::{Walker, WalkerConfig};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/usr/lib/python3"), WalkerConfig::default());
//! walker.validate_root().expect("root must be a readable directory");
//! for entry in walker.walk().filter_map(Result::ok) {
//!     println!("{}", entry.path.display());
//! }
//! ```

use std::cmp::Ordering as CmpOrdering;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use walkdir::{DirEntry, WalkDir};

use super::{FileEntry, ScanError, WalkerConfig};

/// Directory walker for deterministic file discovery.
#[derive(Debug)]
pub struct Walker {
    /// Root path to walk
    root: PathBuf,
    /// Walker configuration
    config: WalkerConfig,
    /// Optional shutdown flag for graceful termination
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl Walker {
    /// Create a new walker for the given path.
    #[must_use]
    pub fn new(path: &Path, config: WalkerConfig) -> Self {
        Self {
            root: path.to_path_buf(),
            config,
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    ///
    /// When the flag is set to `true`, the walker stops yielding entries.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Check if shutdown has been requested.
    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Check that the root exists, is a directory, and can be listed.
    ///
    /// # Errors
    ///
    /// A root that fails this check is a configuration-level error: the
    /// caller should abort instead of walking.
    pub fn validate_root(&self) -> Result<(), ScanError> {
        let metadata =
            std::fs::metadata(&self.root).map_err(|e| ScanError::from_io(&self.root, e))?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory(self.root.clone()));
        }
        std::fs::read_dir(&self.root).map_err(|e| ScanError::from_io(&self.root, e))?;
        Ok(())
    }

    /// Walk the directory tree, yielding candidate files.
    ///
    /// The iterator is lazy and can be restarted by calling `walk` again.
    /// Errors are yielded as [`ScanError`] values rather than stopping
    /// iteration. No path is yielded twice within one walk.
    pub fn walk(&self) -> impl Iterator<Item = Result<FileEntry, ScanError>> + '_ {
        let follow = self.config.follow_symlinks;
        let mut seen: HashSet<PathBuf> = HashSet::new();

        WalkDir::new(&self.root)
            .follow_links(self.config.follow_symlinks)
            .sort_by(files_then_dirs)
            .into_iter()
            .take_while(move |_| {
                if self.is_shutdown_requested() {
                    log::debug!("Walker: Shutdown requested, stopping iteration");
                    false
                } else {
                    true
                }
            })
            .filter_map(move |entry_result| match entry_result {
                Ok(entry) => self.process_entry(entry),
                Err(e) => Some(Err(self.handle_walk_error(e))),
            })
            .filter(move |item| match item {
                Ok(file) if follow => first_visit(&mut seen, &file.path),
                _ => true,
            })
    }

    /// Turn a raw directory entry into a candidate file, if it is one.
    fn process_entry(&self, entry: DirEntry) -> Option<Result<FileEntry, ScanError>> {
        let file_type = entry.file_type();

        if file_type.is_dir() {
            return None;
        }

        if file_type.is_symlink() {
            // Only reachable when links are not followed.
            log::trace!("Skipping symlink: {}", entry.path().display());
            return None;
        }

        if !file_type.is_file() {
            log::trace!("Skipping special file: {}", entry.path().display());
            return None;
        }

        let name = entry.file_name().to_string_lossy();
        if !self.config.matches_suffix(&name) {
            return None;
        }

        let metadata = match entry.metadata() {
            Ok(m) => m,
            Err(e) => return Some(Err(self.handle_walk_error(e))),
        };

        let size = metadata.len();
        if let Some(max) = self.config.max_size {
            if size > max {
                log::debug!(
                    "Skipping file over size limit ({} > {}): {}",
                    size,
                    max,
                    entry.path().display()
                );
                return None;
            }
        }

        let path = if entry.path_is_symlink() {
            // Attributes belong to the link target, so resolve it.
            match std::fs::canonicalize(entry.path()) {
                Ok(target) => target,
                Err(e) => return Some(Err(ScanError::from_io(entry.path(), e))),
            }
        } else {
            entry.into_path()
        };

        Some(Ok(FileEntry { path, size }))
    }

    /// Convert a walkdir error into a [`ScanError`].
    fn handle_walk_error(&self, error: walkdir::Error) -> ScanError {
        let path = error
            .path()
            .map_or_else(|| self.root.clone(), Path::to_path_buf);

        if error.loop_ancestor().is_some() {
            log::debug!("Symlink loop at {}", path.display());
            return ScanError::SymlinkLoop(path);
        }

        log::debug!("Walker error for {}: {}", path.display(), error);
        match error.into_io_error() {
            Some(io) => ScanError::from_io(&path, io),
            None => ScanError::Io {
                path,
                source: std::io::Error::other("walk error"),
            },
        }
    }
}

/// Record the real file behind `path`; false if it was already yielded.
fn first_visit(seen: &mut HashSet<PathBuf>, path: &Path) -> bool {
    let key = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    if seen.insert(key) {
        true
    } else {
        log::debug!("Already visited through another name: {}", path.display());
        false
    }
}

/// Order siblings so that files precede directories, each group sorted by name.
fn files_then_dirs(a: &DirEntry, b: &DirEntry) -> CmpOrdering {
    let a_dir = a.file_type().is_dir();
    let b_dir = b.file_type().is_dir();
    a_dir
        .cmp(&b_dir)
        .then_with(|| a.file_name().cmp(b.file_name()))
}
