//! Attribute storage for per-file digests.
//!
//! The last-known-good digest of a file lives on the file itself, in a named
//! extended attribute. There is no side database: moving or deleting a file
//! moves or deletes its cache entry with it.
//!
//! # Architecture
//!
//! * [`AttributeStore`]: the get/set contract, scoped to one path at a time.
//! * [`filesystem`]: production store backed by filesystem extended attributes.
//! * [`memory`]: in-process store used by tests.
//!
//! # Failure classes
//!
//! An absent attribute is `Ok(None)`, never an error. Errors are split by
//! [`StoreError::is_fatal`] into configuration-level failures (the namespace
//! is unsupported, the name is invalid) that abort a run once, and per-file
//! failures that only skip the file concerned.
//!
//! Note that not every copy or archive tool carries extended attributes
//! along; files copied that way simply show up as stale again.

pub mod filesystem;
pub mod memory;

use std::path::{Path, PathBuf};

pub use filesystem::XattrStore;
pub use memory::MemoryStore;

/// Attribute name used when none is configured.
pub const DEFAULT_ATTR_NAME: &str = "user.io.hashstamp.digest";

/// Key-value access to one named attribute slot per file.
pub trait AttributeStore: Send + Sync {
    /// Read the attribute `name` from `path`.
    ///
    /// Returns `Ok(None)` when the attribute is not set.
    fn get(&self, path: &Path, name: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Write (or overwrite) the attribute `name` on `path`.
    ///
    /// File contents and all other attributes are left untouched.
    fn set(&self, path: &Path, name: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Check once that attributes named `name` can be used below `dir`.
    fn check_support(&self, dir: &Path, name: &str) -> Result<(), StoreError> {
        self.get(dir, name).map(|_| ())
    }
}

/// Errors raised by an [`AttributeStore`].
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// The filesystem does not support the attribute namespace.
    #[error("Extended attributes are not supported on the filesystem of {path}")]
    Unsupported {
        /// Path where support was checked
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The platform has no extended attribute support at all.
    #[error("Extended attributes are not supported on this platform")]
    PlatformUnsupported,

    /// The attribute name cannot be used.
    #[error("Invalid attribute name '{0}'")]
    InvalidName(String),

    /// The file vanished between discovery and attribute access.
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Permission was denied when accessing the attribute.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Any other I/O error.
    #[error("Attribute I/O error for {path}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Classify an I/O error raised while accessing attributes of `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        use std::io::ErrorKind;

        if is_unsupported(&error) {
            return Self::Unsupported {
                path: path.to_path_buf(),
                source: error,
            };
        }

        match error.kind() {
            ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }

    /// Whether this error invalidates the whole run rather than one file.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Unsupported { .. } | Self::PlatformUnsupported | Self::InvalidName(_)
        )
    }
}

fn is_unsupported(error: &std::io::Error) -> bool {
    if error.kind() == std::io::ErrorKind::Unsupported {
        return true;
    }

    #[cfg(unix)]
    {
        matches!(
            error.raw_os_error(),
            Some(code) if code == libc::ENOTSUP || code == libc::EOPNOTSUPP
        )
    }

    #[cfg(not(unix))]
    {
        false
    }
}

/// Reject names the kernel would refuse before touching any file.
pub(crate) fn validate_name(name: &str) -> Result<(), StoreError> {
    if name.is_empty() || name.contains('\0') || !name.contains('.') {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(())
}
