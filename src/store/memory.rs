//! In-process [`AttributeStore`] for tests and embedding.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::{validate_name, AttributeStore, StoreError};

/// Attribute store held in memory, keyed by path and attribute name.
///
/// Can be configured to behave like a filesystem without attribute support,
/// or to refuse writes for selected paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<(PathBuf, String), Vec<u8>>>,
    failing_writes: Mutex<HashSet<PathBuf>>,
    unsupported: bool,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that reports the attribute namespace as unsupported.
    #[must_use]
    pub fn unsupported() -> Self {
        Self {
            unsupported: true,
            ..Self::default()
        }
    }

    /// Make every subsequent `set` on `path` fail with an I/O error.
    pub fn fail_writes_for(&self, path: &Path) {
        self.failing_writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.to_path_buf());
    }

    /// Read a value directly, bypassing error simulation.
    #[must_use]
    pub fn value(&self, path: &Path, name: &str) -> Option<Vec<u8>> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(path.to_path_buf(), name.to_string()))
            .cloned()
    }

    /// Number of stored values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no value is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn unsupported_error(&self, path: &Path) -> StoreError {
        StoreError::Unsupported {
            path: path.to_path_buf(),
            source: std::io::Error::from(std::io::ErrorKind::Unsupported),
        }
    }
}

impl AttributeStore for MemoryStore {
    fn get(&self, path: &Path, name: &str) -> Result<Option<Vec<u8>>, StoreError> {
        validate_name(name)?;
        if self.unsupported {
            return Err(self.unsupported_error(path));
        }
        Ok(self.value(path, name))
    }

    fn set(&self, path: &Path, name: &str, value: &[u8]) -> Result<(), StoreError> {
        validate_name(name)?;
        if self.unsupported {
            return Err(self.unsupported_error(path));
        }
        let refused = self
            .failing_writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(path);
        if refused {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::other("simulated write failure"),
            });
        }
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((path.to_path_buf(), name.to_string()), value.to_vec());
        Ok(())
    }
}
