//! Extended-attribute backed [`AttributeStore`].

use std::path::Path;

use super::{validate_name, AttributeStore, StoreError};

/// Stores digests in filesystem extended attributes.
///
/// Symlinks are never followed here; the walker hands over resolved paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct XattrStore;

impl XattrStore {
    /// Create a new store.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn check(name: &str) -> Result<(), StoreError> {
        if !xattr::SUPPORTED_PLATFORM {
            return Err(StoreError::PlatformUnsupported);
        }
        validate_name(name)
    }
}

impl AttributeStore for XattrStore {
    fn get(&self, path: &Path, name: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Self::check(name)?;
        xattr::get(path, name).map_err(|e| StoreError::from_io(path, e))
    }

    fn set(&self, path: &Path, name: &str, value: &[u8]) -> Result<(), StoreError> {
        Self::check(name)?;
        xattr::set(path, name, value).map_err(|e| StoreError::from_io(path, e))
    }

    fn check_support(&self, dir: &Path, name: &str) -> Result<(), StoreError> {
        self.get(dir, name).map(|_| {
            log::debug!("Extended attributes usable under {}", dir.display());
        })
    }
}
