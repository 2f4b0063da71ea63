//! Whole-file digests with a selectable algorithm.
//!
//! # Overview
//!
//! [`Hasher`] reads a file in a single contiguous read and digests it with
//! the configured [`HashAlgorithm`]. The result is a [`Digest`] carrying the
//! lowercase hex form, which is exactly what gets stored on the file.
//!
//! Digests carry no version tag: a digest produced with one algorithm never
//! equals a stored value produced with another, so changing algorithms makes
//! every file stale exactly once.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use sha2::{Digest as _, Sha224, Sha256, Sha384, Sha512};

use super::HashError;

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HashAlgorithm {
    /// SHA-224
    Sha224,
    /// SHA-256 (default)
    #[default]
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
    /// BLAKE3 (256-bit output)
    Blake3,
}

impl HashAlgorithm {
    /// Every supported algorithm, in display order.
    pub const ALL: [HashAlgorithm; 5] = [
        Self::Sha224,
        Self::Sha256,
        Self::Sha384,
        Self::Sha512,
        Self::Blake3,
    ];

    /// Canonical identifier, as accepted by `--hash`.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
            Self::Blake3 => "blake3",
        }
    }

    /// Length of the raw digest in bytes.
    #[must_use]
    pub fn output_len(self) -> usize {
        match self {
            Self::Sha224 => 28,
            Self::Sha256 | Self::Blake3 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    fn compute(self, data: &[u8]) -> String {
        match self {
            Self::Sha224 => hex::encode(Sha224::digest(data)),
            Self::Sha256 => hex::encode(Sha256::digest(data)),
            Self::Sha384 => hex::encode(Sha384::digest(data)),
            Self::Sha512 => hex::encode(Sha512::digest(data)),
            Self::Blake3 => blake3::hash(data).to_hex().to_string(),
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when an algorithm identifier is not recognised.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown hash algorithm '{name}'{}", suggestion_suffix(.suggestion))]
pub struct UnknownAlgorithm {
    /// The identifier that was given
    pub name: String,
    /// Closest supported identifier, if any is reasonably close
    pub suggestion: Option<&'static str>,
}

fn suggestion_suffix(suggestion: &Option<&'static str>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean '{s}'?)"),
        None => format!(
            " (supported: {})",
            HashAlgorithm::ALL.map(HashAlgorithm::name).join(", ")
        ),
    }
}

impl FromStr for HashAlgorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_lowercase();

        Self::ALL
            .into_iter()
            .find(|alg| alg.name() == normalized)
            .ok_or_else(|| UnknownAlgorithm {
                name: s.to_string(),
                suggestion: Self::ALL
                    .into_iter()
                    .map(|alg| (alg.name(), strsim::levenshtein(alg.name(), &normalized)))
                    .filter(|(_, distance)| *distance <= 2)
                    .min_by_key(|(_, distance)| *distance)
                    .map(|(name, _)| name),
            })
    }
}

/// A content digest in lowercase hex form.
///
/// Two digests are equal iff their hex text is byte-equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    hex: String,
}

impl Digest {
    /// Lowercase hex text.
    #[must_use]
    pub fn as_hex(&self) -> &str {
        &self.hex
    }

    /// Hex text as bytes, the form written to the attribute store.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.hex.as_bytes()
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hex)
    }
}

/// File hasher for a fixed algorithm.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hasher {
    algorithm: HashAlgorithm,
}

impl Hasher {
    /// Create a hasher for the given algorithm.
    #[must_use]
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    /// The algorithm this hasher uses.
    #[must_use]
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Digest an in-memory buffer.
    #[must_use]
    pub fn digest_bytes(&self, data: &[u8]) -> Digest {
        Digest {
            hex: self.algorithm.compute(data),
        }
    }

    /// Digest the complete contents of a file.
    ///
    /// The file is read whole; there is no incremental state between calls.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file cannot be opened or read. Callers
    /// treat this as a per-file skip, never as a fatal condition.
    pub fn digest_file(&self, path: &Path) -> Result<Digest, HashError> {
        let data = std::fs::read(path).map_err(|e| HashError::from_io(path, e))?;
        log::trace!("Read {} bytes from {}", data.len(), path.display());
        Ok(self.digest_bytes(&data))
    }
}
