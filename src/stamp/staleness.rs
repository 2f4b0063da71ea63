//! Staleness decision.
//!
//! A pure comparison between the stored attribute value and a freshly
//! computed digest. There is no partial matching and no algorithm tag: any
//! byte difference in the hex text, including one caused by switching
//! algorithms, makes a file stale.

use crate::scanner::Digest;

/// Returns `true` if the stored value is absent or differs from `computed`.
#[must_use]
pub fn is_stale(stored: Option<&[u8]>, computed: &Digest) -> bool {
    stored.is_none_or(|value| value != computed.as_bytes())
}

/// Outcome of comparing a stored value with a computed digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Stored value matches; nothing to do.
    Fresh,
    /// No value stored yet (first encounter).
    Missing,
    /// A value is stored but differs.
    Changed,
}

impl Verdict {
    /// Compare `stored` with `computed`.
    #[must_use]
    pub fn decide(stored: Option<&[u8]>, computed: &Digest) -> Self {
        match stored {
            None => Self::Missing,
            Some(value) if value == computed.as_bytes() => Self::Fresh,
            Some(_) => Self::Changed,
        }
    }

    /// Whether the file needs regeneration.
    #[must_use]
    pub fn is_stale(self) -> bool {
        !matches!(self, Self::Fresh)
    }
}
