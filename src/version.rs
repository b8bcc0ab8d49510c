//! FormatVersion: the container's on-disk format revision.
//!
//! Stored in the file header as an ordered tuple of non-negative integers.
//! Comparison is lexicographic, so `1.1.1 < 1.2.0 < 1.2.1`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Ordered version tuple, e.g. `1.2.0`.
///
/// Derived `Ord` on the inner `Vec` is lexicographic, which is exactly the
/// comparison the header contract requires.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormatVersion(Vec<u32>);

impl FormatVersion {
    /// Newest revision this library writes.
    pub fn current() -> Self {
        Self(vec![1, 2, 0])
    }

    pub fn new(parts: impl Into<Vec<u32>>) -> Self {
        Self(parts.into())
    }

    pub fn parts(&self) -> &[u32] {
        &self.0
    }
}

impl From<&[u32]> for FormatVersion {
    fn from(parts: &[u32]) -> Self {
        Self(parts.to_vec())
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for part in &self.0 {
            if !first {
                write!(f, ".")?;
            }
            write!(f, "{part}")?;
            first = false;
        }
        Ok(())
    }
}

impl fmt::Debug for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FormatVersion({self})")
    }
}
