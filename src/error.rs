use thiserror::Error;

use crate::container::NodePath;

/// What we know about on-disk side effects when an error is returned.
///
/// Planning is read-only, so planning errors never touch the file. A
/// normalization failure happens mid-rewrite and definitely leaves the file
/// partially migrated; the driver uses this to warn the operator loudly.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Effect {
    /// Definitely no side effects occurred.
    None,
    /// Side effects definitely occurred.
    Some,
    /// We don't know if side effects occurred.
    Unknown,
}

impl Effect {
    pub fn as_str(self) -> &'static str {
        match self {
            Effect::None => "none",
            Effect::Some => "some",
            Effect::Unknown => "unknown",
        }
    }
}

/// A legacy record that cannot be split because a required column is absent.
///
/// Treated as data corruption: the task aborts and the file may be left with
/// some records already rewritten and others untouched.
#[derive(Error, Debug)]
#[error("record {record} is missing expected column `{column}`")]
pub struct NormalizationError {
    pub record: NodePath,
    pub column: &'static str,
}

/// Crate-level error.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The container header or tree is unreadable or nonsensical.
    #[error("malformed container: {reason}")]
    Malformed { reason: String },

    #[error(transparent)]
    Normalization(#[from] NormalizationError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// Aggregate failure over a multi-file run; per-file errors were already
    /// reported.
    #[error("{failed} of {total} files failed")]
    Partial { failed: usize, total: usize },
}

impl Error {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Error::Malformed {
            reason: reason.into(),
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            // Raised while classifying or planning, both read-only.
            Error::Malformed { .. } => Effect::None,
            // Raised inside the per-record rewrite loop.
            Error::Normalization(_) => Effect::Some,
            Error::Io(_) => Effect::Unknown,
            Error::Partial { .. } => Effect::Unknown,
        }
    }
}
