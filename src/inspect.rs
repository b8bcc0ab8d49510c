//! Version Inspector: classify a container's migration need.

use uuid::Uuid;

use crate::container::{AttrValue, Container, NodePath};
use crate::version::FormatVersion;
use crate::{Error, Result};

/// Root attribute holding the format version tuple.
pub const VERSION_ATTR: &str = "format_version";
/// Root attribute holding the container identity UUID.
pub const IDENTITY_ATTR: &str = "identity";

/// Classification of one container file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    /// Reported version is at or past the target; nothing to do.
    UpToDate,
    /// Structure is already current, only the version tag is stale.
    NeedsVersionBumpOnly,
    /// Legacy structure: identity and normalized records are both missing.
    NeedsStructuralUpgrade,
}

/// Read the header version tuple.
///
/// Fails with `Malformed` when the attribute is missing or not an integer
/// tuple.
pub fn read_version(container: &impl Container) -> Result<FormatVersion> {
    let attr = container
        .read_attr(&NodePath::root(), VERSION_ATTR)?
        .ok_or_else(|| Error::malformed(format!("missing root attribute `{VERSION_ATTR}`")))?;
    match attr {
        AttrValue::Ints(parts) => Ok(FormatVersion::new(parts)),
        other => Err(Error::malformed(format!(
            "root attribute `{VERSION_ATTR}` is not an integer tuple: {other:?}"
        ))),
    }
}

/// True when the root identity attribute is present and a syntactically
/// valid UUID.
pub fn has_valid_identity(container: &impl Container) -> Result<bool> {
    let Some(attr) = container.read_attr(&NodePath::root(), IDENTITY_ATTR)? else {
        return Ok(false);
    };
    Ok(attr
        .as_text()
        .is_some_and(|s| Uuid::parse_str(s).is_ok()))
}

/// Classify `container` against `target`.
///
/// When the version tag is stale we do not trust it for structure: identity
/// was introduced in the same revision as the normalized record format, so a
/// valid identity means the structural upgrade already happened and only the
/// tag needs correcting. That keeps classification re-entrant after a crash
/// between tasks.
pub fn classify(container: &impl Container, target: &FormatVersion) -> Result<FileState> {
    let version = read_version(container)?;
    if &version >= target {
        return Ok(FileState::UpToDate);
    }
    if has_valid_identity(container)? {
        Ok(FileState::NeedsVersionBumpOnly)
    } else {
        Ok(FileState::NeedsStructuralUpgrade)
    }
}
