//! Path-level upgrade surface used by the CLI driver.
//!
//! Each call opens the file on its own; nothing is cached across calls, so
//! classification always reflects the file's current on-disk state.

use std::path::Path;

use crate::Result;
use crate::container::JsonContainer;
use crate::execute::execute;
use crate::inspect::{FileState, classify};
use crate::plan::{MigrationPlan, plan};
use crate::version::FormatVersion;

pub fn classify_file(path: &Path, target: &FormatVersion) -> Result<FileState> {
    let container = JsonContainer::open(path)?;
    classify(&container, target)
}

/// Compute the plan for one file. Empty plan means up to date.
pub fn plan_for(path: &Path, target: &FormatVersion) -> Result<MigrationPlan> {
    let container = JsonContainer::open(path)?;
    plan(&container, target)
}

/// Execute a previously computed plan against the file.
///
/// Confirmation gating is the caller's responsibility.
pub fn apply(path: &Path, migration: &MigrationPlan) -> Result<()> {
    let mut container = JsonContainer::open(path)?;
    execute(&mut container, migration)
}
