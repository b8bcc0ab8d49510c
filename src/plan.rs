//! Task Planner: turn a file classification into an ordered task list.
//!
//! Tasks are plain values carrying an operation variant plus a precomputed
//! one-line description; the executor dispatches on the variant. The order
//! in a plan is the mandatory execution order.

use crate::container::{Container, NodePath};
use crate::inspect::{FileState, classify, read_version};
use crate::normalize::discover_candidates;
use crate::version::FormatVersion;
use crate::Result;

/// One unit of migration work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskKind {
    /// Write a fresh UUID as the container identity.
    AssignIdentity,
    /// Split every legacy compound record into canonical form.
    NormalizeRecords { candidates: Vec<NodePath> },
    /// Overwrite the header version tuple with the target.
    BumpVersion { target: FormatVersion },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationTask {
    pub kind: TaskKind,
    description: String,
}

impl MigrationTask {
    pub fn assign_identity() -> Self {
        Self {
            kind: TaskKind::AssignIdentity,
            description: "Add a UUID to the file header".to_string(),
        }
    }

    pub fn normalize_records(candidates: Vec<NodePath>) -> Self {
        let description = format!("Update {} properties", candidates.len());
        Self {
            kind: TaskKind::NormalizeRecords { candidates },
            description,
        }
    }

    pub fn bump_version(target: FormatVersion) -> Self {
        let description = format!("Update the file format version to {target}");
        Self {
            kind: TaskKind::BumpVersion { target },
            description,
        }
    }

    /// One-line description shown to the operator before execution.
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// Ordered tasks for one file. Empty means the file is up to date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPlan {
    pub current: FormatVersion,
    pub target: FormatVersion,
    tasks: Vec<MigrationTask>,
}

impl MigrationPlan {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn tasks(&self) -> &[MigrationTask] {
        &self.tasks
    }
}

/// Compute the plan for `container` against `target`.
///
/// Structural upgrades fix the task order to identity, then normalization,
/// then the version bump. Identity comes first so stamping during
/// normalization runs against a container that already has one; the bump is
/// always last so every structural edit happens while the file still reports
/// the old version.
pub fn plan(container: &impl Container, target: &FormatVersion) -> Result<MigrationPlan> {
    let current = read_version(container)?;
    let tasks = match classify(container, target)? {
        FileState::UpToDate => Vec::new(),
        FileState::NeedsVersionBumpOnly => vec![MigrationTask::bump_version(target.clone())],
        FileState::NeedsStructuralUpgrade => vec![
            MigrationTask::assign_identity(),
            MigrationTask::normalize_records(discover_candidates(container)?),
            MigrationTask::bump_version(target.clone()),
        ],
    };
    Ok(MigrationPlan {
        current,
        target: target.clone(),
        tasks,
    })
}
