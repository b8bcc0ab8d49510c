//! Migration Executor: apply a plan, one write transaction per task.

use uuid::Uuid;

use crate::container::{AttrValue, Container, NodePath};
use crate::inspect::{IDENTITY_ATTR, VERSION_ATTR};
use crate::normalize::normalize_records;
use crate::plan::{MigrationPlan, TaskKind};
use crate::Result;

/// Run every task of `plan` in order.
///
/// Each task ends in its own commit, so a crash between tasks leaves only
/// the completed tasks' effects on disk and re-classification resumes
/// correctly. No task rolls back a prior task's effect on failure. An empty
/// plan commits nothing.
pub fn execute(container: &mut impl Container, plan: &MigrationPlan) -> Result<()> {
    for task in plan.tasks() {
        tracing::debug!(task = task.description(), "executing");
        match &task.kind {
            TaskKind::AssignIdentity => {
                container.write_attr(
                    &NodePath::root(),
                    IDENTITY_ATTR,
                    AttrValue::Text(Uuid::new_v4().to_string()),
                )?;
            }
            TaskKind::NormalizeRecords { candidates } => {
                normalize_records(container, candidates)?;
            }
            TaskKind::BumpVersion { target } => {
                container.write_attr(
                    &NodePath::root(),
                    VERSION_ATTR,
                    AttrValue::Ints(target.parts().to_vec()),
                )?;
            }
        }
        container.commit()?;
    }
    Ok(())
}
