#![forbid(unsafe_code)]

#[cfg(feature = "cli")]
pub mod cli;
pub mod container;
pub mod error;
pub mod execute;
pub mod inspect;
pub mod normalize;
pub mod plan;
pub mod upgrade;
pub mod version;

pub use error::{Effect, Error, NormalizationError};
pub type Result<T> = std::result::Result<T, Error>;

// Re-export the commonly used types at crate root for convenience
pub use crate::container::{
    AttrValue, Column, ColumnDef, Container, JsonContainer, NodeEntry, NodePath, Record, RowType,
    TreeContainer, Value, ValueKind,
};
pub use crate::inspect::FileState;
pub use crate::plan::{MigrationPlan, MigrationTask, TaskKind};
pub use crate::version::FormatVersion;
