//! Container Accessor boundary.
//!
//! The engine never touches storage directly; everything goes through the
//! [`Container`] trait: attribute get/set, whole-record read, record
//! delete/create, and a typed depth-first traversal that reports each node's
//! row type. Two implementations live here: an in-memory tree and a
//! JSON-file-backed store used by the CLI.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Result;

mod json;
mod tree;

pub use json::JsonContainer;
pub use tree::TreeContainer;

/// Path under which all metadata records live.
pub const METADATA_ROOT: &str = "/metadata";

// =============================================================================
// Paths
// =============================================================================

/// Absolute, slash-separated path to a node inside a container.
///
/// The root is `/`. Auxiliary siblings append a dotted suffix to the leaf
/// name (`/metadata/sec/prop` -> `/metadata/sec/prop.uncertainty`).
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodePath(String);

impl NodePath {
    pub fn root() -> Self {
        Self("/".to_string())
    }

    pub fn new(path: impl Into<String>) -> Self {
        let raw = path.into();
        if raw.is_empty() || raw == "/" {
            return Self::root();
        }
        let trimmed = raw.trim_end_matches('/');
        if trimmed.starts_with('/') {
            Self(trimmed.to_string())
        } else {
            Self(format!("/{trimmed}"))
        }
    }

    pub fn is_root(&self) -> bool {
        self.0 == "/"
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Child path. `name` must be a single segment.
    pub fn join(&self, name: &str) -> Self {
        if self.is_root() {
            Self(format!("/{name}"))
        } else {
            Self(format!("{}/{name}", self.0))
        }
    }

    /// Sibling carrying an auxiliary column: `<path>.<kind>`.
    pub fn sibling(&self, kind: &str) -> Self {
        Self(format!("{}.{kind}", self.0))
    }

    /// Final path segment; empty for the root.
    pub fn leaf(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or("")
    }

    /// Path segments, root excluded.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodePath({:?})", self.0)
    }
}

// =============================================================================
// Values and row types
// =============================================================================

/// Element type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    Text,
}

/// One cell of a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Value {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Text(_) => ValueKind::Text,
        }
    }

    /// Numeric view; `None` for text.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// A named column definition inside a compound row type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    pub kind: ValueKind,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Row shape of a record dataset.
///
/// Legacy records are `Compound` (value plus auxiliary columns bundled per
/// row); canonical records are `Simple` (value column only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowType {
    Simple(ValueKind),
    Compound(Vec<ColumnDef>),
}

impl RowType {
    pub fn is_compound(&self) -> bool {
        matches!(self, RowType::Compound(_))
    }

    /// Element kind of a named field in a compound row type.
    pub fn field_kind(&self, name: &str) -> Option<ValueKind> {
        match self {
            RowType::Simple(_) => None,
            RowType::Compound(defs) => defs.iter().find(|d| d.name == name).map(|d| d.kind),
        }
    }
}

/// A named column with its per-row values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Full in-memory read of one record dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub row_type: RowType,
    pub columns: Vec<Column>,
}

impl Record {
    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }
}

/// One node reported by traversal: its path, and its row type if it is a
/// record (`None` for groups).
#[derive(Debug, Clone, PartialEq)]
pub struct NodeEntry {
    pub path: NodePath,
    pub row_type: Option<RowType>,
}

/// Attribute value on the root or on a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttrValue {
    Text(String),
    Float(f64),
    Ints(Vec<u32>),
}

impl AttrValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_ints(&self) -> Option<&[u32]> {
        match self {
            AttrValue::Ints(v) => Some(v),
            _ => None,
        }
    }
}

// =============================================================================
// Accessor contract
// =============================================================================

/// Narrow storage boundary the migration engine runs against.
///
/// Writes accumulate in memory until [`Container::commit`]; the executor
/// commits exactly once per task, so a crash between tasks leaves only the
/// completed tasks' effects on disk.
pub trait Container {
    fn read_attr(&self, path: &NodePath, key: &str) -> Result<Option<AttrValue>>;

    fn write_attr(&mut self, path: &NodePath, key: &str, value: AttrValue) -> Result<()>;

    /// Full column read of the record at `path`.
    fn open_record(&self, path: &NodePath) -> Result<Record>;

    /// Creates missing intermediate groups.
    fn create_record(&mut self, path: &NodePath, row_type: RowType, columns: Vec<Column>)
    -> Result<()>;

    fn delete_record(&mut self, path: &NodePath) -> Result<()>;

    /// Depth-first, deterministic traversal below `root`, groups and records
    /// both. A missing root yields an empty list.
    fn list_descendants(&self, root: &NodePath) -> Result<Vec<NodeEntry>>;

    /// Durably commit all writes since the previous commit.
    fn commit(&mut self) -> Result<()>;
}
