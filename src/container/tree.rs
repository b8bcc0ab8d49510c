//! In-memory container tree.
//!
//! Backing structure for tests and for the JSON file store. Children live in
//! a `BTreeMap`, so traversal order is deterministic without extra sorting.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{AttrValue, Column, Container, NodeEntry, NodePath, Record, RowType};
use crate::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct Dataset {
    pub row_type: RowType,
    pub columns: Vec<Column>,
}

/// One node: attributes, child nodes, and optionally a dataset.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(super) struct Node {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attrs: BTreeMap<String, AttrValue>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub children: BTreeMap<String, Node>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dataset: Option<Dataset>,
}

/// In-memory [`Container`].
///
/// Counts commits so tests can assert how many write transactions a plan
/// opened.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TreeContainer {
    root: Node,
    #[serde(skip)]
    commits: usize,
}

impl TreeContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of commits since construction.
    pub fn commits(&self) -> usize {
        self.commits
    }

    fn node(&self, path: &NodePath) -> Option<&Node> {
        let mut cur = &self.root;
        for seg in path.segments() {
            cur = cur.children.get(seg)?;
        }
        Some(cur)
    }

    fn node_mut(&mut self, path: &NodePath) -> Option<&mut Node> {
        let mut cur = &mut self.root;
        for seg in path.segments() {
            cur = cur.children.get_mut(seg)?;
        }
        Some(cur)
    }

    /// Walk to `path`, creating intermediate group nodes as needed.
    fn ensure_node(&mut self, path: &NodePath) -> &mut Node {
        let mut cur = &mut self.root;
        for seg in path.segments() {
            cur = cur.children.entry(seg.to_string()).or_default();
        }
        cur
    }

    fn visit(node: &Node, path: &NodePath, out: &mut Vec<NodeEntry>) {
        for (name, child) in &node.children {
            let child_path = path.join(name);
            out.push(NodeEntry {
                path: child_path.clone(),
                row_type: child.dataset.as_ref().map(|d| d.row_type.clone()),
            });
            Self::visit(child, &child_path, out);
        }
    }
}

impl Container for TreeContainer {
    fn read_attr(&self, path: &NodePath, key: &str) -> Result<Option<AttrValue>> {
        match self.node(path) {
            Some(node) => Ok(node.attrs.get(key).cloned()),
            None => Err(Error::malformed(format!("no node at {path}"))),
        }
    }

    fn write_attr(&mut self, path: &NodePath, key: &str, value: AttrValue) -> Result<()> {
        let node = self
            .node_mut(path)
            .ok_or_else(|| Error::malformed(format!("no node at {path}")))?;
        node.attrs.insert(key.to_string(), value);
        Ok(())
    }

    fn open_record(&self, path: &NodePath) -> Result<Record> {
        let node = self
            .node(path)
            .ok_or_else(|| Error::malformed(format!("no node at {path}")))?;
        let dataset = node
            .dataset
            .as_ref()
            .ok_or_else(|| Error::malformed(format!("{path} is a group, not a record")))?;
        Ok(Record {
            row_type: dataset.row_type.clone(),
            columns: dataset.columns.clone(),
        })
    }

    fn create_record(
        &mut self,
        path: &NodePath,
        row_type: RowType,
        columns: Vec<Column>,
    ) -> Result<()> {
        let node = self.ensure_node(path);
        if node.dataset.is_some() {
            return Err(Error::malformed(format!("record already exists at {path}")));
        }
        node.dataset = Some(Dataset { row_type, columns });
        Ok(())
    }

    fn delete_record(&mut self, path: &NodePath) -> Result<()> {
        let leaf = path.leaf().to_string();
        let parent = NodePath::new(
            path.as_str()
                .rsplit_once('/')
                .map(|(head, _)| head)
                .unwrap_or(""),
        );
        let parent_node = self
            .node_mut(&parent)
            .ok_or_else(|| Error::malformed(format!("no node at {path}")))?;
        parent_node
            .children
            .remove(&leaf)
            .ok_or_else(|| Error::malformed(format!("no node at {path}")))?;
        Ok(())
    }

    fn list_descendants(&self, root: &NodePath) -> Result<Vec<NodeEntry>> {
        let mut out = Vec::new();
        if let Some(node) = self.node(root) {
            Self::visit(node, root, &mut out);
        }
        Ok(out)
    }

    fn commit(&mut self) -> Result<()> {
        self.commits += 1;
        Ok(())
    }
}
