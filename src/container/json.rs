//! JSON-file-backed container store.
//!
//! The whole node tree is read into memory on open; `commit` serializes it
//! back through a temp file in the same directory and persists atomically,
//! so an interrupted run leaves either the previous or the new tree, never a
//! torn file.

use std::fs;
use std::path::{Path, PathBuf};

use super::{AttrValue, Column, Container, NodeEntry, NodePath, Record, RowType, TreeContainer};
use crate::{Error, Result};

#[derive(Debug)]
pub struct JsonContainer {
    path: PathBuf,
    tree: TreeContainer,
}

impl JsonContainer {
    /// Open an existing container file.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let contents = fs::read_to_string(&path)?;
        let tree: TreeContainer = serde_json::from_str(&contents).map_err(|e| {
            Error::malformed(format!("cannot decode {}: {e}", path.display()))
        })?;
        Ok(Self { path, tree })
    }

    /// Start an empty container that will be written to `path` on commit.
    pub fn init(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            tree: TreeContainer::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Container for JsonContainer {
    fn read_attr(&self, path: &NodePath, key: &str) -> Result<Option<AttrValue>> {
        self.tree.read_attr(path, key)
    }

    fn write_attr(&mut self, path: &NodePath, key: &str, value: AttrValue) -> Result<()> {
        self.tree.write_attr(path, key, value)
    }

    fn open_record(&self, path: &NodePath) -> Result<Record> {
        self.tree.open_record(path)
    }

    fn create_record(
        &mut self,
        path: &NodePath,
        row_type: RowType,
        columns: Vec<Column>,
    ) -> Result<()> {
        self.tree.create_record(path, row_type, columns)
    }

    fn delete_record(&mut self, path: &NodePath) -> Result<()> {
        self.tree.delete_record(path)
    }

    fn list_descendants(&self, root: &NodePath) -> Result<Vec<NodeEntry>> {
        self.tree.list_descendants(root)
    }

    fn commit(&mut self) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let payload = serde_json::to_vec_pretty(&self.tree)
            .map_err(|e| Error::malformed(format!("cannot encode container tree: {e}")))?;
        let temp = tempfile::NamedTempFile::new_in(dir)?;
        fs::write(temp.path(), payload)?;
        temp.persist(&self.path).map_err(|e| e.error)?;
        self.tree.commit()
    }
}

#[cfg(test)]
mod tests {
    use super::super::{Value, ValueKind};
    use super::*;

    #[test]
    fn persists_across_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("data.cont");

        let mut c = JsonContainer::init(&file);
        c.write_attr(&NodePath::root(), "format_version", AttrValue::Ints(vec![1, 1, 1]))
            .unwrap();
        c.create_record(
            &NodePath::new("/metadata/sec/prop"),
            RowType::Simple(ValueKind::Float),
            vec![Column::new("value", vec![Value::Float(1.5)])],
        )
        .unwrap();
        c.commit().unwrap();

        let reopened = JsonContainer::open(&file).unwrap();
        assert_eq!(
            reopened.read_attr(&NodePath::root(), "format_version").unwrap(),
            Some(AttrValue::Ints(vec![1, 1, 1]))
        );
        let rec = reopened.open_record(&NodePath::new("/metadata/sec/prop")).unwrap();
        assert_eq!(rec.column("value"), Some(&[Value::Float(1.5)][..]));
    }

    #[test]
    fn uncommitted_writes_do_not_touch_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("data.cont");

        let mut c = JsonContainer::init(&file);
        c.write_attr(&NodePath::root(), "identity", AttrValue::Text("x".into()))
            .unwrap();
        assert!(!file.exists());
        c.commit().unwrap();
        assert!(file.exists());
    }

    #[test]
    fn undecodable_file_is_malformed() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("data.cont");
        std::fs::write(&file, b"not json").unwrap();
        match JsonContainer::open(&file) {
            Err(Error::Malformed { .. }) => {}
            other => panic!("expected Malformed, got {other:?}"),
        }
    }
}
