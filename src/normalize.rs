//! Record Normalizer: split legacy compound records into canonical form.
//!
//! A legacy record bundles the value column with five auxiliary columns per
//! row. Normalization rewrites it as a simple record holding only the value
//! column and promotes auxiliary data that actually carries information to
//! either a scalar attribute or a `<path>.<kind>` sibling record.

use std::collections::BTreeSet;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use uuid::Uuid;

use crate::container::{
    AttrValue, Column, Container, METADATA_ROOT, NodePath, RowType, Value, ValueKind,
};
use crate::error::NormalizationError;
use crate::{Error, Result};

pub const VALUE_COLUMN: &str = "value";
pub const UNCERTAINTY_COLUMN: &str = "uncertainty";
/// String-like auxiliary columns, promoted whole when any row is non-empty.
pub const STRING_COLUMNS: [&str; 4] = ["reference", "filename", "encoder", "checksum"];

/// Normalization candidates: every record under the metadata root whose row
/// type is compound, in increasing path order.
///
/// The full list is collected before anything mutates, because mutation
/// invalidates traversal.
pub fn discover_candidates(container: &impl Container) -> Result<Vec<NodePath>> {
    let mut candidates: Vec<NodePath> = container
        .list_descendants(&NodePath::new(METADATA_ROOT))?
        .into_iter()
        .filter(|entry| entry.row_type.as_ref().is_some_and(RowType::is_compound))
        .map(|entry| entry.path)
        .collect();
    candidates.sort();
    Ok(candidates)
}

/// Rewrite every candidate record. Returns the number actually rewritten.
///
/// Aborts on the first malformed record with no rollback of records already
/// rewritten; the caller surfaces that state to the operator.
pub fn normalize_records(container: &mut impl Container, candidates: &[NodePath]) -> Result<usize> {
    let mut migrated = 0;
    for path in candidates {
        if normalize_one(container, path)? {
            migrated += 1;
        }
    }
    tracing::debug!(migrated, "normalized records");
    Ok(migrated)
}

fn normalize_one(container: &mut impl Container, path: &NodePath) -> Result<bool> {
    let record = container.open_record(path)?;
    if !record.row_type.is_compound() {
        // Already canonical; the file was likely re-planned after a crash.
        tracing::debug!(%path, "skipping non-compound record");
        return Ok(false);
    }

    let missing = |column: &'static str| -> Error {
        NormalizationError {
            record: path.clone(),
            column,
        }
        .into()
    };

    // Pull every column out in full before deleting anything.
    let values = record.column(VALUE_COLUMN).ok_or_else(|| missing(VALUE_COLUMN))?.to_vec();
    let uncertainty: Vec<f64> = record
        .column(UNCERTAINTY_COLUMN)
        .ok_or_else(|| missing(UNCERTAINTY_COLUMN))?
        .iter()
        .map(|v| v.as_f64().unwrap_or(0.0))
        .collect();
    let mut string_columns: Vec<(&'static str, Vec<String>)> = Vec::new();
    for field in STRING_COLUMNS {
        let rows = record
            .column(field)
            .ok_or_else(|| missing(field))?
            .iter()
            .map(|v| v.as_text().unwrap_or("").to_string())
            .collect();
        string_columns.push((field, rows));
    }

    let value_kind = record
        .row_type
        .field_kind(VALUE_COLUMN)
        .or_else(|| values.first().map(Value::kind))
        .unwrap_or(ValueKind::Float);

    // Replace the base record, keeping the value row type unchanged.
    container.delete_record(path)?;
    container.create_record(
        path,
        RowType::Simple(value_kind),
        vec![Column::new(VALUE_COLUMN, values)],
    )?;
    stamp(container, path)?;

    // Uncertainty is numeric: many distinct values become a sibling record,
    // a single repeated non-zero value becomes a scalar attribute, and an
    // all-zero column carries no information and is dropped.
    let distinct: BTreeSet<u64> = uncertainty.iter().map(|v| v.to_bits()).collect();
    if distinct.len() > 1 {
        let sibling = path.sibling(UNCERTAINTY_COLUMN);
        container.create_record(
            &sibling,
            RowType::Simple(ValueKind::Float),
            vec![Column::new(
                VALUE_COLUMN,
                uncertainty.iter().map(|v| Value::Float(*v)).collect(),
            )],
        )?;
        stamp(container, &sibling)?;
    } else if let Some(single) = uncertainty.iter().copied().find(|v| *v != 0.0) {
        container.write_attr(path, UNCERTAINTY_COLUMN, AttrValue::Float(single))?;
    }

    // String-like fields are all-or-nothing per column: one non-empty row
    // preserves the whole column, empty rows included, so row alignment with
    // the base record survives.
    for (field, rows) in string_columns {
        if rows.iter().any(|s| !s.is_empty()) {
            let sibling = path.sibling(field);
            container.create_record(
                &sibling,
                RowType::Simple(ValueKind::Text),
                vec![Column::new(
                    VALUE_COLUMN,
                    rows.into_iter().map(Value::Text).collect(),
                )],
            )?;
            stamp(container, &sibling)?;
        }
    }

    Ok(true)
}

/// Stamp a freshly created canonical record with its identity and timestamps.
fn stamp(container: &mut impl Container, path: &NodePath) -> Result<()> {
    let now = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|e| Error::malformed(format!("cannot format timestamp: {e}")))?;
    container.write_attr(path, "id", AttrValue::Text(Uuid::new_v4().to_string()))?;
    container.write_attr(path, "name", AttrValue::Text(path.leaf().to_string()))?;
    container.write_attr(path, "created_at", AttrValue::Text(now.clone()))?;
    container.write_attr(path, "updated_at", AttrValue::Text(now))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{ColumnDef, TreeContainer};

    fn legacy_row_type() -> RowType {
        RowType::Compound(vec![
            ColumnDef::new("value", ValueKind::Int),
            ColumnDef::new("uncertainty", ValueKind::Float),
            ColumnDef::new("reference", ValueKind::Text),
            ColumnDef::new("filename", ValueKind::Text),
            ColumnDef::new("encoder", ValueKind::Text),
            ColumnDef::new("checksum", ValueKind::Text),
        ])
    }

    fn text_column(name: &str, rows: &[&str]) -> Column {
        Column::new(
            name,
            rows.iter().map(|s| Value::Text(s.to_string())).collect(),
        )
    }

    fn add_legacy_record(
        c: &mut TreeContainer,
        path: &str,
        uncertainty: &[f64],
        reference: &[&str],
    ) {
        let n = uncertainty.len();
        let empty: Vec<&str> = vec![""; n];
        let columns = vec![
            Column::new("value", (0..n as i64).map(Value::Int).collect()),
            Column::new(
                "uncertainty",
                uncertainty.iter().map(|v| Value::Float(*v)).collect(),
            ),
            text_column("reference", reference),
            text_column("filename", &empty),
            text_column("encoder", &empty),
            text_column("checksum", &empty),
        ];
        c.create_record(&NodePath::new(path), legacy_row_type(), columns)
            .unwrap();
    }

    fn run_one(c: &mut TreeContainer, path: &str) -> usize {
        let candidates = discover_candidates(c).unwrap();
        assert!(candidates.contains(&NodePath::new(path)));
        normalize_records(c, &candidates).unwrap()
    }

    #[test]
    fn discovery_finds_only_compound_records_sorted() {
        let mut c = TreeContainer::new();
        add_legacy_record(&mut c, "/metadata/b/prop", &[0.0], &[""]);
        add_legacy_record(&mut c, "/metadata/a/prop", &[0.0], &[""]);
        c.create_record(
            &NodePath::new("/metadata/simple"),
            RowType::Simple(ValueKind::Int),
            vec![Column::new("value", vec![Value::Int(1)])],
        )
        .unwrap();

        let candidates = discover_candidates(&c).unwrap();
        let paths: Vec<_> = candidates.iter().map(|p| p.as_str()).collect();
        assert_eq!(paths, vec!["/metadata/a/prop", "/metadata/b/prop"]);
    }

    #[test]
    fn base_record_becomes_simple_with_same_value_kind() {
        let mut c = TreeContainer::new();
        add_legacy_record(&mut c, "/metadata/sec/prop", &[0.0, 0.0], &["", ""]);
        assert_eq!(run_one(&mut c, "/metadata/sec/prop"), 1);

        let rec = c.open_record(&NodePath::new("/metadata/sec/prop")).unwrap();
        assert_eq!(rec.row_type, RowType::Simple(ValueKind::Int));
        assert_eq!(
            rec.column("value"),
            Some(&[Value::Int(0), Value::Int(1)][..])
        );
    }

    #[test]
    fn new_record_is_stamped() {
        let mut c = TreeContainer::new();
        add_legacy_record(&mut c, "/metadata/sec/prop", &[0.0], &[""]);
        run_one(&mut c, "/metadata/sec/prop");

        let path = NodePath::new("/metadata/sec/prop");
        let id = c.read_attr(&path, "id").unwrap().unwrap();
        assert!(Uuid::parse_str(id.as_text().unwrap()).is_ok());
        assert_eq!(
            c.read_attr(&path, "name").unwrap(),
            Some(AttrValue::Text("prop".into()))
        );
        assert!(c.read_attr(&path, "created_at").unwrap().is_some());
        assert!(c.read_attr(&path, "updated_at").unwrap().is_some());
    }

    #[test]
    fn all_zero_uncertainty_is_dropped() {
        let mut c = TreeContainer::new();
        add_legacy_record(&mut c, "/metadata/p", &[0.0, 0.0, 0.0], &["", "", ""]);
        run_one(&mut c, "/metadata/p");

        let path = NodePath::new("/metadata/p");
        assert_eq!(c.read_attr(&path, "uncertainty").unwrap(), None);
        assert!(c.open_record(&path.sibling("uncertainty")).is_err());
    }

    #[test]
    fn repeated_nonzero_uncertainty_becomes_scalar_attribute() {
        let mut c = TreeContainer::new();
        add_legacy_record(&mut c, "/metadata/p", &[5.0, 5.0, 5.0], &["", "", ""]);
        run_one(&mut c, "/metadata/p");

        let path = NodePath::new("/metadata/p");
        assert_eq!(
            c.read_attr(&path, "uncertainty").unwrap(),
            Some(AttrValue::Float(5.0))
        );
        assert!(c.open_record(&path.sibling("uncertainty")).is_err());
    }

    #[test]
    fn distinct_uncertainty_becomes_sibling_record() {
        let mut c = TreeContainer::new();
        add_legacy_record(&mut c, "/metadata/p", &[1.0, 2.0, 2.0], &["", "", ""]);
        run_one(&mut c, "/metadata/p");

        let path = NodePath::new("/metadata/p");
        assert_eq!(c.read_attr(&path, "uncertainty").unwrap(), None);

        let sibling = c.open_record(&path.sibling("uncertainty")).unwrap();
        assert_eq!(sibling.row_type, RowType::Simple(ValueKind::Float));
        assert_eq!(
            sibling.column("value"),
            Some(&[Value::Float(1.0), Value::Float(2.0), Value::Float(2.0)][..])
        );
        // Siblings are canonical records in their own right.
        assert!(c.read_attr(&path.sibling("uncertainty"), "id").unwrap().is_some());
    }

    #[test]
    fn partially_empty_reference_keeps_whole_column() {
        let mut c = TreeContainer::new();
        add_legacy_record(&mut c, "/metadata/p", &[0.0, 0.0, 0.0], &["", "a", ""]);
        run_one(&mut c, "/metadata/p");

        let sibling = c
            .open_record(&NodePath::new("/metadata/p").sibling("reference"))
            .unwrap();
        assert_eq!(sibling.row_type, RowType::Simple(ValueKind::Text));
        assert_eq!(
            sibling.column("value"),
            Some(
                &[
                    Value::Text("".into()),
                    Value::Text("a".into()),
                    Value::Text("".into())
                ][..]
            )
        );
    }

    #[test]
    fn all_empty_string_columns_create_no_siblings() {
        let mut c = TreeContainer::new();
        add_legacy_record(&mut c, "/metadata/p", &[0.0, 0.0, 0.0], &["", "", ""]);
        run_one(&mut c, "/metadata/p");

        let path = NodePath::new("/metadata/p");
        for field in STRING_COLUMNS {
            assert!(c.open_record(&path.sibling(field)).is_err(), "{field}");
        }
    }

    #[test]
    fn missing_column_is_a_normalization_error() {
        let mut c = TreeContainer::new();
        let columns = vec![Column::new("value", vec![Value::Int(1)])];
        c.create_record(&NodePath::new("/metadata/p"), legacy_row_type(), columns)
            .unwrap();

        let candidates = discover_candidates(&c).unwrap();
        match normalize_records(&mut c, &candidates) {
            Err(Error::Normalization(e)) => {
                assert_eq!(e.record.as_str(), "/metadata/p");
                assert_eq!(e.column, "uncertainty");
            }
            other => panic!("expected NormalizationError, got {other:?}"),
        }
    }

    #[test]
    fn already_normalized_candidate_is_skipped() {
        let mut c = TreeContainer::new();
        c.create_record(
            &NodePath::new("/metadata/p"),
            RowType::Simple(ValueKind::Int),
            vec![Column::new("value", vec![Value::Int(1)])],
        )
        .unwrap();
        let migrated =
            normalize_records(&mut c, &[NodePath::new("/metadata/p")]).unwrap();
        assert_eq!(migrated, 0);
    }
}
