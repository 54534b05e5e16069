//! Schema diffing - find what the target catalog lacks compared to the source.
//!
//! Only additions are detected. Tables are matched by exact, case-sensitive
//! name; columns of a table present on both sides are matched by exact name
//! only, so a column whose type or nullability changed is not drift.
//!
//! Results always follow the order of the source input, which for catalog
//! data means table names ascending and columns by ordinal position.

use crate::{ColumnDescriptor, TableName};
use std::collections::HashSet;

/// Source tables with no same-named table in the target, in source order.
pub fn missing_tables<'a>(source: &'a [TableName], target: &[TableName]) -> Vec<&'a TableName> {
    let target_names: HashSet<&str> = target.iter().map(|t| t.as_str()).collect();

    source
        .iter()
        .filter(|t| !target_names.contains(t.as_str()))
        .collect()
}

/// Source tables that also exist in the target, in source order.
pub fn common_tables<'a>(source: &'a [TableName], target: &[TableName]) -> Vec<&'a TableName> {
    let target_names: HashSet<&str> = target.iter().map(|t| t.as_str()).collect();

    source
        .iter()
        .filter(|t| target_names.contains(t.as_str()))
        .collect()
}

/// Source columns with no same-named column in the target, in source order.
pub fn missing_columns<'a>(
    source: &'a [ColumnDescriptor],
    target: &[ColumnDescriptor],
) -> Vec<&'a ColumnDescriptor> {
    let target_names: HashSet<&str> = target.iter().map(|c| c.column_name.as_str()).collect();

    source
        .iter()
        .filter(|c| !target_names.contains(c.column_name.as_str()))
        .collect()
}
