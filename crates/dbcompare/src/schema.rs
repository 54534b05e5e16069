//! Catalog metadata records.
//!
//! Everything here is a read-only snapshot of what `INFORMATION_SCHEMA`
//! reported for one catalog. Records are fetched once per run and never
//! mutated afterwards.

use std::borrow::Borrow;
use std::fmt;

/// Constraint type label used by `INFORMATION_SCHEMA.TABLE_CONSTRAINTS`
/// for primary keys.
pub const PRIMARY_KEY: &str = "PRIMARY KEY";

/// The name of a base table within one catalog.
///
/// Comparison is case-sensitive and exact, regardless of the collation of
/// the catalog it came from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TableName(String);

impl TableName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TableName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for TableName {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl AsRef<str> for TableName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for TableName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for TableName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for TableName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// One column of one table, as described by `INFORMATION_SCHEMA.COLUMNS`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub table_name: TableName,
    pub column_name: String,
    /// Declaration order within the table, starting at 1.
    pub ordinal_position: i32,
    pub column_default: Option<String>,
    pub is_nullable: bool,
    /// Base type name without qualifiers, e.g. `int`, `decimal`, `nvarchar`.
    pub data_type: String,
    /// `-1` means `(max)`.
    pub character_maximum_length: Option<i32>,
    pub numeric_precision: Option<i32>,
    pub numeric_scale: Option<i32>,
}

impl ColumnDescriptor {
    /// A non-nullable column with no length, precision or default.
    pub fn new(
        table_name: impl Into<TableName>,
        column_name: impl Into<String>,
        ordinal_position: i32,
        data_type: impl Into<String>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            column_name: column_name.into(),
            ordinal_position,
            column_default: None,
            is_nullable: false,
            data_type: data_type.into(),
            character_maximum_length: None,
            numeric_precision: None,
            numeric_scale: None,
        }
    }

    pub fn nullable(mut self, is_nullable: bool) -> Self {
        self.is_nullable = is_nullable;
        self
    }

    pub fn with_length(mut self, length: i32) -> Self {
        self.character_maximum_length = Some(length);
        self
    }

    pub fn with_precision(mut self, precision: i32, scale: i32) -> Self {
        self.numeric_precision = Some(precision);
        self.numeric_scale = Some(scale);
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.column_default = Some(default.into());
        self
    }
}

/// Parse the `IS_NULLABLE` flag. Only the exact value `YES` means nullable.
pub fn parse_nullable_flag(flag: &str) -> bool {
    flag == "YES"
}

/// A column taking part in a named table constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintInfo {
    pub column_name: String,
    /// E.g. `PRIMARY KEY`, `FOREIGN KEY`, `UNIQUE`, `CHECK`.
    pub constraint_type: String,
}

impl ConstraintInfo {
    pub fn new(column_name: impl Into<String>, constraint_type: impl Into<String>) -> Self {
        Self {
            column_name: column_name.into(),
            constraint_type: constraint_type.into(),
        }
    }

    pub fn primary_key(column_name: impl Into<String>) -> Self {
        Self::new(column_name, PRIMARY_KEY)
    }

    pub fn is_primary_key(&self) -> bool {
        self.constraint_type == PRIMARY_KEY
    }
}
