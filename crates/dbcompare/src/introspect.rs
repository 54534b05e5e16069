//! Reading table, column and constraint metadata from a catalog.
//!
//! [`Catalog`] is the seam between the diff logic and a live server. The
//! SQL Server implementation lives in [`crate::mssql`]; [`StaticCatalog`]
//! serves fixed fixtures.

use crate::{ColumnDescriptor, ConstraintInfo, Error, Result, TableName, parse_nullable_flag};
use indexmap::IndexMap;
use std::collections::HashSet;
use tiberius::Row;

/// Base tables of one catalog, ascending by name.
pub const TABLES_SQL: &str = "SELECT TABLE_NAME \
     FROM INFORMATION_SCHEMA.TABLES \
     WHERE TABLE_TYPE = 'BASE TABLE' AND TABLE_CATALOG = @P1 \
     ORDER BY TABLE_NAME ASC";

/// Columns of one table, by ordinal position. Integer columns are cast to
/// `int` because the views mix `tinyint`, `smallint` and `int`.
pub const COLUMNS_SQL: &str = "SELECT TABLE_NAME, COLUMN_NAME, \
     CAST(ORDINAL_POSITION AS int) AS ORDINAL_POSITION, \
     COLUMN_DEFAULT, IS_NULLABLE, DATA_TYPE, \
     CAST(CHARACTER_MAXIMUM_LENGTH AS int) AS CHARACTER_MAXIMUM_LENGTH, \
     CAST(NUMERIC_PRECISION AS int) AS NUMERIC_PRECISION, \
     CAST(NUMERIC_SCALE AS int) AS NUMERIC_SCALE \
     FROM INFORMATION_SCHEMA.COLUMNS \
     WHERE TABLE_CATALOG = @P1 AND TABLE_NAME = @P2 \
     ORDER BY ORDINAL_POSITION ASC";

/// Columns of one table paired with the type of each constraint they take
/// part in.
pub const CONSTRAINTS_SQL: &str = "SELECT ccu.COLUMN_NAME, tc.CONSTRAINT_TYPE \
     FROM INFORMATION_SCHEMA.CONSTRAINT_COLUMN_USAGE ccu \
     INNER JOIN INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc \
     ON ccu.CONSTRAINT_NAME = tc.CONSTRAINT_NAME \
     AND ccu.CONSTRAINT_SCHEMA = tc.CONSTRAINT_SCHEMA \
     AND ccu.TABLE_NAME = tc.TABLE_NAME \
     WHERE ccu.TABLE_CATALOG = @P1 AND ccu.TABLE_NAME = @P2";

/// Read-only access to the schema metadata of one catalog.
///
/// Methods take `&mut self` because a TDS connection serves one request at
/// a time.
#[allow(async_fn_in_trait)]
pub trait Catalog {
    /// Name of the catalog (database) being read.
    fn database(&self) -> &str;

    /// Base tables, excluding views, ascending by name. Empty for a catalog
    /// without tables.
    async fn tables(&mut self) -> Result<Vec<TableName>>;

    /// Columns of `table` by ordinal position. Empty if the table is unknown.
    async fn columns(&mut self, table: &TableName) -> Result<Vec<ColumnDescriptor>>;

    /// Constraint participation of the columns of `table`.
    async fn constraints(&mut self, table: &TableName) -> Result<Vec<ConstraintInfo>>;
}

fn row_error(column: &'static str, message: impl Into<String>) -> Error {
    Error::Row {
        column,
        message: message.into(),
    }
}

fn required_str<'a>(row: &'a Row, column: &'static str) -> Result<&'a str> {
    row.try_get::<&str, _>(column)
        .map_err(|e| row_error(column, e.to_string()))?
        .ok_or_else(|| row_error(column, "unexpected NULL"))
}

fn optional_str(row: &Row, column: &'static str) -> Result<Option<String>> {
    Ok(row
        .try_get::<&str, _>(column)
        .map_err(|e| row_error(column, e.to_string()))?
        .map(str::to_string))
}

fn optional_int(row: &Row, column: &'static str) -> Result<Option<i32>> {
    row.try_get::<i32, _>(column)
        .map_err(|e| row_error(column, e.to_string()))
}

/// Map a row of [`TABLES_SQL`].
pub fn table_from_row(row: &Row) -> Result<TableName> {
    Ok(TableName::from(required_str(row, "TABLE_NAME")?))
}

/// Map a row of [`COLUMNS_SQL`].
pub fn column_from_row(row: &Row) -> Result<ColumnDescriptor> {
    Ok(ColumnDescriptor {
        table_name: TableName::from(required_str(row, "TABLE_NAME")?),
        column_name: required_str(row, "COLUMN_NAME")?.to_string(),
        ordinal_position: optional_int(row, "ORDINAL_POSITION")?
            .ok_or_else(|| row_error("ORDINAL_POSITION", "unexpected NULL"))?,
        column_default: optional_str(row, "COLUMN_DEFAULT")?,
        is_nullable: parse_nullable_flag(required_str(row, "IS_NULLABLE")?),
        data_type: required_str(row, "DATA_TYPE")?.to_string(),
        character_maximum_length: optional_int(row, "CHARACTER_MAXIMUM_LENGTH")?,
        numeric_precision: optional_int(row, "NUMERIC_PRECISION")?,
        numeric_scale: optional_int(row, "NUMERIC_SCALE")?,
    })
}

/// Map a row of [`CONSTRAINTS_SQL`].
pub fn constraint_from_row(row: &Row) -> Result<ConstraintInfo> {
    Ok(ConstraintInfo::new(
        required_str(row, "COLUMN_NAME")?,
        required_str(row, "CONSTRAINT_TYPE")?,
    ))
}

#[derive(Debug, Clone, Default)]
struct StaticTable {
    columns: Vec<ColumnDescriptor>,
    constraints: Vec<ConstraintInfo>,
}

/// A catalog backed by in-memory metadata.
///
/// Answers the way a server would: tables ascending by name, columns by
/// ordinal position, unknown tables have no columns.
///
/// # Example
///
/// ```
/// use dbcompare::{ColumnDescriptor, ConstraintInfo, StaticCatalog};
///
/// let catalog = StaticCatalog::new("Shop")
///     .with_table("Customer", vec![
///         ColumnDescriptor::new("Customer", "id", 1, "int"),
///         ColumnDescriptor::new("Customer", "name", 2, "nvarchar").with_length(100),
///     ])
///     .with_constraint("Customer", ConstraintInfo::primary_key("id"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    database: String,
    tables: IndexMap<TableName, StaticTable>,
    failing: HashSet<TableName>,
}

impl StaticCatalog {
    pub fn new(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..Default::default()
        }
    }

    /// Add a table. Each column's `table_name` is set to `name`.
    pub fn with_table(
        mut self,
        name: impl Into<TableName>,
        columns: impl IntoIterator<Item = ColumnDescriptor>,
    ) -> Self {
        let name = name.into();
        let columns = columns
            .into_iter()
            .map(|mut c| {
                c.table_name = name.clone();
                c
            })
            .collect();
        self.tables.entry(name).or_default().columns = columns;
        self
    }

    pub fn with_constraint(mut self, table: impl Into<TableName>, constraint: ConstraintInfo) -> Self {
        self.tables
            .entry(table.into())
            .or_default()
            .constraints
            .push(constraint);
        self
    }

    /// Make every column or constraint query for `table` fail.
    pub fn failing_on(mut self, table: impl Into<TableName>) -> Self {
        self.failing.insert(table.into());
        self
    }

    fn check(&self, table: &TableName) -> Result<()> {
        if self.failing.contains(table) {
            return Err(Error::Query(tiberius::error::Error::Protocol(
                format!("metadata for {} is unavailable", table).into(),
            )));
        }
        Ok(())
    }
}

impl Catalog for StaticCatalog {
    fn database(&self) -> &str {
        &self.database
    }

    async fn tables(&mut self) -> Result<Vec<TableName>> {
        let mut tables: Vec<TableName> = self.tables.keys().cloned().collect();
        tables.sort();
        Ok(tables)
    }

    async fn columns(&mut self, table: &TableName) -> Result<Vec<ColumnDescriptor>> {
        self.check(table)?;
        let mut columns = self
            .tables
            .get(table)
            .map(|t| t.columns.clone())
            .unwrap_or_default();
        columns.sort_by_key(|c| c.ordinal_position);
        Ok(columns)
    }

    async fn constraints(&mut self, table: &TableName) -> Result<Vec<ConstraintInfo>> {
        self.check(table)?;
        Ok(self
            .tables
            .get(table)
            .map(|t| t.constraints.clone())
            .unwrap_or_default())
    }
}
