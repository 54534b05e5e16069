//! T-SQL script generation for missing tables and columns.
//!
//! Both entry points render columns the same way:
//!
//! ```text
//! [name] [type](length)          -- when CHARACTER_MAXIMUM_LENGTH is set
//! [name] [decimal](p,s)          -- decimal with precision and scale
//! [name] [int] IDENTITY(1,1)     -- CREATE only, single-column int primary key
//! ... NULL | NOT NULL
//! ```
//!
//! CREATE TABLE adds a clustered primary key constraint after the columns
//! when an identity column was found. ALTER TABLE never adds identity or
//! primary keys.

use crate::{ColumnDescriptor, ConstraintInfo, Error, Result, TableName};
use std::fmt::{self, Write as _};

/// Types SQL Server rejects a length qualifier on, even though
/// `INFORMATION_SCHEMA` reports a length for them.
const UNSIZED_TYPES: &[&str] = &["text", "ntext", "image", "xml"];

/// A compiled script, ready to be written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    /// File name, without directory.
    pub filename: String,
    pub sql: String,
}

/// A bracket-quoted T-SQL identifier.
///
/// Display writes the value wrapped in `[` `]`, doubling any embedded `]`.
pub struct Ident<T: AsRef<str>>(pub T);

impl<T: AsRef<str>> fmt::Display for Ident<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('[')?;
        for c in self.0.as_ref().chars() {
            if c == ']' {
                f.write_str("]]")?;
            } else {
                f.write_char(c)?;
            }
        }
        f.write_char(']')
    }
}

/// Quote a T-SQL identifier.
pub fn quote_ident(name: &str) -> String {
    Ident(name).to_string()
}

/// `CREATE_TABLE_<table>.sql`
pub fn create_table_filename(table: &TableName) -> String {
    format!("CREATE_TABLE_{}.sql", table)
}

/// `ALTER_TABLE_<table>_ADD_<n>_COLUMN.sql`, or `..._COLUMNS.sql` when `n != 1`.
pub fn alter_table_filename(table: &TableName, count: usize) -> String {
    let plural = if count == 1 { "" } else { "S" };
    format!("ALTER_TABLE_{}_ADD_{}_COLUMN{}.sql", table, count, plural)
}

/// The length or precision qualifier for a column type, if any.
///
/// The two are mutually exclusive: `decimal` with both precision and scale
/// gets `(p,s)`, anything else with a character length gets `(n)`.
pub fn type_qualifier(column: &ColumnDescriptor) -> Option<String> {
    if column.data_type == "decimal" {
        if let (Some(precision), Some(scale)) = (column.numeric_precision, column.numeric_scale) {
            return Some(format!("({},{})", precision, scale));
        }
    }

    if UNSIZED_TYPES.contains(&column.data_type.as_str()) {
        return None;
    }

    match column.character_maximum_length {
        Some(-1) => Some("(max)".to_string()),
        Some(length) => Some(format!("({})", length)),
        None => None,
    }
}

/// Render one column definition, without indentation or trailing comma.
fn column_definition(column: &ColumnDescriptor, identity: bool) -> String {
    let mut def = format!(
        "{} {}",
        Ident(&column.column_name),
        Ident(&column.data_type)
    );

    if let Some(qualifier) = type_qualifier(column) {
        def.push_str(&qualifier);
    }

    if identity {
        def.push_str(" IDENTITY(1,1)");
    }

    def.push_str(if column.is_nullable {
        " NULL"
    } else {
        " NOT NULL"
    });

    def
}

/// Find the column that should become `IDENTITY(1,1)` with a clustered
/// primary key.
///
/// Only a primary key on exactly one column of type `int` qualifies. A
/// primary key over several columns is rejected rather than rendered as if
/// one of its columns were the whole key.
pub fn identity_column<'a>(
    table: &TableName,
    columns: &'a [ColumnDescriptor],
    constraints: &[ConstraintInfo],
) -> Result<Option<&'a ColumnDescriptor>> {
    let mut pk_columns: Vec<&str> = Vec::new();
    for constraint in constraints.iter().filter(|c| c.is_primary_key()) {
        if !pk_columns.contains(&constraint.column_name.as_str()) {
            pk_columns.push(&constraint.column_name);
        }
    }

    if pk_columns.len() > 1 {
        // Report the key in declaration order.
        let columns = columns
            .iter()
            .filter(|c| pk_columns.contains(&c.column_name.as_str()))
            .map(|c| c.column_name.clone())
            .collect();
        return Err(Error::CompositePrimaryKey {
            table: table.to_string(),
            columns,
        });
    }

    Ok(columns
        .iter()
        .find(|c| pk_columns.contains(&c.column_name.as_str()) && c.data_type == "int"))
}

/// Compile the `CREATE TABLE` script for a table missing from the target.
///
/// `columns` may come in any order; they are rendered by ordinal position.
pub fn create_table(
    table: &TableName,
    columns: &[ColumnDescriptor],
    constraints: &[ConstraintInfo],
) -> Result<Script> {
    let mut ordered: Vec<&ColumnDescriptor> = columns.iter().collect();
    ordered.sort_by_key(|c| c.ordinal_position);

    let identity = identity_column(table, columns, constraints)?;

    let mut lines: Vec<String> = ordered
        .iter()
        .map(|col| {
            let is_identity = identity.is_some_and(|pk| pk.column_name == col.column_name);
            format!("\t{}", column_definition(col, is_identity))
        })
        .collect();

    if let Some(pk) = identity {
        lines.push(format!(
            "\tCONSTRAINT {} PRIMARY KEY CLUSTERED ({} ASC)",
            Ident(format!("PK_{}", table)),
            Ident(&pk.column_name)
        ));
    }

    let mut sql = format!("CREATE TABLE {} (\n", Ident(table));
    sql.push_str(&lines.join(",\n"));
    if !lines.is_empty() {
        sql.push('\n');
    }
    sql.push_str(");\n");

    Ok(Script {
        filename: create_table_filename(table),
        sql,
    })
}

/// Compile one `ALTER TABLE ... ADD` script covering every missing column of
/// a table.
///
/// Returns `None` when there is nothing to add.
pub fn alter_table(table: &TableName, missing: &[&ColumnDescriptor]) -> Option<Script> {
    if missing.is_empty() {
        return None;
    }

    let mut ordered = missing.to_vec();
    ordered.sort_by_key(|c| c.ordinal_position);

    let lines: Vec<String> = ordered
        .iter()
        .map(|col| format!("\t{}", column_definition(col, false)))
        .collect();

    let sql = format!(
        "ALTER TABLE {} ADD\n{}\n;\n",
        Ident(table),
        lines.join(",\n")
    );

    Some(Script {
        filename: alter_table_filename(table, missing.len()),
        sql,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TableName {
        TableName::from("Invoice")
    }

    fn invoice_columns() -> Vec<ColumnDescriptor> {
        vec![
            ColumnDescriptor::new("Invoice", "id", 1, "int"),
            ColumnDescriptor::new("Invoice", "number", 2, "varchar").with_length(50),
            ColumnDescriptor::new("Invoice", "amount", 3, "decimal")
                .with_precision(18, 2)
                .nullable(true),
        ]
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("user"), "[user]");
        assert_eq!(quote_ident("odd]name"), "[odd]]name]");
        assert_eq!(quote_ident("with space"), "[with space]");
    }

    #[test]
    fn test_type_qualifiers() {
        let decimal = ColumnDescriptor::new("t", "c", 1, "decimal").with_precision(18, 2);
        assert_eq!(type_qualifier(&decimal).as_deref(), Some("(18,2)"));

        let varchar = ColumnDescriptor::new("t", "c", 1, "varchar").with_length(50);
        assert_eq!(type_qualifier(&varchar).as_deref(), Some("(50)"));

        let int = ColumnDescriptor::new("t", "c", 1, "int");
        assert_eq!(type_qualifier(&int), None);

        let max = ColumnDescriptor::new("t", "c", 1, "nvarchar").with_length(-1);
        assert_eq!(type_qualifier(&max).as_deref(), Some("(max)"));

        let text = ColumnDescriptor::new("t", "c", 1, "text").with_length(2147483647);
        assert_eq!(type_qualifier(&text), None);
    }

    #[test]
    fn test_precision_only_applies_to_decimal() {
        // numeric carries precision in the catalog but is not `decimal`.
        let numeric = ColumnDescriptor::new("t", "c", 1, "numeric").with_precision(10, 4);
        assert_eq!(type_qualifier(&numeric), None);

        // decimal without scale falls through to the (absent) length.
        let mut partial = ColumnDescriptor::new("t", "c", 1, "decimal");
        partial.numeric_precision = Some(10);
        assert_eq!(type_qualifier(&partial), None);
    }

    #[test]
    fn test_nullability() {
        let nullable = ColumnDescriptor::new("t", "note", 1, "int").nullable(true);
        assert_eq!(column_definition(&nullable, false), "[note] [int] NULL");

        let required = ColumnDescriptor::new("t", "note", 1, "int");
        assert_eq!(column_definition(&required, false), "[note] [int] NOT NULL");
    }

    #[test]
    fn test_create_table_with_identity() {
        let script = create_table(
            &table(),
            &invoice_columns(),
            &[ConstraintInfo::primary_key("id")],
        )
        .unwrap();

        assert_eq!(script.filename, "CREATE_TABLE_Invoice.sql");
        assert_eq!(script.sql.matches("IDENTITY(1,1)").count(), 1);
        assert_eq!(script.sql.matches("CONSTRAINT [PK_Invoice]").count(), 1);
        insta::assert_snapshot!(script.sql.trim_end(), @r"
CREATE TABLE [Invoice] (
	[id] [int] IDENTITY(1,1) NOT NULL,
	[number] [varchar](50) NOT NULL,
	[amount] [decimal](18,2) NULL,
	CONSTRAINT [PK_Invoice] PRIMARY KEY CLUSTERED ([id] ASC)
);
");
    }

    #[test]
    fn test_create_table_without_primary_key() {
        let script = create_table(&table(), &invoice_columns(), &[]).unwrap();

        assert!(!script.sql.contains("IDENTITY"));
        assert!(!script.sql.contains("CONSTRAINT"));
        insta::assert_snapshot!(script.sql.trim_end(), @r"
CREATE TABLE [Invoice] (
	[id] [int] NOT NULL,
	[number] [varchar](50) NOT NULL,
	[amount] [decimal](18,2) NULL
);
");
    }

    #[test]
    fn test_non_int_primary_key_gets_no_identity() {
        let columns = vec![
            ColumnDescriptor::new("Invoice", "id", 1, "bigint"),
            ColumnDescriptor::new("Invoice", "code", 2, "char").with_length(3),
        ];
        let script =
            create_table(&table(), &columns, &[ConstraintInfo::primary_key("id")]).unwrap();

        assert!(!script.sql.contains("IDENTITY"));
        assert!(!script.sql.contains("CONSTRAINT"));
        assert!(script.sql.ends_with("\t[code] [char](3) NOT NULL\n);\n"));
    }

    #[test]
    fn test_identity_column_not_last() {
        let columns = vec![
            ColumnDescriptor::new("Invoice", "name", 1, "nvarchar").with_length(20),
            ColumnDescriptor::new("Invoice", "id", 2, "int"),
            ColumnDescriptor::new("Invoice", "note", 3, "nvarchar")
                .with_length(-1)
                .nullable(true),
        ];
        let constraints = vec![
            ConstraintInfo::new("name", "UNIQUE"),
            ConstraintInfo::primary_key("id"),
        ];
        let script = create_table(&table(), &columns, &constraints).unwrap();

        let lines: Vec<&str> = script.sql.lines().collect();
        assert_eq!(
            lines,
            vec![
                "CREATE TABLE [Invoice] (",
                "\t[name] [nvarchar](20) NOT NULL,",
                "\t[id] [int] IDENTITY(1,1) NOT NULL,",
                "\t[note] [nvarchar](max) NULL,",
                "\tCONSTRAINT [PK_Invoice] PRIMARY KEY CLUSTERED ([id] ASC)",
                ");",
            ]
        );
    }

    #[test]
    fn test_columns_render_in_ordinal_order() {
        let mut columns = invoice_columns();
        columns.reverse();
        let shuffled = create_table(&table(), &columns, &[]).unwrap();
        let ordered = create_table(&table(), &invoice_columns(), &[]).unwrap();
        assert_eq!(shuffled, ordered);
    }

    #[test]
    fn test_composite_primary_key_is_rejected() {
        let columns = vec![
            ColumnDescriptor::new("OrderLine", "order_id", 1, "int"),
            ColumnDescriptor::new("OrderLine", "line", 2, "int"),
        ];
        let constraints = vec![
            ConstraintInfo::primary_key("line"),
            ConstraintInfo::primary_key("order_id"),
        ];
        let err = create_table(&TableName::from("OrderLine"), &columns, &constraints).unwrap_err();

        match err {
            Error::CompositePrimaryKey { table, columns } => {
                assert_eq!(table, "OrderLine");
                assert_eq!(columns, vec!["order_id", "line"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_repeated_primary_key_rows_are_one_key() {
        // The same column can show up once per constraint it takes part in.
        let constraints = vec![
            ConstraintInfo::primary_key("id"),
            ConstraintInfo::primary_key("id"),
            ConstraintInfo::new("id", "FOREIGN KEY"),
        ];
        let columns = invoice_columns();
        let pk = identity_column(&table(), &columns, &constraints).unwrap();
        assert_eq!(pk.map(|c| c.column_name.as_str()), Some("id"));
    }

    #[test]
    fn test_alter_table_single_column() {
        let columns = invoice_columns();
        let script = alter_table(&table(), &[&columns[2]]).unwrap();

        assert_eq!(script.filename, "ALTER_TABLE_Invoice_ADD_1_COLUMN.sql");
        insta::assert_snapshot!(script.sql.trim_end(), @r"
ALTER TABLE [Invoice] ADD
	[amount] [decimal](18,2) NULL
;
");
    }

    #[test]
    fn test_alter_table_never_adds_identity() {
        let columns = invoice_columns();
        let missing: Vec<&ColumnDescriptor> = columns.iter().collect();
        let script = alter_table(&table(), &missing).unwrap();

        assert_eq!(script.filename, "ALTER_TABLE_Invoice_ADD_3_COLUMNS.sql");
        assert!(!script.sql.contains("IDENTITY"));
        assert!(!script.sql.contains("CONSTRAINT"));
        assert_eq!(
            script.sql,
            "ALTER TABLE [Invoice] ADD\n\
             \t[id] [int] NOT NULL,\n\
             \t[number] [varchar](50) NOT NULL,\n\
             \t[amount] [decimal](18,2) NULL\n\
             ;\n"
        );
    }

    #[test]
    fn test_alter_table_nothing_missing() {
        assert!(alter_table(&table(), &[]).is_none());
    }

    #[test]
    fn test_filenames() {
        let t = TableName::from("A");
        assert_eq!(create_table_filename(&t), "CREATE_TABLE_A.sql");
        assert_eq!(alter_table_filename(&t, 1), "ALTER_TABLE_A_ADD_1_COLUMN.sql");
        assert_eq!(alter_table_filename(&t, 2), "ALTER_TABLE_A_ADD_2_COLUMNS.sql");
    }
}
