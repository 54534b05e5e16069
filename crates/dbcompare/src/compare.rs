//! Running a comparison between a source and a target catalog.
//!
//! The run happens in two passes, both in source table order:
//!
//! 1. Tables: every source table absent from the target is reported, and
//!    with scripts enabled a `CREATE TABLE` script is compiled from the
//!    source metadata and written right away.
//! 2. Columns: for every table present on both sides, each source column
//!    absent from the target table is reported, then one `ALTER TABLE`
//!    script covers all of them.
//!
//! Catalog failures abort the run. Script failures (a composite primary
//! key, an unwritable file) are reported and the run goes on.

use crate::{
    Catalog, Error, Reporter, Result, Script, ScriptSink, TableName, ddl,
    diff::{common_tables, missing_columns, missing_tables},
};
use camino::Utf8PathBuf;

/// Columns one target table lacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingColumns {
    pub table: TableName,
    /// Column names, in source ordinal order.
    pub columns: Vec<String>,
}

/// Result of the table pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableComparison {
    /// All source tables, ascending.
    pub source: Vec<TableName>,
    /// All target tables, ascending.
    pub target: Vec<TableName>,
    /// Source tables absent from the target, in source order.
    pub missing: Vec<TableName>,
}

/// Everything a finished run found and wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompareReport {
    pub tables: TableComparison,
    /// Only tables with at least one missing column, in source order.
    pub missing_columns: Vec<MissingColumns>,
    pub scripts_written: Vec<Utf8PathBuf>,
    /// One message per script that could not be produced or written.
    pub script_failures: Vec<String>,
}

impl CompareReport {
    /// Returns true if the target lacks any table or column.
    pub fn has_drift(&self) -> bool {
        !self.tables.missing.is_empty() || !self.missing_columns.is_empty()
    }

    pub fn missing_column_count(&self) -> usize {
        self.missing_columns.iter().map(|m| m.columns.len()).sum()
    }
}

/// One comparison run.
///
/// # Example
///
/// ```
/// use dbcompare::{ColumnDescriptor, Comparison, MemorySink, Recorder, StaticCatalog};
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let mut source = StaticCatalog::new("Shop")
///     .with_table("A", vec![ColumnDescriptor::new("A", "id", 1, "int")])
///     .with_table("B", vec![ColumnDescriptor::new("B", "id", 1, "int")]);
/// let mut target = StaticCatalog::new("ShopCopy")
///     .with_table("A", vec![ColumnDescriptor::new("A", "id", 1, "int")]);
///
/// let mut reporter = Recorder::new();
/// let mut sink = MemorySink::new();
/// let report = Comparison::new(&mut source, &mut target, &mut reporter)
///     .with_scripts(&mut sink)
///     .run()
///     .await
///     .unwrap();
///
/// assert_eq!(report.tables.missing, vec!["B"]);
/// assert!(sink.get("CREATE_TABLE_B.sql").is_some());
/// # });
/// ```
pub struct Comparison<'a, S, T> {
    source: &'a mut S,
    target: &'a mut T,
    reporter: &'a mut dyn Reporter,
    sink: Option<&'a mut dyn ScriptSink>,
    scripts_written: Vec<Utf8PathBuf>,
    script_failures: Vec<String>,
}

impl<'a, S: Catalog, T: Catalog> Comparison<'a, S, T> {
    /// A comparison that only reports; no scripts are generated.
    pub fn new(source: &'a mut S, target: &'a mut T, reporter: &'a mut dyn Reporter) -> Self {
        Self {
            source,
            target,
            reporter,
            sink: None,
            scripts_written: Vec::new(),
            script_failures: Vec::new(),
        }
    }

    /// Generate scripts for the missing tables and columns into `sink`.
    pub fn with_scripts(mut self, sink: &'a mut dyn ScriptSink) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Run both passes.
    pub async fn run(mut self) -> Result<CompareReport> {
        let tables = self.compare_tables().await?;
        let missing_columns = self.compare_columns(&tables).await?;

        Ok(CompareReport {
            tables,
            missing_columns,
            scripts_written: self.scripts_written,
            script_failures: self.script_failures,
        })
    }

    /// Table pass: report source tables the target lacks.
    pub async fn compare_tables(&mut self) -> Result<TableComparison> {
        let source = self.source.tables().await?;
        let target = self.target.tables().await?;
        tracing::debug!(
            source = source.len(),
            target = target.len(),
            "fetched table lists"
        );

        self.reporter.blank();
        self.reporter.notice("Checking for missing target tables..");

        let missing: Vec<TableName> = missing_tables(&source, &target)
            .into_iter()
            .cloned()
            .collect();

        for table in &missing {
            self.reporter.notice(&format!("- Missing table: {}", table));

            if self.sink.is_some() {
                self.create_table_script(table).await?;
            }
        }

        if missing.is_empty() {
            self.reporter.notice("..No missing tables found.");
        }

        Ok(TableComparison {
            source,
            target,
            missing,
        })
    }

    /// Column pass: report, per table present on both sides, the source
    /// columns the target lacks.
    pub async fn compare_columns(
        &mut self,
        tables: &TableComparison,
    ) -> Result<Vec<MissingColumns>> {
        self.reporter.blank();
        self.reporter
            .notice("Checking for missing target table columns..");

        let mut found = Vec::new();

        for table in common_tables(&tables.source, &tables.target) {
            let source_columns = self.source.columns(table).await?;
            let target_columns = self.target.columns(table).await?;

            let missing = missing_columns(&source_columns, &target_columns);
            if missing.is_empty() {
                continue;
            }

            for column in &missing {
                self.reporter.notice(&format!(
                    "- Missing column {} in table {}",
                    column.column_name, table
                ));
            }

            if self.sink.is_some() {
                if let Some(script) = ddl::alter_table(table, &missing) {
                    self.write_script(&script);
                }
            }

            found.push(MissingColumns {
                table: table.clone(),
                columns: missing.iter().map(|c| c.column_name.clone()).collect(),
            });
        }

        if found.is_empty() {
            self.reporter.notice("..No missing columns found.");
        }

        Ok(found)
    }

    async fn create_table_script(&mut self, table: &TableName) -> Result<()> {
        let columns = self.source.columns(table).await?;
        let constraints = self.source.constraints(table).await?;

        match ddl::create_table(table, &columns, &constraints) {
            Ok(script) => self.write_script(&script),
            Err(e) if e.is_local() => {
                tracing::warn!(%table, error = %e, "skipping CREATE TABLE script");
                self.reporter.notice(&format!(
                    "  .. Skipping CREATE TABLE script for {}: {}",
                    table, e
                ));
                self.script_failures.push(e.to_string());
            }
            Err(e) => return Err(e),
        }

        Ok(())
    }

    fn write_script(&mut self, script: &Script) {
        let Some(sink) = self.sink.as_deref_mut() else {
            return;
        };

        self.reporter
            .notice(&format!("  .. Writing SQL script to {}", script.filename));

        match sink.write(script) {
            Ok(path) => self.scripts_written.push(path),
            Err(e) => {
                tracing::error!(filename = %script.filename, error = %e, "script write failed");
                let cause = match &e {
                    Error::WriteScript { source, .. } => source.to_string(),
                    other => other.to_string(),
                };
                self.reporter.notice(&format!(
                    "  .. Failed to write {}: {}",
                    script.filename, cause
                ));
                self.script_failures.push(e.to_string());
            }
        }
    }
}
