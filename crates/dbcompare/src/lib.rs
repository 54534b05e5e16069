//! Schema drift detection for SQL Server.
//!
//! This crate compares a source catalog against a target catalog and finds:
//! - Tables that exist in the source but not in the target
//! - Columns of shared tables that exist in the source but not in the target
//!
//! For every finding it can also compile the T-SQL that brings the target
//! up to date: a `CREATE TABLE` script per missing table and one
//! `ALTER TABLE ... ADD` script per table with missing columns.
//!
//! Only additions are detected. Nothing present in the target but absent
//! from the source is reported, and type or nullability differences between
//! columns of the same name are ignored.
//!
//! # Comparing
//!
//! ```ignore
//! let mut source = MssqlCatalog::connect(&ConnectParams::new("db01", "sa", pw, "Shop")?).await?;
//! let mut target = MssqlCatalog::connect(&ConnectParams::new("db02", "sa", pw, "Shop")?).await?;
//!
//! let mut sink = DirectorySink::current_dir()?;
//! let report = Comparison::new(&mut source, &mut target, &mut Console)
//!     .with_scripts(&mut sink)
//!     .run()
//!     .await?;
//! ```
//!
//! Any [`Catalog`] works as either side; [`StaticCatalog`] serves metadata
//! from memory.

mod compare;
mod connect;
pub mod ddl;
pub mod diff;
mod error;
mod introspect;
mod mssql;
mod report;
mod schema;
mod script;
mod traced;

pub use compare::{CompareReport, Comparison, MissingColumns, TableComparison};
pub use connect::{ConnectParams, DEFAULT_PORT, parse_host};
pub use ddl::{Script, quote_ident};
pub use error::Error;
pub use introspect::{COLUMNS_SQL, CONSTRAINTS_SQL, Catalog, StaticCatalog, TABLES_SQL};
pub use mssql::MssqlCatalog;
pub use report::{Console, Recorder, Reporter};
pub use schema::{ColumnDescriptor, ConstraintInfo, PRIMARY_KEY, TableName, parse_nullable_flag};
pub use script::{DirectorySink, MemorySink, ScriptSink};
pub use traced::{TracedClient, Transport};

/// Result type for dbcompare operations.
pub type Result<T> = std::result::Result<T, Error>;
