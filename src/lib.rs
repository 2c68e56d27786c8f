//! # Rusty Migrate
//!
//! Loads the CSV and spreadsheet files listed in a data model manifest into
//! DuckDB tables, normalizing every free-text dataset and field name into a
//! legal SQL identifier on the way.
//!
//! ## Features
//!
//! - **Identifier normalization**: idempotent pipelines for table and column names,
//!   with collisions reported before any DDL runs
//! - **Multi-format sources**: delimited text and Excel/OpenDocument workbooks
//!   (`.xls`, `.xlsx`, `.xlsm`, `.xlsb`, `.xla`, `.xlam`, `.ods`)
//! - **Cell ranges**: `A2:D10`, `Data!AA1:AB20`, multi-letter columns included
//! - **Schema generation**: `DROP TABLE IF EXISTS` / `CREATE TABLE` from the declared fields
//! - **Column reconciliation**: only source columns present in the live table are loaded
//! - **Atomic loads**: one parameterized multi-row INSERT per file
//!
//! ## Pipeline
//!
//! 1. [`manifest::Manifest`] yields [`database::table::TableSchema`]s and [`source::SourceRecord`]s
//! 2. [`loader::migrate`] creates the tables through a [`database::session::Session`]
//! 3. [`loader::BatchLoader`] reads, normalizes, reconciles and inserts every file
pub mod database;
pub mod error;
pub mod loader;
pub mod manifest;
pub mod naming;
pub mod source;
pub mod spreadsheet;

pub use crate::database::session::DuckDbSession;
pub use crate::database::session::Session;
pub use crate::error::MigrateError;
pub use crate::loader::migrate;
pub use crate::loader::BatchLoader;
pub use crate::loader::FailurePolicy;
pub use crate::loader::LoadOptions;
pub use crate::loader::LoadReport;
pub use crate::manifest::Manifest;
pub use crate::manifest::ManifestOptions;
pub use crate::naming::TableNameStyle;
