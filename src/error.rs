use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the migration pipeline.
/// Aggregates errors from the standard library, dependencies, and the pipeline stages.
#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("{0}")]
    WithContextError(String),

    // Pipeline errors
    #[error("Duplicate identifier '{identifier}' produced by {}", .sources.join(", "))]
    DuplicateIdentifier {
        identifier: String,
        sources: Vec<String>,
    },

    #[error("Invalid range format '{0}'")]
    RangeParse(String),

    #[error("Sheet '{sheet}' not found in '{}'", .path.display())]
    SheetNotFound { path: PathBuf, sheet: String },

    #[error("Workbook '{}' has no sheets", .0.display())]
    EmptyWorkbook(PathBuf),

    #[error("Record {record} of '{}' has {found} fields, header has {expected}", .path.display())]
    ColumnCountMismatch {
        path: PathBuf,
        record: usize,
        expected: usize,
        found: usize,
    },

    #[error("Source file '{}' does not exist", .0.display())]
    MissingSourceFile(PathBuf),

    #[error("Cannot detect file format for '{}'", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("Table '{0}' does not exist in the destination database")]
    TableNotFound(String),

    #[error("Loading '{table}' exceeded the deadline of {seconds}s")]
    DeadlineExceeded { table: String, seconds: u64 },

    #[error("Run cancelled")]
    Cancelled,

    #[error("Invalid data model: {0}")]
    DataModel(String),

    #[error("Unknown text encoding '{0}'")]
    UnknownEncoding(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    // Third-party library errors
    #[error("{0}")]
    Database(#[from] duckdb::Error),

    #[error("{0}")]
    CsvError(#[from] csv::Error),

    #[error("{0}")]
    JsonError(#[from] serde_json::Error),

    #[error("{0}")]
    SpreadsheetError(#[from] calamine::Error),
}

impl MigrateError {
    /// Returns true for errors raised by the destination database.
    pub fn is_database_error(&self) -> bool {
        matches!(self, MigrateError::Database(_) | MigrateError::TableNotFound(_))
    }
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, MigrateError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| MigrateError::WithContextError(format!("{}: {}", message, e)))
    }
}
