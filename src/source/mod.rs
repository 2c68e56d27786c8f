//! # Tabular Sources
//!
//! One reading contract over delimited text and spreadsheet workbooks: a file
//! becomes a header of raw column names plus rows of [`CellValue`]s aligned
//! with it.
mod delimited;

use crate::database::range::CellRange;
use crate::error::MigrateError;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::is_spreadsheet;
use crate::spreadsheet::read_sheet;
use crate::source::delimited::read_delimited;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::Path;
use std::path::PathBuf;

/// One manifest entry: which file feeds which destination table.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceRecord {
    /// Normalized destination table name
    pub table_name: String,
    /// Resolved source file path
    pub path: PathBuf,
    /// Worksheet to read, spreadsheets only
    pub sheet_name: Option<String>,
    /// Cell range such as `A2:D10`, spreadsheets only
    pub cells: Option<String>,
}

/// Options shared by every source read.
#[derive(Clone, Debug)]
pub struct ReadOptions {
    /// Delimited-text fields loaded as NULL (default: the empty string)
    pub nulls: HashSet<String>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            nulls: HashSet::from([String::new()]),
        }
    }
}

/// The rows of one source file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Tabular {
    /// Raw header names; blank entries already replaced by `_c<N>` placeholders
    pub header: Vec<String>,
    /// Data rows aligned with the header
    pub rows: Vec<Vec<CellValue>>,
}

/// Reads a source file into a header and data rows.
///
/// # Errors
/// * [`MigrateError::MissingSourceFile`] when the file does not exist
/// * [`MigrateError::UnsupportedFormat`] for unknown extensions
/// * [`MigrateError::RangeParse`], [`MigrateError::SheetNotFound`] and
///   [`MigrateError::ColumnCountMismatch`] from the format readers
pub fn read_source(record: &SourceRecord, options: &ReadOptions) -> Result<Tabular, MigrateError> {
    let path = record.path.as_path();
    if !path.is_file() {
        Err(MigrateError::MissingSourceFile(path.to_path_buf()))?
    }

    let (header, rows) = if is_delimited(path) {
        read_delimited(path, &options.nulls)?
    } else if is_spreadsheet(path) {
        let range = CellRange::parse(record.cells.as_deref())?;
        let (header, rows) = read_sheet(path, record.sheet_name.as_deref(), range.as_ref())?;
        (header.iter().map(CellValue::to_string).collect(), rows)
    } else {
        Err(MigrateError::UnsupportedFormat(path.to_path_buf()))?
    };

    Ok(Tabular {
        header: fill_blank_headers(header),
        rows,
    })
}

/// Replaces blank header entries with `_c0`, `_c1`, ... counting only the blanks.
pub fn fill_blank_headers(header: Vec<String>) -> Vec<String> {
    let mut blanks = 0;
    header
        .into_iter()
        .map(|name| {
            if name.is_empty() {
                let placeholder = format!("_c{blanks}");
                blanks += 1;
                placeholder
            } else {
                name
            }
        })
        .collect()
}

fn is_delimited(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|extension| extension.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}
