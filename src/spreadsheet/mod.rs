//! # Spreadsheet Processing Module
//!
//! Reads legacy (`.xls`, `.xla`) and modern (`.xlsx`, `.xlsm`, `.xlsb`, `.xlam`)
//! Excel workbooks as well as OpenDocument (`.ods`) spreadsheets into a header
//! row plus typed data rows. Sheet selection is by name, falling back to the
//! first sheet in workbook order.
pub mod cell;
pub(crate) mod sheet;

use crate::database::range::CellRange;
use crate::error::MigrateError;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::sheet::SheetWindow;
use calamine::open_workbook_auto;
use calamine::Reader;
use std::ffi::OsStr;
use std::path::Path;

/// File extensions handled by the spreadsheet reader.
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xls", "xla", "xlsx", "xlsm", "xlsb", "xlam", "ods"];

/// Checks whether a path has a spreadsheet extension (case-insensitive).
pub fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|extension| {
            SPREADSHEET_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(extension))
        })
        .unwrap_or(false)
}

/// Reads a header row and data rows from one worksheet.
///
/// # Arguments
/// * `path` - Workbook file
/// * `sheet_name` - Sheet to read; when absent, the sheet named by the range
///   prefix, then the first sheet in the workbook
/// * `range` - Window to read; when absent, row 0 is the header and every
///   later row is data
///
/// # Errors
/// * [`MigrateError::SheetNotFound`] for an unknown sheet name
/// * [`MigrateError::EmptyWorkbook`] for a workbook without sheets
pub fn read_sheet(
    path: &Path,
    sheet_name: Option<&str>,
    range: Option<&CellRange>,
) -> Result<(Vec<CellValue>, Vec<Vec<CellValue>>), MigrateError> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet_names = workbook.sheet_names();

    let requested = sheet_name
        .map(str::to_owned)
        .or_else(|| range.and_then(|range| range.sheet_name.to_owned()));
    let name = match requested {
        Some(name) if sheet_names.contains(&name) => name,
        Some(name) => Err(MigrateError::SheetNotFound {
            path: path.to_path_buf(),
            sheet: name,
        })?,
        None => sheet_names
            .first()
            .cloned()
            .ok_or_else(|| MigrateError::EmptyWorkbook(path.to_path_buf()))?,
    };

    let cells = workbook.worksheet_range(&name)?;
    match SheetWindow::new(range, &cells) {
        Some(window) => {
            log::debug!("Reading {}!{} from '{}'", name, window.reference(), path.display());
            Ok(window.read(&cells))
        }
        None => {
            log::debug!("Sheet '{}' of '{}' is empty", name, path.display());
            Ok((Vec::new(), Vec::new()))
        }
    }
}
