use crate::error::MigrateError;
use regex::Regex;
use std::ops::RangeInclusive;
use std::sync::LazyLock;

/// Last 0-based row index of a worksheet (row 1048576).
pub const MAX_ROW_INDEX: usize = 1_048_575;
/// Last 0-based column index of a worksheet (column `XFD`).
pub const MAX_COL_INDEX: usize = 16_383;

static RANGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(.+)!)?([A-Z]+)(\d+):([A-Z]+)(\d+)$").expect("Hardcode regex pattern")
});

/// Represents an Excel-style rectangular cell window, all bounds 0-based and inclusive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellRange {
    /// Sheet named by a `Sheet!` prefix, if any
    pub sheet_name: Option<String>,
    pub col_start: usize,
    pub col_end: usize,
    pub row_start: usize,
    pub row_end: usize,
}

impl CellRange {
    /// Parses a range expression such as `A2:D10` or `Data!B1:AA40`.
    ///
    /// Returns `Ok(None)` for an empty expression, meaning the whole sheet starting at row 0.
    pub fn parse(expression: Option<&str>) -> Result<Option<Self>, MigrateError> {
        let expression = match expression.map(str::trim) {
            Some(expression) if !expression.is_empty() => expression,
            _ => return Ok(None),
        };
        let (sheet_name, cells) = match expression.rsplit_once('!') {
            Some((sheet_name, cells)) => (Some(sheet_name), cells.to_ascii_uppercase()),
            None => (None, expression.to_ascii_uppercase()),
        };
        let value = match sheet_name {
            Some(sheet_name) => format!("{sheet_name}!{cells}"),
            None => cells,
        };
        let error = || MigrateError::RangeParse(expression.to_owned());

        let captures = RANGE_PATTERN.captures(&value).ok_or_else(error)?;
        let col_start = captures.get(2).and_then(|it| col_to_index(it.as_str())).ok_or_else(error)?;
        let row_start = captures.get(3).and_then(|it| row_to_index(it.as_str())).ok_or_else(error)?;
        let col_end = captures.get(4).and_then(|it| col_to_index(it.as_str())).ok_or_else(error)?;
        let row_end = captures.get(5).and_then(|it| row_to_index(it.as_str())).ok_or_else(error)?;
        if col_end < col_start || row_end < row_start || col_end > MAX_COL_INDEX || row_end > MAX_ROW_INDEX {
            Err(error())?
        }

        Ok(Some(CellRange {
            sheet_name: captures
                .get(1)
                .map(|it| it.as_str().trim_matches('\'').to_owned()),
            col_start,
            col_end,
            row_start,
            row_end,
        }))
    }

    /// Column indexes covered by the range.
    pub fn columns(&self) -> RangeInclusive<usize> {
        self.col_start..=self.col_end
    }

    /// Row indexes covered by the range.
    pub fn rows(&self) -> RangeInclusive<usize> {
        self.row_start..=self.row_end
    }
}

/// Converts Excel-style column letters to a 0-based index:
/// A = 0, ..., Z = 25, AA = 26, AB = 27, ...
pub(crate) fn col_to_index(letters: &str) -> Option<usize> {
    letters
        .chars()
        .map(|letter| letter.is_ascii_uppercase().then(|| letter as usize - 'A' as usize + 1))
        .try_fold(0usize, |index, digit| index.checked_mul(26)?.checked_add(digit?))
        .filter(|column| *column > 0)
        .map(|column| column - 1)
}

/// Converts a 1-based row number to a 0-based index. Row 0 does not exist.
pub(crate) fn row_to_index(number: &str) -> Option<usize> {
    number
        .parse::<usize>()
        .ok()
        .filter(|row| *row > 0)
        .map(|row| row - 1)
}

/// Converts 0-based row and column indexes to an Excel-style reference such as `B7`.
pub(crate) fn index_to_reference(row: usize, col: usize) -> String {
    let mut column = col + 1;
    let mut letters = String::new();
    while column > 0 {
        column -= 1;
        letters.insert(0, (b'A' + (column % 26) as u8) as char);
        column /= 26;
    }
    format!("{letters}{}", row + 1)
}
