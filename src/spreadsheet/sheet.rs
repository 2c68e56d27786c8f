use crate::database::range::index_to_reference;
use crate::database::range::CellRange;
use crate::spreadsheet::cell::CellValue;
use calamine::Data;
use calamine::Range;

/// A rectangular block of cells read from one worksheet.
///
/// The first row of the window holds the header, later rows hold data.
#[derive(Debug)]
pub(crate) struct SheetWindow {
    pub(crate) row_lower_bound: usize,
    pub(crate) row_upper_bound: usize,
    pub(crate) col_lower_bound: usize,
    pub(crate) col_upper_bound: usize,
}

impl SheetWindow {
    /// Chooses the window to read from a worksheet.
    ///
    /// With an explicit range the window is exactly that range. Without one it
    /// starts at row 0, column 0 and extends to the last used row and column.
    /// Returns None for a sheet without any cells when no range is given.
    pub(crate) fn new(range: Option<&CellRange>, cells: &Range<Data>) -> Option<Self> {
        match range {
            Some(range) => Some(Self {
                row_lower_bound: range.row_start,
                row_upper_bound: range.row_end,
                col_lower_bound: range.col_start,
                col_upper_bound: range.col_end,
            }),
            None => cells.end().map(|(row, col)| Self {
                row_lower_bound: 0,
                row_upper_bound: row as usize,
                col_lower_bound: 0,
                col_upper_bound: col as usize,
            }),
        }
    }

    /// Reference of the window, e.g. `A1:D10`.
    pub(crate) fn reference(&self) -> String {
        format!(
            "{}:{}",
            index_to_reference(self.row_lower_bound, self.col_lower_bound),
            index_to_reference(self.row_upper_bound, self.col_upper_bound)
        )
    }

    /// Reads one row of the window. Cells outside the used area are null.
    fn row(&self, cells: &Range<Data>, row: usize) -> Vec<CellValue> {
        (self.col_lower_bound..=self.col_upper_bound)
            .map(|col| {
                cells
                    .get_value((row as u32, col as u32))
                    .map(CellValue::from)
                    .unwrap_or(CellValue::Null)
            })
            .collect()
    }

    /// Header row followed by the data rows.
    ///
    /// Data rows stop at the last used row of the sheet; the empty tail of a
    /// larger window is not materialized.
    pub(crate) fn read(&self, cells: &Range<Data>) -> (Vec<CellValue>, Vec<Vec<CellValue>>) {
        let header = self.row(cells, self.row_lower_bound);
        let last_row = cells
            .end()
            .map(|(row, _)| (row as usize).min(self.row_upper_bound))
            .unwrap_or(self.row_lower_bound);
        let rows = ((self.row_lower_bound + 1)..=last_row)
            .map(|row| self.row(cells, row))
            .collect();
        (header, rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet() -> Range<Data> {
        // Used area B1:D4, column A is empty
        let mut cells = Range::new((0, 1), (3, 3));
        cells.set_value((0, 1), Data::String("Name".to_owned()));
        cells.set_value((0, 2), Data::String("Amount".to_owned()));
        cells.set_value((1, 1), Data::String("a".to_owned()));
        cells.set_value((1, 2), Data::Float(1.5));
        cells.set_value((2, 1), Data::String("b".to_owned()));
        cells.set_value((2, 2), Data::Int(2));
        cells.set_value((3, 3), Data::Bool(true));
        cells
    }

    #[test]
    fn window_whole_sheet() {
        let cells = sheet();
        let window = SheetWindow::new(None, &cells).unwrap();
        assert_eq!(window.reference(), "A1:D4");

        let (header, rows) = window.read(&cells);
        assert_eq!(
            header,
            vec![
                CellValue::Null,
                CellValue::Text("Name".to_owned()),
                CellValue::Text("Amount".to_owned()),
                CellValue::Null,
            ]
        );
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][2], CellValue::Float(1.5));
        assert_eq!(rows[1][2], CellValue::Int(2));
        assert_eq!(rows[2][3], CellValue::Bool(true));
    }

    #[test]
    fn window_with_range() {
        let cells = sheet();
        let range = CellRange::parse(Some("B1:C3")).unwrap().unwrap();
        let window = SheetWindow::new(Some(&range), &cells).unwrap();

        let (header, rows) = window.read(&cells);
        assert_eq!(header.len(), 2);
        assert_eq!(header[0], CellValue::Text("Name".to_owned()));
        assert_eq!(
            rows,
            vec![
                vec![CellValue::Text("a".to_owned()), CellValue::Float(1.5)],
                vec![CellValue::Text("b".to_owned()), CellValue::Int(2)],
            ]
        );
    }

    #[test]
    fn window_beyond_used_area() {
        let cells = sheet();
        let range = CellRange::parse(Some("C4:E5")).unwrap().unwrap();
        let window = SheetWindow::new(Some(&range), &cells).unwrap();

        let (header, rows) = window.read(&cells);
        assert_eq!(header, vec![CellValue::Null, CellValue::Bool(true), CellValue::Null]);
        assert!(rows.is_empty());
    }

    #[test]
    fn window_whole_worksheet_range() {
        let cells = sheet();
        let range = CellRange::parse(Some("A1:XFD1048576")).unwrap().unwrap();
        let window = SheetWindow::new(Some(&range), &cells).unwrap();

        let (header, rows) = window.read(&cells);
        assert_eq!(header.len(), 16_384);
        assert_eq!(header[1], CellValue::Text("Name".to_owned()));
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2][3], CellValue::Bool(true));
        assert!(rows.iter().all(|row| row[4..].iter().all(CellValue::is_null)));
    }

    #[test]
    fn window_below_used_area() {
        let cells = sheet();
        let range = CellRange::parse(Some("B10:C12")).unwrap().unwrap();
        let window = SheetWindow::new(Some(&range), &cells).unwrap();

        let (header, rows) = window.read(&cells);
        assert_eq!(header, vec![CellValue::Null, CellValue::Null]);
        assert!(rows.is_empty());
    }

    #[test]
    fn window_empty_sheet() {
        let cells: Range<Data> = Range::empty();
        assert!(SheetWindow::new(None, &cells).is_none());
    }
}
