use crate::spreadsheet::cell::CellValue;
use duckdb::types::Value;

/// One file's rows prepared as a single multi-row insert.
#[derive(Clone, Debug, PartialEq)]
pub struct Batch {
    /// Destination table
    pub table_name: String,
    /// Destination column names, in the order values appear in each row
    pub columns: Vec<String>,
    /// Rows projected onto `columns`
    pub rows: Vec<Vec<CellValue>>,
}

impl Batch {
    /// Builds a batch from source rows, keeping only the cells at `indexes`.
    pub fn project(table_name: &str, columns: Vec<String>, indexes: &[usize], rows: Vec<Vec<CellValue>>) -> Self {
        let rows = rows
            .into_iter()
            .map(|row| {
                indexes
                    .iter()
                    .map(|index| row.get(*index).cloned().unwrap_or(CellValue::Null))
                    .collect()
            })
            .collect();
        Self {
            table_name: table_name.to_owned(),
            columns,
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `INSERT INTO "t"("a","b") VALUES (?, ?),(?, ?);` with one placeholder tuple per row.
    pub fn insert_statement(&self) -> String {
        let columns: Vec<String> = self.columns.iter().map(|column| quote_identifier(column)).collect();
        let tuple = format!("({})", vec!["?"; self.columns.len()].join(", "));
        format!(
            "INSERT INTO {}({}) VALUES {};",
            quote_identifier(&self.table_name),
            columns.join(","),
            vec![tuple.as_str(); self.rows.len()].join(",")
        )
    }

    /// Values bound to the placeholders, row by row.
    pub fn parameters(&self) -> Vec<Value> {
        self.rows
            .iter()
            .flat_map(|row| row.iter().map(CellValue::to_sql_value))
            .collect()
    }
}

/// Quotes an identifier for DuckDB, doubling embedded quotes.
pub(crate) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> CellValue {
        CellValue::Text(value.to_owned())
    }

    #[test]
    fn project_keeps_selected_columns() {
        let rows = vec![vec![text("a"), text("b"), text("c")], vec![text("d"), text("e"), text("f")]];
        let batch = Batch::project("t", vec!["col_a".to_owned(), "col_c".to_owned()], &[0, 2], rows);
        assert_eq!(batch.rows, vec![vec![text("a"), text("c")], vec![text("d"), text("f")]]);
        assert!(batch.rows.iter().all(|row| row.len() == 2));
    }

    #[test]
    fn insert_statement_placeholders() {
        let batch = Batch::project(
            "sales",
            vec!["name".to_owned(), "col_2021_Revenue".to_owned()],
            &[0, 1],
            vec![vec![text("a"), text("1")], vec![text("b"), text("2")]],
        );
        assert_eq!(
            batch.insert_statement(),
            "INSERT INTO \"sales\"(\"name\",\"col_2021_Revenue\") VALUES (?, ?),(?, ?);"
        );
        assert_eq!(
            batch.parameters(),
            vec![
                Value::Text("a".to_owned()),
                Value::Text("1".to_owned()),
                Value::Text("b".to_owned()),
                Value::Text("2".to_owned()),
            ]
        );
    }

    #[test]
    fn quote_embedded_quotes() {
        assert_eq!(quote_identifier("a\"b"), "\"a\"\"b\"");
    }
}
