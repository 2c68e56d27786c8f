//! Comma-delimited text sources.
use crate::error::MigrateError;
use crate::spreadsheet::cell::CellValue;
use csv::ReaderBuilder;
use std::collections::HashSet;
use std::path::Path;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Reads a UTF-8 CSV file into its header record and string rows.
///
/// Fields equal to one of `nulls` become [`CellValue::Null`]. Every record
/// must have exactly as many fields as the header.
pub(crate) fn read_delimited(
    path: &Path,
    nulls: &HashSet<String>,
) -> Result<(Vec<String>, Vec<Vec<CellValue>>), MigrateError> {
    let bytes = std::fs::read(path)?;
    parse_delimited(path, bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes), nulls)
}

fn parse_delimited(
    path: &Path,
    bytes: &[u8],
    nulls: &HashSet<String>,
) -> Result<(Vec<String>, Vec<Vec<CellValue>>), MigrateError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);
    let mut records = reader.records();

    let header: Vec<String> = match records.next() {
        Some(record) => record?.iter().map(str::to_owned).collect(),
        None => return Ok((Vec::new(), Vec::new())),
    };

    let mut rows = Vec::new();
    for (index, record) in records.enumerate() {
        let record = record?;
        if record.len() != header.len() {
            Err(MigrateError::ColumnCountMismatch {
                path: path.to_path_buf(),
                record: index + 2,
                expected: header.len(),
                found: record.len(),
            })?
        }
        rows.push(
            record
                .iter()
                .map(|field| {
                    if nulls.contains(field) {
                        CellValue::Null
                    } else {
                        CellValue::Text(field.to_owned())
                    }
                })
                .collect(),
        );
    }
    Ok((header, rows))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn nulls() -> HashSet<String> {
        HashSet::from([String::new()])
    }

    fn text(value: &str) -> CellValue {
        CellValue::Text(value.to_owned())
    }

    #[test]
    fn delimited_with_bom() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"\xEF\xBB\xBFName,Amount\nkim,3\nlee,\n").unwrap();

        let (header, rows) = read_delimited(file.path(), &nulls()).unwrap();
        assert_eq!(header, vec!["Name", "Amount"]);
        assert_eq!(rows, vec![vec![text("kim"), text("3")], vec![text("lee"), CellValue::Null]]);
    }

    #[test]
    fn delimited_quoted_fields() {
        let path = Path::new("quoted.csv");
        let (header, rows) = parse_delimited(path, "\"a,b\",c\n\"x\"\"y\",z\n".as_bytes(), &HashSet::new()).unwrap();
        assert_eq!(header, vec!["a,b", "c"]);
        assert_eq!(rows, vec![vec![text("x\"y"), text("z")]]);
    }

    #[test]
    fn delimited_keeps_empty_strings_without_null_literals() {
        let path = Path::new("empty.csv");
        let (_, rows) = parse_delimited(path, b"a,b\n,1\n", &HashSet::new()).unwrap();
        assert_eq!(rows, vec![vec![text(""), text("1")]]);
    }

    #[test]
    fn delimited_header_only() {
        let path = Path::new("header.csv");
        let (header, rows) = parse_delimited(path, b"a,b\n", &nulls()).unwrap();
        assert_eq!(header.len(), 2);
        assert!(rows.is_empty());
    }

    #[test]
    fn delimited_empty_file() {
        let path = Path::new("empty.csv");
        let (header, rows) = parse_delimited(path, b"", &nulls()).unwrap();
        assert!(header.is_empty());
        assert!(rows.is_empty());
    }

    #[test]
    fn delimited_arity_mismatch() {
        let path = Path::new("short.csv");
        let result = parse_delimited(path, b"a,b,c\n1,2,3\n4,5\n", &nulls());
        match result {
            Err(MigrateError::ColumnCountMismatch { record, expected, found, .. }) => {
                assert_eq!((record, expected, found), (3, 3, 2));
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn delimited_invalid_utf8() {
        let path = Path::new("latin1.csv");
        assert!(matches!(
            parse_delimited(path, b"a\n\xE9\n", &nulls()),
            Err(MigrateError::CsvError(_))
        ));
    }
}
