use crate::database::session::Session;
use crate::error::MigrateError;
use std::collections::HashSet;

/// Source columns that exist in the destination table.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// Kept source column indexes, in source order
    pub indexes: Vec<usize>,
    /// Destination spelling of each kept column, aligned with `indexes`
    pub columns: Vec<String>,
}

impl Reconciliation {
    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }
}

/// Matches a normalized source header against the live columns of `table`.
///
/// # Errors
/// [`MigrateError::TableNotFound`] when the destination table does not exist.
pub fn reconcile_columns<S>(session: &S, table: &str, header: &[String]) -> Result<Reconciliation, MigrateError>
where
    S: Session + ?Sized,
{
    let destination = session
        .table_columns(table)?
        .ok_or_else(|| MigrateError::TableNotFound(table.to_owned()))?;
    let reconciliation = match_columns(header, &destination);

    let dropped: Vec<&str> = header
        .iter()
        .enumerate()
        .filter(|(index, _)| !reconciliation.indexes.contains(index))
        .map(|(_, name)| name.as_str())
        .collect();
    if !dropped.is_empty() {
        log::debug!("Columns not in '{}': {}", table, dropped.join(", "));
    }
    if reconciliation.is_empty() {
        log::warn!(
            "No column of the source header [{}] exists in table '{}'",
            header.join(", "),
            table
        );
    }
    Ok(reconciliation)
}

/// Keeps header entries whose name matches a destination column (ASCII
/// case-insensitive, as SQL folds unquoted identifiers).
///
/// Only the first source column mapping onto a destination column is kept.
pub(crate) fn match_columns(header: &[String], destination: &[String]) -> Reconciliation {
    let mut reconciliation = Reconciliation::default();
    let mut used: HashSet<usize> = HashSet::new();
    for (index, name) in header.iter().enumerate() {
        let Some(position) = destination
            .iter()
            .position(|column| column.eq_ignore_ascii_case(name))
        else {
            continue;
        };
        if used.insert(position) {
            reconciliation.indexes.push(index);
            reconciliation.columns.push(destination[position].to_owned());
        } else {
            log::warn!("Source column '{}' duplicates '{}' and is dropped", name, destination[position]);
        }
    }
    reconciliation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::session::DuckDbSession;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn reconcile_preserves_source_order() {
        let reconciliation = match_columns(&names(&["col_a", "col_b", "col_c"]), &names(&["col_c", "col_a"]));
        assert_eq!(reconciliation.indexes, vec![0, 2]);
        assert_eq!(reconciliation.columns, names(&["col_a", "col_c"]));
    }

    #[test]
    fn reconcile_ignores_case() {
        let reconciliation = match_columns(&names(&["Name", "Other"]), &names(&["name"]));
        assert_eq!(reconciliation.indexes, vec![0]);
        assert_eq!(reconciliation.columns, names(&["name"]));
    }

    #[test]
    fn reconcile_drops_duplicate_targets() {
        let reconciliation = match_columns(&names(&["a_b", "A_B", "c"]), &names(&["a_b", "c"]));
        assert_eq!(reconciliation.indexes, vec![0, 2]);
    }

    #[test]
    fn reconcile_nothing_in_common() {
        let reconciliation = match_columns(&names(&["x"]), &names(&["y"]));
        assert!(reconciliation.is_empty());
    }

    #[test]
    fn reconcile_against_catalog() {
        let session = DuckDbSession::open_in_memory().unwrap();
        session.execute_script("CREATE TABLE t (col_a text, col_c text);").unwrap();

        let reconciliation = reconcile_columns(&session, "t", &names(&["col_a", "col_b", "col_c"])).unwrap();
        assert_eq!(reconciliation.indexes, vec![0, 2]);

        let missing = reconcile_columns(&session, "nope", &names(&["col_a"]));
        assert!(matches!(missing, Err(MigrateError::TableNotFound(table)) if table == "nope"));
    }
}
