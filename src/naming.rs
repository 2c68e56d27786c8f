//! # Identifier Normalization
//!
//! Turns free-text dataset and field names into SQL identifiers matching
//! `^[A-Za-z_][A-Za-z0-9_]*$`. Each normalizer is an ordered pipeline of
//! small string transforms; every transform is total, and the composed
//! pipelines are idempotent.
use crate::error::MigrateError;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// A single pure step of a normalization pipeline.
type Transform = fn(&str) -> String;

static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^(\d+\S+)(.*)$").expect("Hardcode regex pattern"));
static REPEATED_UNDERSCORES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_{2,}").expect("Hardcode regex pattern"));
static TRAILING_UNDERSCORES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_+$").expect("Hardcode regex pattern"));

/// How table names with a leading number (e.g. `2019 Cargo Volume`) are treated.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum TableNameStyle {
    /// Keep the leading number where it is, matching identifiers generated by earlier runs.
    #[default]
    Compatible,
    /// Move the leading number token to the end: `2019 Cargo Volume` becomes `Cargo_Volume_2019`.
    ReorderLeadingNumber,
}

/// A raw display name paired with its normalized SQL identifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identifier {
    /// Name as it appeared in the metadata or the source header
    pub raw: String,
    /// Normalized, SQL-legal identifier
    pub name: String,
}

impl Identifier {
    /// Builds a table identifier.
    pub fn table(raw: &str, style: TableNameStyle) -> Self {
        Self {
            raw: raw.to_owned(),
            name: normalize_table_name_with(raw, style),
        }
    }

    /// Builds a column identifier.
    pub fn column(raw: &str) -> Self {
        Self {
            raw: raw.to_owned(),
            name: normalize_column_name(raw),
        }
    }
}

/// Normalizes a table name with the [`TableNameStyle::Compatible`] style.
pub fn normalize_table_name(raw: &str) -> String {
    normalize_table_name_with(raw, TableNameStyle::Compatible)
}

/// Normalizes a table name.
///
/// Underscores already present are treated as word separators, so feeding
/// an identifier back through yields the same identifier.
pub fn normalize_table_name_with(raw: &str, style: TableNameStyle) -> String {
    let reorder: Transform = match style {
        TableNameStyle::Compatible => keep,
        TableNameStyle::ReorderLeadingNumber => reorder_leading_number,
    };
    run(
        raw,
        &[
            underscores_to_spaces,
            reorder,
            table_separators_to_underscores,
            transliterate,
            prefix_table,
            collapse_underscores,
            strip_trailing_underscores,
        ],
    )
}

/// Normalizes a column name.
pub fn normalize_column_name(raw: &str) -> String {
    run(
        raw,
        &[
            transliterate,
            prefix_column,
            collapse_underscores,
            strip_trailing_underscores,
        ],
    )
}

/// Normalizes every table name and checks that no two collapse onto the same identifier.
///
/// Returns the normalized names in input order, or the first colliding group.
pub fn ensure_unique_tables<S>(names: &[S], style: TableNameStyle) -> Result<Vec<String>, MigrateError>
where
    S: AsRef<str>,
{
    let identifiers: Vec<Identifier> = names
        .iter()
        .map(|name| Identifier::table(name.as_ref(), style))
        .collect();
    ensure_distinct(&identifiers)?;
    Ok(identifiers.into_iter().map(|identifier| identifier.name).collect())
}

/// Fails with [`MigrateError::DuplicateIdentifier`] when two identifiers share a normalized name.
///
/// Collisions are reported in the order their identifier first appears, naming every raw input.
pub fn ensure_distinct(identifiers: &[Identifier]) -> Result<(), MigrateError> {
    let mut groups: HashMap<&str, Vec<&str>> = HashMap::new();
    for identifier in identifiers {
        groups
            .entry(identifier.name.as_str())
            .or_default()
            .push(identifier.raw.as_str());
    }
    match identifiers.iter().find(|identifier| groups[identifier.name.as_str()].len() > 1) {
        Some(identifier) => Err(MigrateError::DuplicateIdentifier {
            identifier: identifier.name.to_owned(),
            sources: groups[identifier.name.as_str()]
                .iter()
                .map(|raw| raw.to_string())
                .collect(),
        }),
        None => Ok(()),
    }
}

fn run(raw: &str, pipeline: &[Transform]) -> String {
    pipeline
        .iter()
        .fold(raw.to_owned(), |name, transform| transform(&name))
}

fn keep(name: &str) -> String {
    name.to_owned()
}

fn underscores_to_spaces(name: &str) -> String {
    name.replace('_', " ")
}

fn reorder_leading_number(name: &str) -> String {
    match LEADING_NUMBER.captures(name) {
        Some(captures) => format!("{}_{}", captures[2].trim(), captures[1].trim()),
        None => name.to_owned(),
    }
}

fn table_separators_to_underscores(name: &str) -> String {
    name.chars()
        .map(|character| match character {
            ',' | '(' | ')' | '-' | '~' => '_',
            _ if character.is_whitespace() => '_',
            _ => character,
        })
        .collect()
}

/// Keeps ASCII word characters, spells other letters and digits as `u<HEX>`
/// codepoint tokens and turns everything else into underscores.
fn transliterate(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    for character in name.chars() {
        if character.is_ascii_alphanumeric() || character == '_' {
            result.push(character);
        } else if character.is_alphanumeric() {
            result.push_str(&format!("u{:04X}", character as u32));
        } else {
            result.push('_');
        }
    }
    result
}

fn prefix_table(name: &str) -> String {
    prefix_with(name, "tab_")
}

fn prefix_column(name: &str) -> String {
    prefix_with(name, "col_")
}

fn prefix_with(name: &str, prefix: &str) -> String {
    match name.chars().next() {
        Some(first) if first.is_ascii_alphabetic() => name.to_owned(),
        _ => format!("{prefix}{name}"),
    }
}

fn collapse_underscores(name: &str) -> String {
    REPEATED_UNDERSCORES.replace_all(name, "_").into_owned()
}

fn strip_trailing_underscores(name: &str) -> String {
    TRAILING_UNDERSCORES.replace(name, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn is_legal(name: &str) -> bool {
        let pattern = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
        pattern.is_match(name) && !name.contains("__") && !name.ends_with('_')
    }

    #[test]
    fn column_name_with_leading_digit() {
        assert_eq!(normalize_column_name("2020Q1 Revenue"), "col_2020Q1_Revenue");
    }

    #[test]
    fn column_name_placeholder() {
        assert_eq!(normalize_column_name("_c0"), "col_c0");
        assert_eq!(normalize_column_name("Name"), "Name");
    }

    #[test]
    fn column_name_punctuation() {
        assert_eq!(normalize_column_name("Total (KRW) / 1,000"), "Total_KRW_1_000");
    }

    #[test]
    fn empty_names() {
        assert_eq!(normalize_column_name(""), "col");
        assert_eq!(normalize_table_name(""), "tab");
        assert_eq!(normalize_table_name("___"), "tab");
    }

    #[test]
    fn table_name_separators() {
        assert_eq!(normalize_table_name("Monthly deaths (15-19 sum)"), "Monthly_deaths_15_19_sum");
        assert_eq!(normalize_table_name("Sales 2020"), "Sales_2020");
        assert_eq!(normalize_table_name("a ~ b, c"), "a_b_c");
    }

    #[test]
    fn table_name_with_leading_digit() {
        assert_eq!(normalize_table_name("2019 Cargo Volume"), "tab_2019_Cargo_Volume");
        assert_eq!(normalize_table_name("_hidden"), "tab_hidden");
    }

    #[test]
    fn table_name_reorder_style() {
        let style = TableNameStyle::ReorderLeadingNumber;
        assert_eq!(normalize_table_name_with("2019 Cargo Volume", style), "Cargo_Volume_2019");
        assert_eq!(normalize_table_name_with("2019Q1 Cargo", style), "Cargo_2019Q1");
        assert_eq!(normalize_table_name_with("2019", style), "tab_2019");
        assert_eq!(normalize_table_name_with("Cargo 2019", style), "Cargo_2019");
    }

    #[test]
    fn table_name_non_ascii() {
        let name = normalize_table_name("국제선 국내선 화물량 차이_2010_2018");
        assert!(is_legal(&name), "{name}");
        assert!(name.ends_with("_2010_2018"));
        assert!(name.starts_with("uAD6D"));
        assert_eq!(name.matches('_').count(), 5);
    }

    #[test]
    fn table_name_idempotent_examples() {
        for raw in ["국제선 국내선 화물량 차이_2010_2018", "월별 도로교통사고사망자(15-19합)", "2019 x", "__"] {
            let once = normalize_table_name(raw);
            assert_eq!(normalize_table_name(&once), once);
        }
    }

    #[test]
    fn unique_tables_pass() {
        let names = ensure_unique_tables(&["Sales 2020", "Sales 2021"], TableNameStyle::Compatible).unwrap();
        assert_eq!(names, vec!["Sales_2020", "Sales_2021"]);
    }

    #[test]
    fn unique_tables_detect_collision() {
        let error = ensure_unique_tables(&["Other", "Sales 2020", "Sales_2020"], TableNameStyle::Compatible).unwrap_err();
        match error {
            MigrateError::DuplicateIdentifier { identifier, sources } => {
                assert_eq!(identifier, "Sales_2020");
                assert_eq!(sources, vec!["Sales 2020", "Sales_2020"]);
            }
            other => panic!("unexpected error {other}"),
        }
    }

    proptest! {
        #[test]
        fn column_name_is_idempotent_and_legal(raw in "\\PC{0,24}") {
            let once = normalize_column_name(&raw);
            prop_assert!(is_legal(&once), "{}", once);
            prop_assert_eq!(normalize_column_name(&once), once);
        }

        #[test]
        fn table_name_is_idempotent_and_legal(raw in "\\PC{0,24}") {
            let once = normalize_table_name(&raw);
            prop_assert!(is_legal(&once), "{}", once);
            prop_assert_eq!(normalize_table_name(&once), once.clone());

            let reordered = normalize_table_name_with(&raw, TableNameStyle::ReorderLeadingNumber);
            prop_assert!(is_legal(&reordered), "{}", reordered);
            prop_assert_eq!(
                normalize_table_name_with(&reordered, TableNameStyle::ReorderLeadingNumber),
                reordered
            );
        }
    }
}
