use crate::database::batch::quote_identifier;
use crate::naming::normalize_column_name;
use serde::Deserialize;
use serde::Serialize;

/// One declared column of a dataset, as listed in the data model `FIELDS` JSON.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Display name of the field
    pub name: String,
    /// Declared SQL type, passed through to DDL without validation
    #[serde(rename = "type")]
    pub kind: String,
    /// Alternative display name, not used for DDL
    #[serde(default)]
    pub alias: String,
}

impl FieldSpec {
    pub fn new(name: &str, kind: &str) -> Self {
        Self {
            name: name.to_owned(),
            kind: kind.to_owned(),
            alias: String::new(),
        }
    }

    /// Normalized column identifier.
    pub fn column_name(&self) -> String {
        normalize_column_name(&self.name)
    }

    /// Column definition for `CREATE TABLE`, e.g. `"col_2020_sales" real`.
    pub fn definition(&self) -> String {
        format!("{} {}", quote_identifier(&self.column_name()), self.kind.to_lowercase())
    }

    /// Parses the `FIELDS` JSON list of a data model record.
    pub fn parse_list(json: &str) -> Result<Vec<FieldSpec>, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_lower_cases_type() {
        let field = FieldSpec::new("2020 Sales", "REAL");
        assert_eq!(field.definition(), "\"col_2020_Sales\" real");
    }

    #[test]
    fn parse_fields_json() {
        let fields = FieldSpec::parse_list(
            r#"[{"name": "차종", "type": "TEXT", "alias": ""}, {"name": "Deaths", "type": "REAL"}]"#,
        )
        .unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "차종");
        assert_eq!(fields[0].kind, "TEXT");
        assert_eq!(fields[1].alias, "");
        assert_eq!(fields[1].definition(), "\"Deaths\" real");
    }

    #[test]
    fn parse_fields_rejects_missing_type() {
        assert!(FieldSpec::parse_list(r#"[{"name": "a"}]"#).is_err());
    }
}
