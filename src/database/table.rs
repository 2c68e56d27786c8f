use crate::database::batch::quote_identifier;
use crate::database::column::FieldSpec;
use crate::error::MigrateError;
use crate::naming::ensure_distinct;
use crate::naming::Identifier;

/// A destination table declared by the data model.
#[derive(Clone, Debug)]
pub struct TableSchema {
    /// Table identifier (raw dataset name and normalized name)
    pub table_name: Identifier,
    /// Column definitions in declaration order
    pub fields: Vec<FieldSpec>,
}

impl TableSchema {
    pub fn new(table_name: Identifier, fields: Vec<FieldSpec>) -> Self {
        Self { table_name, fields }
    }

    /// `DROP TABLE IF EXISTS "t"; CREATE TABLE "t" ("c1" type1, "c2" type2);`
    pub fn ddl(&self) -> String {
        let columns: Vec<String> = self.fields.iter().map(FieldSpec::definition).collect();
        format!(
            "DROP TABLE IF EXISTS {0}; CREATE TABLE {0} ({1});",
            quote_identifier(&self.table_name.name),
            columns.join(", ")
        )
    }
}

/// Builds the DDL script for every table, one statement pair per line.
///
/// Table names are checked for collisions first, so no script is produced for an invalid run.
pub fn build_schema_script(schemas: &[TableSchema]) -> Result<String, MigrateError> {
    let names: Vec<Identifier> = schemas
        .iter()
        .map(|schema| schema.table_name.clone())
        .collect();
    ensure_distinct(&names)?;

    Ok(schemas
        .iter()
        .map(TableSchema::ddl)
        .collect::<Vec<_>>()
        .join("\n"))
}
