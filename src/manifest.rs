//! # Data Model Manifest
//!
//! The data model is a delimited file with one row per dataset. Its columns:
//!
//! - `NAME`: free-text dataset name, the source of the table name
//! - `FIELDS`: JSON list of `{"name", "type", "alias"}` column declarations
//! - `DATASET`: JSON `{"path": ..., "option": {"sheet_name": ..., "cells": ...}}`
//! - `table_name` (optional): normalized table name written by an earlier run
//!
//! Every other column is carried through untouched when the file is rewritten.
use crate::database::column::FieldSpec;
use crate::database::table::TableSchema;
use crate::error::MigrateError;
use crate::error::ResultMessage;
use crate::naming::ensure_distinct;
use crate::naming::Identifier;
use crate::naming::TableNameStyle;
use crate::source::SourceRecord;
use csv::ReaderBuilder;
use csv::WriterBuilder;
use encoding_rs::Encoding;
use regex::Regex;
use serde::Deserialize;
use std::path::Path;
use std::path::PathBuf;
use std::sync::LazyLock;

pub const NAME_COLUMN: &str = "NAME";
pub const FIELDS_COLUMN: &str = "FIELDS";
pub const DATASET_COLUMN: &str = "DATASET";
pub const TABLE_NAME_COLUMN: &str = "table_name";

static UNQUOTED_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[^"]+"#).expect("Hardcode regex pattern"));

/// How the manifest file is decoded.
#[derive(Clone, Debug)]
pub struct ManifestOptions {
    /// Field delimiter (default: `,`)
    pub delimiter: u8,
    /// Encoding label understood by the WHATWG Encoding Standard (default: `utf-8`)
    pub encoding: String,
}

impl Default for ManifestOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            encoding: "utf-8".to_owned(),
        }
    }
}

/// `DATASET` JSON of one manifest row.
#[derive(Clone, Debug, Deserialize)]
struct Dataset {
    path: String,
    #[serde(default)]
    option: DatasetOption,
}

/// Read options of a dataset. Empty strings mean "not set".
#[derive(Clone, Debug, Default, Deserialize)]
struct DatasetOption {
    #[serde(default)]
    sheet_name: Option<String>,
    #[serde(default)]
    cells: Option<String>,
}

/// The data model file held in memory as headers plus string records.
#[derive(Clone, Debug, PartialEq)]
pub struct Manifest {
    pub headers: Vec<String>,
    pub records: Vec<Vec<String>>,
}

impl Manifest {
    /// Reads and decodes a manifest file.
    pub fn read(path: &Path, options: &ManifestOptions) -> Result<Self, MigrateError> {
        let bytes = std::fs::read(path)?;
        Self::parse(&bytes, options).with_prefix(&format!("Read manifest '{}'", path.display()))
    }

    /// Decodes and parses manifest bytes. A byte-order mark overrides the configured encoding.
    pub fn parse(bytes: &[u8], options: &ManifestOptions) -> Result<Self, MigrateError> {
        let encoding = Encoding::for_label(options.encoding.as_bytes())
            .ok_or_else(|| MigrateError::UnknownEncoding(options.encoding.to_owned()))?;
        let (text, _, malformed) = encoding.decode(bytes);
        if malformed {
            log::warn!("Manifest contains bytes that are not valid {}", encoding.name());
        }

        let mut reader = ReaderBuilder::new()
            .delimiter(options.delimiter)
            .from_reader(text.as_bytes());
        let headers = reader.headers()?.iter().map(str::to_owned).collect();
        let records = reader
            .records()
            .map(|record| record.map(|record| record.iter().map(str::to_owned).collect()))
            .collect::<Result<Vec<Vec<String>>, _>>()?;
        Ok(Self { headers, records })
    }

    /// Writes the manifest as UTF-8 CSV, quoting only where needed.
    pub fn write(&self, path: &Path) -> Result<(), MigrateError> {
        let mut writer = WriterBuilder::new().from_path(path)?;
        writer.write_record(&self.headers)?;
        for record in &self.records {
            writer.write_record(record)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|header| header == name)
    }

    fn require_column(&self, name: &str) -> Result<usize, MigrateError> {
        self.column(name)
            .ok_or_else(|| MigrateError::DataModel(format!("missing column '{name}'")))
    }

    fn value<'a>(&self, record: &'a [String], index: usize) -> &'a str {
        record.get(index).map(String::as_str).unwrap_or("")
    }

    /// Table identifiers of every row, validated to be distinct.
    ///
    /// Uses the `table_name` column when present, `NAME` otherwise.
    pub fn table_identifiers(&self, style: TableNameStyle) -> Result<Vec<Identifier>, MigrateError> {
        let index = match self.column(TABLE_NAME_COLUMN) {
            Some(index) => index,
            None => self.require_column(NAME_COLUMN)?,
        };
        let identifiers: Vec<Identifier> = self
            .records
            .iter()
            .map(|record| Identifier::table(self.value(record, index), style))
            .collect();
        ensure_distinct(&identifiers)?;
        Ok(identifiers)
    }

    /// Copy of the manifest with a `table_name` column derived from `NAME`.
    pub fn with_table_names(&self, style: TableNameStyle) -> Result<Self, MigrateError> {
        let index = self.require_column(NAME_COLUMN)?;
        let identifiers: Vec<Identifier> = self
            .records
            .iter()
            .map(|record| Identifier::table(self.value(record, index), style))
            .collect();
        ensure_distinct(&identifiers)?;

        let mut manifest = self.without_column(TABLE_NAME_COLUMN);
        manifest.headers.push(TABLE_NAME_COLUMN.to_owned());
        for (record, identifier) in manifest.records.iter_mut().zip(identifiers) {
            record.push(identifier.name);
        }
        Ok(manifest)
    }

    /// Declared destination tables, one per row.
    pub fn schemas(&self, style: TableNameStyle) -> Result<Vec<TableSchema>, MigrateError> {
        let fields_index = self.require_column(FIELDS_COLUMN)?;
        self.table_identifiers(style)?
            .into_iter()
            .zip(self.records.iter())
            .enumerate()
            .map(|(row, (identifier, record))| {
                let fields = FieldSpec::parse_list(self.value(record, fields_index))
                    .map_err(MigrateError::from)
                    .with_prefix(&format!("FIELDS of row {}", row + 1))?;
                Ok(TableSchema::new(identifier, fields))
            })
            .collect()
    }

    /// Source files to load, resolved against the `prefix` directory.
    pub fn sources(&self, prefix: &Path, style: TableNameStyle) -> Result<Vec<SourceRecord>, MigrateError> {
        let dataset_index = self.require_column(DATASET_COLUMN)?;
        self.table_identifiers(style)?
            .into_iter()
            .zip(self.records.iter())
            .enumerate()
            .map(|(row, (identifier, record))| {
                let dataset: Dataset = serde_json::from_str(self.value(record, dataset_index))
                    .map_err(MigrateError::from)
                    .with_prefix(&format!("DATASET of row {}", row + 1))?;
                Ok(SourceRecord {
                    table_name: identifier.name,
                    path: resolve_source_path(prefix, &dataset.path)?,
                    sheet_name: non_empty(dataset.option.sheet_name),
                    cells: non_empty(dataset.option.cells),
                })
            })
            .collect()
    }

    /// Points every dataset at the destination storage:
    /// `DATASET` becomes `{"format": "<format>", "table": "<table_name>"}` and
    /// the `table_name` column is dropped.
    pub fn convert_datasets(&self, format: &str) -> Result<Self, MigrateError> {
        let dataset_index = self.require_column(DATASET_COLUMN)?;
        let table_index = self.require_column(TABLE_NAME_COLUMN)?;

        let mut manifest = self.clone();
        for record in manifest.records.iter_mut() {
            let table = self.value(record, table_index).to_owned();
            let dataset = format!(
                "{{\"format\": {}, \"table\": {}}}",
                serde_json::to_string(format)?,
                serde_json::to_string(&table)?
            );
            match record.get_mut(dataset_index) {
                Some(value) => *value = dataset,
                None => Err(MigrateError::DataModel("record shorter than header".to_owned()))?,
            }
        }
        Ok(manifest.without_column(TABLE_NAME_COLUMN))
    }

    fn without_column(&self, name: &str) -> Self {
        match self.column(name) {
            Some(index) => Self {
                headers: remove_at(&self.headers, index),
                records: self.records.iter().map(|record| remove_at(record, index)).collect(),
            },
            None => self.clone(),
        }
    }
}

/// Resolves a `DATASET` path: the first unquoted run, last `/` segment, under `prefix`.
pub fn resolve_source_path(prefix: &Path, raw: &str) -> Result<PathBuf, MigrateError> {
    let unquoted = UNQUOTED_PATH
        .find(raw)
        .map(|matcher| matcher.as_str())
        .ok_or_else(|| MigrateError::DataModel(format!("invalid dataset path '{raw}'")))?;
    let file_name = unquoted.rsplit('/').next().unwrap_or(unquoted);
    Ok(prefix.join(file_name))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}

fn remove_at(values: &[String], index: usize) -> Vec<String> {
    values
        .iter()
        .enumerate()
        .filter(|(position, _)| *position != index)
        .map(|(_, value)| value.to_owned())
        .collect()
}
