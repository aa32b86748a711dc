// src/extract/record.rs
// =============================================================================
// This module parses rule file text and builds one flattened record per file.
//
// How it works:
// 1. Parse the raw text with the format's parser (toml / serde_yaml)
// 2. Convert the parsed tree into a serde_json::Value - one common document
//    model, so the field accessor works identically for both formats
// 3. Resolve every configured field path and store the result under its
//    column name, applying the source's missing-value policy
//
// A parse error fails the single file, not the run - the caller records a
// diagnostic and moves on to the next file.
// =============================================================================

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::config::{ExportConfig, MissingValue, RuleFormat, FILE_COLUMN, FOLDER_COLUMN};
use crate::extract::access::resolve_path;

// One row of the export table: column name -> extracted value
//
// None is the absent marker - a field path that did not resolve under the
// Null policy. The Empty policy stores Some("") instead, so the two are
// distinguishable in the record even though both render as an empty CSV cell.
#[derive(Debug, Clone, Default)]
pub struct FlatRecord {
    columns: HashMap<String, Option<Value>>,
}

impl FlatRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: &str, value: Option<Value>) {
        self.columns.insert(column.to_string(), value);
    }

    /// The extracted value for a column, or None when the column is absent
    /// or carries the absent marker
    pub fn value(&self, column: &str) -> Option<&Value> {
        self.columns.get(column).and_then(|v| v.as_ref())
    }

    /// True when the column was recorded with the absent marker
    /// (as opposed to not being part of the record at all)
    pub fn is_marked_absent(&self, column: &str) -> bool {
        matches!(self.columns.get(column), Some(None))
    }
}

// Builds the flattened record for one fetched rule file
//
// Parameters:
//   config: the export configuration (fields, format, missing-value policy)
//   text: the file's raw text content
//   folder_location: derived folder portion of the file's repository path
//   file_name: the file's name within its directory
//
// Returns: the record, or the parse error for the caller to diagnose
pub fn build_record(
    config: &ExportConfig,
    text: &str,
    folder_location: &str,
    file_name: &str,
) -> Result<FlatRecord> {
    let document = parse_document(config.format, text)?;

    let mut record = FlatRecord::new();
    record.insert(FOLDER_COLUMN, Some(Value::String(folder_location.to_string())));
    record.insert(FILE_COLUMN, Some(Value::String(file_name.to_string())));

    for field in &config.fields {
        let resolved = resolve_path(&document, &field.path);
        let value = match (resolved, config.missing_value) {
            (Some(v), _) => Some(v),
            (None, MissingValue::Empty) => Some(Value::String(String::new())),
            (None, MissingValue::Null) => None,
        };
        record.insert(&field.column, value);
    }

    Ok(record)
}

// Parses raw rule text into the common document model
pub fn parse_document(format: RuleFormat, text: &str) -> Result<Value> {
    match format {
        RuleFormat::Toml => {
            let value: toml::Value = toml::from_str(text).context("invalid TOML")?;
            Ok(toml_to_json(value))
        }
        RuleFormat::Yaml => {
            let value: serde_yaml::Value = serde_yaml::from_str(text).context("invalid YAML")?;
            Ok(yaml_to_json(value))
        }
    }
}

// Converts a TOML tree into the common model
//
// Done by hand rather than through serde so TOML datetimes come out as their
// plain string form instead of the toml crate's internal datetime wrapper.
fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(d) => Value::String(d.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, item)| (key, toml_to_json(item)))
                .collect(),
        ),
    }
}

// Converts a YAML tree into the common model
//
// YAML allows non-string mapping keys; scalar keys are stringified and
// anything stranger is dropped. Tagged values unwrap to their inner value.
fn yaml_to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(items) => {
            Value::Array(items.into_iter().map(yaml_to_json).collect())
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut object = serde_json::Map::new();
            for (key, item) in mapping {
                let key = match key {
                    serde_yaml::Value::String(s) => s,
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    _ => continue,
                };
                object.insert(key, yaml_to_json(item));
            }
            Value::Object(object)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}
