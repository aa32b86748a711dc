// src/export/csv_file.rs
// =============================================================================
// CSV serialization of the export table.
//
// Column order is fixed per source and identical across all rows no matter
// which fields each rule actually carried: the two synthetic columns first,
// then the promoted identity columns, then the remaining configured fields
// (minus any already promoted).
//
// If the walk produced zero records, no file is written at all - an export
// full of nothing helps nobody downstream.
// =============================================================================

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde_json::Value;

use crate::config::{ExportConfig, FILE_COLUMN, FOLDER_COLUMN};
use crate::extract::FlatRecord;

// The fixed column order for one export
pub fn column_order(config: &ExportConfig) -> Vec<String> {
    let mut columns = vec![FOLDER_COLUMN.to_string(), FILE_COLUMN.to_string()];
    columns.extend(config.identity_columns.iter().cloned());

    for field in &config.fields {
        if !columns.contains(&field.column) {
            columns.push(field.column.clone());
        }
    }

    columns
}

// Output file name for a given date, e.g.
// "elastic_detection_rules_export_07_08_2026.csv"
pub fn dated_file_name(prefix: &str, date: NaiveDate) -> String {
    format!("{}_{}.csv", prefix, date.format("%d_%m_%Y"))
}

// Writes all records as CSV into the output directory
//
// Parameters:
//   config: export configuration (column set, file name prefix)
//   records: the export table rows, already in final order
//   out_dir: directory the file is created in
//   date: the date stamped into the file name
//
// Returns: the written path, or None when there were no records.
pub fn write_csv(
    config: &ExportConfig,
    records: &[FlatRecord],
    out_dir: &Path,
    date: NaiveDate,
) -> Result<Option<PathBuf>> {
    if records.is_empty() {
        return Ok(None);
    }

    let path = out_dir.join(dated_file_name(&config.output_prefix, date));
    let mut writer = csv::Writer::from_path(&path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    let columns = column_order(config);
    writer.write_record(&columns)?;

    for record in records {
        let row: Vec<String> = columns
            .iter()
            .map(|column| render_value(record.value(column)))
            .collect();
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(Some(path))
}

// Renders one cell
//
// Strings go out bare (no surrounding quotes beyond what CSV escaping adds);
// numbers and booleans use their display form; lists and nested mappings
// keep their JSON text; the absent marker renders as an empty cell.
fn render_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
