// 📤 Export - filtered records as CSV or JSON
//
// CSV header is the union of every record's keys in first-seen order, so
// heterogeneous records (equipment followed by lines) share one table.

use crate::entities::{IsometricData, PnidData};
use anyhow::{anyhow, Context, Result};
use csv::{QuoteStyle, WriterBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::str::FromStr;

// ============================================================================
// FORMATS & DATASETS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Json => "application/json; charset=utf-8",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(anyhow!("Unknown export format: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportDataset {
    Pnid,
    Iso,
}

impl ExportDataset {
    /// Base file name used for downloads
    pub fn file_stem(&self) -> &'static str {
        match self {
            ExportDataset::Pnid => "pnid_filtered",
            ExportDataset::Iso => "isometric_filtered",
        }
    }
}

impl FromStr for ExportDataset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pnid" => Ok(ExportDataset::Pnid),
            "iso" | "isometric" => Ok(ExportDataset::Iso),
            other => Err(anyhow!("Unknown export dataset: {}", other)),
        }
    }
}

// ============================================================================
// RECORD COLLECTION
// ============================================================================

/// PNID export rows: equipment first, then lines
pub fn pnid_records(pnid: &PnidData) -> Result<Vec<Value>> {
    let mut records = Vec::with_capacity(pnid.equipments.len() + pnid.lines.len());
    for equipment in &pnid.equipments {
        records.push(serde_json::to_value(equipment)?);
    }
    for line in &pnid.lines {
        records.push(serde_json::to_value(line)?);
    }
    Ok(records)
}

pub fn iso_records(iso: &IsometricData) -> Result<Vec<Value>> {
    iso.elements
        .iter()
        .map(|e| serde_json::to_value(e).context("Failed to serialize element"))
        .collect()
}

// ============================================================================
// WRITERS
// ============================================================================

/// Pretty-printed JSON array
pub fn to_json(records: &[Value]) -> Result<String> {
    serde_json::to_string_pretty(records).context("Failed to serialize records as JSON")
}

/// CSV with a union-of-keys header; empty input gives an empty string
pub fn to_csv(records: &[Value]) -> Result<String> {
    if records.is_empty() {
        return Ok(String::new());
    }

    let columns = union_keys(records);

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::NonNumeric)
        .from_writer(Vec::new());

    writer.write_record(&columns)?;

    for record in records {
        let object = record.as_object();
        let row: Vec<String> = columns
            .iter()
            .map(|column| cell(object.and_then(|o| o.get(column.as_str()))))
            .collect();
        writer.write_record(&row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to flush CSV writer: {}", e))?;

    String::from_utf8(bytes).context("CSV output was not valid UTF-8")
}

pub fn render(records: &[Value], format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Csv => to_csv(records),
        ExportFormat::Json => to_json(records),
    }
}

fn union_keys(records: &[Value]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();

    for object in records.iter().filter_map(Value::as_object) {
        for key in object.keys() {
            if seen.insert(key.clone()) {
                columns.push(key.clone());
            }
        }
    }

    columns
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{normalize_iso_value, normalize_pnid_value};
    use serde_json::json;

    #[test]
    fn test_csv_union_header_and_blanks() {
        let pnid = normalize_pnid_value(&json!({
            "equipment": [{"equipment_id": "P-1", "type": "Pump", "tag": "P-1A", "material": "CS"}],
            "lines": [{"line_id": "L-1", "size": "6 in", "material": "SS", "service": "Process"}]
        }));

        let csv = to_csv(&pnid_records(&pnid).unwrap()).unwrap();
        let mut lines = csv.lines();

        let header = lines.next().unwrap();
        assert!(header.contains("\"id\""));
        assert!(header.contains("\"tag\""));
        assert!(header.contains("\"size\""));
        assert!(header.contains("\"service\""));
        assert_eq!(csv.lines().count(), 3);

        // The equipment row has empty cells for line-only columns
        let equipment_row = lines.next().unwrap();
        assert!(equipment_row.starts_with("\"P-1\""));
        assert!(equipment_row.contains(",\"\""));
    }

    #[test]
    fn test_csv_escapes_quotes() {
        let records = vec![json!({"id": "L-1", "size": "8\""})];
        let csv = to_csv(&records).unwrap();
        assert!(csv.contains("\"8\"\"\""));
    }

    #[test]
    fn test_csv_numbers_unquoted() {
        let iso = normalize_iso_value(&json!({
            "rows": [{"id": "el-1", "type": "pipe", "material": "CS", "quantity": 6}]
        }));
        let csv = to_csv(&iso_records(&iso).unwrap()).unwrap();
        assert!(csv.contains(",6"));
    }

    #[test]
    fn test_empty_exports() {
        assert_eq!(to_csv(&[]).unwrap(), "");
        assert_eq!(to_json(&[]).unwrap(), "[]");
    }

    #[test]
    fn test_json_roundtrips_records() {
        let records = vec![json!({"id": "a"}), json!({"id": "b"})];
        let text = render(&records, ExportFormat::Json).unwrap();
        let back: Vec<Value> = serde_json::from_str(&text).unwrap();
        assert_eq!(back, records);
    }

    #[test]
    fn test_parse_format_and_dataset() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("isometric".parse::<ExportDataset>().unwrap(), ExportDataset::Iso);
        assert!("xml".parse::<ExportFormat>().is_err());
        assert_eq!(ExportDataset::Pnid.file_stem(), "pnid_filtered");
    }
}
