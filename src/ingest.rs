// 📥 Ingest - raw JSON files into a canonical dataset
//
// A file holds either a raw extraction payload or the job snapshot the
// poller last saw ({"status": ..., "result": ...}). Either way the caller
// ends up with a Dataset; a missing payload just means an empty side plus
// a message in `errors`.

use crate::entities::{IsometricData, PnidData};
use crate::job::{JobOutcome, JobSnapshot};
use crate::normalize::{normalize_iso_value, normalize_pnid_value};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

// ============================================================================
// FILE READING
// ============================================================================

/// Read a payload file. Invalid JSON is an error; odd shapes are not.
pub fn read_payload_file(path: &Path) -> Result<JobOutcome<Value>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read payload file: {}", path.display()))?;

    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;

    parse_payload(value, &fallback_job_id(path))
}

/// Classify an already-parsed document
pub fn parse_payload(value: Value, fallback_id: &str) -> Result<JobOutcome<Value>> {
    let is_snapshot = value
        .as_object()
        .map(|o| o.contains_key("status"))
        .unwrap_or(false);

    if !is_snapshot {
        return Ok(JobOutcome::Ready(value));
    }

    let job_id = snapshot_job_id(&value).unwrap_or_else(|| fallback_id.to_string());
    let snapshot: JobSnapshot<Value> = serde_json::from_value(value)
        .with_context(|| format!("Unrecognised job snapshot for job {}", job_id))?;

    Ok(snapshot.into_outcome(&job_id))
}

fn snapshot_job_id(value: &Value) -> Option<String> {
    ["job_id", "jobId", "id"]
        .iter()
        .find_map(|key| value.get(*key))
        .and_then(|id| match id {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

fn fallback_job_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// DATASET
// ============================================================================

/// Both canonical datasets plus whatever went wrong upstream
#[derive(Debug, Clone, Serialize)]
pub struct Dataset {
    pub pnid: PnidData,
    pub iso: IsometricData,
    pub errors: Vec<String>,
    pub loaded_at: DateTime<Utc>,
}

impl Default for Dataset {
    fn default() -> Self {
        Dataset {
            pnid: PnidData::empty(),
            iso: IsometricData::empty(),
            errors: Vec::new(),
            loaded_at: Utc::now(),
        }
    }
}

impl Dataset {
    /// Normalize ready payloads; anything else leaves that side empty
    pub fn from_outcomes(pnid: JobOutcome<Value>, iso: JobOutcome<Value>) -> Self {
        let mut errors = Vec::new();

        let pnid = match pnid {
            JobOutcome::Ready(value) => normalize_pnid_value(&value),
            other => {
                if let Some(message) = other.user_message() {
                    tracing::warn!(side = "pnid", "{}", message);
                    errors.push(message);
                }
                PnidData::empty()
            }
        };

        let iso = match iso {
            JobOutcome::Ready(value) => normalize_iso_value(&value),
            other => {
                if let Some(message) = other.user_message() {
                    tracing::warn!(side = "iso", "{}", message);
                    errors.push(message);
                }
                IsometricData::empty()
            }
        };

        Dataset {
            pnid,
            iso,
            errors,
            loaded_at: Utc::now(),
        }
    }

    /// Load both sides from disk. A side without a path stays empty.
    pub fn load(pnid_path: Option<&Path>, iso_path: Option<&Path>) -> Result<Self> {
        let pnid = match pnid_path {
            Some(path) => read_payload_file(path)?,
            None => JobOutcome::Ready(Value::Null),
        };
        let iso = match iso_path {
            Some(path) => read_payload_file(path)?,
            None => JobOutcome::Ready(Value::Null),
        };

        let dataset = Dataset::from_outcomes(pnid, iso);
        tracing::info!(
            equipment = dataset.pnid.equipments.len(),
            lines = dataset.pnid.lines.len(),
            elements = dataset.iso.elements.len(),
            errors = dataset.errors.len(),
            "Dataset loaded"
        );
        Ok(dataset)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_json(value: &Value) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", value).unwrap();
        file
    }

    #[test]
    fn test_raw_payload_is_ready() {
        let file = write_json(&json!({"lines": [{"line_id": "L-1"}]}));
        let outcome = read_payload_file(file.path()).unwrap();
        assert!(outcome.is_ready());
    }

    #[test]
    fn test_snapshot_payload_unwrapped() {
        let file = write_json(&json!({
            "job_id": "job-42",
            "status": "succeeded",
            "result": {"rows": [{"type": "pipe", "quantity": 2}]}
        }));
        let outcome = read_payload_file(file.path()).unwrap();
        assert_eq!(outcome.ready(), Some(json!({"rows": [{"type": "pipe", "quantity": 2}]})));
    }

    #[test]
    fn test_failed_snapshot_uses_job_id() {
        let outcome = parse_payload(json!({"jobId": "xyz", "status": "failed"}), "file").unwrap();
        assert_eq!(outcome.user_message(), Some("Job xyz failed".to_string()));

        let outcome = parse_payload(json!({"status": "failed"}), "pnid").unwrap();
        assert_eq!(outcome.user_message(), Some("Job pnid failed".to_string()));
    }

    #[test]
    fn test_invalid_json_is_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(read_payload_file(file.path()).is_err());
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(read_payload_file(Path::new("/definitely/not/here.json")).is_err());
    }

    #[test]
    fn test_from_outcomes_degrades_to_empty() {
        let dataset = Dataset::from_outcomes(
            JobOutcome::Failed {
                job_id: "p1".to_string(),
            },
            JobOutcome::TimedOut,
        );

        assert!(dataset.pnid.is_empty());
        assert!(dataset.iso.is_empty());
        assert_eq!(
            dataset.errors,
            vec!["Job p1 failed".to_string(), "Polling timed out".to_string()]
        );
        assert!(dataset.has_errors());
    }

    #[test]
    fn test_load_normalizes_both_sides() {
        let pnid = write_json(&json!({
            "lines": [{"line_id": "L-100", "size": "DN150", "material": "carbon steel"}]
        }));
        let iso = write_json(&json!({
            "rows": [{"type": " Pipe ", "material": "SS316", "line_number": "L-100"}]
        }));

        let dataset = Dataset::load(Some(pnid.path()), Some(iso.path())).unwrap();

        assert_eq!(dataset.pnid.lines[0].size, "6 in");
        assert_eq!(dataset.pnid.lines[0].material, "CS");
        assert_eq!(dataset.iso.elements[0].kind, "pipe");
        assert_eq!(dataset.iso.elements[0].line_id.as_deref(), Some("L-100"));
        assert!(!dataset.has_errors());
    }

    #[test]
    fn test_load_without_paths_is_empty() {
        let dataset = Dataset::load(None, None).unwrap();
        assert!(dataset.pnid.is_empty());
        assert!(dataset.iso.is_empty());
        assert!(dataset.errors.is_empty());
    }
}
