// 🏭 PNID Entities - equipment, instruments and piping lines
//
// Produced by normalize::normalize_pnid. Sizes and materials are already
// canonical (see size.rs / material.rs) by the time a record exists.

use serde::{Deserialize, Serialize};

// ============================================================================
// EQUIPMENT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,

    /// Canonical material code
    pub material: String,
}

// ============================================================================
// INSTRUMENT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instrument {
    pub id: String,

    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

// ============================================================================
// LINE
// ============================================================================

/// A PNID piping segment, the unit both drawings are linked on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub id: String,

    /// Canonical size label ("6 in" or "Unknown")
    pub size: String,

    /// Canonical material code
    pub material: String,

    /// Raw service string, untouched
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,

    #[serde(rename = "type")]
    pub kind: String,
}

// ============================================================================
// DATASET
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PnidData {
    #[serde(default)]
    pub equipments: Vec<Equipment>,

    #[serde(default)]
    pub instruments: Vec<Instrument>,

    #[serde(default)]
    pub lines: Vec<Line>,
}

impl PnidData {
    /// Empty default used when the upstream job produced nothing
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.equipments.is_empty() && self.instruments.is_empty() && self.lines.is_empty()
    }

    pub fn line(&self, id: &str) -> Option<&Line> {
        self.lines.iter().find(|l| l.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_serializes_with_canonical_keys() {
        let line = Line {
            id: "L-100".to_string(),
            size: "6 in".to_string(),
            material: "CS".to_string(),
            service: None,
            kind: "Process".to_string(),
        };

        let json = serde_json::to_value(&line).unwrap();
        assert_eq!(json["type"], "Process");
        assert_eq!(json["size"], "6 in");
        assert!(json.get("service").is_none());
    }

    #[test]
    fn test_empty_dataset() {
        let data = PnidData::empty();
        assert!(data.is_empty());
        assert!(data.line("L-100").is_none());
    }
}
