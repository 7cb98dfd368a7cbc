// 📐 ISO Entities - isometric drawing items
//
// Pipes, fittings, welds... each optionally referencing the PNID line it
// was drawn for. That reference is a candidate only; it may dangle.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: String,

    /// Trimmed and lower-cased ("pipe", "elbow", "weld")
    #[serde(rename = "type")]
    pub kind: String,

    /// Canonical material code
    pub material: String,

    pub quantity: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IsometricData {
    #[serde(default)]
    pub elements: Vec<Element>,
}

impl IsometricData {
    /// Empty default used when the upstream job produced nothing
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Sum of quantities across all elements, saturating at u64::MAX
    pub fn total_quantity(&self) -> u64 {
        self.elements.iter().map(|e| e.quantity).fold(0, u64::saturating_add)
    }
}
