// 📋 Dashboard Breakdowns - per-dataset tables behind the PNID and ISO views
//
// PNID: equipment by type, instruments by type, lines by size × material
// ISO:  element quantity by type, element quantity by material

use crate::aggregate::{sum_by, GroupedCounts};
use crate::entities::{IsometricData, PnidData};
use crate::insights::{equipment_types, instrument_types};
use crate::size::size_value;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;

// ============================================================================
// LINE SORT ORDER
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineSortOrder {
    #[default]
    CountDesc,
    CountAsc,
    SizeDesc,
    SizeAsc,
    MaterialAsc,
    MaterialDesc,
}

impl LineSortOrder {
    pub fn code(&self) -> &'static str {
        match self {
            LineSortOrder::CountDesc => "count-desc",
            LineSortOrder::CountAsc => "count-asc",
            LineSortOrder::SizeDesc => "size-desc",
            LineSortOrder::SizeAsc => "size-asc",
            LineSortOrder::MaterialAsc => "material-asc",
            LineSortOrder::MaterialDesc => "material-desc",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LineSortOrder::CountDesc => "Count (High to Low)",
            LineSortOrder::CountAsc => "Count (Low to High)",
            LineSortOrder::SizeDesc => "Size (Large to Small)",
            LineSortOrder::SizeAsc => "Size (Small to Large)",
            LineSortOrder::MaterialAsc => "Material (A to Z)",
            LineSortOrder::MaterialDesc => "Material (Z to A)",
        }
    }

    pub fn all() -> [LineSortOrder; 6] {
        [
            LineSortOrder::CountDesc,
            LineSortOrder::CountAsc,
            LineSortOrder::SizeDesc,
            LineSortOrder::SizeAsc,
            LineSortOrder::MaterialAsc,
            LineSortOrder::MaterialDesc,
        ]
    }
}

impl FromStr for LineSortOrder {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        LineSortOrder::all()
            .into_iter()
            .find(|order| order.code() == s.trim())
            .ok_or_else(|| anyhow!("Unknown line sort order: {}", s))
    }
}

// ============================================================================
// LINE GROUPS (size × material)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineGroup {
    /// "<size> | <material>"
    pub key: String,
    pub size: String,
    pub material: String,
    pub count: u64,
}

/// Lines grouped by (size, material), first-seen order
pub fn line_groups(pnid: &PnidData) -> Vec<LineGroup> {
    let mut counts = GroupedCounts::new();
    for line in &pnid.lines {
        counts.add(&group_key(&line.size, &line.material), 1);
    }

    let mut groups = Vec::with_capacity(counts.len());
    for entry in counts.entries() {
        if let Some((size, material)) = entry.key.split_once(" | ") {
            groups.push(LineGroup {
                key: entry.key.clone(),
                size: size.to_string(),
                material: material.to_string(),
                count: entry.count,
            });
        }
    }
    groups
}

fn group_key(size: &str, material: &str) -> String {
    format!("{} | {}", size, material)
}

/// Stable sort of line groups
pub fn sort_line_groups(groups: &mut [LineGroup], order: LineSortOrder) {
    let by_size = |a: &LineGroup, b: &LineGroup| {
        size_value(&a.size)
            .partial_cmp(&size_value(&b.size))
            .unwrap_or(Ordering::Equal)
    };

    match order {
        LineSortOrder::CountDesc => groups.sort_by(|a, b| b.count.cmp(&a.count)),
        LineSortOrder::CountAsc => groups.sort_by(|a, b| a.count.cmp(&b.count)),
        LineSortOrder::SizeDesc => groups.sort_by(|a, b| by_size(b, a)),
        LineSortOrder::SizeAsc => groups.sort_by(by_size),
        LineSortOrder::MaterialAsc => groups.sort_by(|a, b| a.material.cmp(&b.material)),
        LineSortOrder::MaterialDesc => groups.sort_by(|a, b| b.material.cmp(&a.material)),
    }
}

// ============================================================================
// BREAKDOWNS
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct PnidBreakdown {
    pub equipment_by_type: GroupedCounts,
    pub instruments_by_type: GroupedCounts,
    pub lines: Vec<LineGroup>,
    pub line_sort: LineSortOrder,
}

#[derive(Debug, Clone, Serialize)]
pub struct IsoBreakdown {
    /// Sum of stored quantity per element type (0 contributes 0)
    pub elements_by_type: GroupedCounts,
    /// Sum of stored quantity per material
    pub materials: GroupedCounts,
}

pub fn pnid_breakdown(pnid: &PnidData, order: LineSortOrder) -> PnidBreakdown {
    let mut lines = line_groups(pnid);
    sort_line_groups(&mut lines, order);

    PnidBreakdown {
        equipment_by_type: equipment_types(pnid),
        instruments_by_type: instrument_types(pnid),
        lines,
        line_sort: order,
    }
}

pub fn iso_breakdown(iso: &IsometricData) -> IsoBreakdown {
    IsoBreakdown {
        elements_by_type: sum_by(&iso.elements, |e| e.kind.as_str(), |e| e.quantity),
        materials: sum_by(&iso.elements, |e| e.material.as_str(), |e| e.quantity),
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

    fn pnid() -> PnidData {
        normalize_pnid_value(&json!({
            "equipment": [{"type": "Pump"}, {"type": "Valve"}, {"type": "Pump"}],
            "instruments": [{"type": "PI"}],
            "lines": [
                {"id": "1", "size": "6 in", "material": "CS"},
                {"id": "2", "size": "2 in", "material": "SS"},
                {"id": "3", "size": "6 in", "material": "CS"},
                {"id": "4", "size": "DN300", "material": "ALLOY"},
                {"id": "5", "material": "PP"}
            ]
        }))
    }

    fn keys(groups: &[LineGroup]) -> Vec<&str> {
        groups.iter().map(|g| g.key.as_str()).collect()
    }

    #[test]
    fn test_line_groups_first_seen() {
        let groups = line_groups(&pnid());
        assert_eq!(
            keys(&groups),
            vec!["6 in | CS", "2 in | SS", "12 in | ALLOY", "Unknown | PP"]
        );
        assert_eq!(groups[0].count, 2);
        assert_eq!(groups[0].size, "6 in");
        assert_eq!(groups[0].material, "CS");
    }

    #[test]
    fn test_sort_orders() {
        let base = line_groups(&pnid());

        let mut g = base.clone();
        sort_line_groups(&mut g, LineSortOrder::CountDesc);
        assert_eq!(g[0].key, "6 in | CS");
        // Ties keep first-seen order
        assert_eq!(keys(&g[1..]), vec!["2 in | SS", "12 in | ALLOY", "Unknown | PP"]);

        let mut g = base.clone();
        sort_line_groups(&mut g, LineSortOrder::SizeDesc);
        assert_eq!(keys(&g), vec!["12 in | ALLOY", "6 in | CS", "2 in | SS", "Unknown | PP"]);

        let mut g = base.clone();
        sort_line_groups(&mut g, LineSortOrder::SizeAsc);
        assert_eq!(g[0].key, "Unknown | PP");

        let mut g = base.clone();
        sort_line_groups(&mut g, LineSortOrder::MaterialAsc);
        assert_eq!(keys(&g), vec!["12 in | ALLOY", "6 in | CS", "Unknown | PP", "2 in | SS"]);

        let mut g = base;
        sort_line_groups(&mut g, LineSortOrder::CountAsc);
        assert_eq!(g.last().unwrap().key, "6 in | CS");
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("size-desc".parse::<LineSortOrder>().unwrap(), LineSortOrder::SizeDesc);
        assert_eq!(LineSortOrder::default(), LineSortOrder::CountDesc);
        assert!("sideways".parse::<LineSortOrder>().is_err());

        for order in LineSortOrder::all() {
            assert_eq!(order.code().parse::<LineSortOrder>().unwrap(), order);
        }
    }

    #[test]
    fn test_pnid_breakdown() {
        let breakdown = pnid_breakdown(&pnid(), LineSortOrder::CountDesc);
        assert_eq!(breakdown.equipment_by_type.get("Pump"), Some(2));
        assert_eq!(breakdown.equipment_by_type.get("Valve"), Some(1));
        assert_eq!(breakdown.instruments_by_type.get("PI"), Some(1));
        assert_eq!(breakdown.lines.len(), 4);
    }

    #[test]
    fn test_iso_breakdown_uses_quantity() {
        let iso = normalize_iso_value(&json!({
            "rows": [
                {"type": "pipe", "quantity": 6, "material": "CS"},
                {"type": "pipe", "quantity": 2, "material": "SS"},
                {"type": "weld", "material": "CS"}
            ]
        }));
        let breakdown = iso_breakdown(&iso);
        assert_eq!(breakdown.elements_by_type.get("pipe"), Some(8));
        assert_eq!(breakdown.elements_by_type.get("weld"), Some(1));
        assert_eq!(breakdown.materials.get("CS"), Some(7));
        assert_eq!(breakdown.materials.get("SS"), Some(2));
    }

    #[test]
    fn test_iso_breakdown_keeps_zero_quantity() {
        let iso = normalize_iso_value(&json!({
            "rows": [
                {"type": "pipe", "quantity": 3, "material": "CS"},
                {"type": "weld", "quantity": 0, "material": "CS"}
            ]
        }));
        let breakdown = iso_breakdown(&iso);
        assert_eq!(breakdown.elements_by_type.get("weld"), Some(0));
        assert_eq!(breakdown.materials.get("CS"), Some(3));
    }
}
