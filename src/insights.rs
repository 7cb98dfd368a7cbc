// 💡 Insight Aggregator - summary statistics over canonical records
//
// PNID:   totals, most common equipment / instrument type, largest line size,
//         top line materials
// ISO:    totals, most common element type (by quantity), top materials
// Linking: linked / unlinked counts and the link-coverage ratio
//
// Pure: same records in, same report out. Empty input gives zero totals,
// no most-common picks and 0% coverage.

use crate::aggregate::{count_by, largest_size, sum_by, CountEntry, GroupedCounts};
use crate::entities::{Element, IsometricData, PnidData};
use crate::linking::{link, LinkingReport};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How many materials the insight views list
pub const DEFAULT_TOP_MATERIALS: usize = 3;

// ============================================================================
// REPORT TYPES
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PnidInsights {
    pub total_equipment: usize,
    pub total_instruments: usize,
    pub total_lines: usize,
    pub most_common_equipment: Option<CountEntry>,
    pub most_common_instrument: Option<CountEntry>,
    pub largest_line_size: Option<CountEntry>,
    pub top_line_materials: Vec<CountEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IsoInsights {
    pub total_elements: usize,
    pub total_quantity: u64,
    pub most_common_element: Option<CountEntry>,
    pub top_materials: Vec<CountEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkInsights {
    /// Distinct line ids present on both sides
    pub linked_lines: usize,
    /// Distinct PNID line ids no element points at
    pub unlinked_pnid_lines: usize,
    /// Distinct ISO line references with no PNID line
    pub unlinked_iso_refs: usize,
    /// round(100 * linked / total lines), 0 when there are no lines
    pub coverage_percent: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsightsReport {
    pub pnid: PnidInsights,
    pub iso: IsoInsights,
    pub linking: LinkInsights,
}

impl InsightsReport {
    pub fn summary(&self) -> String {
        format!(
            "PNID: {} equipment, {} instruments, {} lines | ISO: {} elements ({} items) | Link coverage: {}%",
            self.pnid.total_equipment,
            self.pnid.total_instruments,
            self.pnid.total_lines,
            self.iso.total_elements,
            self.iso.total_quantity,
            self.linking.coverage_percent
        )
    }
}

// ============================================================================
// GROUPINGS
// ============================================================================

pub fn equipment_types(pnid: &PnidData) -> GroupedCounts {
    count_by(&pnid.equipments, |e| e.kind.as_str())
}

pub fn instrument_types(pnid: &PnidData) -> GroupedCounts {
    count_by(&pnid.instruments, |i| i.kind.as_str())
}

pub fn line_sizes(pnid: &PnidData) -> GroupedCounts {
    count_by(&pnid.lines, |l| l.size.as_str())
}

pub fn line_materials(pnid: &PnidData) -> GroupedCounts {
    count_by(&pnid.lines, |l| l.material.as_str())
}

/// Insight weight of an element: its quantity, with 0 counted as 1
pub fn element_weight(element: &Element) -> u64 {
    if element.quantity == 0 {
        1
    } else {
        element.quantity
    }
}

/// Element types weighted by quantity
pub fn element_types(iso: &IsometricData) -> GroupedCounts {
    sum_by(&iso.elements, |e| e.kind.as_str(), element_weight)
}

/// Element materials weighted by quantity
pub fn element_materials(iso: &IsometricData) -> GroupedCounts {
    sum_by(&iso.elements, |e| e.material.as_str(), element_weight)
}

// ============================================================================
// LINK COVERAGE
// ============================================================================

/// Percentage of lines that are linked, rounded; 0 when there are no lines
pub fn link_coverage(linked_lines: usize, total_lines: usize) -> u32 {
    if total_lines == 0 {
        return 0;
    }
    let pct = (100.0 * linked_lines as f64 / total_lines as f64).round();
    pct.clamp(0.0, 100.0) as u32
}

fn link_insights(pnid: &PnidData, report: &LinkingReport) -> LinkInsights {
    let pnid_ids: HashSet<&str> = pnid.lines.iter().map(|l| l.id.as_str()).collect();
    let linked = report.linked_line_ids();

    LinkInsights {
        linked_lines: linked.len(),
        unlinked_pnid_lines: pnid_ids.len() - linked.len(),
        unlinked_iso_refs: report.dangling_line_ids().len(),
        coverage_percent: link_coverage(linked.len(), pnid.lines.len()),
    }
}

// ============================================================================
// AGGREGATOR
// ============================================================================

/// Compute every insight, linking the two datasets along the way
pub fn compute_insights(pnid: &PnidData, iso: &IsometricData, top_n: usize) -> InsightsReport {
    let report = link(&pnid.lines, &iso.elements);
    compute_insights_with_links(pnid, iso, &report, top_n)
}

/// Same as `compute_insights`, reusing an existing linking report
pub fn compute_insights_with_links(
    pnid: &PnidData,
    iso: &IsometricData,
    links: &LinkingReport,
    top_n: usize,
) -> InsightsReport {
    let pnid_insights = PnidInsights {
        total_equipment: pnid.equipments.len(),
        total_instruments: pnid.instruments.len(),
        total_lines: pnid.lines.len(),
        most_common_equipment: equipment_types(pnid).most_common(),
        most_common_instrument: instrument_types(pnid).most_common(),
        largest_line_size: largest_size(&line_sizes(pnid)),
        top_line_materials: line_materials(pnid).top_n(top_n),
    };

    let iso_insights = IsoInsights {
        total_elements: iso.elements.len(),
        total_quantity: iso.total_quantity(),
        most_common_element: element_types(iso).most_common(),
        top_materials: element_materials(iso).top_n(top_n),
    };

    InsightsReport {
        pnid: pnid_insights,
        iso: iso_insights,
        linking: link_insights(pnid, links),
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

    fn sample() -> (PnidData, IsometricData) {
        let pnid = normalize_pnid_value(&json!({
            "equipment": [
                {"id": "eq-1", "type": "Pump", "material": "CS"},
                {"id": "eq-2", "type": "Pump", "material": "SS"},
                {"id": "eq-3", "type": "Valve", "material": "CS"},
                {"id": "eq-4", "type": "Compressor", "material": "CS"}
            ],
            "instruments": [
                {"id": "ins-1", "type": "Pressure Indicator"},
                {"id": "ins-2", "type": "Temperature Indicator"},
                {"id": "ins-3", "type": "Pressure Indicator"}
            ],
            "lines": [
                {"id": "L-100", "size": "6 in", "material": "CS"},
                {"id": "L-101", "size": "4in", "material": "CS"},
                {"id": "L-102", "size": "DN150", "material": "SS"},
                {"id": "L-103", "size": "2 in", "material": "SS"}
            ]
        }));
        let iso = normalize_iso_value(&json!({
            "rows": [
                {"id": "el-1", "type": "pipe", "material": "CS", "quantity": 6, "line_number": "L-100"},
                {"id": "el-2", "type": "elbow", "material": "CS", "quantity": 4, "line_number": "L-100"},
                {"id": "el-3", "type": "weld", "material": "CS", "quantity": 8, "line_number": "L-101"},
                {"id": "el-4", "type": "pipe", "material": "SS", "quantity": 3, "line_number": "L-102"},
                {"id": "el-5", "type": "elbow", "material": "SS", "quantity": 2, "line_number": "L-200"}
            ]
        }));
        (pnid, iso)
    }

    #[test]
    fn test_pnid_insights() {
        let (pnid, iso) = sample();
        let report = compute_insights(&pnid, &iso, DEFAULT_TOP_MATERIALS);

        assert_eq!(report.pnid.total_equipment, 4);
        assert_eq!(report.pnid.total_instruments, 3);
        assert_eq!(report.pnid.total_lines, 4);
        assert_eq!(report.pnid.most_common_equipment, Some(CountEntry::new("Pump", 2)));
        assert_eq!(
            report.pnid.most_common_instrument,
            Some(CountEntry::new("Pressure Indicator", 2))
        );
        // "6 in" appears twice (L-100 and DN150)
        assert_eq!(report.pnid.largest_line_size, Some(CountEntry::new("6 in", 2)));
        assert_eq!(
            report.pnid.top_line_materials,
            vec![CountEntry::new("CS", 2), CountEntry::new("SS", 2)]
        );
    }

    #[test]
    fn test_iso_insights_sum_quantity() {
        let (pnid, iso) = sample();
        let report = compute_insights(&pnid, &iso, DEFAULT_TOP_MATERIALS);

        assert_eq!(report.iso.total_elements, 5);
        assert_eq!(report.iso.total_quantity, 23);
        // pipe 9, weld 8, elbow 6
        assert_eq!(report.iso.most_common_element, Some(CountEntry::new("pipe", 9)));
        assert_eq!(
            report.iso.top_materials,
            vec![CountEntry::new("CS", 18), CountEntry::new("SS", 5)]
        );
    }

    #[test]
    fn test_element_types_sum_not_count() {
        let iso = normalize_iso_value(&json!({
            "rows": [
                {"type": "pipe", "quantity": 6, "material": "CS"},
                {"type": "pipe", "quantity": 2, "material": "CS"}
            ]
        }));
        let types = element_types(&iso);
        assert_eq!(types.len(), 1);
        assert_eq!(types.get("pipe"), Some(8));
    }

    #[test]
    fn test_zero_quantity_counts_once() {
        let iso = normalize_iso_value(&json!({
            "rows": [
                {"type": "pipe", "quantity": 2, "material": "CS"},
                {"type": "weld", "quantity": 0, "material": "SS"}
            ]
        }));

        assert_eq!(iso.elements[1].quantity, 0);
        assert_eq!(element_types(&iso).get("weld"), Some(1));
        assert_eq!(element_materials(&iso).get("SS"), Some(1));
        assert_eq!(iso.total_quantity(), 2);
    }

    #[test]
    fn test_huge_quantities_saturate() {
        let iso = normalize_iso_value(&json!({
            "rows": [
                {"type": "pipe", "quantity": 1e19, "material": "CS"},
                {"type": "pipe", "quantity": 1e19, "material": "CS"}
            ]
        }));

        let report = compute_insights(&PnidData::empty(), &iso, DEFAULT_TOP_MATERIALS);
        assert_eq!(report.iso.total_quantity, u64::MAX);
        assert_eq!(report.iso.most_common_element, Some(CountEntry::new("pipe", u64::MAX)));
        assert_eq!(report.iso.top_materials, vec![CountEntry::new("CS", u64::MAX)]);
    }

    #[test]
    fn test_link_insights() {
        let (pnid, iso) = sample();
        let report = compute_insights(&pnid, &iso, DEFAULT_TOP_MATERIALS);

        assert_eq!(report.linking.linked_lines, 3);
        assert_eq!(report.linking.unlinked_pnid_lines, 1);
        assert_eq!(report.linking.unlinked_iso_refs, 1);
        assert_eq!(report.linking.coverage_percent, 75);
    }

    #[test]
    fn test_link_coverage_bounds() {
        assert_eq!(link_coverage(0, 0), 0);
        assert_eq!(link_coverage(5, 0), 0);
        assert_eq!(link_coverage(0, 7), 0);
        assert_eq!(link_coverage(1, 3), 33);
        assert_eq!(link_coverage(2, 3), 67);
        assert_eq!(link_coverage(1, 2), 50);
        assert_eq!(link_coverage(7, 7), 100);

        for total in 0..20 {
            for linked in 0..=total {
                let pct = link_coverage(linked, total);
                assert!(pct <= 100);
            }
        }
    }

    #[test]
    fn test_empty_inputs() {
        let report = compute_insights(&PnidData::empty(), &IsometricData::empty(), 3);

        assert_eq!(report, InsightsReport::default());
        assert_eq!(report.pnid.most_common_equipment, None);
        assert_eq!(report.pnid.largest_line_size, None);
        assert!(report.iso.top_materials.is_empty());
        assert_eq!(report.linking.coverage_percent, 0);
    }

    #[test]
    fn test_summary_line() {
        let (pnid, iso) = sample();
        let summary = compute_insights(&pnid, &iso, 3).summary();
        assert!(summary.contains("4 lines"));
        assert!(summary.contains("75%"));
    }
}
