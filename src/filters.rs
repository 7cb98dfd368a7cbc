// 🔍 Filters - narrow the canonical datasets before aggregation
//
// Material applies to equipment, lines and elements; equipment type only to
// equipment; element type only to elements. Instruments are never filtered.

use crate::entities::{IsometricData, PnidData};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Literal used by callers to mean "no filter"
pub const ALL: &str = "All";

// ============================================================================
// FILTER VALUE
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum FilterValue {
    #[default]
    All,
    Only(String),
}

impl FilterValue {
    /// "All", empty or missing → All; anything else must match exactly
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => FilterValue::All,
            Some(v) if v == ALL => FilterValue::All,
            Some(v) => FilterValue::Only(v.to_string()),
        }
    }

    pub fn accepts(&self, value: &str) -> bool {
        match self {
            FilterValue::All => true,
            FilterValue::Only(wanted) => wanted == value,
        }
    }

    pub fn is_all(&self) -> bool {
        matches!(self, FilterValue::All)
    }
}

impl From<Option<String>> for FilterValue {
    fn from(raw: Option<String>) -> Self {
        FilterValue::parse(raw.as_deref())
    }
}

impl From<FilterValue> for String {
    fn from(value: FilterValue) -> Self {
        match value {
            FilterValue::All => ALL.to_string(),
            FilterValue::Only(v) => v,
        }
    }
}

// ============================================================================
// FILTERS
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
    #[serde(default)]
    pub material: FilterValue,

    #[serde(default)]
    pub equipment_type: FilterValue,

    #[serde(default)]
    pub element_type: FilterValue,
}

impl Filters {
    pub fn new(
        material: Option<&str>,
        equipment_type: Option<&str>,
        element_type: Option<&str>,
    ) -> Self {
        Filters {
            material: FilterValue::parse(material),
            equipment_type: FilterValue::parse(equipment_type),
            element_type: FilterValue::parse(element_type),
        }
    }

    pub fn is_unfiltered(&self) -> bool {
        self.material.is_all() && self.equipment_type.is_all() && self.element_type.is_all()
    }
}

/// Filtered copy of the PNID dataset
pub fn filter_pnid(pnid: &PnidData, filters: &Filters) -> PnidData {
    PnidData {
        equipments: pnid
            .equipments
            .iter()
            .filter(|e| filters.material.accepts(&e.material))
            .filter(|e| filters.equipment_type.accepts(&e.kind))
            .cloned()
            .collect(),
        instruments: pnid.instruments.clone(),
        lines: pnid
            .lines
            .iter()
            .filter(|l| filters.material.accepts(&l.material))
            .cloned()
            .collect(),
    }
}

/// Filtered copy of the ISO dataset
pub fn filter_iso(iso: &IsometricData, filters: &Filters) -> IsometricData {
    IsometricData {
        elements: iso
            .elements
            .iter()
            .filter(|e| filters.material.accepts(&e.material))
            .filter(|e| filters.element_type.accepts(&e.kind))
            .cloned()
            .collect(),
    }
}

// ============================================================================
// FILTER OPTIONS
// ============================================================================

/// Distinct values a user can filter on, first-seen order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub materials: Vec<String>,
    pub equipment_types: Vec<String>,
    pub element_types: Vec<String>,
}

impl FilterOptions {
    pub fn collect(pnid: &PnidData, iso: &IsometricData) -> Self {
        let materials = pnid
            .equipments
            .iter()
            .map(|e| e.material.as_str())
            .chain(pnid.lines.iter().map(|l| l.material.as_str()))
            .chain(iso.elements.iter().map(|e| e.material.as_str()));

        FilterOptions {
            materials: distinct(materials),
            equipment_types: distinct(pnid.equipments.iter().map(|e| e.kind.as_str())),
            element_types: distinct(iso.elements.iter().map(|e| e.kind.as_str())),
        }
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{normalize_iso_value, normalize_pnid_value};
    use serde_json::json;

    fn data() -> (PnidData, IsometricData) {
        let pnid = normalize_pnid_value(&json!({
            "equipment": [
                {"id": "eq-1", "type": "Pump", "material": "CS"},
                {"id": "eq-2", "type": "Pump", "material": "SS"},
                {"id": "eq-3", "type": "Valve", "material": "CS"}
            ],
            "instruments": [{"id": "ins-1", "type": "PI"}],
            "lines": [
                {"id": "L-1", "material": "SS"},
                {"id": "L-2", "material": "PP"}
            ]
        }));
        let iso = normalize_iso_value(&json!({
            "rows": [
                {"id": "a", "type": "pipe", "material": "CS"},
                {"id": "b", "type": "weld", "material": "CS"},
                {"id": "c", "type": "pipe", "material": "DSS"}
            ]
        }));
        (pnid, iso)
    }

    #[test]
    fn test_parse_all() {
        assert_eq!(FilterValue::parse(None), FilterValue::All);
        assert_eq!(FilterValue::parse(Some("All")), FilterValue::All);
        assert_eq!(FilterValue::parse(Some("  ")), FilterValue::All);
        assert_eq!(FilterValue::parse(Some("CS")), FilterValue::Only("CS".to_string()));
    }

    #[test]
    fn test_unfiltered_is_identity() {
        let (pnid, iso) = data();
        let filters = Filters::default();
        assert!(filters.is_unfiltered());
        assert_eq!(filter_pnid(&pnid, &filters), pnid);
        assert_eq!(filter_iso(&iso, &filters), iso);
    }

    #[test]
    fn test_material_filter() {
        let (pnid, iso) = data();
        let filters = Filters::new(Some("CS"), None, None);

        let p = filter_pnid(&pnid, &filters);
        assert_eq!(p.equipments.len(), 2);
        assert!(p.lines.is_empty());
        // Instruments carry no material and are kept
        assert_eq!(p.instruments.len(), 1);

        let i = filter_iso(&iso, &filters);
        assert_eq!(i.elements.len(), 2);
    }

    #[test]
    fn test_type_filters() {
        let (pnid, iso) = data();
        let filters = Filters::new(Some("CS"), Some("Pump"), Some("pipe"));

        let p = filter_pnid(&pnid, &filters);
        assert_eq!(p.equipments.len(), 1);
        assert_eq!(p.equipments[0].id, "eq-1");

        let i = filter_iso(&iso, &filters);
        assert_eq!(i.elements.len(), 1);
        assert_eq!(i.elements[0].id, "a");
    }

    #[test]
    fn test_filter_options() {
        let (pnid, iso) = data();
        let options = FilterOptions::collect(&pnid, &iso);

        assert_eq!(options.materials, vec!["CS", "SS", "PP", "DSS"]);
        assert_eq!(options.equipment_types, vec!["Pump", "Valve"]);
        assert_eq!(options.element_types, vec!["pipe", "weld"]);
    }

    #[test]
    fn test_filters_deserialize_from_partial_json() {
        let filters: Filters = serde_json::from_value(json!({"material": "SS"})).unwrap();
        assert_eq!(filters.material, FilterValue::Only("SS".to_string()));
        assert!(filters.equipment_type.is_all());
    }
}
