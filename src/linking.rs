// 🔗 Cross-Document Linker - PNID lines ↔ ISO elements by line id
//
// Three disjoint groups:
//   linked    - a Line plus every Element whose lineId points at it
//   PNID-only - a Line nobody points at
//   ISO-only  - an Element whose lineId points at no Line (dangling)
//
// Elements without a lineId belong to none of the groups. A dangling
// reference is an ordinary outcome here, not an error. When several Lines
// share an id only the first one is reported.

use crate::entities::{Element, Line};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// ============================================================================
// LINK STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkStatus {
    #[serde(rename = "linked")]
    Linked,

    #[serde(rename = "unlinked-pnid")]
    PnidOnly,

    #[serde(rename = "unlinked-iso")]
    IsoOnly,
}

impl LinkStatus {
    /// Human-readable label for display
    pub fn label(&self) -> &'static str {
        match self {
            LinkStatus::Linked => "Linked",
            LinkStatus::PnidOnly => "PNID Only",
            LinkStatus::IsoOnly => "ISO Only",
        }
    }

    /// Stable key, also used as the row-key prefix
    pub fn code(&self) -> &'static str {
        match self {
            LinkStatus::Linked => "linked",
            LinkStatus::PnidOnly => "unlinked-pnid",
            LinkStatus::IsoOnly => "unlinked-iso",
        }
    }
}

// ============================================================================
// LINKING REPORT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedLine {
    pub line: Line,
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkingReport {
    pub linked: Vec<LinkedLine>,
    pub pnid_only: Vec<Line>,
    pub iso_only: Vec<Element>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkingSummary {
    pub linked: usize,
    pub pnid_only: usize,
    pub iso_only: usize,
    pub total: usize,
}

/// One table row of the linking view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRow {
    pub key: String,
    pub line_id: String,
    pub line: Option<Line>,
    pub elements: Vec<Element>,
    pub status: LinkStatus,
    pub element_count: usize,
}

impl LinkRow {
    fn matches(&self, needle: &str) -> bool {
        let hit = |s: &str| s.to_lowercase().contains(needle);

        if hit(&self.line_id) {
            return true;
        }

        if let Some(line) = &self.line {
            if hit(&line.size) || hit(&line.material) {
                return true;
            }
        }

        self.elements
            .iter()
            .any(|e| hit(&e.kind) || hit(&e.material))
    }
}

impl LinkingReport {
    pub fn summary(&self) -> LinkingSummary {
        LinkingSummary {
            linked: self.linked.len(),
            pnid_only: self.pnid_only.len(),
            iso_only: self.iso_only.len(),
            total: self.linked.len() + self.pnid_only.len() + self.iso_only.len(),
        }
    }

    /// Distinct ids of lines that have at least one element
    pub fn linked_line_ids(&self) -> HashSet<&str> {
        self.linked.iter().map(|l| l.line.id.as_str()).collect()
    }

    /// Distinct line ids referenced by ISO-only elements
    pub fn dangling_line_ids(&self) -> HashSet<&str> {
        self.iso_only
            .iter()
            .filter_map(|e| e.line_id.as_deref())
            .collect()
    }

    /// Linked rows, then PNID-only rows, then ISO-only rows
    pub fn rows(&self) -> Vec<LinkRow> {
        let linked = self.linked.iter().map(|group| LinkRow {
            key: format!("{}-{}", LinkStatus::Linked.code(), group.line.id),
            line_id: group.line.id.clone(),
            line: Some(group.line.clone()),
            elements: group.elements.clone(),
            status: LinkStatus::Linked,
            element_count: group.elements.len(),
        });

        let pnid_only = self.pnid_only.iter().map(|line| LinkRow {
            key: format!("{}-{}", LinkStatus::PnidOnly.code(), line.id),
            line_id: line.id.clone(),
            line: Some(line.clone()),
            elements: Vec::new(),
            status: LinkStatus::PnidOnly,
            element_count: 0,
        });

        let iso_only = self.iso_only.iter().map(|element| LinkRow {
            key: format!("{}-{}", LinkStatus::IsoOnly.code(), element.id),
            line_id: element.line_id.clone().unwrap_or_default(),
            line: None,
            elements: vec![element.clone()],
            status: LinkStatus::IsoOnly,
            element_count: 1,
        });

        linked.chain(pnid_only).chain(iso_only).collect()
    }

    /// Rows whose line id, line size/material or any element type/material
    /// contains `text` (case-insensitive). Blank text returns every row.
    pub fn search(&self, text: &str) -> Vec<LinkRow> {
        let needle = text.trim().to_lowercase();
        let rows = self.rows();
        if needle.is_empty() {
            return rows;
        }
        rows.into_iter().filter(|row| row.matches(&needle)).collect()
    }

    /// Rows for one line id (linked, PNID-only, or the ISO-only elements that point at it)
    pub fn rows_for_line(&self, line_id: &str) -> Vec<LinkRow> {
        self.rows()
            .into_iter()
            .filter(|row| row.line_id == line_id)
            .collect()
    }
}

// ============================================================================
// LINKER
// ============================================================================

/// Partition lines and elements by shared line identity
pub fn link(lines: &[Line], elements: &[Element]) -> LinkingReport {
    let line_ids: HashSet<&str> = lines.iter().map(|l| l.id.as_str()).collect();

    let mut by_line: HashMap<&str, Vec<&Element>> = HashMap::new();
    for element in elements {
        if let Some(line_id) = element.line_id.as_deref() {
            by_line.entry(line_id).or_default().push(element);
        }
    }

    let mut report = LinkingReport::default();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut duplicates = 0usize;

    for line in lines {
        if !seen.insert(line.id.as_str()) {
            duplicates += 1;
            continue;
        }

        match by_line.get(line.id.as_str()) {
            Some(group) if !group.is_empty() => report.linked.push(LinkedLine {
                line: line.clone(),
                elements: group.iter().map(|e| (*e).clone()).collect(),
            }),
            _ => report.pnid_only.push(line.clone()),
        }
    }

    report.iso_only = elements
        .iter()
        .filter(|e| matches!(e.line_id.as_deref(), Some(id) if !line_ids.contains(id)))
        .cloned()
        .collect();

    if duplicates > 0 {
        tracing::warn!(duplicates, "duplicate PNID line ids, keeping the first of each");
    }

    tracing::debug!(
        linked = report.linked.len(),
        pnid_only = report.pnid_only.len(),
        iso_only = report.iso_only.len(),
        "linked PNID lines to ISO elements"
    );

    report
}

// ============================================================================
// TESTS
// ============================================================================
