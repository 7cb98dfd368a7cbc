// 🔄 Record Normalizer - raw pipeline payloads → canonical records
//
// Two entry points, one per pipeline:
//   normalize_pnid: {equipment, instruments, lines} → PnidData
//   normalize_iso:  {rows}                          → IsometricData
//
// Never fails: every field has a fallback. Missing identifiers are derived
// from the record's content and position, so re-normalizing the same payload
// always yields the same ids.

use crate::entities::{
    Element, Equipment, Instrument, IsometricData, Line, PnidData, UNKNOWN_TYPE,
};
use crate::material::normalize_material;
use crate::payload::{
    RawEquipment, RawInstrument, RawIsoPayload, RawIsoRow, RawLine, RawPnidPayload,
};
use crate::size::normalize_size;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Quantity assumed when a row does not state one
pub const DEFAULT_QUANTITY: u64 = 1;

// ============================================================================
// STABLE IDENTIFIERS
// ============================================================================

/// Which record family a derived id belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    Equipment,
    Instrument,
    Line,
    Element,
}

impl IdKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            IdKind::Equipment => "eq",
            IdKind::Instrument => "ins",
            IdKind::Line => "line",
            IdKind::Element => "el",
        }
    }
}

/// Derive an id for a record that arrived without one.
///
/// SHA-256 over kind, position and the record's own fields; the first
/// 16 hex chars are kept. Two identical rows at different positions get
/// different ids.
pub fn derive_id<T: Serialize>(kind: IdKind, index: usize, raw: &T) -> String {
    let content = serde_json::to_string(raw).unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(format!("{}:{}:{}", kind.prefix(), index, content));
    let digest = format!("{:x}", hasher.finalize());

    format!("{}-{}", kind.prefix(), &digest[..16])
}

// ============================================================================
// FIELD HELPERS
// ============================================================================

/// Some and non-empty
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

/// Trimmed type, "Unknown" when absent or blank
fn clean_type(raw: &Option<String>) -> String {
    match raw.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => t.to_string(),
        _ => UNKNOWN_TYPE.to_string(),
    }
}

fn coerce_quantity(raw: Option<f64>) -> u64 {
    match raw {
        Some(q) if q.is_finite() && q >= 0.0 => q.round() as u64,
        _ => DEFAULT_QUANTITY,
    }
}

/// Size source for a line: `size_in` (as `<n>"`) wins over free-form `size`
fn line_size_source(raw: &RawLine) -> Option<String> {
    match raw.size_in {
        Some(n) if n != 0.0 => Some(format!("{}\"", n)),
        _ => present(&raw.size).map(str::to_string),
    }
}

// ============================================================================
// PNID
// ============================================================================

pub fn normalize_equipment(index: usize, raw: &RawEquipment) -> Equipment {
    let id = present(&raw.equipment_id)
        .or(present(&raw.id))
        .map(str::to_string)
        .unwrap_or_else(|| derive_id(IdKind::Equipment, index, raw));

    Equipment {
        id,
        kind: clean_type(&raw.kind),
        tag: present(&raw.tag)
            .or(present(&raw.equipment_id))
            .map(str::to_string),
        material: normalize_material(present(&raw.material)),
    }
}

pub fn normalize_instrument(index: usize, raw: &RawInstrument) -> Instrument {
    let id = present(&raw.instrument_id)
        .or(present(&raw.id))
        .map(str::to_string)
        .unwrap_or_else(|| derive_id(IdKind::Instrument, index, raw));

    Instrument {
        id,
        kind: clean_type(&raw.kind),
        tag: present(&raw.tag)
            .or(present(&raw.instrument_id))
            .map(str::to_string),
    }
}

pub fn normalize_line(index: usize, raw: &RawLine) -> Line {
    let id = present(&raw.line_id)
        .or(present(&raw.id))
        .map(str::to_string)
        .unwrap_or_else(|| derive_id(IdKind::Line, index, raw));

    Line {
        id,
        size: normalize_size(line_size_source(raw).as_deref()),
        material: normalize_material(present(&raw.material).or(present(&raw.spec))),
        service: raw.service.clone(),
        kind: clean_type(&raw.kind),
    }
}

/// Canonicalize a PNID payload
pub fn normalize_pnid(raw: &RawPnidPayload) -> PnidData {
    let data = PnidData {
        equipments: raw
            .equipment
            .iter()
            .enumerate()
            .map(|(i, e)| normalize_equipment(i, e))
            .collect(),
        instruments: raw
            .instruments
            .iter()
            .enumerate()
            .map(|(i, ins)| normalize_instrument(i, ins))
            .collect(),
        lines: raw
            .lines
            .iter()
            .enumerate()
            .map(|(i, l)| normalize_line(i, l))
            .collect(),
    };

    tracing::debug!(
        equipments = data.equipments.len(),
        instruments = data.instruments.len(),
        lines = data.lines.len(),
        "normalized PNID payload"
    );

    data
}

/// Canonicalize a PNID payload given as untyped JSON
pub fn normalize_pnid_value(value: &Value) -> PnidData {
    normalize_pnid(&RawPnidPayload::from_value(value))
}

// ============================================================================
// ISO
// ============================================================================

pub fn normalize_element(index: usize, raw: &RawIsoRow) -> Element {
    let id = present(&raw.id)
        .map(str::to_string)
        .unwrap_or_else(|| derive_id(IdKind::Element, index, raw));

    let kind = match raw.kind.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => t.to_lowercase(),
        _ => UNKNOWN_TYPE.to_string(),
    };

    Element {
        id,
        kind,
        material: normalize_material(present(&raw.material)),
        quantity: coerce_quantity(raw.quantity),
        line_id: present(&raw.line_number).map(str::to_string),
    }
}

/// Canonicalize an isometric payload
pub fn normalize_iso(raw: &RawIsoPayload) -> IsometricData {
    let data = IsometricData {
        elements: raw
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| normalize_element(i, row))
            .collect(),
    };

    tracing::debug!(elements = data.elements.len(), "normalized ISO payload");

    data
}

/// Canonicalize an isometric payload given as untyped JSON
pub fn normalize_iso_value(value: &Value) -> IsometricData {
    normalize_iso(&RawIsoPayload::from_value(value))
}

// ============================================================================
// TESTS
// ============================================================================
