// 🧪 Material Normalizer - free-form material/spec strings → short codes
//
// "Carbon Steel", "CS-40-150", "cs" → "CS"
// Unrecognized tokens pass through upper-cased; never empty.

use once_cell::sync::Lazy;
use regex::Regex;

/// Sentinel for absent materials
pub const UNKNOWN_MATERIAL: &str = "Unknown";

// ============================================================================
// SYNONYM TABLE
// ============================================================================

/// Exact (trimmed, upper-cased) spellings → canonical code
const SYNONYMS: &[(&[&str], &str)] = &[
    (&["CARBON STEEL", "CARBON-STEEL", "CS"], "CS"),
    (
        &["STAINLESS STEEL", "STAINLESS-STEEL", "S.S", "SS.", "SS316", "SS304"],
        "SS",
    ),
    (&["ALLOY", "ALLOY825"], "ALLOY"),
    (&["PP", "PP-R"], "PP"),
    (&["DSS", "DSS2205"], "DSS"),
];

/// The closed canonical vocabulary
pub const CANONICAL_CODES: &[&str] = &["CS", "SS", "ALLOY", "PP", "DSS"];

/// Piping spec such as "CS-40-150": letter code, then two numeric groups
static SPEC_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Z]+)-\d+-\d+").expect("static spec pattern"));

// ============================================================================
// NORMALIZER
// ============================================================================

/// Canonicalize a raw material or piping-spec string.
pub fn normalize_material(raw: Option<&str>) -> String {
    let s = match raw {
        Some(r) => r.trim().to_uppercase(),
        None => return UNKNOWN_MATERIAL.to_string(),
    };

    if s.is_empty() {
        return UNKNOWN_MATERIAL.to_string();
    }

    if let Some(code) = lookup_synonym(&s) {
        return code.to_string();
    }

    if let Some(caps) = SPEC_PATTERN.captures(&s) {
        let code = &caps[1];
        return match CANONICAL_CODES.iter().find(|c| **c == code) {
            Some(canonical) => (*canonical).to_string(),
            None => code.to_string(),
        };
    }

    s
}

fn lookup_synonym(s: &str) -> Option<&'static str> {
    SYNONYMS
        .iter()
        .find(|(spellings, _)| spellings.contains(&s))
        .map(|(_, code)| *code)
}

/// True when `code` is one of the canonical short codes
pub fn is_canonical(code: &str) -> bool {
    CANONICAL_CODES.contains(&code)
}

// ============================================================================
// TESTS
// ============================================================================
