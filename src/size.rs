// 📏 Size Normalizer - free-form pipe sizes → nominal diameter labels
//
// "DN150", "6in", "6 \"", "NPS 6" → "6 in"
//
// Output is always either UNKNOWN_SIZE or "<number> in".

use once_cell::sync::Lazy;
use regex::Regex;

/// Sentinel for sizes that carry no usable number
pub const UNKNOWN_SIZE: &str = "Unknown";

// ============================================================================
// LOOKUP DATA
// ============================================================================

/// Metric nominal diameter (upper bound, inclusive) → inch label
const DN_TO_INCH: &[(f64, &str)] = &[
    (25.0, "1 in"),
    (40.0, "1.5 in"),
    (50.0, "2 in"),
    (80.0, "3 in"),
    (100.0, "4 in"),
    (150.0, "6 in"),
    (200.0, "8 in"),
];

const MM_PER_INCH: f64 = 25.4;

/// Leading decimal number, optionally followed by an inch marker
static LEADING_INCH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^(\d+(?:\.\d+)?)(?:inch|in|")?"#).expect("static size pattern"));

// ============================================================================
// NORMALIZER
// ============================================================================

/// Canonicalize a raw size string.
///
/// Rules are tried in order:
/// 1. `dn<number>` → lookup table, or `round(n / 25.4)` above DN200
/// 2. leading number with optional `in` / `"` / `inch` → `"<number> in"`
/// 3. whatever digits remain after stripping → `"<digits> in"`
///
/// Absent or empty input gives `"Unknown"`.
pub fn normalize_size(raw: Option<&str>) -> String {
    let raw = match raw {
        Some(r) if !r.is_empty() => r,
        _ => return UNKNOWN_SIZE.to_string(),
    };

    let s: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if let Some(label) = from_nominal_diameter(&s) {
        return label;
    }

    if let Some(caps) = LEADING_INCH.captures(&s) {
        if let Ok(num) = caps[1].parse::<f64>() {
            return format!("{} in", num);
        }
    }

    let stripped: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if stripped.chars().any(|c| c.is_ascii_digit()) {
        format!("{} in", stripped)
    } else {
        UNKNOWN_SIZE.to_string()
    }
}

/// `dn<number>` → inch label; None when the prefix or number is missing
fn from_nominal_diameter(s: &str) -> Option<String> {
    let rest = s.strip_prefix("dn")?;
    let n: f64 = rest.parse().ok().filter(|n: &f64| n.is_finite())?;

    for (upper, label) in DN_TO_INCH {
        if n <= *upper {
            return Some((*label).to_string());
        }
    }

    Some(format!("{} in", (n / MM_PER_INCH).round() as i64))
}

/// Numeric prefix of a size label ("6 in" → 6.0, "Unknown" → 0.0)
///
/// Keeps digits and dots only, then reads the longest leading float,
/// so "1.5.2 in" reads as 1.5.
pub fn size_value(label: &str) -> f64 {
    let kept: String = label
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    let mut end = 0;
    let mut seen_dot = false;
    for (i, c) in kept.char_indices() {
        if c == '.' {
            if seen_dot {
                break;
            }
            seen_dot = true;
        }
        end = i + c.len_utf8();
    }

    kept[..end].parse::<f64>().unwrap_or(0.0)
}

// ============================================================================
// TESTS
// ============================================================================
