// Canonical Entities
//
// The comparable record set both pipelines are reduced to:
// - PNID side: Equipment, Instrument, Line
// - ISO side: Element (optionally pointing at a Line by id)
//
// Records are plain values. A normalization run always builds a fresh set;
// nothing here is ever mutated in place.

pub mod pnid;
pub mod iso;

pub use pnid::{Equipment, Instrument, Line, PnidData};
pub use iso::{Element, IsometricData};

/// Sentinel used for missing types
pub const UNKNOWN_TYPE: &str = "Unknown";
