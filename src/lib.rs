// Plant Linker - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod size;        // Size Normalizer - DN / inch labels
pub mod material;    // Material Normalizer - synonym table + spec codes
pub mod payload;     // Raw extraction payload shapes
pub mod entities;    // Canonical PNID / ISO records
pub mod normalize;   // Record Normalizer - raw payload → canonical data
pub mod linking;     // Cross-Document Linker
pub mod aggregate;   // Grouped counts, most-common, top-N
pub mod insights;    // Insight Aggregator
pub mod filters;     // Dashboard filters
pub mod breakdown;   // Per-dataset breakdown tables
pub mod export;      // CSV / JSON export
pub mod job;         // Extraction job contract
pub mod ingest;      // Files → Dataset
pub mod config;      // plant-linker.toml
pub mod logging;     // tracing setup

// Re-export commonly used types
pub use size::{normalize_size, size_value, UNKNOWN_SIZE};
pub use material::{normalize_material, UNKNOWN_MATERIAL};
pub use payload::{
    RawEquipment, RawInstrument, RawIsoPayload, RawIsoRow, RawLine, RawPnidPayload,
};
pub use entities::{
    Element, Equipment, Instrument, IsometricData, Line, PnidData, UNKNOWN_TYPE,
};
pub use normalize::{
    derive_id, normalize_iso, normalize_iso_value, normalize_pnid, normalize_pnid_value, IdKind,
};
pub use linking::{link, LinkRow, LinkStatus, LinkedLine, LinkingReport, LinkingSummary};
pub use aggregate::{count_by, largest_size, sum_by, CountEntry, GroupedCounts};
pub use insights::{
    compute_insights, compute_insights_with_links, link_coverage, InsightsReport, IsoInsights,
    LinkInsights, PnidInsights, DEFAULT_TOP_MATERIALS,
};
pub use filters::{filter_iso, filter_pnid, FilterOptions, FilterValue, Filters};
pub use breakdown::{
    iso_breakdown, pnid_breakdown, IsoBreakdown, LineGroup, LineSortOrder, PnidBreakdown,
};
pub use export::{ExportDataset, ExportFormat};
pub use job::{JobOutcome, JobSnapshot, JobStatus};
pub use ingest::{read_payload_file, Dataset};
pub use config::{Config, LoggingConfig};
pub use logging::init_logging;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
