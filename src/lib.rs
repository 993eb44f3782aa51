//! # serp-assay
//!
//! Deterministic classification and spatial attribution of elements on
//! rendered search-result pages.
//!
//! The assay answers one question per page:
//!
//! > Which nodes on this page are ads, answers, links or organic results, and
//! > how much of the screen does each one take?
//!
//! ## Core Contract
//!
//! 1. A bank of structural detectors tags nodes with dash-namespaced categories
//! 2. Overlapping claims are resolved by fixed precedence, then pruned to the
//!    most specific node per branch
//! 3. Survivors are measured against the viewport and the page, and emitted
//!    as JSON lines
//!
//! ## Architecture
//!
//! ```text
//! PageSource → DetectorBank → precedence → prune → SpatialAttributor → AssayReport
//!                                                        ↓
//!                                                Renderer (layout lookups)
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Same page + same config → identical paths, categories and order
//! - Detectors run in registration order; ties go to the earlier detector
//! - Batch output is in input order regardless of completion order

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod policy;
pub mod canonical;
pub mod dom;
pub mod domain;
pub mod detectors;
pub mod resolve;
pub mod render;
pub mod attribution;
pub mod assay;
pub mod batch;
pub mod coverage;

// Re-exports
pub use types::{
    AssayState, AttributedElement, CandidateRecord, Category, CategoryFamily, GeometryRecord,
    PageRejection, PathError, RejectionLog, RejectionReason, Severity, StructuralPath,
};
pub use policy::{AssayConfig, ConfigError, PrecedenceRule, Viewport};
pub use canonical::{canonical_hash, canonical_hash_hex, content_digest, to_canonical_bytes};
pub use dom::PageTree;
pub use domain::{DomainResolver, ResolvedDomain};
pub use detectors::{Detector, DetectorBank, ScanContext};
pub use resolve::{dedup, enforce_precedence, prune, Partitions};
pub use render::{InMemoryRenderer, RenderedRect, Renderer};
pub use attribution::SpatialAttributor;
pub use assay::{AssayError, AssayReport, PageAssay, PageOutcome, PageSource};
pub use batch::{BatchAssay, BatchReport, PageJob};
pub use coverage::{CoverageAuditor, CoverageReport};

/// Schema version of emitted records.
/// Increment on breaking changes to the JSON-lines contract.
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Default configuration version identifier.
pub const DEFAULT_CONFIG_VERSION: &str = "assay_config_v1";
