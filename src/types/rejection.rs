//! Page rejections and the append-only rejection log.
//!
//! ## Rejection Taxonomy
//!
//! | Reason | Stage | Severity | Response |
//! |--------|-------|----------|----------|
//! | MissingResultsRoot | Loaded | MEDIUM | Page skipped, capture likely blocked |
//! | WarpedLayout | Attributed | HIGH | Page skipped, layout cannot be trusted |
//! | EmptyAttribution | Merged | HIGH | Page skipped, render/snapshot mismatch |
//!
//! Rejection is terminal for a page and never stops a batch. Attribution
//! misses and empty detectors are not rejections and never reach this log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::path::StructuralPath;
use super::state::AssayState;

/// Severity of a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Informational.
    Low,
    /// Worth checking the capture.
    Medium,
    /// Measurement for the page cannot be trusted.
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
        }
    }
}

/// Why a page was rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RejectionReason {
    /// The results container was not found in the page.
    MissingResultsRoot {
        /// Element id that was looked up.
        root_id: String,
    },
    /// An element's height met the warp threshold.
    WarpedLayout {
        /// Path of the first warped element.
        path: StructuralPath,
        /// Its raw height.
        height: f64,
        /// Threshold in effect.
        threshold: f64,
    },
    /// No classified path could be attributed.
    EmptyAttribution {
        /// Number of candidates that were looked up.
        candidates: usize,
    },
}

impl RejectionReason {
    /// Short stable label used in logs and summaries.
    pub fn label(&self) -> &'static str {
        match self {
            Self::MissingResultsRoot { .. } => "missing results root",
            Self::WarpedLayout { .. } => "warped layout",
            Self::EmptyAttribution { .. } => "empty attribution",
        }
    }

    /// Severity of the rejection.
    pub fn severity(&self) -> Severity {
        match self {
            Self::MissingResultsRoot { .. } => Severity::Medium,
            Self::WarpedLayout { .. } => Severity::High,
            Self::EmptyAttribution { .. } => Severity::High,
        }
    }

    /// Pipeline state at which the rejection happens.
    pub fn stage(&self) -> AssayState {
        match self {
            Self::MissingResultsRoot { .. } => AssayState::Loaded,
            Self::WarpedLayout { .. } => AssayState::Attributed,
            Self::EmptyAttribution { .. } => AssayState::Merged,
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingResultsRoot { root_id } => {
                write!(f, "missing results root: no element with id '{root_id}'")
            }
            Self::WarpedLayout { path, height, threshold } => {
                write!(f, "warped layout: {path} is {height}px tall (threshold {threshold}px)")
            }
            Self::EmptyAttribution { candidates } => {
                write!(f, "empty attribution: none of {candidates} candidates located")
            }
        }
    }
}

/// A recorded page rejection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRejection {
    /// Unique rejection ID.
    pub id: String,
    /// Page that was rejected.
    pub page_id: String,
    /// Why.
    pub reason: RejectionReason,
    /// Severity, derived from the reason.
    pub severity: Severity,
    /// State at which the page left the pipeline.
    pub stage: AssayState,
    /// When the rejection was recorded.
    pub recorded_at: DateTime<Utc>,
}

impl PageRejection {
    /// Create a new rejection for a page.
    pub fn new(page_id: impl Into<String>, reason: RejectionReason) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            page_id: page_id.into(),
            severity: reason.severity(),
            stage: reason.stage(),
            reason,
            recorded_at: Utc::now(),
        }
    }

    /// Log this rejection as a structured event.
    pub fn log(&self) {
        tracing::warn!(
            rejection_id = %self.id,
            page_id = %self.page_id,
            reason = self.reason.label(),
            severity = %self.severity,
            stage = %self.stage,
            "page rejected: {}",
            self.reason
        );
    }
}

/// Append-only log of page rejections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RejectionLog {
    entries: Vec<PageRejection>,
}

impl RejectionLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rejection.
    pub fn record(&mut self, rejection: PageRejection) {
        self.entries.push(rejection);
    }

    /// All rejections in recording order.
    pub fn entries(&self) -> &[PageRejection] {
        &self.entries
    }

    /// Number of rejections.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was rejected.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the rejection for a page.
    pub fn for_page(&self, page_id: &str) -> Option<&PageRejection> {
        self.entries.iter().find(|r| r.page_id == page_id)
    }

    /// Rejection counts keyed by reason label.
    pub fn summary(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for entry in &self.entries {
            *counts.entry(entry.reason.label()).or_default() += 1;
        }
        counts
    }
}
