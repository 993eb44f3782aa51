//! Per-page assay orchestrator.
//!
//! ## Pipeline
//!
//! ```text
//! PageSource
//!     │ parse, isolate results root            (Loaded)
//!     ▼
//! DetectorBank::run → drop excluded subtrees
//!     │ partition owner / non-owner             (Classified)
//!     ▼
//! precedence rules in order                     (Resolved)
//!     ▼
//! dedup + prune per partition, union            (Pruned)
//!     ▼
//! Renderer lookups, warp fail-fast              (Attributed)
//!     ▼
//! keyed join on path                            (Merged)
//!     ▼
//! AssayReport                                   (Emitted)
//! ```
//!
//! Any page-fatal condition ends the page in `Rejected` with a
//! [`RejectionReason`]; a structural resolution failure or a renderer
//! transport failure is an [`AssayError`] instead.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, info_span, Instrument};

use crate::attribution::SpatialAttributor;
use crate::canonical::content_digest;
use crate::detectors::{DetectorBank, ScanContext};
use crate::dom::PageTree;
use crate::domain::DomainResolver;
use crate::policy::{apply_rules, standard_rules, AssayConfig, ConfigError, PrecedenceRule};
use crate::render::Renderer;
use crate::resolve::partition;
use crate::types::{
    resolve, to_json_lines, AssayState, AttributedElement, CandidateRecord, GeometryRecord,
    PageRejection, PathError, RejectionReason, StructuralPath,
};
use crate::SCHEMA_VERSION;

/// Error type for assay operations.
#[derive(Debug, thiserror::Error)]
pub enum AssayError {
    /// A node could not be located in its own tree.
    #[error("Structural resolution failed: {0}")]
    StructuralResolution(#[from] PathError),
    /// The rendering collaborator failed.
    #[error("Renderer error: {0}")]
    Renderer(String),
}

impl AssayError {
    /// Create a renderer error from any error type.
    pub fn from_renderer<E: std::error::Error>(e: E) -> Self {
        Self::Renderer(e.to_string())
    }
}

/// Raw source of one captured page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSource {
    /// Identifier of the capture.
    pub page_id: String,
    /// Full page HTML.
    pub html: String,
}

impl PageSource {
    /// Create a page source.
    pub fn new(page_id: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            page_id: page_id.into(),
            html: html.into(),
        }
    }
}

/// Record counts after each stage of one page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCounts {
    /// Claims made by the detector bank.
    pub classified: usize,
    /// Claims dropped for lying inside an excluded subtree.
    pub excluded: usize,
    /// Claims left after precedence rules.
    pub resolved: usize,
    /// Claims left after dedup and pruning.
    pub pruned: usize,
    /// Paths with geometry.
    pub attributed: usize,
    /// Elements emitted.
    pub emitted: usize,
}

/// Candidates of a page that passed classification.
#[derive(Debug, Clone)]
pub struct ClassifiedPage {
    /// Page identifier.
    pub page_id: String,
    /// SHA-256 of the page source.
    pub content_digest: String,
    /// Surviving candidates, owner partition first.
    pub candidates: Vec<CandidateRecord>,
    /// Stage counts so far.
    pub stats: StageCounts,
}

/// Outcome of the tree-only half of the pipeline.
#[derive(Debug, Clone)]
pub enum Classification {
    /// Candidates ready for attribution.
    Ready(ClassifiedPage),
    /// Page rejected before attribution.
    Rejected(RejectionReason),
}

/// Provenance of an emitted page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageProvenance {
    /// Page identifier.
    pub source_page_id: String,
    /// SHA-256 of the page source.
    pub content_digest: String,
    /// Hash of the configuration in effect.
    pub config_hash: String,
    /// Output schema version.
    pub schema_version: String,
    /// Detectors with at least one emitted element, in bank order.
    pub detectors: Vec<String>,
}

/// Elements and provenance of one emitted page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssayReport {
    /// Page identifier.
    pub page_id: String,
    /// Attributed elements, owner partition first.
    pub elements: Vec<AttributedElement>,
    /// Provenance.
    pub provenance: PageProvenance,
    /// Stage counts.
    pub stats: StageCounts,
}

impl AssayReport {
    /// Elements as JSON lines.
    pub fn to_json_lines(&self) -> Result<String, serde_json::Error> {
        to_json_lines(&self.elements)
    }
}

/// Terminal outcome of one page.
#[derive(Debug, Clone)]
pub enum PageOutcome {
    /// Elements emitted.
    Emitted(AssayReport),
    /// Page rejected.
    Rejected(PageRejection),
}

impl PageOutcome {
    /// Terminal state reached.
    pub fn state(&self) -> AssayState {
        match self {
            Self::Emitted(_) => AssayState::Emitted,
            Self::Rejected(_) => AssayState::Rejected,
        }
    }

    /// The report, if emitted.
    pub fn report(&self) -> Option<&AssayReport> {
        match self {
            Self::Emitted(report) => Some(report),
            Self::Rejected(_) => None,
        }
    }

    /// The rejection, if rejected.
    pub fn rejection(&self) -> Option<&PageRejection> {
        match self {
            Self::Emitted(_) => None,
            Self::Rejected(rejection) => Some(rejection),
        }
    }
}

/// Classification and attribution engine for single pages.
///
/// Holds no per-page state; one instance serves a whole batch.
pub struct PageAssay {
    config: AssayConfig,
    config_hash: String,
    bank: DetectorBank,
    rules: Vec<PrecedenceRule>,
    domains: Arc<DomainResolver>,
    attributor: SpatialAttributor,
}

impl PageAssay {
    /// Engine with the standard detector bank and precedence rules.
    pub fn new(config: AssayConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config_hash: config.config_hash(),
            bank: DetectorBank::standard(),
            rules: standard_rules(),
            domains: Arc::new(DomainResolver::new(config.domain_cache_entries)),
            attributor: SpatialAttributor::from_config(&config),
            config,
        })
    }

    /// Replace the detector bank.
    pub fn with_bank(mut self, bank: DetectorBank) -> Self {
        self.bank = bank;
        self
    }

    /// Share a domain resolver with other engines.
    pub fn with_domains(mut self, domains: Arc<DomainResolver>) -> Self {
        self.domains = domains;
        self
    }

    /// Configuration in effect.
    pub fn config(&self) -> &AssayConfig {
        &self.config
    }

    /// Detector bank in use.
    pub fn bank(&self) -> &DetectorBank {
        &self.bank
    }

    /// Hash of the configuration in effect.
    pub fn config_hash(&self) -> &str {
        &self.config_hash
    }

    /// Run the tree-only stages: Loaded through Pruned.
    ///
    /// The parsed tree lives only inside this call.
    pub fn classify(&self, page: &PageSource) -> Result<Classification, AssayError> {
        let tree = PageTree::parse(&page.html);
        let Some(root) = tree.element_by_id(&self.config.results_root_id) else {
            return Ok(Classification::Rejected(RejectionReason::MissingResultsRoot {
                root_id: self.config.results_root_id.clone(),
            }));
        };
        debug!(page_id = %page.page_id, state = %AssayState::Loaded, "page loaded");

        let mut stats = StageCounts::default();
        let scan = ScanContext::new(root, &self.config, &self.domains);
        let mut candidates = self.bank.run(&scan)?;
        stats.classified = candidates.len();

        let excluded = self.excluded_paths(&tree)?;
        if !excluded.is_empty() {
            candidates.retain(|c| {
                !excluded
                    .iter()
                    .any(|root| *root == c.path || root.is_ancestor_of(&c.path))
            });
        }
        stats.excluded = stats.classified - candidates.len();
        drop(tree);

        let mut parts = partition(candidates, &self.config);
        debug!(
            page_id = %page.page_id,
            state = %AssayState::Classified,
            owner = parts.owner.len(),
            other = parts.other.len(),
            "candidates partitioned"
        );

        apply_rules(&self.rules, &mut parts);
        stats.resolved = parts.len();

        let candidates = parts.into_pruned();
        stats.pruned = candidates.len();
        debug!(
            page_id = %page.page_id,
            state = %AssayState::Pruned,
            resolved = stats.resolved,
            pruned = stats.pruned,
            "candidates pruned"
        );

        Ok(Classification::Ready(ClassifiedPage {
            page_id: page.page_id.clone(),
            content_digest: content_digest(&page.html),
            candidates,
            stats,
        }))
    }

    fn excluded_paths(&self, tree: &PageTree) -> Result<Vec<StructuralPath>, PathError> {
        let ids = &self.config.excluded_root_ids;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        tree.root()
            .descendants()
            .filter_map(scraper::ElementRef::wrap)
            .filter(|el| el.value().id().is_some_and(|id| ids.iter().any(|x| x == id)))
            .map(resolve)
            .collect()
    }

    /// Run the whole pipeline for one page.
    pub async fn classify_and_attribute<R>(
        &self,
        page: &PageSource,
        renderer: &R,
    ) -> Result<PageOutcome, AssayError>
    where
        R: Renderer + ?Sized,
    {
        let span = info_span!("assay_page", page_id = %page.page_id);
        async move {
            let classified = match self.classify(page)? {
                Classification::Ready(classified) => classified,
                Classification::Rejected(reason) => return Ok(self.reject(page, reason)),
            };
            self.attribute(classified, renderer).await
        }
        .instrument(span)
        .await
    }

    /// Run the render-dependent stages: Attributed through Emitted.
    pub async fn attribute<R>(
        &self,
        classified: ClassifiedPage,
        renderer: &R,
    ) -> Result<PageOutcome, AssayError>
    where
        R: Renderer + ?Sized,
    {
        let ClassifiedPage {
            page_id,
            content_digest,
            candidates,
            mut stats,
        } = classified;

        let mut geometry: HashMap<StructuralPath, GeometryRecord> = HashMap::new();
        for candidate in &candidates {
            let Some(measured) = self
                .attributor
                .attribute(&candidate.path, renderer)
                .await
                .map_err(AssayError::from_renderer)?
            else {
                continue;
            };
            if measured.is_warped {
                let reason = RejectionReason::WarpedLayout {
                    path: measured.path,
                    height: measured.height,
                    threshold: self.config.warped_height_px,
                };
                return Ok(self.reject_id(&page_id, reason));
            }
            geometry.insert(measured.path.clone(), measured);
        }
        stats.attributed = geometry.len();

        if geometry.is_empty() {
            let reason = RejectionReason::EmptyAttribution {
                candidates: candidates.len(),
            };
            return Ok(self.reject_id(&page_id, reason));
        }

        let mut contributing: Vec<String> = Vec::new();
        let mut elements = Vec::with_capacity(geometry.len());
        for candidate in candidates {
            let Some(measured) = geometry.get(&candidate.path) else {
                continue;
            };
            if !contributing.contains(&candidate.detector) {
                contributing.push(candidate.detector.clone());
            }
            elements.push(AttributedElement::join(candidate, measured, &page_id));
        }
        stats.emitted = elements.len();

        let order = self.bank.names();
        contributing.sort_by_key(|name| order.iter().position(|n| *n == name.as_str()));

        info!(
            page_id = %page_id,
            elements = stats.emitted,
            candidates = stats.pruned,
            "page emitted"
        );

        Ok(PageOutcome::Emitted(AssayReport {
            provenance: PageProvenance {
                source_page_id: page_id.clone(),
                content_digest,
                config_hash: self.config_hash.clone(),
                schema_version: SCHEMA_VERSION.to_string(),
                detectors: contributing,
            },
            page_id,
            elements,
            stats,
        }))
    }

    fn reject(&self, page: &PageSource, reason: RejectionReason) -> PageOutcome {
        self.reject_id(&page.page_id, reason)
    }

    fn reject_id(&self, page_id: &str, reason: RejectionReason) -> PageOutcome {
        let rejection = PageRejection::new(page_id, reason);
        rejection.log();
        PageOutcome::Rejected(rejection)
    }
}
