//! Corpus-level detector coverage.
//!
//! Detectors are site-specific and go stale when the markup they target
//! changes. Running the bank over a corpus shows which detectors still fire.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::assay::PageSource;
use crate::detectors::{DetectorBank, ScanContext};
use crate::dom::PageTree;
use crate::domain::DomainResolver;
use crate::policy::AssayConfig;
use crate::types::PathError;

/// Hits of one detector across a corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectorCoverage {
    /// Detector name.
    pub detector: String,
    /// Pages with at least one record.
    pub pages_hit: usize,
    /// Records across all pages.
    pub records: usize,
}

/// Coverage of a bank over a corpus, detectors in bank order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageReport {
    /// Pages scanned.
    pub pages: usize,
    /// Per-detector counts.
    pub detectors: Vec<DetectorCoverage>,
}

impl CoverageReport {
    /// Detectors that never fired.
    pub fn stale_detectors(&self) -> Vec<&str> {
        self.detectors
            .iter()
            .filter(|d| d.pages_hit == 0)
            .map(|d| d.detector.as_str())
            .collect()
    }

    /// Whether every detector fired at least once.
    pub fn is_complete(&self) -> bool {
        self.detectors.iter().all(|d| d.pages_hit > 0)
    }

    /// Counts for one detector.
    pub fn get(&self, detector: &str) -> Option<&DetectorCoverage> {
        self.detectors.iter().find(|d| d.detector == detector)
    }
}

/// Runs a detector bank over a corpus without attribution.
pub struct CoverageAuditor {
    config: AssayConfig,
    domains: DomainResolver,
}

impl CoverageAuditor {
    /// Auditor for a configuration.
    pub fn new(config: AssayConfig) -> Self {
        let domains = DomainResolver::new(config.domain_cache_entries);
        Self { config, domains }
    }

    /// Count hits of every detector in `bank` over `corpus`.
    ///
    /// Pages without a results root are scanned from the document root.
    pub fn audit(&self, bank: &DetectorBank, corpus: &[PageSource]) -> Result<CoverageReport, PathError> {
        let mut detectors: Vec<DetectorCoverage> = bank
            .names()
            .into_iter()
            .map(|name| DetectorCoverage {
                detector: name.to_string(),
                pages_hit: 0,
                records: 0,
            })
            .collect();

        for page in corpus {
            let tree = PageTree::parse(&page.html);
            let root = tree
                .element_by_id(&self.config.results_root_id)
                .unwrap_or_else(|| tree.root());
            let scan = ScanContext::new(root, &self.config, &self.domains);
            for (slot, (_, records)) in detectors.iter_mut().zip(bank.run_each(&scan)?) {
                if !records.is_empty() {
                    slot.pages_hit += 1;
                    slot.records += records.len();
                }
            }
        }

        let report = CoverageReport {
            pages: corpus.len(),
            detectors,
        };
        let stale = report.stale_detectors();
        if stale.is_empty() {
            info!(pages = report.pages, "all detectors fired");
        } else {
            warn!(pages = report.pages, stale = ?stale, "detectors without hits");
        }
        Ok(report)
    }
}
