//! Detector bank: independent structural classifiers over a page tree.
//!
//! ## Architecture
//!
//! ```text
//! DetectorBank (registration order)
//!     ├── SelectorDetector   table-driven: CSS + optional text/attribute checks
//!     └── FnDetector         hand-written scans (links, amp, factoids, ...)
//!             │
//!             ▼
//!     ScanContext { root, config, domains }
//!             │
//!             ▼
//!     Vec<CandidateRecord>   stamped with the detector name
//! ```
//!
//! Detectors only read the tree. An empty result is the normal case and is
//! never an error; the only failure is a node whose path cannot be resolved.

pub mod catalog;
mod answers;
mod commerce;
mod knowledge;
mod links;

use scraper::{ElementRef, Selector};
use tracing::{debug, trace};

use crate::dom::{self, broaden_to, text_of};
use crate::domain::{DomainResolver, ResolvedDomain};
use crate::policy::AssayConfig;
use crate::types::{resolve, CandidateRecord, Category, PathError};

pub use catalog::{CatalogEntry, RecordDomain, SelectorSpec, STANDARD_CATALOG};

/// Signature of a hand-written detector scan.
pub type ClassifyFn = fn(&ScanContext<'_>) -> Result<Vec<CandidateRecord>, PathError>;

/// Everything a detector may look at while scanning one page.
pub struct ScanContext<'a> {
    /// Scan root; detectors search below it and never broaden onto it.
    pub root: ElementRef<'a>,
    /// Engine configuration.
    pub config: &'a AssayConfig,
    /// Shared domain resolver.
    pub domains: &'a DomainResolver,
}

impl<'a> ScanContext<'a> {
    /// Create a scan context.
    pub fn new(root: ElementRef<'a>, config: &'a AssayConfig, domains: &'a DomainResolver) -> Self {
        Self {
            root,
            config,
            domains,
        }
    }

    /// Elements below the scan root matching `selector`.
    pub fn select<'s>(&self, selector: &'s Selector) -> impl Iterator<Item = ElementRef<'a>> + 's
    where
        'a: 's,
    {
        dom::descendants(self.root, selector)
    }

    /// Walk up at most `hops` levels, staying below the scan root.
    pub fn broaden(&self, element: ElementRef<'a>, hops: usize) -> ElementRef<'a> {
        self.broaden_until(element, hops, |_| false)
    }

    /// Walk up at most `hops` levels, stopping early when `stop` matches.
    pub fn broaden_until<F>(&self, element: ElementRef<'a>, hops: usize, stop: F) -> ElementRef<'a>
    where
        F: Fn(ElementRef<'a>) -> bool,
    {
        broaden_to(element, hops, self.root, stop)
    }

    /// Domain a link target counts toward.
    ///
    /// Hostless targets (`/url?q=`, `#`) stay on the publisher's site.
    pub fn target_domain(&self, resolved: &ResolvedDomain) -> String {
        match resolved {
            ResolvedDomain::Registrable(domain) => domain.clone(),
            ResolvedDomain::Relative(_) => self.config.publisher_domain.clone(),
        }
    }

    /// Record attributed to the publisher's domain.
    pub fn record(&self, element: ElementRef<'a>, category: &str) -> Result<CandidateRecord, PathError> {
        self.record_with(element, category, &self.config.publisher_domain, None)
    }

    /// Record with an explicit domain and link target.
    pub fn record_with(
        &self,
        element: ElementRef<'a>,
        category: &str,
        domain: &str,
        link: Option<&str>,
    ) -> Result<CandidateRecord, PathError> {
        Ok(CandidateRecord {
            path: resolve(element)?,
            category: Category::from(category),
            domain: domain.to_string(),
            text: text_of(element),
            tag: dom::tag(element).to_string(),
            attributes: dom::attributes(element),
            link: link.map(str::to_string),
            detector: String::new(),
        })
    }
}

/// A structural classifier.
pub trait Detector: Send + Sync {
    /// Stable name, used in provenance and coverage reports.
    fn name(&self) -> &'static str;

    /// Scan the page and return every claim this detector makes.
    fn classify(&self, scan: &ScanContext<'_>) -> Result<Vec<CandidateRecord>, PathError>;
}

/// Detector backed by a hand-written scan function.
pub struct FnDetector {
    name: &'static str,
    scan: ClassifyFn,
}

impl FnDetector {
    /// Wrap a scan function.
    pub fn new(name: &'static str, scan: ClassifyFn) -> Self {
        Self { name, scan }
    }
}

impl Detector for FnDetector {
    fn name(&self) -> &'static str {
        self.name
    }

    fn classify(&self, scan: &ScanContext<'_>) -> Result<Vec<CandidateRecord>, PathError> {
        (self.scan)(scan)
    }
}

/// Table-driven detector compiled from a [`SelectorSpec`].
pub struct SelectorDetector {
    spec: SelectorSpec,
    selector: Selector,
    attr_pattern: Option<(&'static str, regex_lite::Regex)>,
    own_text: Option<regex_lite::Regex>,
}

impl SelectorDetector {
    /// Compile a spec. Catalog entries are literals, so a bad pattern is a bug.
    pub fn from_spec(spec: SelectorSpec) -> Self {
        let selector = Selector::parse(spec.css).expect("catalog selector");
        let attr_pattern = spec.attr_pattern.map(|(name, pattern)| {
            (name, regex_lite::Regex::new(pattern).expect("catalog attribute pattern"))
        });
        let own_text = spec
            .own_text
            .map(|pattern| regex_lite::Regex::new(pattern).expect("catalog text pattern"));
        Self {
            spec,
            selector,
            attr_pattern,
            own_text,
        }
    }

    fn accepts(&self, element: ElementRef<'_>) -> bool {
        if let Some((name, pattern)) = &self.attr_pattern {
            match dom::attr(element, name) {
                Some(value) if pattern.is_match(value) => {}
                _ => return false,
            }
        }
        if let Some(pattern) = &self.own_text {
            match dom::own_string(element) {
                Some(text) if pattern.is_match(&text) => {}
                _ => return false,
            }
        }
        !self.spec.require_text || !text_of(element).is_empty()
    }
}

impl Detector for SelectorDetector {
    fn name(&self) -> &'static str {
        self.spec.name
    }

    fn classify(&self, scan: &ScanContext<'_>) -> Result<Vec<CandidateRecord>, PathError> {
        let domain = match self.spec.domain {
            RecordDomain::Publisher => scan.config.publisher_domain.as_str(),
            RecordDomain::Video => scan.config.video_domain.as_str(),
            RecordDomain::Fixed(domain) => domain,
        };
        scan.select(&self.selector)
            .filter(|el| self.accepts(*el))
            .map(|el| {
                let target = scan.broaden(el, self.spec.hops);
                scan.record_with(target, self.spec.category, domain, None)
            })
            .collect()
    }
}

/// Ordered registry of detectors.
pub struct DetectorBank {
    detectors: Vec<Box<dyn Detector>>,
}

impl DetectorBank {
    /// Empty bank.
    pub fn new() -> Self {
        Self {
            detectors: Vec::new(),
        }
    }

    /// Bank built from a catalog, in catalog order.
    pub fn from_catalog(catalog: &[CatalogEntry]) -> Self {
        let mut bank = Self::new();
        for entry in catalog {
            match entry {
                CatalogEntry::Selector(spec) => bank.register(SelectorDetector::from_spec(*spec)),
                CatalogEntry::Custom(name, scan) => bank.register(FnDetector::new(*name, *scan)),
            }
        }
        bank
    }

    /// The standard bank for mobile result pages.
    pub fn standard() -> Self {
        Self::from_catalog(STANDARD_CATALOG)
    }

    /// Append a detector; it runs after every detector already registered.
    pub fn register<D: Detector + 'static>(&mut self, detector: D) {
        self.detectors.push(Box::new(detector));
    }

    /// Detector names in registration order.
    pub fn names(&self) -> Vec<&'static str> {
        self.detectors.iter().map(|d| d.name()).collect()
    }

    /// Number of registered detectors.
    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    /// Whether the bank has no detectors.
    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Run every detector and keep each detector's claims separate.
    pub fn run_each(
        &self,
        scan: &ScanContext<'_>,
    ) -> Result<Vec<(&'static str, Vec<CandidateRecord>)>, PathError> {
        let mut results = Vec::with_capacity(self.detectors.len());
        for detector in &self.detectors {
            let name = detector.name();
            let mut records = detector.classify(scan)?;
            for record in &mut records {
                record.detector = name.to_string();
            }
            if records.is_empty() {
                trace!(detector = name, "no hits");
            } else {
                debug!(detector = name, hits = records.len(), "detector hits");
            }
            results.push((name, records));
        }
        Ok(results)
    }

    /// Run every detector and concatenate claims in registration order.
    pub fn run(&self, scan: &ScanContext<'_>) -> Result<Vec<CandidateRecord>, PathError> {
        Ok(self
            .run_each(scan)?
            .into_iter()
            .flat_map(|(_, records)| records)
            .collect())
    }
}

impl Default for DetectorBank {
    fn default() -> Self {
        Self::standard()
    }
}
