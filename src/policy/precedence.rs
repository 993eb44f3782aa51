//! Fixed precedence rules between detector families.
//!
//! Some categories structurally contain others: an ad block contains an
//! organic-looking anchor, a rating span sits inside the link it rates.
//! Each rule names which records dominate and which records yield when their
//! paths overlap. Rules are applied in order and are not negotiated.

use std::collections::BTreeSet;

use crate::resolve::{is_dominated, Partitions};
use crate::types::{CandidateRecord, CategoryFamily, StructuralPath};

/// Category of rating widgets nested inside links.
pub const RATING_CATEGORY: &str = "link-reviews_rating";

/// Which domain partition a selector looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionScope {
    /// Owner-domain records only.
    Owner,
    /// Non-owner records only.
    Other,
    /// Both partitions.
    Both,
}

/// Predicate over candidate records.
#[derive(Debug, Clone)]
pub struct RecordSelector {
    /// Partition(s) the selector applies to.
    pub scope: PartitionScope,
    /// Accepted families; empty accepts every family.
    pub families: Vec<CategoryFamily>,
    /// Accepted exact categories; empty accepts every category.
    pub categories: Vec<String>,
    /// Categories never accepted.
    pub excluded_categories: Vec<String>,
}

impl RecordSelector {
    /// Select every record in a scope.
    pub fn all(scope: PartitionScope) -> Self {
        Self {
            scope,
            families: Vec::new(),
            categories: Vec::new(),
            excluded_categories: Vec::new(),
        }
    }

    /// Restrict to families.
    pub fn families(mut self, families: &[CategoryFamily]) -> Self {
        self.families = families.to_vec();
        self
    }

    /// Restrict to exact categories.
    pub fn categories(mut self, categories: &[&str]) -> Self {
        self.categories = categories.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Exclude exact categories.
    pub fn excluding(mut self, categories: &[&str]) -> Self {
        self.excluded_categories = categories.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Whether a record matches, ignoring partition.
    pub fn matches(&self, record: &CandidateRecord) -> bool {
        let category = record.category.as_str();
        if self.excluded_categories.iter().any(|c| c == category) {
            return false;
        }
        if !self.categories.is_empty() && !self.categories.iter().any(|c| c == category) {
            return false;
        }
        self.families.is_empty() || self.families.contains(&record.category.family())
    }

    fn select<'a>(&'a self, parts: &'a Partitions) -> impl Iterator<Item = &'a CandidateRecord> {
        let none: &[CandidateRecord] = &[];
        let (owner, other) = match self.scope {
            PartitionScope::Owner => (parts.owner.as_slice(), none),
            PartitionScope::Other => (none, parts.other.as_slice()),
            PartitionScope::Both => (parts.owner.as_slice(), parts.other.as_slice()),
        };
        owner
            .iter()
            .chain(other.iter())
            .filter(move |r| self.matches(r))
    }
}

/// An ordered (dominant, subordinate) pair.
#[derive(Debug, Clone)]
pub struct PrecedenceRule {
    /// Rule name for logs.
    pub name: &'static str,
    /// Records that win.
    pub dominant: RecordSelector,
    /// Records that yield.
    pub subordinate: RecordSelector,
}

impl PrecedenceRule {
    /// Ads claimed on the publisher's domain beat non-owner results inside them.
    pub fn ads_over_organic() -> Self {
        Self {
            name: "ads_over_organic",
            dominant: RecordSelector::all(PartitionScope::Owner).families(&[CategoryFamily::Ads]),
            subordinate: RecordSelector::all(PartitionScope::Other),
        }
    }

    /// Links and organic results beat rating widgets nested in them.
    pub fn links_over_ratings() -> Self {
        Self {
            name: "links_over_ratings",
            dominant: RecordSelector::all(PartitionScope::Both)
                .families(&[CategoryFamily::Link, CategoryFamily::Organic])
                .excluding(&[RATING_CATEGORY]),
            subordinate: RecordSelector::all(PartitionScope::Owner).categories(&[RATING_CATEGORY]),
        }
    }

    /// Dominant paths as they stand in `parts`.
    pub fn dominant_paths(&self, parts: &Partitions) -> BTreeSet<StructuralPath> {
        self.dominant.select(parts).map(|r| r.path.clone()).collect()
    }

    /// Drop subordinate records overlapping a dominant path. Returns the
    /// number of records removed.
    pub fn apply(&self, parts: &mut Partitions) -> usize {
        let dominant = self.dominant_paths(parts);
        if dominant.is_empty() {
            return 0;
        }
        let before = parts.len();
        let subordinate = &self.subordinate;
        let yields = |r: &CandidateRecord| subordinate.matches(r) && is_dominated(&r.path, &dominant);

        if matches!(subordinate.scope, PartitionScope::Owner | PartitionScope::Both) {
            parts.owner.retain(|r| !yields(r));
        }
        if matches!(subordinate.scope, PartitionScope::Other | PartitionScope::Both) {
            parts.other.retain(|r| !yields(r));
        }

        let removed = before - parts.len();
        if removed > 0 {
            tracing::debug!(rule = self.name, removed, "precedence applied");
        }
        removed
    }
}

/// The fixed rule sequence: ads over organic, then links over ratings.
pub fn standard_rules() -> Vec<PrecedenceRule> {
    vec![
        PrecedenceRule::ads_over_organic(),
        PrecedenceRule::links_over_ratings(),
    ]
}

/// Apply rules in order. Returns the total number of records removed.
pub fn apply_rules(rules: &[PrecedenceRule], parts: &mut Partitions) -> usize {
    rules.iter().map(|rule| rule.apply(parts)).sum()
}
