//! Conflict resolution, deduplication and hierarchy pruning.
//!
//! All three operations only ever drop records; none edits a record or
//! reorders the survivors.
//!
//! ## Guarantees
//!
//! - `enforce_precedence` removes every subordinate overlapping a dominant path
//! - `dedup` keeps the first record per path
//! - `prune` keeps only the most specific path per branch
//! - Each operation is idempotent

use std::collections::{BTreeSet, HashSet};
use std::ops::Bound;

use crate::policy::AssayConfig;
use crate::types::{CandidateRecord, StructuralPath};

/// Candidates split by whether their domain belongs to the publisher.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partitions {
    /// Records whose domain is an owner domain.
    pub owner: Vec<CandidateRecord>,
    /// Everything else.
    pub other: Vec<CandidateRecord>,
}

impl Partitions {
    /// Total number of records.
    pub fn len(&self) -> usize {
        self.owner.len() + self.other.len()
    }

    /// Whether both partitions are empty.
    pub fn is_empty(&self) -> bool {
        self.owner.is_empty() && self.other.is_empty()
    }

    /// Iterate over both partitions, owner first.
    pub fn iter(&self) -> impl Iterator<Item = &CandidateRecord> {
        self.owner.iter().chain(self.other.iter())
    }

    /// Dedup and prune each partition, then union them owner first.
    ///
    /// Ancestor pruning is per partition, so an owner record may contain a
    /// non-owner record. A path claimed in both partitions keeps the owner
    /// claim.
    pub fn into_pruned(self) -> Vec<CandidateRecord> {
        let mut merged = prune(dedup(self.owner));
        merged.extend(prune(dedup(self.other)));
        dedup(merged)
    }
}

/// Split records into owner and non-owner partitions, keeping order.
pub fn partition(records: Vec<CandidateRecord>, config: &AssayConfig) -> Partitions {
    let (owner, other) = records
        .into_iter()
        .partition(|r| config.is_owner_domain(&r.domain));
    Partitions { owner, other }
}

/// True when `path` equals, contains, or is contained by any dominant path.
pub fn is_dominated(path: &StructuralPath, dominant: &BTreeSet<StructuralPath>) -> bool {
    if dominant.contains(path) {
        return true;
    }
    if path.ancestors().any(|a| dominant.contains(&a)) {
        return true;
    }
    // Descendants sort in one run right after `path/`.
    let prefix = StructuralPath::new(path.descendant_prefix());
    dominant
        .range((Bound::Included(&prefix), Bound::Unbounded))
        .next()
        .is_some_and(|p| p.as_str().starts_with(prefix.as_str()))
}

/// Remove every subordinate record overlapping a dominant path.
///
/// Dominant wins on equality and on containment in either direction.
pub fn enforce_precedence(
    subordinate: Vec<CandidateRecord>,
    dominant: &BTreeSet<StructuralPath>,
) -> Vec<CandidateRecord> {
    if dominant.is_empty() {
        return subordinate;
    }
    subordinate
        .into_iter()
        .filter(|r| !is_dominated(&r.path, dominant))
        .collect()
}

/// Collapse records sharing a path; the first one wins.
pub fn dedup(records: Vec<CandidateRecord>) -> Vec<CandidateRecord> {
    let mut seen: HashSet<StructuralPath> = HashSet::with_capacity(records.len());
    records
        .into_iter()
        .filter(|r| seen.insert(r.path.clone()))
        .collect()
}

/// Paths in `paths` that are a strict ancestor of another path in the set.
///
/// Sorted order puts every descendant of `P` in the run of paths sharing the
/// raw prefix `P`, so each path only needs a forward scan over that run.
pub fn ancestor_paths<'a, I>(paths: I) -> HashSet<StructuralPath>
where
    I: IntoIterator<Item = &'a StructuralPath>,
{
    let sorted: Vec<&StructuralPath> = paths
        .into_iter()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut ancestors = HashSet::new();
    for (i, path) in sorted.iter().enumerate() {
        let has_descendant = sorted[i + 1..]
            .iter()
            .take_while(|next| next.as_str().starts_with(path.as_str()))
            .any(|next| path.is_ancestor_of(next));
        if has_descendant {
            ancestors.insert((*path).clone());
        }
    }
    ancestors
}

/// Keep only records whose path is not a strict ancestor of another record's.
pub fn prune(records: Vec<CandidateRecord>) -> Vec<CandidateRecord> {
    let dropped = ancestor_paths(records.iter().map(|r| &r.path));
    if dropped.is_empty() {
        return records;
    }
    records
        .into_iter()
        .filter(|r| !dropped.contains(&r.path))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;
    use std::collections::BTreeMap;

    fn rec(path: &str, category: &str, domain: &str) -> CandidateRecord {
        CandidateRecord {
            path: StructuralPath::from(path),
            category: Category::from(category),
            domain: domain.to_string(),
            text: String::new(),
            tag: "div".to_string(),
            attributes: BTreeMap::new(),
            link: None,
            detector: "test".to_string(),
        }
    }

    fn paths(records: &[CandidateRecord]) -> Vec<&str> {
        records.iter().map(|r| r.path.as_str()).collect()
    }

    fn dominant(paths: &[&str]) -> BTreeSet<StructuralPath> {
        paths.iter().map(|p| StructuralPath::from(*p)).collect()
    }

    #[test]
    fn test_precedence_removes_descendant() {
        let kept = enforce_precedence(
            vec![rec("/a/b/c", "organic", "example.com")],
            &dominant(&["/a/b"]),
        );
        assert!(kept.is_empty());
    }

    #[test]
    fn test_precedence_removes_ancestor_and_equal() {
        let kept = enforce_precedence(
            vec![
                rec("/a", "organic", "example.com"),
                rec("/a/b", "organic", "example.com"),
                rec("/a/c", "organic", "example.com"),
            ],
            &dominant(&["/a/b"]),
        );
        assert_eq!(paths(&kept), vec!["/a/c"]);
    }

    #[test]
    fn test_precedence_respects_index_boundaries() {
        let kept = enforce_precedence(
            vec![
                rec("/div[1]/div[2]", "organic", "example.com"),
                rec("/div[1]/div[20]/a", "organic", "example.com"),
            ],
            &dominant(&["/div[1]/div[2]/a"]),
        );
        assert_eq!(paths(&kept), vec!["/div[1]/div[20]/a"]);
    }

    #[test]
    fn test_precedence_idempotent() {
        let dom = dominant(&["/x/y"]);
        let input = vec![
            rec("/x", "organic", "a.com"),
            rec("/x/z", "organic", "a.com"),
            rec("/q", "organic", "a.com"),
        ];
        let once = enforce_precedence(input, &dom);
        let twice = enforce_precedence(once.clone(), &dom);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_dedup_first_wins() {
        let out = dedup(vec![
            rec("/a", "ads-general", "google.com"),
            rec("/a", "link-google", "google.com"),
            rec("/b", "organic", "a.com"),
        ]);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].category, "ads-general");
    }

    #[test]
    fn test_prune_keeps_most_specific() {
        let out = prune(vec![
            rec("/html/body/div", "link-google", "google.com"),
            rec("/html/body/div/a", "link-google", "google.com"),
            rec("/html/body/div/a/span", "answer-x", "google.com"),
            rec("/html/body/p", "answer-y", "google.com"),
        ]);
        assert_eq!(paths(&out), vec!["/html/body/div/a/span", "/html/body/p"]);
    }

    #[test]
    fn test_prune_ignores_raw_prefix_without_separator() {
        let out = prune(vec![
            rec("/html/body/div[1]", "a", "google.com"),
            rec("/html/body/div[10]", "b", "google.com"),
            rec("/html/body/div[1]0", "c", "google.com"),
        ]);
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn test_prune_sees_descendant_past_non_descendant() {
        // "/a/b[2]" sorts between "/a/b" and "/a/b/c" but is not a descendant.
        let out = prune(vec![
            rec("/a/b", "x", "google.com"),
            rec("/a/b[2]", "y", "google.com"),
            rec("/a/b/c", "z", "google.com"),
        ]);
        assert_eq!(paths(&out), vec!["/a/b[2]", "/a/b/c"]);
    }

    #[test]
    fn test_partition_by_owner_domain() {
        let config = AssayConfig::default();
        let parts = partition(
            vec![
                rec("/a", "ads-general", "google.com"),
                rec("/b", "organic", "example.com"),
                rec("/c", "link-youtube", "youtube.com"),
            ],
            &config,
        );
        assert_eq!(paths(&parts.owner), vec!["/a", "/c"]);
        assert_eq!(paths(&parts.other), vec!["/b"]);
    }

    #[test]
    fn test_pruned_union_prunes_within_partitions_only() {
        let parts = Partitions {
            owner: vec![rec("/a", "ads-general", "google.com")],
            other: vec![
                rec("/a/b", "organic", "x.com"),
                rec("/a", "organic", "x.com"),
            ],
        };
        let out = parts.into_pruned();
        assert_eq!(paths(&out), vec!["/a", "/a/b"]);
        assert_eq!(out[0].category, "ads-general");
    }
}
