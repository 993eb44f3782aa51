//! Structural paths: stable, deterministic keys locating a node in a tree.
//!
//! A path is the root-to-node chain of tag names. A component carries a
//! 1-based `[i]` index only when the node shares its tag name with at least
//! one element sibling, so `/html/body/div[2]/a` and `/html/body/div/a` are
//! both valid. Paths are XPath expressions and can be handed to a browser
//! unchanged.

use scraper::ElementRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between path components.
pub const PATH_SEPARATOR: char = '/';

/// Error raised when a node cannot be located in its tree.
///
/// This is a contract violation: every node handed out by a parsed document
/// is reachable from the document root. It is propagated, never swallowed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// The node has no parent chain leading to a document or fragment root.
    #[error("node <{tag}> is detached from the document root")]
    Detached {
        /// Tag of the last element reached before the chain broke.
        tag: String,
    },
}

/// Deterministic string key uniquely locating a node in a document tree.
///
/// Ordering is plain byte-wise string ordering. Given the encoding, sorting
/// paths places every node's descendants in one contiguous run after it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructuralPath(String);

impl StructuralPath {
    /// Wrap a raw path string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Get the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the raw string.
    pub fn into_string(self) -> String {
        self.0
    }

    /// True when `self` is a strict ancestor of `other`.
    ///
    /// `/a/b` is an ancestor of `/a/b/c` but not of `/a/bc` or `/a/b[2]`.
    pub fn is_ancestor_of(&self, other: &StructuralPath) -> bool {
        let (a, b) = (self.0.as_str(), other.0.as_str());
        b.len() > a.len()
            && b.starts_with(a)
            && b[a.len()..].starts_with(PATH_SEPARATOR)
    }

    /// True when `self` is a strict descendant of `other`.
    pub fn is_descendant_of(&self, other: &StructuralPath) -> bool {
        other.is_ancestor_of(self)
    }

    /// True when the two paths are equal or one contains the other.
    pub fn overlaps(&self, other: &StructuralPath) -> bool {
        self == other || self.is_ancestor_of(other) || other.is_ancestor_of(self)
    }

    /// Number of components in the path.
    pub fn depth(&self) -> usize {
        self.0
            .split(PATH_SEPARATOR)
            .filter(|c| !c.is_empty())
            .count()
    }

    /// Path of the parent node, if any.
    pub fn parent(&self) -> Option<StructuralPath> {
        let cut = self.0.rfind(PATH_SEPARATOR)?;
        if cut == 0 {
            return None;
        }
        Some(Self(self.0[..cut].to_string()))
    }

    /// Iterate over all strict ancestors, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = StructuralPath> + '_ {
        std::iter::successors(self.parent(), |p| p.parent())
    }

    /// Prefix that every descendant path starts with (`self` + separator).
    pub fn descendant_prefix(&self) -> String {
        let mut prefix = String::with_capacity(self.0.len() + 1);
        prefix.push_str(&self.0);
        prefix.push(PATH_SEPARATOR);
        prefix
    }
}

impl fmt::Display for StructuralPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StructuralPath {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl AsRef<str> for StructuralPath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Resolve the structural path of an element.
///
/// Walks from the element to the document root. At each level the element's
/// tag is indexed among element siblings with the same tag, and the index is
/// only written when there is more than one of them.
pub fn resolve(element: ElementRef<'_>) -> Result<StructuralPath, PathError> {
    let mut components: Vec<String> = Vec::new();
    let mut current = element;

    loop {
        let name = current.value().name();
        let parent = current.parent().ok_or_else(|| PathError::Detached {
            tag: name.to_string(),
        })?;

        let mut position = 0;
        let mut same_tag = 0;
        for sibling in parent.children() {
            let Some(el) = sibling.value().as_element() else {
                continue;
            };
            if el.name() != name {
                continue;
            }
            same_tag += 1;
            if sibling.id() == current.id() {
                position = same_tag;
            }
        }

        if same_tag > 1 {
            components.push(format!("{name}[{position}]"));
        } else {
            components.push(name.to_string());
        }

        if parent.value().is_document() || parent.value().is_fragment() {
            break;
        }
        current = ElementRef::wrap(parent).ok_or_else(|| PathError::Detached {
            tag: name.to_string(),
        })?;
    }

    components.reverse();
    let mut path = String::new();
    for component in components {
        path.push(PATH_SEPARATOR);
        path.push_str(&component);
    }
    Ok(StructuralPath(path))
}
