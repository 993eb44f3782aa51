//! In-memory renderer backed by a recorded layout snapshot.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{RenderedRect, Renderer};
use crate::types::StructuralPath;

/// Error type for the in-memory renderer.
#[derive(Debug, thiserror::Error)]
pub enum InMemoryRendererError {
    /// Layout snapshot could not be parsed.
    #[error("Invalid layout snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),

    /// Lookup configured to fail.
    #[error("Layout lookup failed for {0}")]
    LookupFailed(StructuralPath),
}

/// One node of a recorded layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutEntry {
    /// Structural path of the node.
    pub xpath: StructuralPath,
    /// Its rectangle.
    #[serde(flatten)]
    pub rect: RenderedRect,
}

/// Layout recorded alongside a page capture.
///
/// ```json
/// {"elements": [{"xpath": "/html/body/div", "x": 0, "y": 40, "width": 375, "height": 120}]}
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutSnapshot {
    /// Recorded nodes.
    #[serde(default)]
    pub elements: Vec<LayoutEntry>,
}

/// Renderer answering from a layout snapshot.
///
/// Uses BTreeMap for deterministic iteration order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRenderer {
    rects: BTreeMap<StructuralPath, RenderedRect>,
    failing: BTreeSet<StructuralPath>,
}

impl InMemoryRenderer {
    /// Create an empty renderer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a snapshot. Later entries for the same path win.
    pub fn from_snapshot(snapshot: LayoutSnapshot) -> Self {
        let mut renderer = Self::new();
        for entry in snapshot.elements {
            renderer.insert(entry.xpath, entry.rect);
        }
        renderer
    }

    /// Parse a JSON layout snapshot.
    pub fn from_json_str(raw: &str) -> Result<Self, InMemoryRendererError> {
        let snapshot: LayoutSnapshot = serde_json::from_str(raw)?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Record a rectangle for a path.
    pub fn insert(&mut self, path: impl Into<StructuralPath>, rect: RenderedRect) {
        self.rects.insert(path.into(), rect);
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, path: &str, rect: RenderedRect) -> Self {
        self.insert(path, rect);
        self
    }

    /// Make lookups of `path` fail with a transport error.
    pub fn fail_on(&mut self, path: impl Into<StructuralPath>) {
        self.failing.insert(path.into());
    }

    /// Number of recorded nodes.
    pub fn len(&self) -> usize {
        self.rects.len()
    }

    /// Whether nothing is recorded.
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }
}

#[async_trait]
impl Renderer for InMemoryRenderer {
    type Error = InMemoryRendererError;

    async fn locate(&self, path: &StructuralPath) -> Result<Option<RenderedRect>, Self::Error> {
        if self.failing.contains(path) {
            return Err(InMemoryRendererError::LookupFailed(path.clone()));
        }
        Ok(self.rects.get(path).copied())
    }
}
