//! Rendering collaborators.
//!
//! The engine never drives a browser. It asks a [`Renderer`] where a node
//! was laid out, keyed by structural path, and measures the answer.

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::types::StructuralPath;

/// Raw bounding rectangle of a rendered node, in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderedRect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
    /// Whether the node is displayed.
    #[serde(default = "displayed_by_default")]
    pub displayed: bool,
}

fn displayed_by_default() -> bool {
    true
}

impl RenderedRect {
    /// Displayed rectangle.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            displayed: true,
        }
    }

    /// Same rectangle marked hidden.
    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }
}

/// Trait for layout lookups.
///
/// `Ok(None)` means the path does not resolve in the current render; an
/// `Err` is a transport failure of the collaborator itself.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Error type for renderer operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Locate a node by structural path.
    async fn locate(&self, path: &StructuralPath) -> Result<Option<RenderedRect>, Self::Error>;
}

pub use memory::{InMemoryRenderer, InMemoryRendererError, LayoutEntry, LayoutSnapshot};
