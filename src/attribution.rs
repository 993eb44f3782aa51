//! Spatial attribution: rectangles to clipped areas.
//!
//! ## Clipping
//!
//! ```text
//! tl_x = clamp(max(x, 0), 0, W)      tr_y = clamp(y, 0, H)
//! tr_x = clamp(x + w, 0, W)          br_y = clamp(y + h, 0, H)
//! area = max(0, tr_x - tl_x) * max(0, br_y - tr_y)
//! ```
//!
//! Visible area clips to the viewport; page area clips to the viewport width
//! and a very tall page.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::policy::AssayConfig;
use crate::render::{RenderedRect, Renderer};
use crate::types::{GeometryRecord, StructuralPath};

/// Clipping bounds, origin at the top-left of the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Width bound.
    pub width: f64,
    /// Height bound.
    pub height: f64,
}

impl Bounds {
    /// Create bounds.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Corners of a rectangle after clipping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClippedRect {
    /// Clipped left edge.
    pub tl_x: f64,
    /// Clipped right edge.
    pub tr_x: f64,
    /// Clipped top edge.
    pub tr_y: f64,
    /// Clipped bottom edge.
    pub br_y: f64,
}

impl ClippedRect {
    /// Area of the clipped rectangle, zero when it is empty.
    pub fn area(&self) -> f64 {
        (self.tr_x - self.tl_x).max(0.0) * (self.br_y - self.tr_y).max(0.0)
    }
}

/// Clip a raw rectangle to `bounds`.
pub fn clip(rect: &RenderedRect, bounds: Bounds) -> ClippedRect {
    ClippedRect {
        tl_x: rect.x.max(0.0).clamp(0.0, bounds.width),
        tr_x: (rect.x + rect.width).clamp(0.0, bounds.width),
        tr_y: rect.y.clamp(0.0, bounds.height),
        br_y: (rect.y + rect.height).clamp(0.0, bounds.height),
    }
}

/// Area of a raw rectangle inside `bounds`.
pub fn clipped_area(rect: &RenderedRect, bounds: Bounds) -> f64 {
    clip(rect, bounds).area()
}

/// Measures rendered nodes against the viewport and page bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialAttributor {
    /// First-screen bounds.
    pub viewport: Bounds,
    /// Whole-page bounds.
    pub page: Bounds,
    /// Height at which a layout counts as warped.
    pub warped_height_px: f64,
}

impl SpatialAttributor {
    /// Attributor for a configuration.
    pub fn from_config(config: &AssayConfig) -> Self {
        Self {
            viewport: Bounds::new(config.viewport.width, config.viewport.height),
            page: Bounds::new(config.viewport.width, config.page_height_bound),
            warped_height_px: config.warped_height_px,
        }
    }

    /// Measure a located rectangle.
    ///
    /// Warp is checked before visibility: a warped node flags the page even
    /// when hidden. A hidden, unwarped node has no geometry.
    pub fn measure(&self, path: &StructuralPath, rect: &RenderedRect) -> Option<GeometryRecord> {
        let is_warped = rect.height >= self.warped_height_px;
        if !is_warped && !rect.displayed {
            return None;
        }
        Some(GeometryRecord {
            path: path.clone(),
            width: rect.width,
            height: rect.height,
            x: rect.x,
            y: rect.y,
            visible_area: clipped_area(rect, self.viewport),
            page_area: clipped_area(rect, self.page),
            is_warped,
        })
    }

    /// Look a path up in the renderer and measure it.
    ///
    /// `Ok(None)` is an attribution miss: the path is not rendered or not
    /// displayed.
    pub async fn attribute<R>(
        &self,
        path: &StructuralPath,
        renderer: &R,
    ) -> Result<Option<GeometryRecord>, R::Error>
    where
        R: Renderer + ?Sized,
    {
        let Some(rect) = renderer.locate(path).await? else {
            debug!(path = %path, "attribution miss: not rendered");
            return Ok(None);
        };
        let geometry = self.measure(path, &rect);
        if geometry.is_none() {
            debug!(path = %path, "attribution miss: not displayed");
        }
        Ok(geometry)
    }
}
