//! Assay configuration: viewport, thresholds and domain sets.
//!
//! ## Float Normalization for Deterministic Hashing
//!
//! Viewport and threshold floats are quantized to integers before hashing
//! (multiply by 1e6 and round to i64), so a run manifest records the same
//! `config_hash` regardless of how the configuration was serialized.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::canonical::canonical_hash_hex;
use crate::DEFAULT_CONFIG_VERSION;

/// Quantization factor for float normalization.
const FLOAT_QUANTIZATION_FACTOR: f64 = 1_000_000.0;

/// Errors raised while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration document could not be parsed.
    #[error("Invalid configuration document: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field holds a value the engine cannot work with.
    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Screen size the page was rendered at, in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Screen width.
    pub width: f64,
    /// Screen height (the "first screen").
    pub height: f64,
}

impl Viewport {
    /// Create a viewport.
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// iPhone X portrait screen.
    pub fn iphone_x() -> Self {
        Self::new(375.0, 812.0)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::iphone_x()
    }
}

/// Configuration passed to the engine at construction.
///
/// ## Parameters
///
/// - `viewport`: screen the page was rendered at; bounds visible area
/// - `page_height_bound`: height used for whole-page area
/// - `warped_height_px`: raw element height at which a layout is treated as broken
/// - `publisher_domain`: domain of the search engine itself
/// - `video_domain`: the publisher's video property
/// - `ad_service_domain`: domain ad clicks are routed through
/// - `owner_domains`: domains counted as owned by the publisher
/// - `script_hrefs`: href values that mark script-driven controls
/// - `text_window_min_chars`: minimum text length for text-window checks
/// - `results_root_id`: id of the container detectors scan
/// - `excluded_root_ids`: ids of subtrees whose candidates are discarded
/// - `max_concurrent_pages`: page-level parallelism in batch runs
/// - `domain_cache_entries`: capacity of the domain-resolution cache
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssayConfig {
    /// Configuration version identifier.
    pub version: String,
    /// Render viewport.
    pub viewport: Viewport,
    /// Height bound for page area.
    pub page_height_bound: f64,
    /// Warp threshold in pixels.
    pub warped_height_px: f64,
    /// Publisher domain.
    pub publisher_domain: String,
    /// Publisher's video domain.
    pub video_domain: String,
    /// Ad click service domain.
    pub ad_service_domain: String,
    /// Publisher-owned domains.
    pub owner_domains: Vec<String>,
    /// Script-driven href values.
    pub script_hrefs: Vec<String>,
    /// Text window threshold.
    pub text_window_min_chars: usize,
    /// Results container id.
    pub results_root_id: String,
    /// Excluded subtree ids.
    pub excluded_root_ids: Vec<String>,
    /// Batch page parallelism.
    pub max_concurrent_pages: usize,
    /// Domain cache capacity.
    pub domain_cache_entries: usize,
}

impl AssayConfig {
    /// Configuration for pages captured on an iPhone X.
    pub fn iphone_x() -> Self {
        Self {
            version: DEFAULT_CONFIG_VERSION.to_string(),
            viewport: Viewport::iphone_x(),
            page_height_bound: 1e6,
            warped_height_px: 700.0,
            publisher_domain: "google.com".to_string(),
            video_domain: "youtube.com".to_string(),
            ad_service_domain: "googleadservices.com".to_string(),
            owner_domains: vec![
                "google.com".to_string(),
                "youtube.com".to_string(),
                "googleadservices.com".to_string(),
            ],
            script_hrefs: vec![
                "#".to_string(),
                "javascript:void(0);".to_string(),
                "javascript:void(0)".to_string(),
            ],
            text_window_min_chars: 50,
            results_root_id: "cnt".to_string(),
            excluded_root_ids: vec!["sfooter".to_string()],
            max_concurrent_pages: 4,
            domain_cache_entries: 4096,
        }
    }

    /// Same configuration with a different viewport.
    pub fn with_viewport(mut self, width: f64, height: f64) -> Self {
        self.viewport = Viewport::new(width, height);
        self
    }

    /// Parse a JSON configuration document. Missing fields take defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.viewport.width > 0.0 && self.viewport.height > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "viewport",
                reason: format!(
                    "dimensions must be positive, got {}x{}",
                    self.viewport.width, self.viewport.height
                ),
            });
        }
        if self.page_height_bound < self.viewport.height {
            return Err(ConfigError::InvalidValue {
                field: "page_height_bound",
                reason: "must be at least the viewport height".to_string(),
            });
        }
        if !(self.warped_height_px > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "warped_height_px",
                reason: "must be positive".to_string(),
            });
        }
        if self.max_concurrent_pages == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_concurrent_pages",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.domain_cache_entries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "domain_cache_entries",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.results_root_id.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "results_root_id",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// True when `domain` belongs to the publisher.
    pub fn is_owner_domain(&self, domain: &str) -> bool {
        self.owner_domains.iter().any(|d| d == domain)
    }

    /// True when `href` is a script-driven control rather than a link.
    pub fn is_script_href(&self, href: &str) -> bool {
        self.script_hrefs.iter().any(|h| h == href)
    }

    /// Compute a hash of the configuration.
    ///
    /// Floats are multiplied by 1e6 and rounded to i64 before hashing.
    pub fn config_hash(&self) -> String {
        canonical_hash_hex(&self.to_quantized())
    }

    fn to_quantized(&self) -> QuantizedAssayConfig {
        QuantizedAssayConfig {
            version: self.version.clone(),
            viewport_width: quantize_float(self.viewport.width),
            viewport_height: quantize_float(self.viewport.height),
            page_height_bound: quantize_float(self.page_height_bound),
            warped_height_px: quantize_float(self.warped_height_px),
            publisher_domain: self.publisher_domain.clone(),
            video_domain: self.video_domain.clone(),
            ad_service_domain: self.ad_service_domain.clone(),
            owner_domains: self.owner_domains.clone(),
            script_hrefs: self.script_hrefs.clone(),
            text_window_min_chars: self.text_window_min_chars,
            results_root_id: self.results_root_id.clone(),
            excluded_root_ids: self.excluded_root_ids.clone(),
        }
    }
}

impl Default for AssayConfig {
    fn default() -> Self {
        Self::iphone_x()
    }
}

/// Quantize a float to an i64 for deterministic hashing.
fn quantize_float(value: f64) -> i64 {
    (value * FLOAT_QUANTIZATION_FACTOR).round() as i64
}

/// Hashed view of the configuration.
///
/// Concurrency and cache sizing do not change outputs and are left out.
#[derive(Debug, Clone, Serialize)]
struct QuantizedAssayConfig {
    version: String,
    viewport_width: i64,
    viewport_height: i64,
    page_height_bound: i64,
    warped_height_px: i64,
    publisher_domain: String,
    video_domain: String,
    ad_service_domain: String,
    owner_domains: Vec<String>,
    script_hrefs: Vec<String>,
    text_window_min_chars: usize,
    results_root_id: String,
    excluded_root_ids: Vec<String>,
}
