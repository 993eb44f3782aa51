//! Link-target domain resolution.
//!
//! Absolute URLs resolve to their registrable domain (`news.bbc.co.uk` →
//! `bbc.co.uk`, `www.youtube.com` → `youtube.com`). Anything without a host
//! (`/aclk?sa=l`, `#`, `javascript:void(0)`) stays as the raw target.

use std::fmt;
use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use url::Url;

/// Second-level labels that sit under a two-letter country code.
const SECOND_LEVEL_LABELS: &[&str] = &["co", "com", "org", "net", "ac", "gov", "edu", "ne", "or"];

/// Capacity used when a zero capacity is requested.
const FALLBACK_CACHE_ENTRIES: usize = 1024;

/// Result of resolving a link target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ResolvedDomain {
    /// Registrable domain of an absolute URL.
    Registrable(String),
    /// Target without a host, kept verbatim.
    Relative(String),
}

impl ResolvedDomain {
    /// Domain or raw target.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Registrable(d) | Self::Relative(d) => d,
        }
    }

    /// True for targets without a host.
    pub fn is_relative(&self) -> bool {
        matches!(self, Self::Relative(_))
    }

    /// Path part of a relative target, before any query string.
    pub fn relative_path(&self) -> Option<&str> {
        match self {
            Self::Relative(raw) if raw.starts_with('/') => {
                Some(raw.split('?').next().unwrap_or(raw))
            }
            _ => None,
        }
    }
}

impl fmt::Display for ResolvedDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reduce a host name to its registrable domain.
///
/// Keeps the last two labels, or three when the second-to-last label is a
/// common second-level registry label under a two-letter country code
/// (`bbc.co.uk`). There is no public suffix list behind this, so hosts under
/// private suffixes (`user.github.io` → `github.io`) and under second-level
/// labels missing from `SECOND_LEVEL_LABELS` (`city.kawasaki.jp` →
/// `kawasaki.jp`) are split one label too high. IP literals pass through.
pub fn registrable_domain(host: &str) -> String {
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    let host = host.strip_prefix("www.").unwrap_or(&host);
    if host.parse::<std::net::IpAddr>().is_ok() || host.starts_with('[') {
        return host.to_string();
    }

    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    let keep = match labels.as_slice() {
        [.., second, tld]
            if labels.len() >= 3
                && tld.len() == 2
                && SECOND_LEVEL_LABELS.contains(second) =>
        {
            3
        }
        _ => 2,
    };
    labels[labels.len().saturating_sub(keep)..].join(".")
}

fn resolve_uncached(raw: &str) -> ResolvedDomain {
    let target = raw.trim();
    let parsed = if target.starts_with("//") {
        Url::parse(&format!("https:{target}"))
    } else {
        Url::parse(target)
    };

    match parsed.ok().as_ref().and_then(Url::host_str).map(registrable_domain) {
        Some(domain) if !domain.is_empty() => ResolvedDomain::Registrable(domain),
        _ => ResolvedDomain::Relative(target.to_string()),
    }
}

/// Domain resolver with a bounded LRU cache.
///
/// Thread-safe; one resolver is shared by every page of a batch.
pub struct DomainResolver {
    cache: RwLock<LruCache<String, ResolvedDomain>>,
}

impl DomainResolver {
    /// Create a resolver caching up to `capacity` targets.
    pub fn new(capacity: usize) -> Self {
        let size = NonZeroUsize::new(capacity)
            .or_else(|| NonZeroUsize::new(FALLBACK_CACHE_ENTRIES))
            .unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: RwLock::new(LruCache::new(size)),
        }
    }

    /// Resolve a link target.
    pub fn resolve(&self, url: &str) -> ResolvedDomain {
        if let Some(hit) = self.cache.read().peek(url) {
            return hit.clone();
        }
        let resolved = resolve_uncached(url);
        self.cache.write().put(url.to_string(), resolved.clone());
        resolved
    }

    /// Number of cached targets.
    pub fn cached(&self) -> usize {
        self.cache.read().len()
    }
}

impl Default for DomainResolver {
    fn default() -> Self {
        Self::new(FALLBACK_CACHE_ENTRIES)
    }
}

impl fmt::Debug for DomainResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainResolver")
            .field("cached", &self.cached())
            .finish()
    }
}
