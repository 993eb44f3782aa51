//! Element categories.
//!
//! Categories are dash-namespaced strings: the part before the first dash is
//! the family (`ads`, `organic`, `link`, `answer`, `amp`), the rest is a
//! detector-specific subtype (`ads-general`, `answer-lyrics`). A bare family
//! (`organic`) is also valid.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between family and subtype.
pub const FAMILY_SEPARATOR: char = '-';

/// Top-level grouping of categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryFamily {
    /// Third-party search results.
    Organic,
    /// Accelerated mobile page cards.
    Amp,
    /// Content answered directly on the page.
    Answer,
    /// Links and controls leading to the publisher's own properties.
    Link,
    /// Advertising.
    Ads,
    /// Anything outside the known families.
    Other,
}

impl CategoryFamily {
    /// Parse a family prefix.
    pub fn from_prefix(prefix: &str) -> Self {
        match prefix {
            "organic" => Self::Organic,
            "amp" => Self::Amp,
            "answer" => Self::Answer,
            "link" => Self::Link,
            "ads" => Self::Ads,
            _ => Self::Other,
        }
    }
}

impl fmt::Display for CategoryFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Organic => write!(f, "organic"),
            Self::Amp => write!(f, "amp"),
            Self::Answer => write!(f, "answer"),
            Self::Link => write!(f, "link"),
            Self::Ads => write!(f, "ads"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// A semantic category attached to a classified element.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    /// Wrap a category string.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Category string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Family prefix of the category.
    pub fn family(&self) -> CategoryFamily {
        let prefix = self.0.split(FAMILY_SEPARATOR).next().unwrap_or_default();
        CategoryFamily::from_prefix(prefix)
    }

    /// Subtype after the family prefix, if any.
    pub fn subtype(&self) -> Option<&str> {
        self.0
            .split_once(FAMILY_SEPARATOR)
            .map(|(_, rest)| rest)
    }

    /// True for an `organic-<subtype>` category.
    pub fn is_organic_subtype(&self) -> bool {
        self.family() == CategoryFamily::Organic && self.subtype().is_some()
    }

    /// Requalify an organic category as a link to an owner property.
    ///
    /// `organic-search_result_1a` with prefix `link-youtube_` becomes
    /// `link-youtube_search_result_1a`; anything that is not an organic
    /// subtype becomes `fallback`.
    pub fn requalify(&self, prefix: &str, fallback: &str) -> Category {
        match self.subtype() {
            Some(subtype) if self.is_organic_subtype() => Category(format!("{prefix}{subtype}")),
            _ => Category(fallback.to_string()),
        }
    }

    /// Append a suffix to the category (`amp-card` → `amp-card_google`).
    pub fn with_suffix(&self, suffix: &str) -> Category {
        Category(format!("{}{suffix}", self.0))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Category {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for Category {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl PartialEq<str> for Category {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Category {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_family_parsing() {
        assert_eq!(Category::from("ads-general").family(), CategoryFamily::Ads);
        assert_eq!(Category::from("organic").family(), CategoryFamily::Organic);
        assert_eq!(Category::from("answer-lyrics").family(), CategoryFamily::Answer);
        assert_eq!(Category::from("widget-x").family(), CategoryFamily::Other);
    }

    #[test]
    fn test_subtype_keeps_inner_dashes() {
        let c = Category::from("answer-product-details");
        assert_eq!(c.subtype(), Some("product-details"));
        assert_eq!(Category::from("organic").subtype(), None);
    }

    #[test]
    fn test_requalify_organic_subtype() {
        let c = Category::from("organic-search_result_1a");
        assert_eq!(
            c.requalify("link-google_", "link-google"),
            "link-google_search_result_1a"
        );
    }

    #[test]
    fn test_requalify_falls_back_for_plain_categories() {
        assert_eq!(
            Category::from("organic").requalify("link-youtube_", "link-youtube"),
            "link-youtube"
        );
        assert_eq!(
            Category::from("link-google").requalify("link-google_", "link-google"),
            "link-google"
        );
    }
}
