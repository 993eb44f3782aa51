//! Candidate, geometry and attributed element records.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::category::Category;
use super::path::StructuralPath;

/// A detector's classification claim about one node.
///
/// Created during the classification pass; dropped or kept by the resolver
/// and pruner, never edited afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Structural path of the claimed node.
    pub path: StructuralPath,
    /// Semantic category.
    pub category: Category,
    /// Resolved link-target domain, or the page owner's domain.
    pub domain: String,
    /// Concatenated text content of the node.
    pub text: String,
    /// Tag name of the node.
    pub tag: String,
    /// Attributes of the node, ordered by name.
    pub attributes: BTreeMap<String, String>,
    /// Raw link target the classification was based on, if any.
    pub link: Option<String>,
    /// Name of the detector that produced the claim.
    pub detector: String,
}

impl CandidateRecord {
    /// Class names joined with `|`, empty when the node has no class attribute.
    pub fn element_class(&self) -> String {
        self.attributes
            .get("class")
            .map(|c| c.split_whitespace().collect::<Vec<_>>().join("|"))
            .unwrap_or_default()
    }
}

/// On-screen geometry of a node in the current render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryRecord {
    /// Structural path the geometry was looked up by.
    pub path: StructuralPath,
    /// Raw width in device pixels.
    pub width: f64,
    /// Raw height in device pixels.
    pub height: f64,
    /// Raw left edge.
    pub x: f64,
    /// Raw top edge.
    pub y: f64,
    /// Area clipped to the first screen (viewport).
    pub visible_area: f64,
    /// Area clipped to the page width with unbounded height.
    pub page_area: f64,
    /// Whether the height marks the layout as broken.
    pub is_warped: bool,
}

/// Width and height of an attributed element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in device pixels.
    pub width: f64,
    /// Height in device pixels.
    pub height: f64,
}

/// Top-left corner of an attributed element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
}

/// Final emitted unit: a candidate joined with its geometry.
///
/// Field names and nesting are the JSON-lines contract read by the
/// visualization tooling; do not rename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributedElement {
    /// Structural path.
    pub xpath: StructuralPath,
    /// Semantic category.
    pub category: Category,
    /// Link-target or owner domain.
    pub domain: String,
    /// Text content.
    pub text: String,
    /// Tag name.
    pub tag: String,
    /// Attributes, ordered by name.
    pub attributes: BTreeMap<String, String>,
    /// Raw dimensions.
    pub dimensions: Dimensions,
    /// Raw location.
    pub location: Location,
    /// Visible (first screen) area.
    pub area: f64,
    /// Whole-page area.
    pub area_page: f64,
    /// Identifier of the page the element was measured on.
    pub source_page_id: String,
}

impl AttributedElement {
    /// Join a candidate with its geometry.
    ///
    /// The caller guarantees both records share a path.
    pub fn join(candidate: CandidateRecord, geometry: &GeometryRecord, source_page_id: &str) -> Self {
        debug_assert_eq!(candidate.path, geometry.path);
        Self {
            xpath: candidate.path,
            category: candidate.category,
            domain: candidate.domain,
            text: candidate.text,
            tag: candidate.tag,
            attributes: candidate.attributes,
            dimensions: Dimensions {
                width: geometry.width,
                height: geometry.height,
            },
            location: Location {
                x: geometry.x,
                y: geometry.y,
            },
            area: geometry.visible_area,
            area_page: geometry.page_area,
            source_page_id: source_page_id.to_string(),
        }
    }

    /// Serialize as a single JSON line (no trailing newline).
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Serialize elements as JSON lines, one record per line.
pub fn to_json_lines(elements: &[AttributedElement]) -> Result<String, serde_json::Error> {
    let mut out = String::new();
    for element in elements {
        out.push_str(&element.to_json_line()?);
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> CandidateRecord {
        let mut attributes = BTreeMap::new();
        attributes.insert("class".to_string(), "g  tF2Cxc".to_string());
        CandidateRecord {
            path: StructuralPath::from("/html/body/div[2]"),
            category: Category::from("ads-general"),
            domain: "google.com".to_string(),
            text: "Sponsored".to_string(),
            tag: "div".to_string(),
            attributes,
            link: None,
            detector: "ads_general".to_string(),
        }
    }

    fn geometry() -> GeometryRecord {
        GeometryRecord {
            path: StructuralPath::from("/html/body/div[2]"),
            width: 375.0,
            height: 120.0,
            x: 0.0,
            y: 40.0,
            visible_area: 45000.0,
            page_area: 45000.0,
            is_warped: false,
        }
    }

    #[test]
    fn test_element_class_joins_with_pipes() {
        assert_eq!(candidate().element_class(), "g|tF2Cxc");
    }

    #[test]
    fn test_json_line_field_contract() {
        let element = AttributedElement::join(candidate(), &geometry(), "page-001");
        let value: serde_json::Value = serde_json::from_str(&element.to_json_line().unwrap()).unwrap();

        assert_eq!(value["xpath"], "/html/body/div[2]");
        assert_eq!(value["category"], "ads-general");
        assert_eq!(value["domain"], "google.com");
        assert_eq!(value["tag"], "div");
        assert_eq!(value["attributes"]["class"], "g  tF2Cxc");
        assert_eq!(value["dimensions"]["width"], 375.0);
        assert_eq!(value["dimensions"]["height"], 120.0);
        assert_eq!(value["location"]["x"], 0.0);
        assert_eq!(value["location"]["y"], 40.0);
        assert_eq!(value["area"], 45000.0);
        assert_eq!(value["area_page"], 45000.0);
        assert_eq!(value["source_page_id"], "page-001");
        assert!(value.get("link").is_none());
    }

    #[test]
    fn test_json_lines_one_record_per_line() {
        let element = AttributedElement::join(candidate(), &geometry(), "page-001");
        let out = to_json_lines(&[element.clone(), element]).unwrap();
        assert_eq!(out.lines().count(), 2);
        assert!(out.ends_with('\n'));
    }
}
