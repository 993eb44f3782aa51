//! Knowledge-graph panels: factoids, media actions, course lists and maps.

use super::ScanContext;
use crate::dom::{self, descendants, own_string, parent_element, text_of};
use crate::domain::ResolvedDomain;
use crate::types::{CandidateRecord, PathError};
use crate::{static_regex, static_selector};

/// Levels above a factoid span checked for an enclosing anchor.
const ANCHOR_LOOKUP_HOPS: usize = 4;

/// First image of each reverse-image-search trigger.
pub(super) fn image_reverse(scan: &ScanContext<'_>) -> Result<Vec<CandidateRecord>, PathError> {
    let mut records = Vec::new();
    for trigger in scan.select(static_selector!(r#"[jsaction^="fire.ivg_o"]"#)) {
        if let Some(img) = descendants(trigger, static_selector!("img")).next() {
            records.push(scan.record(img, "link-img_reverse")?);
        }
    }
    Ok(records)
}

/// "Watched" and "add to watchlist" buttons in media panels.
pub(super) fn watchlist(scan: &ScanContext<'_>) -> Result<Vec<CandidateRecord>, PathError> {
    let media_actions = static_regex!("^kc:(.*?):media_actions");
    let mut records = Vec::new();
    for panel in scan.select(static_selector!("div[data-attrid]")) {
        if !dom::attr(panel, "data-attrid").is_some_and(|v| media_actions.is_match(v)) {
            continue;
        }
        for button in descendants(panel, static_selector!(r#"div[role="button"][jsdata][jscontroller]"#)) {
            records.push(scan.record(button, "link-watchlist")?);
        }
    }
    Ok(records)
}

/// Course offerings of an educational institution, one record per entry.
pub(super) fn courses(scan: &ScanContext<'_>) -> Result<Vec<CandidateRecord>, PathError> {
    let majors = static_regex!("^/(.*?)/majors");
    let mut records = Vec::new();
    for panel in scan.select(static_selector!("div[data-attrid]")) {
        if !dom::attr(panel, "data-attrid").is_some_and(|v| majors.is_match(v)) {
            continue;
        }
        for span in descendants(panel, static_selector!("span")) {
            if let Some(entry) = parent_element(span) {
                records.push(scan.record(entry, "answer-courses")?);
            }
        }
    }
    Ok(records)
}

/// Factoids quoted in knowledge panels that are not themselves links.
///
/// A span is skipped when it contains a link to a third-party site or sits
/// inside an anchor; linked factoids are claimed by the link detector.
pub(super) fn factoids(scan: &ScanContext<'_>) -> Result<Vec<CandidateRecord>, PathError> {
    let config = scan.config;
    let sourced = static_regex!("^(kc:|ss:|hw:|okra:)");
    let spans = static_selector!("span:not([role]):not([aria-level]):not([jsaction])");
    let mut records = Vec::new();

    for panel in scan.select(static_selector!("div[data-attrid][lang]")) {
        if !dom::attr(panel, "data-attrid").is_some_and(|v| sourced.is_match(v)) {
            continue;
        }
        for span in descendants(panel, spans) {
            if text_of(span).chars().count() <= 1 {
                continue;
            }
            let links_out = descendants(span, static_selector!("a[href]")).any(|a| {
                let href = dom::attr(a, "href").unwrap_or_default();
                !config.is_script_href(href)
                    && match scan.domains.resolve(href) {
                        ResolvedDomain::Registrable(domain) => domain != config.publisher_domain,
                        ResolvedDomain::Relative(_) => false,
                    }
            });
            let inside_anchor = span
                .ancestors()
                .take(ANCHOR_LOOKUP_HOPS)
                .filter_map(scraper::ElementRef::wrap)
                .any(|el| dom::tag(el) == "a");
            if !links_out && !inside_anchor {
                records.push(scan.record(span, "answer-knowledge_graph_factoid")?);
            }
        }
    }
    Ok(records)
}

/// Map tiles under a "Map Results" heading.
pub(super) fn map_results(scan: &ScanContext<'_>) -> Result<Vec<CandidateRecord>, PathError> {
    let mut records = Vec::new();
    for heading in scan.select(static_selector!("h2")) {
        if own_string(heading).as_deref() != Some("Map Results") {
            continue;
        }
        let Some(section) = parent_element(heading) else {
            continue;
        };
        for tile in descendants(section, static_selector!(r#"div[class*="map"]"#)) {
            records.push(scan.record(tile, "link-google_map_2")?);
        }
    }
    Ok(records)
}
