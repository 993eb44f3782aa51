//! Text answers shown directly on the page.

use super::ScanContext;
use crate::dom::{descendants, parent_element, text_of};
use crate::static_selector;
use crate::types::{CandidateRecord, PathError};

/// Label of the "see results about" disambiguation span.
const SEE_RESULTS_ABOUT: &str = "See results about";

/// Paragraph answers quoted from the web, recorded at the span holding the text.
pub(super) fn rich_text(scan: &ScanContext<'_>) -> Result<Vec<CandidateRecord>, PathError> {
    let min_chars = scan.config.text_window_min_chars;
    let mut records = Vec::new();

    for block in scan.select(static_selector!(r#"div[jsaction^="desclink:"]"#)) {
        for span in descendants(block, static_selector!("span")) {
            let text = text_of(span);
            if text.is_empty() || text == SEE_RESULTS_ABOUT || text.chars().count() <= min_chars {
                continue;
            }
            if descendants(span, static_selector!("a[href]")).next().is_some() {
                continue;
            }
            records.push(scan.record(span, "answer-richtext")?);
        }
        for list in descendants(block, static_selector!("ul[class]")) {
            records.push(scan.record(list, "answer-richtext")?);
        }
    }
    Ok(records)
}

/// First long unlinked span under a "Description" heading.
pub(super) fn knowledge_panel_description(
    scan: &ScanContext<'_>,
) -> Result<Vec<CandidateRecord>, PathError> {
    let min_chars = scan.config.text_window_min_chars;
    let mut records = Vec::new();

    for heading in scan.select(static_selector!("h2[class]")) {
        if text_of(heading) != "Description" {
            continue;
        }
        let Some(panel) = parent_element(heading) else {
            continue;
        };
        let found = descendants(panel, static_selector!("span:not([jsslot])")).find(|span| {
            let text = text_of(*span);
            text.chars().count() > min_chars
                && descendants(*span, static_selector!("a[href]")).next().is_none()
        });
        if let Some(span) = found {
            records.push(scan.record(span, "answer-knowledge_panel_answer_1")?);
        }
    }
    Ok(records)
}

/// Level-3 headings that carry an answer in a classed span.
pub(super) fn knowledge_panel_heading(
    scan: &ScanContext<'_>,
) -> Result<Vec<CandidateRecord>, PathError> {
    let headings =
        static_selector!(r#"div[aria-level="3"][role="heading"][data-hveid][class]"#);
    scan.select(headings)
        .filter(|heading| {
            descendants(*heading, static_selector!("span[class]"))
                .any(|span| !text_of(span).is_empty())
        })
        .map(|heading| scan.record(heading, "answer-knowledge_panel_answer_2"))
        .collect()
}
