//! Product reviews and store listings.

use super::ScanContext;
use crate::dom::{self, descendants, own_string, parent_element};
use crate::types::{CandidateRecord, PathError};
use crate::{static_regex, static_selector};

/// Label identifying a book listing on the publisher's store.
const PLAY_BOOKS_LABEL: &str = "Google Play Books";

/// Review and details tabs, plus the product-detail spans next to them.
pub(super) fn reviews(scan: &ScanContext<'_>) -> Result<Vec<CandidateRecord>, PathError> {
    let tab_kind = static_regex!("DETAILS|REVIEWS");
    let mut records = Vec::new();

    for tab in scan.select(static_selector!("div[data-dtl]")) {
        if !dom::attr(tab, "data-dtl").is_some_and(|v| tab_kind.is_match(v)) {
            continue;
        }
        if let Some(listing) = parent_element(tab) {
            for span in descendants(listing, static_selector!("span[data-hveid]")) {
                records.push(scan.record(span, "answer-product_details")?);
            }
        }
        records.push(scan.record(tab, "link-reviews_details")?);
    }
    Ok(records)
}

/// Store buttons inside expandable book panels.
///
/// A button whose labels include the publisher's own store is a link to it;
/// any other labelled button is an organic seller.
pub(super) fn ebook(scan: &ScanContext<'_>) -> Result<Vec<CandidateRecord>, PathError> {
    let panels = static_selector!(
        "g-expandable-content[jscontroller][jsaction][jsshadow][aria-hidden][data-eb][data-mt][data-quie][data-ved]"
    );
    let buttons = static_selector!(
        r#"div[class][jsname][role="button"][aria-haspopup][tabindex][jsaction]"#
    );
    let mut records = Vec::new();

    for panel in scan.select(panels) {
        for button in descendants(panel, buttons) {
            let labels: Vec<String> = descendants(button, static_selector!("div"))
                .filter_map(own_string)
                .collect();
            if labels.is_empty() {
                continue;
            }
            let category = if labels.iter().any(|l| l == PLAY_BOOKS_LABEL) {
                "link-google_play_books"
            } else {
                "organic"
            };
            records.push(scan.record(button, category)?);
        }
    }
    Ok(records)
}
