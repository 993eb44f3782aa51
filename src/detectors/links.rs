//! Anchor-driven detectors: plain links, AMP cards and "more" controls.
//!
//! ## Link categories
//!
//! | Target | Category |
//! |--------|----------|
//! | script href (`#`, `javascript:void(0)`) | `link-javascript` |
//! | `/aclk?...`, ad service domain, `aclk?` in URL | `ads-google_ad_services` |
//! | anchor with `data-merchant-id` on an owner target | `ads-merchant` |
//! | third-party domain | `organic` or an `organic-<layout>` subtype |
//! | video domain | `link-youtube` / `link-youtube_<layout>` (layout analysed as for organic) |
//! | publisher domain | `link-google`, `link-google_<layout>`, `link-button_2`, `link-google_2` |
//!
//! Ad escalations and script links are final; only plain and organic
//! categories are requalified for owner targets.

use scraper::ElementRef;

use super::ScanContext;
use crate::dom::{
    self, descendants, has_any_attr, has_attr, has_class, has_own_text, next_sibling_element,
    nth_ancestor, parent_element, text_of,
};
use crate::types::{CandidateRecord, Category, CategoryFamily, PathError};
use crate::{static_regex, static_selector};

/// Organic result shapes recognised from the text block next to the anchor.
fn organic_layout<'a>(
    scan: &ScanContext<'a>,
    anchor: ElementRef<'a>,
) -> Option<(&'static str, ElementRef<'a>)> {
    let parent = parent_element(anchor)?;
    let plain_div = static_selector!("div:not([role]):not([aria-level]):not([jsname])");
    let plain_span = static_selector!("span:not([role]):not([aria-level])");

    let beside_parent = next_sibling_element(parent, "div");
    if let Some(snippet) = beside_parent.filter(|_| !has_attr(parent, "data-attrid")) {
        if descendants(snippet, plain_div).next().is_some() {
            let mut target = parent;
            if !has_attr(target, "data-ved") {
                target = scan.broaden(target, 1);
            }
            return Some(("organic-search_result_1a", target));
        }
        if descendants(snippet, plain_span).any(has_own_text) {
            return Some(("organic-search_result_1b", scan.broaden(anchor, 2)));
        }
        return None;
    }

    let grandparent = parent_element(parent)?;
    let snippet = next_sibling_element(grandparent, "div")?;
    if dom::tag(parent) == "h3" {
        return None;
    }
    if descendants(snippet, plain_div).any(has_own_text) {
        return Some(("organic-search_result_2a", scan.broaden(anchor, 3)));
    }
    if descendants(snippet, plain_span).any(has_own_text) {
        return Some(("organic-search_result_2b", scan.broaden(anchor, 3)));
    }
    if descendants(snippet, static_selector!("table[class]")).next().is_some() {
        return Some(("organic-search_result_2c", scan.broaden(anchor, 3)));
    }
    None
}

fn is_escalated(category: &Category) -> bool {
    category.family() == CategoryFamily::Ads || *category == "link-javascript"
}

/// Every anchor with an `href`, except AMP anchors.
pub(super) fn links(scan: &ScanContext<'_>) -> Result<Vec<CandidateRecord>, PathError> {
    let config = scan.config;
    let mut records = Vec::new();

    for anchor in scan.select(static_selector!("a[href]:not([data-amp])")) {
        let url = dom::attr(anchor, "href").unwrap_or_default();
        let resolved = scan.domains.resolve(url);
        let mut domain = scan.target_domain(&resolved);
        let mut category = Category::from("link-google");
        let mut target = anchor;

        if config.is_script_href(url) {
            let icon_label = static_regex!("Call|Share|Save");
            let is_icon = descendants(anchor, static_selector!("div"))
                .filter_map(dom::own_string)
                .any(|s| icon_label.is_match(&s));
            if is_icon {
                continue;
            }
            domain = config.publisher_domain.clone();
            category = Category::from("link-javascript");
        } else if let Some(path) = resolved.relative_path() {
            if path == "/aclk" {
                category = Category::from("ads-google_ad_services");
            }
        } else if domain == config.ad_service_domain {
            category = Category::from("ads-google_ad_services");
        } else if domain != config.publisher_domain {
            category = Category::from("organic");
            let bare = !has_any_attr(anchor, &["data-ved", "target"])
                && descendants(anchor, static_selector!("g-img")).next().is_none();
            if bare {
                if let Some((layout, broader)) = organic_layout(scan, anchor) {
                    category = Category::from(layout);
                    target = broader;
                }
            }
            if has_class(target, "gws-twitter-link") {
                target = scan.broaden(target, 3);
                category = Category::from("organic-tweet_1");
            }
        }

        if domain == config.video_domain {
            category = category.requalify("link-youtube_", "link-youtube");
            if has_attr(target, "tabindex") {
                if let Some(inner) = descendants(target, static_selector!("div")).next() {
                    target = inner;
                }
            }
        } else if domain == config.publisher_domain {
            let escalated = is_escalated(&category);
            let base = category.clone();
            if !escalated {
                category = base.requalify("link-google_", "link-google");
            }

            let grandparent = nth_ancestor(target, 2);
            if has_attr(target, "data-merchant-id") {
                category = Category::from("ads-merchant");
            } else if url.contains("aclk?") {
                category = Category::from("ads-google_ad_services");
            } else if escalated {
                // Script and ad links keep their category and node.
            } else if let Some(tray) = grandparent.filter(|g| dom::tag(*g) == "g-tray-header") {
                if has_attr(tray, "style") {
                    target = scan.broaden(target, 2);
                    category = base.requalify("link-button_2_", "link-button_2");
                }
            } else if nth_ancestor(target, 3).is_some_and(|g| dom::tag(g) == "g-inner-card")
                && dom::tag(target) == "a"
            {
                category = base.requalify("link-google_2_", "link-google_2");
                target = scan.broaden(target, 3);
            }
        }

        records.push(scan.record_with(target, category.as_str(), &domain, Some(url))?);
    }
    Ok(records)
}

/// Accelerated mobile page anchors, broadened to the card or result they head.
pub(super) fn amp(scan: &ScanContext<'_>) -> Result<Vec<CandidateRecord>, PathError> {
    let config = scan.config;
    let min_chars = config.text_window_min_chars;
    let long_text = |el: ElementRef<'_>| has_own_text(el) && text_of(el).chars().count() > min_chars;
    let mut records = Vec::new();

    for anchor in scan.select(static_selector!("a[data-amp]")) {
        let url = dom::attr(anchor, "data-amp").unwrap_or_default();
        let domain = scan.target_domain(&scan.domains.resolve(url));
        let mut category = "amp-card";
        let mut target = anchor;

        let card = nth_ancestor(anchor, 2);
        let result = nth_ancestor(anchor, 3);
        let standalone = match (card, result) {
            (Some(card), Some(result)) => {
                !has_attr(anchor, "data-amp-st")
                    && dom::attr(result, "role") != Some("listitem")
                    && dom::attr(card, "data-hveid").map_or(true, str::is_empty)
                    && nth_ancestor(result, 3).map(dom::tag) != Some("g-card")
            }
            _ => false,
        };

        if let (true, Some(card), Some(result)) = (standalone, card, result) {
            let snippet = static_selector!("span[class]:not([role]):not([aria-level])");
            if descendants(result, snippet).any(long_text) {
                target = scan.broaden(anchor, 3);
                category = "amp-search_result_2";
            } else {
                let blocks = static_selector!(
                    "div[class]:not([role]):not([style]):not([data-ved]):not([jscontroller]):not([aria-level])"
                );
                for block in descendants(card, blocks) {
                    if !text_of(block).is_empty() {
                        target = scan.broaden(anchor, 2);
                        category = "amp-search_result_3";
                    } else if descendants(block, static_selector!("span[class]")).any(long_text) {
                        target = scan.broaden(anchor, 2);
                        category = "amp-search_result_3b";
                    }
                }
            }
        }

        let mut category = Category::from(category);
        if domain == config.publisher_domain {
            category = category.with_suffix("_google");
        }
        if has_attr(target, "data-amp-st") {
            category = Category::from("amp-visual_stories");
        }
        records.push(scan.record_with(target, category.as_str(), &domain, Some(url))?);
    }
    Ok(records)
}

/// Controls labelled "More" that expand the page or open a popup.
pub(super) fn load_more(scan: &ScanContext<'_>) -> Result<Vec<CandidateRecord>, PathError> {
    scan.select(static_selector!(r#"[aria-label*="More"]"#))
        .map(|el| {
            let target = if dom::tag(el) == "span" {
                scan.broaden(el, 1)
            } else {
                el
            };
            scan.record(target, "link-load_more")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detectors::tests::scan_page;

    fn categories(records: &[CandidateRecord]) -> Vec<(&str, &str)> {
        records
            .iter()
            .map(|r| (r.category.as_str(), r.domain.as_str()))
            .collect()
    }

    #[test]
    fn test_plain_organic_link() {
        let records = scan_page(
            "<div><a href='https://www.example.com/page' data-ved='x'>Example</a></div>",
            |scan| links(scan).unwrap(),
        );
        assert_eq!(categories(&records), vec![("organic", "example.com")]);
        assert_eq!(records[0].link.as_deref(), Some("https://www.example.com/page"));
    }

    #[test]
    fn test_organic_result_with_snippet_broadens() {
        let body = "<div class='g'><div data-ved='v'><a href='https://news.example.org/a'><h3>Title</h3></a></div>\
                    <div><div>Snippet text</div></div></div>";
        let records = scan_page(body, |scan| links(scan).unwrap());
        assert_eq!(records[0].category, "organic-search_result_1a");
        assert_eq!(records[0].tag, "div");
        assert_eq!(records[0].attributes.get("data-ved").map(String::as_str), Some("v"));
    }

    #[test]
    fn test_organic_result_2b_from_grandparent_sibling() {
        let body = "<div><div><span><a href='https://site.net/x'>T</a></span></div>\
                    <div><span>Some snippet</span></div></div>";
        let records = scan_page(body, |scan| links(scan).unwrap());
        assert_eq!(records[0].category, "organic-search_result_2b");
        assert_eq!(records[0].path.as_str(), "/html/body/div/div");
    }

    #[test]
    fn test_ad_service_targets_escalate() {
        let body = "<a href='/aclk?sa=l&ai=x'>ad</a>\
                    <a href='https://www.googleadservices.com/pagead/aclk?x'>ad</a>\
                    <a href='https://www.google.com/aclk?sa=L'>ad</a>";
        let records = scan_page(body, |scan| links(scan).unwrap());
        assert_eq!(
            categories(&records),
            vec![
                ("ads-google_ad_services", "google.com"),
                ("ads-google_ad_services", "googleadservices.com"),
                ("ads-google_ad_services", "google.com"),
            ]
        );
    }

    #[test]
    fn test_owner_targets_requalify() {
        let body = "<a href='https://www.youtube.com/watch?v=1'>v</a>\
                    <a href='/search?q=more'>more</a>\
                    <a href='https://www.google.com/shopping' data-merchant-id='9'>shop</a>";
        let records = scan_page(body, |scan| links(scan).unwrap());
        assert_eq!(
            categories(&records),
            vec![
                ("link-youtube", "youtube.com"),
                ("link-google", "google.com"),
                ("ads-merchant", "google.com"),
            ]
        );
    }

    #[test]
    fn test_video_link_takes_organic_layout() {
        let body = "<div><div><a href='https://www.youtube.com/watch?v=1'>T</a></div>\
                    <div><div>Snippet</div></div></div>";
        let records = scan_page(body, |scan| links(scan).unwrap());
        assert_eq!(
            categories(&records),
            vec![("link-youtube_search_result_1a", "youtube.com")]
        );
        assert_eq!(records[0].path.as_str(), "/html/body/div/div");
    }

    #[test]
    fn test_styled_tray_header_link_broadens() {
        let body = "<g-tray-header style='top:0'><div><a href='/search?q=t'>t</a></div></g-tray-header>";
        let records = scan_page(body, |scan| links(scan).unwrap());
        assert_eq!(categories(&records), vec![("link-button_2", "google.com")]);
        assert_eq!(records[0].tag, "g-tray-header");
    }

    #[test]
    fn test_unstyled_tray_header_ends_owner_checks() {
        let body = "<g-inner-card><g-tray-header><div><a href='/search?q=t'>t</a></div></g-tray-header></g-inner-card>";
        let records = scan_page(body, |scan| links(scan).unwrap());
        assert_eq!(categories(&records), vec![("link-google", "google.com")]);
        assert_eq!(records[0].tag, "a");
    }

    #[test]
    fn test_script_links_keep_category_and_skip_icons() {
        let body = "<a href='#'>toggle</a><a href='javascript:void(0)'><div>Share</div></a>";
        let records = scan_page(body, |scan| links(scan).unwrap());
        assert_eq!(categories(&records), vec![("link-javascript", "google.com")]);
    }

    #[test]
    fn test_inner_card_link_broadens() {
        let body = "<g-inner-card><div><div><a href='/search?q=x'>card</a></div></div></g-inner-card>";
        let records = scan_page(body, |scan| links(scan).unwrap());
        assert_eq!(records[0].category, "link-google_2");
        assert_eq!(records[0].tag, "g-inner-card");
    }

    #[test]
    fn test_tweet_link_broadens_three_levels() {
        let body = "<div id='card'><div><div><a class='gws-twitter-link' data-ved='x' \
                    href='https://twitter.com/someone'>@someone</a></div></div></div>";
        let records = scan_page(body, |scan| links(scan).unwrap());
        assert_eq!(categories(&records), vec![("organic-tweet_1", "twitter.com")]);
        assert_eq!(records[0].attributes.get("id").map(String::as_str), Some("card"));
    }

    #[test]
    fn test_amp_card_and_publisher_suffix() {
        let body = "<div role='listitem'><div><div><a data-amp='https://amp.example.com/a' \
                    href='/amp/s/a'>story</a></div></div></div>\
                    <div role='listitem'><div><div><a data-amp='/amp/local' href='/amp/local'>x</a></div></div></div>";
        let records = scan_page(body, |scan| amp(scan).unwrap());
        assert_eq!(
            categories(&records),
            vec![("amp-card", "example.com"), ("amp-card_google", "google.com")]
        );
    }

    #[test]
    fn test_amp_visual_story() {
        let body = "<div><div><div><a data-amp='https://stories.example.com/s' data-amp-st='1'>s</a></div></div></div>";
        let records = scan_page(body, |scan| amp(scan).unwrap());
        assert_eq!(records[0].category, "amp-visual_stories");
    }

    #[test]
    fn test_amp_search_result_with_long_snippet() {
        let snippet = "x".repeat(60);
        let body = format!(
            "<div><div><div><a data-amp='https://amp.example.com/a'>t</a></div></div>\
             <span class='s'>{snippet}</span></div>"
        );
        let records = scan_page(&body, |scan| amp(scan).unwrap());
        assert_eq!(records[0].category, "amp-search_result_2");
        assert_eq!(records[0].path.as_str(), "/html/body/div/div");
    }

    #[test]
    fn test_amp_inside_g_card_stays_card() {
        let snippet = "x".repeat(60);
        let body = format!(
            "<g-card><div><div><div><div><div><a data-amp='https://amp.example.com/a'>t</a></div></div>\
             <span class='s'>{snippet}</span></div></div></div></g-card>"
        );
        let records = scan_page(&body, |scan| amp(scan).unwrap());
        assert_eq!(categories(&records), vec![("amp-card", "example.com")]);
        assert_eq!(records[0].tag, "a");
    }

    #[test]
    fn test_amp_g_card_five_levels_up_is_not_a_card() {
        let snippet = "x".repeat(60);
        let body = format!(
            "<g-card><div><div><div><div><a data-amp='https://amp.example.com/a'>t</a></div></div>\
             <span class='s'>{snippet}</span></div></div></g-card>"
        );
        let records = scan_page(&body, |scan| amp(scan).unwrap());
        assert_eq!(categories(&records), vec![("amp-search_result_2", "example.com")]);
        assert_eq!(records[0].path.as_str(), "/html/body/div/g-card/div/div");
    }

    #[test]
    fn test_load_more_span_uses_parent() {
        let body = "<div><span aria-label='More results'>more</span></div><g-more-link aria-label='More'>m</g-more-link>";
        let records = scan_page(body, |scan| load_more(scan).unwrap());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].tag, "div");
        assert_eq!(records[1].tag, "g-more-link");
    }
}
