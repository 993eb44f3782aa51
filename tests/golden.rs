//! Golden tests for the SERP assay.
//!
//! These tests verify determinism and correctness of the full page pipeline.

use std::collections::BTreeMap;

use serp_assay::attribution::{clip, clipped_area, Bounds};
use serp_assay::types::resolve;
use serp_assay::{
    AssayConfig, InMemoryRenderer, PageAssay, PageOutcome, PageSource, PageTree,
    RejectionReason, RenderedRect, StructuralPath,
};

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

const AD_BLOCK: &str = "/html/body/div/div[1]/div[2]";
const NESTED_ORGANIC: &str = "/html/body/div/div[1]/div[2]/div[2]/a";
const WIKI_RESULT: &str = "/html/body/div/div[2]/div/a";
const TAB: &str = "/html/body/div/div[3]/div";

/// Results page with an ad block holding its own organic-looking anchor,
/// one organic result and a tab control.
fn golden_page() -> PageSource {
    PageSource::new(
        "golden-1",
        r#"<html><head><title>shoes</title></head><body>
        <div id="cnt">
          <div>
            <div><span>Sponsored</span></div>
            <div>
              <div><div><div><div><div><div aria-label="Why these ads?">i</div></div></div></div></div></div>
              <div><a href="https://shop.example.com/deal">Deal on shoes</a></div>
            </div>
          </div>
          <div>
            <div><a href="https://en.wikipedia.org/wiki/Shoe" data-ved="0ah">Shoe - Wikipedia</a></div>
          </div>
          <div>
            <div role="tab">Images</div>
          </div>
          <div id="sfooter"><a href="https://support.example.org/help">Help</a></div>
        </div>
        </body></html>"#,
    )
}

fn golden_layout(wiki_height: f64) -> InMemoryRenderer {
    InMemoryRenderer::new()
        .with(AD_BLOCK, RenderedRect::new(0.0, 0.0, 375.0, 300.0))
        .with(NESTED_ORGANIC, RenderedRect::new(10.0, 200.0, 200.0, 20.0))
        .with(TAB, RenderedRect::new(0.0, 300.0, 80.0, 40.0))
        .with(WIKI_RESULT, RenderedRect::new(0.0, 900.0, 375.0, wiki_height))
}

fn assay() -> PageAssay {
    PageAssay::new(AssayConfig::iphone_x()).unwrap()
}

async fn emitted_lines(engine: &PageAssay) -> String {
    match engine
        .classify_and_attribute(&golden_page(), &golden_layout(60.0))
        .await
        .unwrap()
    {
        PageOutcome::Emitted(report) => report.to_json_lines().unwrap(),
        PageOutcome::Rejected(rejection) => panic!("golden page rejected: {}", rejection.reason),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// DETERMINISM TESTS
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_same_page_same_output_100_runs() {
    let engine = assay();
    let first = emitted_lines(&engine).await;

    for i in 1..100 {
        let run = emitted_lines(&engine).await;
        assert_eq!(first, run, "Output must be deterministic (run {} differs from run 0)", i);
    }
}

#[tokio::test]
async fn test_fresh_engines_agree() {
    let a = emitted_lines(&assay()).await;
    let b = emitted_lines(&assay()).await;
    assert_eq!(a, b);
}

#[test]
fn test_path_resolution_is_stable_across_parses() {
    let page = golden_page();
    let paths = |source: &str| -> Vec<StructuralPath> {
        let tree = PageTree::parse(source);
        tree.root()
            .descendants()
            .filter_map(scraper::ElementRef::wrap)
            .map(|el| resolve(el).unwrap())
            .collect()
    };

    let first = paths(&page.html);
    let second = paths(&page.html);
    assert_eq!(first, second);

    let mut distinct = first.clone();
    distinct.sort();
    distinct.dedup();
    assert_eq!(distinct.len(), first.len(), "distinct nodes must have distinct paths");
}

#[test]
fn test_config_change_changes_config_hash() {
    let base = AssayConfig::iphone_x();
    let mut taller = AssayConfig::iphone_x();
    taller.warped_height_px = 900.0;

    assert_eq!(base.config_hash(), AssayConfig::iphone_x().config_hash());
    assert_ne!(base.config_hash(), taller.config_hash());
}

// ─────────────────────────────────────────────────────────────────────────────
// CORRECTNESS TESTS
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ad_block_kept_nested_organic_removed() {
    let outcome = assay()
        .classify_and_attribute(&golden_page(), &golden_layout(60.0))
        .await
        .unwrap();
    let report = outcome.report().expect("golden page emits");

    let by_path: BTreeMap<&str, &str> = report
        .elements
        .iter()
        .map(|e| (e.xpath.as_str(), e.category.as_str()))
        .collect();

    assert_eq!(by_path.get(AD_BLOCK), Some(&"ads-general"));
    assert_eq!(by_path.get(WIKI_RESULT), Some(&"organic"));
    assert_eq!(by_path.get(TAB), Some(&"link-knowledge_panel_tab"));
    assert!(!by_path.contains_key(NESTED_ORGANIC));
    assert!(
        by_path.keys().all(|p| !p.starts_with("/html/body/div/div[4]")),
        "footer must be excluded"
    );
    assert_eq!(report.elements.len(), 3);
}

#[tokio::test]
async fn test_no_overlap_within_a_partition() {
    let config = AssayConfig::iphone_x();
    let outcome = assay()
        .classify_and_attribute(&golden_page(), &golden_layout(60.0))
        .await
        .unwrap();
    let elements = &outcome.report().unwrap().elements;

    for a in elements {
        for b in elements {
            if a.xpath == b.xpath {
                continue;
            }
            let same_partition = config.is_owner_domain(&a.domain) == config.is_owner_domain(&b.domain);
            assert!(
                !(same_partition && a.xpath.is_ancestor_of(&b.xpath)),
                "{} contains {}",
                a.xpath,
                b.xpath
            );
        }
    }
}

#[tokio::test]
async fn test_below_fold_element_has_page_area_only() {
    let outcome = assay()
        .classify_and_attribute(&golden_page(), &golden_layout(60.0))
        .await
        .unwrap();
    let wiki = outcome
        .report()
        .unwrap()
        .elements
        .iter()
        .find(|e| e.xpath.as_str() == WIKI_RESULT)
        .unwrap();

    assert_eq!(wiki.area, 0.0);
    assert_eq!(wiki.area_page, 375.0 * 60.0);
    assert_eq!(wiki.domain, "wikipedia.org");
    assert_eq!(wiki.source_page_id, "golden-1");
}

#[tokio::test]
async fn test_warped_layout_rejects_page() {
    let outcome = assay()
        .classify_and_attribute(&golden_page(), &golden_layout(700.0))
        .await
        .unwrap();

    let rejection = outcome.rejection().expect("warped page must be rejected");
    match &rejection.reason {
        RejectionReason::WarpedLayout { path, height, threshold } => {
            assert_eq!(path.as_str(), WIKI_RESULT);
            assert_eq!(*height, 700.0);
            assert_eq!(*threshold, 700.0);
        }
        other => panic!("unexpected reason {other:?}"),
    }
}

#[tokio::test]
async fn test_just_below_warp_threshold_emits() {
    let outcome = assay()
        .classify_and_attribute(&golden_page(), &golden_layout(699.0))
        .await
        .unwrap();
    assert!(outcome.report().is_some());
}

#[test]
fn test_clipping_left_overflow() {
    let rect = RenderedRect::new(-10.0, 5.0, 50.0, 20.0);
    let clipped = clip(&rect, Bounds::new(100.0, 100.0));

    assert_eq!(clipped.tl_x, 0.0);
    assert_eq!(clipped.tr_x, 40.0);
    assert_eq!(clipped_area(&rect, Bounds::new(100.0, 100.0)), 40.0 * 20.0);
}

// ─────────────────────────────────────────────────────────────────────────────
// OUTPUT CONTRACT TESTS
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_json_line_field_names() {
    let lines = emitted_lines(&assay()).await;
    let first = lines.lines().next().unwrap();
    let value: serde_json::Value = serde_json::from_str(first).unwrap();
    let object = value.as_object().unwrap();

    for key in [
        "xpath",
        "category",
        "domain",
        "text",
        "tag",
        "attributes",
        "dimensions",
        "location",
        "area",
        "area_page",
        "source_page_id",
    ] {
        assert!(object.contains_key(key), "missing {key}");
    }
    assert!(value["dimensions"]["width"].is_number());
    assert!(value["location"]["y"].is_number());
}

#[tokio::test]
async fn test_provenance_carries_digest_and_config() {
    let engine = assay();
    let outcome = engine
        .classify_and_attribute(&golden_page(), &golden_layout(60.0))
        .await
        .unwrap();
    let provenance = &outcome.report().unwrap().provenance;

    assert_eq!(provenance.source_page_id, "golden-1");
    assert_eq!(provenance.content_digest, serp_assay::content_digest(&golden_page().html));
    assert_eq!(provenance.config_hash, engine.config_hash());
    assert!(provenance.detectors.contains(&"ads_general".to_string()));
    assert!(provenance.detectors.contains(&"links".to_string()));
}
