//! End-to-end tests for batch runs and corpus coverage.

use std::sync::Arc;

use serp_assay::{
    AssayConfig, AssayState, BatchAssay, CoverageAuditor, DetectorBank, InMemoryRenderer,
    PageAssay, PageJob, PageSource, RenderedRect,
};

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

const RESULT_PATH: &str = "/html/body/div/div/a";

fn result_page(id: &str, host: &str) -> PageSource {
    PageSource::new(
        id,
        format!(
            "<html><body><div id='cnt'><div><a href='https://{host}/' data-ved='v'>{host}</a></div></div></body></html>"
        ),
    )
}

fn result_layout(height: f64) -> Arc<InMemoryRenderer> {
    Arc::new(InMemoryRenderer::new().with(RESULT_PATH, RenderedRect::new(0.0, 100.0, 375.0, height)))
}

/// Five pages: two emitted, one without a results root, one warped, one
/// whose renderer fails.
fn mixed_jobs() -> Vec<PageJob<InMemoryRenderer>> {
    let mut failing = InMemoryRenderer::new();
    failing.fail_on(RESULT_PATH);

    vec![
        PageJob::new(result_page("p0", "www.example.com"), result_layout(80.0)),
        PageJob::new(
            PageSource::new("p1", "<html><body><div id='main'></div></body></html>"),
            result_layout(80.0),
        ),
        PageJob::new(result_page("p2", "news.example.org"), result_layout(900.0)),
        PageJob::new(result_page("p3", "shop.example.net"), Arc::new(failing)),
        PageJob::new(result_page("p4", "en.wikipedia.org"), result_layout(80.0)),
    ]
}

fn batch(max_concurrent_pages: usize) -> BatchAssay {
    let mut config = AssayConfig::iphone_x();
    config.max_concurrent_pages = max_concurrent_pages;
    BatchAssay::new(PageAssay::new(config).unwrap())
}

fn fixture_corpus() -> Vec<PageSource> {
    vec![
        PageSource::new(
            "controls_local_media",
            include_str!("fixtures/coverage/controls_local_media.html"),
        ),
        PageSource::new("answers", include_str!("fixtures/coverage/answers.html")),
        PageSource::new(
            "commerce_knowledge",
            include_str!("fixtures/coverage/commerce_knowledge.html"),
        ),
    ]
}

// ─────────────────────────────────────────────────────────────────────────────
// BATCH TESTS
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_batch_continues_past_rejections_and_failures() {
    let report = batch(4).run(mixed_jobs()).await.unwrap();

    let emitted: Vec<_> = report.reports.iter().map(|r| r.page_id.as_str()).collect();
    assert_eq!(emitted, vec!["p0", "p4"]);

    let summary = report.rejections.summary();
    assert_eq!(summary.get("missing results root"), Some(&1));
    assert_eq!(summary.get("warped layout"), Some(&1));
    assert_eq!(report.rejections.for_page("p2").unwrap().stage, AssayState::Attributed);

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].page_id, "p3");
}

#[tokio::test]
async fn test_batch_entries_follow_input_order() {
    let report = batch(4).run(mixed_jobs()).await.unwrap();

    let entries: Vec<_> = report
        .entries
        .iter()
        .map(|e| (e.page_id.as_str(), e.state.as_str()))
        .collect();
    assert_eq!(
        entries,
        vec![
            ("p0", "emitted"),
            ("p1", "rejected"),
            ("p2", "rejected"),
            ("p3", "failed"),
            ("p4", "emitted"),
        ]
    );
    assert_eq!(report.element_count(), 2);
    assert_eq!(report.to_json_lines().unwrap().lines().count(), 2);
}

#[tokio::test]
async fn test_output_hash_independent_of_concurrency() {
    let serial = batch(1).run(mixed_jobs()).await.unwrap();
    let parallel = batch(4).run(mixed_jobs()).await.unwrap();

    assert_ne!(serial.run_id, parallel.run_id);
    assert_eq!(serial.output_hash, parallel.output_hash);
    assert_eq!(serial.to_json_lines().unwrap(), parallel.to_json_lines().unwrap());
}

#[tokio::test]
async fn test_empty_batch() {
    let report = batch(2).run(Vec::<PageJob<InMemoryRenderer>>::new()).await.unwrap();
    assert!(report.reports.is_empty());
    assert!(report.rejections.is_empty());
    assert!(report.entries.is_empty());
    assert!(report.finished_at >= report.started_at);
}

#[tokio::test]
async fn test_domains_emitted_per_page() {
    let report = batch(2).run(mixed_jobs()).await.unwrap();
    let domains: Vec<_> = report
        .reports
        .iter()
        .flat_map(|r| r.elements.iter().map(|e| e.domain.as_str()))
        .collect();
    assert_eq!(domains, vec!["example.com", "wikipedia.org"]);
}

// ─────────────────────────────────────────────────────────────────────────────
// COVERAGE TESTS
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_every_detector_fires_on_fixture_corpus() {
    let bank = DetectorBank::standard();
    let report = CoverageAuditor::new(AssayConfig::iphone_x())
        .audit(&bank, &fixture_corpus())
        .unwrap();

    assert_eq!(report.pages, 3);
    assert_eq!(report.detectors.len(), bank.len());
    assert!(report.is_complete(), "stale detectors: {:?}", report.stale_detectors());
}

#[test]
fn test_coverage_report_follows_bank_order() {
    let bank = DetectorBank::standard();
    let report = CoverageAuditor::new(AssayConfig::iphone_x())
        .audit(&bank, &fixture_corpus())
        .unwrap();

    let names: Vec<_> = report.detectors.iter().map(|d| d.detector.as_str()).collect();
    assert_eq!(names, bank.names());
    assert_eq!(report.get("tab").unwrap().pages_hit, 1);
}
