//! SERP Assay Binary
//!
//! Runs the assay over a directory of captured pages and writes every
//! emitted element as one JSON line.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `SERP_ASSAY_INPUT`: directory of `*.html` captures, each with a sibling
//!   `<stem>.layout.json` snapshot (required)
//! - `SERP_ASSAY_OUTPUT`: JSON-lines output path (default: `elements.jsonl`)
//! - `SERP_ASSAY_CONFIG`: JSON config file (default: iPhone X preset)
//! - `RUST_LOG`: Log level filter (default: serp_assay=info)
//! - `LOG_FORMAT`: "json" for structured logs, "pretty" for development (default: json)
//!
//! ## Usage
//!
//! ```bash
//! SERP_ASSAY_INPUT=captures/ SERP_ASSAY_OUTPUT=out.jsonl cargo run --bin serp_assay
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use serp_assay::{AssayConfig, BatchAssay, InMemoryRenderer, PageAssay, PageJob, PageSource};

const LAYOUT_SUFFIX: &str = ".layout.json";

/// Initialize the tracing subscriber with JSON or pretty format
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "serp_assay=info".into());

    if log_format == "pretty" {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_span_events(FmtSpan::CLOSE))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .flatten_event(true),
            )
            .init();
    }
}

fn load_config() -> Result<AssayConfig, Box<dyn std::error::Error>> {
    match std::env::var("SERP_ASSAY_CONFIG") {
        Ok(path) if !path.is_empty() => {
            let raw = std::fs::read_to_string(&path)?;
            let config = AssayConfig::from_json_str(&raw)?;
            info!(path = %path, config_hash = %config.config_hash(), "config loaded");
            Ok(config)
        }
        _ => Ok(AssayConfig::iphone_x()),
    }
}

/// Pair every `*.html` capture with its layout snapshot, sorted by file name.
fn load_jobs(dir: &Path) -> Result<Vec<PageJob<InMemoryRenderer>>, Box<dyn std::error::Error>> {
    let mut pages: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "html"))
        .collect();
    pages.sort();

    let mut jobs = Vec::with_capacity(pages.len());
    for page in pages {
        let Some(stem) = page.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let layout_path = dir.join(format!("{stem}{LAYOUT_SUFFIX}"));
        let renderer = match std::fs::read_to_string(&layout_path) {
            Ok(raw) => InMemoryRenderer::from_json_str(&raw)?,
            Err(e) => {
                warn!(page_id = stem, error = %e, "no layout snapshot, page will not attribute");
                InMemoryRenderer::new()
            }
        };
        let html = std::fs::read_to_string(&page)?;
        jobs.push(PageJob::new(PageSource::new(stem, html), Arc::new(renderer)));
    }
    Ok(jobs)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let version = env!("CARGO_PKG_VERSION");
    info!(version = version, "Starting SERP assay");

    let input = std::env::var("SERP_ASSAY_INPUT").map_err(|_| "SERP_ASSAY_INPUT not set")?;
    let output = std::env::var("SERP_ASSAY_OUTPUT").unwrap_or_else(|_| "elements.jsonl".to_string());

    let config = load_config()?;
    let jobs = load_jobs(Path::new(&input))?;
    info!(input = %input, pages = jobs.len(), "captures loaded");

    let start = Instant::now();
    let batch = BatchAssay::new(PageAssay::new(config)?);
    let report = batch.run(jobs).await?;

    std::fs::write(&output, report.to_json_lines()?)?;

    for (reason, count) in report.rejections.summary() {
        warn!(reason = reason, pages = count, "pages rejected");
    }
    for failure in &report.failures {
        warn!(page_id = %failure.page_id, error = %failure.error, "page failed");
    }

    info!(
        run_id = %report.run_id,
        output = %output,
        pages = report.entries.len(),
        elements = report.element_count(),
        output_hash = %report.output_hash,
        latency_ms = start.elapsed().as_millis() as u64,
        "SERP assay complete"
    );

    Ok(())
}
