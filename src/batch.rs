//! Batch assay across many pages.
//!
//! Pages are independent: each runs in its own task, bounded by
//! `max_concurrent_pages`. A rejected page or a failed renderer never stops
//! the batch. Results come back in input order regardless of completion
//! order.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};
use uuid::Uuid;

use crate::assay::{AssayError, AssayReport, PageAssay, PageOutcome, PageSource};
use crate::canonical::canonical_hash_hex;
use crate::render::Renderer;
use crate::types::{AssayState, RejectionLog};

/// Error type for batch execution itself.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    /// Concurrency limiter closed.
    #[error("Worker limiter closed: {0}")]
    Limiter(String),
    /// A page task panicked or was cancelled.
    #[error("Page task failed: {0}")]
    Task(String),
}

/// One page and the renderer holding its layout.
pub struct PageJob<R: ?Sized> {
    /// Page source.
    pub source: PageSource,
    /// Renderer for this page.
    pub renderer: Arc<R>,
}

impl<R: ?Sized> PageJob<R> {
    /// Create a job.
    pub fn new(source: PageSource, renderer: Arc<R>) -> Self {
        Self { source, renderer }
    }
}

/// A page that ended in an error rather than an outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFailure {
    /// Page identifier.
    pub page_id: String,
    /// Error message.
    pub error: String,
}

/// Per-page line of the batch registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEntry {
    /// Page identifier.
    pub page_id: String,
    /// Terminal state, or `failed`.
    pub state: String,
    /// Elements emitted.
    pub elements: usize,
    /// Page content digest, when emitted.
    pub content_digest: Option<String>,
}

/// Result of a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    /// Run identifier.
    pub run_id: Uuid,
    /// Run start.
    pub started_at: DateTime<Utc>,
    /// Run end.
    pub finished_at: DateTime<Utc>,
    /// Hash of the configuration in effect.
    pub config_hash: String,
    /// Emitted pages, in input order.
    pub reports: Vec<AssayReport>,
    /// Rejected pages, in input order.
    pub rejections: RejectionLog,
    /// Pages that failed with an error, in input order.
    pub failures: Vec<PageFailure>,
    /// One entry per input page, in input order.
    pub entries: Vec<BatchEntry>,
    /// Hash over entries and emitted elements; independent of run id and timing.
    pub output_hash: String,
}

impl BatchReport {
    /// All emitted elements as JSON lines, pages in input order.
    pub fn to_json_lines(&self) -> Result<String, serde_json::Error> {
        let mut out = String::new();
        for report in &self.reports {
            out.push_str(&report.to_json_lines()?);
        }
        Ok(out)
    }

    /// Total emitted elements.
    pub fn element_count(&self) -> usize {
        self.reports.iter().map(|r| r.elements.len()).sum()
    }
}

/// Runs a [`PageAssay`] over many pages concurrently.
pub struct BatchAssay {
    assay: Arc<PageAssay>,
    limiter: Arc<Semaphore>,
}

impl BatchAssay {
    /// Batch runner with the engine's configured concurrency.
    pub fn new(assay: PageAssay) -> Self {
        let permits = assay.config().max_concurrent_pages.max(1);
        Self {
            assay: Arc::new(assay),
            limiter: Arc::new(Semaphore::new(permits)),
        }
    }

    /// Engine in use.
    pub fn assay(&self) -> &PageAssay {
        &self.assay
    }

    /// Assay every job.
    pub async fn run<R>(&self, jobs: Vec<PageJob<R>>) -> Result<BatchReport, BatchError>
    where
        R: Renderer + ?Sized + 'static,
    {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let total = jobs.len();
        info!(%run_id, pages = total, "batch started");

        let mut tasks = JoinSet::new();
        for (index, job) in jobs.into_iter().enumerate() {
            let permit = self
                .limiter
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| BatchError::Limiter(e.to_string()))?;
            let assay = Arc::clone(&self.assay);
            tasks.spawn(async move {
                let _permit = permit;
                let outcome = assay
                    .classify_and_attribute(&job.source, job.renderer.as_ref())
                    .await;
                (index, job.source.page_id, outcome)
            });
        }

        let mut slots: Vec<Option<(String, Result<PageOutcome, AssayError>)>> =
            (0..total).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            let (index, page_id, outcome) = joined.map_err(|e| BatchError::Task(e.to_string()))?;
            slots[index] = Some((page_id, outcome));
        }

        let mut reports = Vec::new();
        let mut rejections = RejectionLog::new();
        let mut failures = Vec::new();
        let mut entries = Vec::with_capacity(total);

        for (page_id, outcome) in slots.into_iter().flatten() {
            match outcome {
                Ok(PageOutcome::Emitted(report)) => {
                    entries.push(BatchEntry {
                        page_id,
                        state: AssayState::Emitted.to_string(),
                        elements: report.elements.len(),
                        content_digest: Some(report.provenance.content_digest.clone()),
                    });
                    reports.push(report);
                }
                Ok(PageOutcome::Rejected(rejection)) => {
                    entries.push(BatchEntry {
                        page_id,
                        state: AssayState::Rejected.to_string(),
                        elements: 0,
                        content_digest: None,
                    });
                    rejections.record(rejection);
                }
                Err(e) => {
                    warn!(page_id = %page_id, error = %e, "page failed");
                    entries.push(BatchEntry {
                        page_id: page_id.clone(),
                        state: "failed".to_string(),
                        elements: 0,
                        content_digest: None,
                    });
                    failures.push(PageFailure {
                        page_id,
                        error: e.to_string(),
                    });
                }
            }
        }

        let elements: Vec<_> = reports.iter().flat_map(|r| r.elements.iter()).collect();
        let output_hash = canonical_hash_hex(&(&entries, &elements));
        let finished_at = Utc::now();

        info!(
            %run_id,
            emitted = reports.len(),
            rejected = rejections.len(),
            failed = failures.len(),
            %output_hash,
            "batch finished"
        );

        Ok(BatchReport {
            run_id,
            started_at,
            finished_at,
            config_hash: self.assay.config_hash().to_string(),
            reports,
            rejections,
            failures,
            entries,
            output_hash,
        })
    }
}
