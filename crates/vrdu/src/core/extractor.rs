//! Document-level extraction entry points.
//!
//! - [`extract_document`] - locate fields across every page of a document
//! - [`analyze_document`] - reading order and grids only, no fields
//! - [`extract_document_sync`] - blocking wrapper over [`extract_document`]
//!
//! Pages are pulled from the document's [`WordSource`](crate::geometry::WordSource)
//! one at a time. The CPU-bound page work runs on the blocking pool, and the
//! task yields between pages so a long document never starves the runtime.

use std::sync::Arc;
use std::time::Instant;

use once_cell::sync::Lazy;

use crate::core::config::VrduConfig;
use crate::core::pipeline::{FieldAggregator, PageOutcome, process_page};
use crate::fields::{FieldSpec, resolve_fields, validate_field_requests};
use crate::geometry::Document;
use crate::types::{DocumentResult, FieldRequest, PageSummary, ResultMetadata, SkippedPage};
use crate::{Result, VrduError};

/// Global Tokio runtime for the synchronous wrapper.
///
/// Runtime creation only fails when the process is out of threads or memory,
/// in which case nothing else would work either.
static GLOBAL_RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create global Tokio runtime - system may be out of resources")
});

struct DocumentRun {
    outcomes: Vec<PageOutcome>,
    skipped: Vec<SkippedPage>,
    page_count: usize,
}

/// Process every page in order, skipping pages the source cannot deliver.
async fn run_pages(document: &Document, fields: Arc<Vec<FieldSpec>>, config: Arc<VrduConfig>) -> Result<DocumentRun> {
    let page_count = document.page_count();
    let source = document.source();
    let mut run = DocumentRun {
        outcomes: Vec::with_capacity(page_count),
        skipped: Vec::new(),
        page_count,
    };

    for page in 1..=page_count {
        match source.page_words(page).await {
            Ok(words) => {
                let fields = Arc::clone(&fields);
                let config = Arc::clone(&config);
                let outcome = tokio::task::spawn_blocking(move || process_page(page, words, &fields, &config))
                    .await
                    .map_err(|e| {
                        if e.is_panic() {
                            std::panic::resume_unwind(e.into_panic());
                        }
                        VrduError::JobProcessing(format!("Page {} task was cancelled: {}", page, e))
                    })?;
                run.outcomes.push(outcome);
            }
            Err(e) => {
                tracing::warn!(page, source = source.name(), error = %e, "Skipping page");
                run.skipped.push(SkippedPage {
                    page,
                    reason: e.to_string(),
                });
            }
        }

        tokio::task::yield_now().await;
    }

    Ok(run)
}

/// Locate `fields` across all pages of `document`.
///
/// Pages the geometry source fails on are skipped and listed in
/// `metadata.skipped_pages`. Every requested field appears in the result,
/// found or not.
///
/// # Errors
///
/// - `VrduError::Validation` for an invalid configuration or an empty, blank
///   or duplicated field list
/// - `VrduError::GeometrySource` when the document has pages but none of them
///   could be read
///
/// # Example
///
/// ```rust
/// use vrdu::core::config::VrduConfig;
/// use vrdu::core::extractor::extract_document;
/// use vrdu::geometry::Document;
/// use vrdu::WordBox;
///
/// # async fn example() -> vrdu::Result<()> {
/// let document = Document::from_pages(vec![vec![
///     WordBox::new("Total", 0.96, 0.0, 0.0, 40.0, 10.0),
///     WordBox::new("$45.00", 0.91, 80.0, 0.0, 48.0, 10.0),
/// ]]);
/// let result = extract_document(document, vec!["Total".into()], &VrduConfig::default()).await?;
/// assert_eq!(result.fields["Total"].value.as_deref(), Some("$45.00"));
/// # Ok(())
/// # }
/// ```
#[tracing::instrument(skip_all, fields(document = document.name().unwrap_or("<unnamed>"), pages = document.page_count()))]
pub async fn extract_document(
    document: Document,
    fields: Vec<FieldRequest>,
    config: &VrduConfig,
) -> Result<DocumentResult> {
    config.validate()?;
    let requests = validate_field_requests(fields)?;
    let specs = Arc::new(resolve_fields(&requests, config));
    let started = Instant::now();

    let run = run_pages(&document, Arc::clone(&specs), Arc::new(config.clone())).await?;

    if run.page_count > 0 && run.outcomes.is_empty() {
        let last = run.skipped.last().map(|s| s.reason.clone()).unwrap_or_default();
        return Err(VrduError::geometry_source(
            run.page_count,
            format!("all {} pages failed; last error: {}", run.page_count, last),
        ));
    }

    let mut aggregator = FieldAggregator::new(&specs, config.jobs.aggregation);
    let mut pages = Vec::with_capacity(run.outcomes.len());
    for outcome in run.outcomes {
        aggregator.absorb(outcome.fields);
        pages.push(outcome.summary);
    }

    let result = DocumentResult {
        fields: aggregator.finish(),
        metadata: ResultMetadata {
            page_count: run.page_count,
            pages_processed: pages.len(),
            skipped_pages: run.skipped,
            aggregation: config.jobs.aggregation,
            elapsed_ms: started.elapsed().as_millis() as u64,
        },
        pages,
    };

    tracing::debug!(
        found = result.fields.values().filter(|f| f.found).count(),
        requested = result.fields.len(),
        "Document extraction finished"
    );

    Ok(result)
}

/// Reading order and page grids for every page, without field extraction.
///
/// # Errors
///
/// Returns `VrduError::Validation` for an invalid configuration and
/// `VrduError::GeometrySource` when no page could be read.
pub async fn analyze_document(document: Document, config: &VrduConfig) -> Result<Vec<PageSummary>> {
    config.validate()?;
    let run = run_pages(&document, Arc::new(Vec::new()), Arc::new(config.clone())).await?;

    if run.page_count > 0 && run.outcomes.is_empty() {
        return Err(VrduError::geometry_source(run.page_count, "no page could be read"));
    }

    Ok(run.outcomes.into_iter().map(|outcome| outcome.summary).collect())
}

/// Synchronous wrapper for [`extract_document`] on a shared global runtime.
pub fn extract_document_sync(
    document: Document,
    fields: Vec<FieldRequest>,
    config: &VrduConfig,
) -> Result<DocumentResult> {
    GLOBAL_RUNTIME.block_on(extract_document(document, fields, config))
}
