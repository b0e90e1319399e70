//! Batch orchestration: prompt once, extract every document, keep order.
//!
//! Documents are extracted concurrently (up to
//! [`ExtractionConfig::concurrency`](crate::config::ExtractionConfig) at a
//! time) through `futures::StreamExt::buffered`, which yields results in
//! input order. A failing document produces an empty field map at its own
//! position; it never aborts the batch. Only report generation can fail a
//! batch as a whole.

use crate::batch::{Batch, BatchStatus};
use crate::document::Document;
use crate::error::VisionParseError;
use crate::output::{BatchOutput, BatchStats, DocumentResult, ExtractionResult};
use crate::pipeline::extract::ExtractionClient;
use crate::pipeline::postprocess::parse_fields;
use crate::prompts::build_prompt;
use crate::report::{self, ReportArtifact};
use futures::stream::{self, StreamExt};
use std::time::Instant;
use tracing::{error, info, warn};

/// Extraction output plus the generated report for one batch run.
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub output: BatchOutput,
    pub artifact: ReportArtifact,
}

/// Extract every document with a shared prompt.
///
/// Returns exactly one field map per document, in document order; failed
/// documents yield an empty map.
pub async fn process_batch(
    client: &ExtractionClient,
    documents: &[Document],
    field_names: &[String],
    strict: bool,
) -> Vec<ExtractionResult> {
    process_batch_detailed(client, documents, field_names, strict)
        .await
        .into_results()
}

/// [`process_batch`] keeping per-document errors, timings and stats.
pub async fn process_batch_detailed(
    client: &ExtractionClient,
    documents: &[Document],
    field_names: &[String],
    strict: bool,
) -> BatchOutput {
    let start = Instant::now();
    let total = documents.len();
    let prompt = build_prompt(field_names, strict);
    let config = client.config();

    info!(
        "Processing batch of {} documents ({} fields, strict={}, concurrency={})",
        total,
        field_names.len(),
        strict,
        config.concurrency
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_start(total);
    }

    let prompt = prompt.as_str();
    let documents: Vec<DocumentResult> = stream::iter(
        documents
            .iter()
            .enumerate()
            .map(|(index, doc)| process_document(client, index, total, doc, prompt)),
    )
    .buffered(config.concurrency)
    .collect()
    .await;

    let succeeded = documents.iter().filter(|d| d.is_success()).count();
    let empty = documents
        .iter()
        .filter(|d| d.is_success() && d.fields.is_empty())
        .count();
    let stats = BatchStats {
        total_documents: total,
        succeeded,
        failed: total - succeeded,
        empty,
        total_duration_ms: start.elapsed().as_millis() as u64,
    };

    info!(
        "Batch complete: {}/{} documents extracted, {}ms",
        succeeded, total, stats.total_duration_ms
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_batch_complete(total, succeeded);
    }

    BatchOutput { documents, stats }
}

/// Extract and parse one document. Never fails; errors land in the result.
pub(crate) async fn process_document(
    client: &ExtractionClient,
    index: usize,
    total: usize,
    document: &Document,
    prompt: &str,
) -> DocumentResult {
    let start = Instant::now();
    let cb = client.config().progress_callback.as_ref();
    if let Some(cb) = cb {
        cb.on_document_start(index, total, document.filename());
    }

    let (outcome, retries) = client
        .extract_with_retries(document.bytes(), document.mime_type(), prompt)
        .await;
    let parsed = outcome.and_then(|text| parse_fields(&text));
    let duration_ms = start.elapsed().as_millis() as u64;

    match parsed {
        Ok(fields) => {
            if let Some(cb) = cb {
                cb.on_document_complete(index, total, fields.len());
            }
            DocumentResult {
                index,
                filename: document.filename().to_string(),
                fields,
                duration_ms,
                retries,
                error: None,
            }
        }
        Err(e) => {
            warn!("Document {} ('{}'): {}", index + 1, document.filename(), e);
            if let Some(cb) = cb {
                cb.on_document_error(index, total, &e.to_string());
            }
            DocumentResult {
                index,
                filename: document.filename().to_string(),
                fields: ExtractionResult::new(),
                duration_ms,
                retries,
                error: Some(e),
            }
        }
    }
}

/// Run a batch end to end and record its status.
///
/// `Pending → Processing`, extract, render the report in the batch's format,
/// then `Completed`. If the report cannot be produced the batch ends
/// `Failed` and the error is returned.
pub async fn run_batch(
    client: &ExtractionClient,
    batch: &mut Batch,
) -> Result<BatchReport, VisionParseError> {
    batch.transition(BatchStatus::Processing)?;
    info!("Batch {}: processing {} documents", batch.id, batch.len());

    let output = process_batch_detailed(
        client,
        &batch.documents,
        &batch.options.fields,
        batch.options.strict,
    )
    .await;

    match report::generate(&output.results(), batch.options.format, &batch.id) {
        Ok(artifact) => {
            batch.transition(BatchStatus::Completed)?;
            info!("Batch {}: completed → {}", batch.id, artifact.filename);
            Ok(BatchReport { output, artifact })
        }
        Err(e) => {
            batch.transition(BatchStatus::Failed)?;
            error!("Batch {}: failed: {}", batch.id, e);
            Err(e)
        }
    }
}

/// Synchronous wrapper around [`run_batch`].
///
/// Creates a temporary tokio runtime internally; do not call from within one.
pub fn run_batch_sync(
    client: &ExtractionClient,
    batch: &mut Batch,
) -> Result<BatchReport, VisionParseError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| VisionParseError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(run_batch(client, batch))
}
