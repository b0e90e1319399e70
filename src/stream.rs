//! Streaming batch API: emit document results as they complete.
//!
//! Unlike [`crate::process::process_batch`], which returns once every
//! document is done, [`process_stream`] yields each [`DocumentResult`] as
//! soon as its extraction finishes. Items arrive in completion order; sort
//! by [`DocumentResult::index`] if document order matters. Useful for a web
//! layer that pushes per-document status to the browser.

use crate::document::Document;
use crate::output::DocumentResult;
use crate::pipeline::extract::ExtractionClient;
use crate::process::process_document;
use crate::prompts::build_prompt;
use futures::stream::{self, StreamExt};
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;
use tracing::info;

/// A boxed stream of per-document results.
pub type DocumentStream = Pin<Box<dyn Stream<Item = DocumentResult> + Send>>;

/// Extract `documents`, streaming results in completion order.
///
/// The stream yields exactly one item per document.
pub fn process_stream(
    client: ExtractionClient,
    documents: Vec<Document>,
    field_names: &[String],
    strict: bool,
) -> DocumentStream {
    let total = documents.len();
    let concurrency = client.config().concurrency;
    let prompt: Arc<str> = Arc::from(build_prompt(field_names, strict));
    info!("Starting streaming extraction of {} documents", total);

    let s = stream::iter(documents.into_iter().enumerate().map(move |(index, doc)| {
        let client = client.clone();
        let prompt = Arc::clone(&prompt);
        async move { process_document(&client, index, total, &doc, &prompt).await }
    }))
    .buffer_unordered(concurrency);

    Box::pin(s)
}
