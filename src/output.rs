//! Result types produced by the batch orchestrator.

use crate::error::DocumentError;
use serde::{Deserialize, Serialize};

/// Extracted fields for one document, in the order the model emitted them.
///
/// Key order matters: the first result's keys become the report columns.
pub type ExtractionResult = serde_json::Map<String, serde_json::Value>;

/// Outcome of extracting one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentResult {
    /// 0-based position of the document in its batch.
    pub index: usize,
    pub filename: String,
    /// Parsed fields; empty when `error` is set.
    pub fields: ExtractionResult,
    pub duration_ms: u64,
    pub retries: u8,
    pub error: Option<DocumentError>,
}

impl DocumentResult {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Aggregate counters for a processed batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchStats {
    pub total_documents: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Successful documents whose model answer was `{}`.
    pub empty: usize,
    pub total_duration_ms: u64,
}

/// Everything the orchestrator learned about a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutput {
    /// One entry per input document, in input order.
    pub documents: Vec<DocumentResult>,
    pub stats: BatchStats,
}

impl BatchOutput {
    /// The plain field maps, positionally aligned with the input documents.
    pub fn results(&self) -> Vec<ExtractionResult> {
        self.documents.iter().map(|d| d.fields.clone()).collect()
    }

    pub fn into_results(self) -> Vec<ExtractionResult> {
        self.documents.into_iter().map(|d| d.fields).collect()
    }

    pub fn errors(&self) -> impl Iterator<Item = (usize, &DocumentError)> {
        self.documents
            .iter()
            .filter_map(|d| d.error.as_ref().map(|e| (d.index, e)))
    }
}
