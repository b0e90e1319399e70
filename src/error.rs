//! Error types for the visionparse library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`VisionParseError`] — **Fatal**: the batch cannot produce an artifact
//!   (unknown report format, report writer failed, client misconfigured).
//!   Returned as `Err(VisionParseError)` from the top-level entry points.
//!
//! * [`DocumentError`] — **Non-fatal**: a single document failed (transport
//!   error, non-200 status, unparseable model output) but every other
//!   document in the batch is fine. Stored inside
//!   [`crate::output::DocumentResult`] next to an empty field map, so a bad
//!   document degrades its own row instead of the whole report.

use crate::batch::BatchStatus;
use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the visionparse library.
///
/// Document-level failures use [`DocumentError`] and are stored in
/// [`crate::output::DocumentResult`] rather than propagated here.
#[derive(Debug, Error)]
pub enum VisionParseError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// MIME type is not accepted by the vision API.
    #[error(
        "Unsupported file type for extraction: {mime_type}. Supported types: {}",
        crate::document::SUPPORTED_MIME_TYPES.join(", ")
    )]
    UnsupportedFileType { mime_type: String },

    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    // ── Report errors ─────────────────────────────────────────────────────
    /// The requested report format token is not one of csv/json/xlsx/pdf/xml.
    #[error("Unsupported report format '{format}'. Supported formats: csv, json, xlsx, pdf, xml")]
    UnsupportedFormat { format: String },

    /// The report writer for a supported format failed.
    #[error("Failed to generate {format} report: {detail}")]
    ReportFailed { format: String, detail: String },

    // ── Batch errors ──────────────────────────────────────────────────────
    /// A batch status change that the lifecycle does not allow.
    #[error("Batch cannot move from {from} to {to}")]
    InvalidStatusTransition { from: BatchStatus, to: BatchStatus },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// No API key was supplied and none was found in the environment.
    #[error("No API key configured.\nSet GEMINI_API_KEY or pass --api-key.")]
    MissingApiKey,

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Artifact filename is not a single path component.
    #[error("Refusing to write '{filename}': report filename must not contain path separators or '..'")]
    InvalidFilename { filename: String },

    /// Could not create or write the report file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single document.
///
/// The batch continues with an empty field map for the affected document.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum DocumentError {
    /// MIME type not in the allow-list; no request was sent.
    #[error("unsupported file type: {mime_type}")]
    UnsupportedFileType { mime_type: String },

    /// The request never produced an HTTP response.
    #[error("transport error: {detail}")]
    Transport { detail: String },

    /// The API answered with a non-200 status.
    #[error("API returned HTTP {status}: {detail}")]
    HttpStatus { status: u16, detail: String },

    /// HTTP 200, but the body lacks `candidates[0].content.parts[0].text`.
    #[error("malformed API response: {detail}")]
    MalformedResponse { detail: String },

    /// The request exceeded the configured per-call timeout.
    #[error("API call timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The model's answer was not a JSON object.
    #[error("model output is not a JSON object: {detail}")]
    InvalidJson { detail: String },
}

impl DocumentError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Transport errors, timeouts, 429 and 5xx are retried; everything else
    /// (bad key, bad request, unusable body) fails immediately.
    pub fn is_retryable(&self) -> bool {
        match self {
            DocumentError::Transport { .. } | DocumentError::Timeout { .. } => true,
            DocumentError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
