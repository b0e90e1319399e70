//! # visionparse
//!
//! Batch-extract invoice fields from PDFs and images with a vision LLM, and
//! compile the results into a downloadable report.
//!
//! ## Pipeline Overview
//!
//! ```text
//! documents + options
//!  │
//!  ├─ 1. Prompt   field names + strict flag → one instruction per batch
//!  ├─ 2. Encode   file bytes → base64 inline_data request
//!  ├─ 3. Extract  concurrent generateContent calls, timeout + retry
//!  ├─ 4. Clean    unfence ```json blocks, parse one JSON object per file
//!  └─ 5. Report   csv / json / xlsx / pdf / xml artifact
//! ```
//!
//! A document that fails at any step contributes an empty field map at its
//! own position, so `results.len() == documents.len()` always holds.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use visionparse::{run_batch, Batch, BatchOptions, Document, ExtractionClient, ExtractionConfig, ReportFormat};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ExtractionClient::new(ExtractionConfig::from_env()?)?;
//!     let docs = vec![Document::from_path("invoice.pdf").await?];
//!     let options = BatchOptions::new(vec!["invoice_number".into(), "total".into()], true, ReportFormat::Csv);
//!     let mut batch = Batch::new(docs, options);
//!
//!     let report = run_batch(&client, &mut batch).await?;
//!     println!("{} → {} bytes", report.artifact.filename, report.artifact.bytes.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `visionparse` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod document;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod process;
pub mod progress;
pub mod prompts;
pub mod report;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{Batch, BatchOptions, BatchStatus, ReportFormat};
pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use document::{Document, FileCategory};
pub use error::{DocumentError, VisionParseError};
pub use output::{BatchOutput, BatchStats, DocumentResult, ExtractionResult};
pub use pipeline::extract::{ExtractionClient, GeminiBackend, VisionBackend};
pub use process::{process_batch, process_batch_detailed, run_batch, run_batch_sync, BatchReport};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use prompts::build_prompt;
pub use report::{generate, generate_from_token, ReportArtifact};
pub use stream::process_stream;
