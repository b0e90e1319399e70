//! Report generation: ordered extraction results → downloadable artifact.
//!
//! ## Formats
//!
//! | Format | Writer | Notes |
//! |--------|--------|-------|
//! | csv  | `csv` | first result's keys are the header row |
//! | json | `serde_json` | full list, 2-space indent |
//! | xlsx | `rust_xlsxwriter` | csv layout on sheet "Invoices", text cut to 32 767 chars |
//! | pdf  | `lopdf` | fixed-width text, cells cut to 30 chars |
//! | xml  | `quick-xml` | legacy `<batch>/<document>/<field>` layout |
//!
//! The tabular formats share one column policy, documented in [`table`].

mod delimited;
mod json;
mod pdf;
mod spreadsheet;
pub mod table;
mod xml;

use crate::batch::ReportFormat;
use crate::error::VisionParseError;
use crate::output::ExtractionResult;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

pub use pdf::MAX_CELL_CHARS;
pub use spreadsheet::{MAX_XLSX_CELL_CHARS, SHEET_NAME};
pub use table::NO_DATA;

/// A generated report, ready to store and serve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportArtifact {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ReportArtifact {
    /// Write into `dir` as [`Self::filename`] atomically (temp file + rename).
    ///
    /// The filename must be a single path component; one that would land
    /// outside `dir` (separators, `..`) is rejected before anything is written.
    pub async fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<PathBuf, VisionParseError> {
        if !is_plain_filename(&self.filename) {
            return Err(VisionParseError::InvalidFilename {
                filename: self.filename.clone(),
            });
        }
        let dir = dir.as_ref().to_path_buf();
        let path = dir.join(&self.filename);
        let bytes = self.bytes.clone();
        let target = path.clone();

        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            std::fs::create_dir_all(&dir)?;
            let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
            std::io::Write::write_all(&mut tmp, &bytes)?;
            tmp.persist(&target).map_err(|e| e.error)?;
            Ok(())
        })
        .await
        .map_err(|e| VisionParseError::Internal(format!("Write task panicked: {e}")))?
        .map_err(|source| VisionParseError::OutputWriteFailed {
            path: path.clone(),
            source,
        })?;

        info!("Wrote {} ({} bytes)", path.display(), self.bytes.len());
        Ok(path)
    }
}

fn is_plain_filename(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\', '\0'])
}

/// `result_<batch_id>.<ext>`
pub fn artifact_filename(batch_id: &str, format: ReportFormat) -> String {
    format!("result_{}.{}", batch_id, format.extension())
}

/// Render `results` in `format`.
///
/// # Errors
/// [`VisionParseError::ReportFailed`] if the format's writer fails; no
/// partial artifact is returned.
pub fn generate(
    results: &[ExtractionResult],
    format: ReportFormat,
    batch_id: &str,
) -> Result<ReportArtifact, VisionParseError> {
    let start = Instant::now();

    let bytes = match format {
        ReportFormat::Csv => delimited::render(results),
        ReportFormat::Json => json::render(results),
        ReportFormat::Xlsx => spreadsheet::render(results),
        ReportFormat::Pdf => pdf::render(results),
        ReportFormat::Xml => xml::render(results, batch_id),
    }
    .map_err(|detail| VisionParseError::ReportFailed {
        format: format.to_string(),
        detail,
    })?;

    debug!(
        "Generated {} report for {} results: {} bytes in {}ms",
        format,
        results.len(),
        bytes.len(),
        start.elapsed().as_millis()
    );

    Ok(ReportArtifact {
        filename: artifact_filename(batch_id, format),
        content_type: format.content_type().to_string(),
        bytes,
    })
}

/// Like [`generate`], taking the raw format token from the request.
///
/// An unknown token fails with [`VisionParseError::UnsupportedFormat`]
/// before any rendering starts.
pub fn generate_from_token(
    results: &[ExtractionResult],
    format: &str,
    batch_id: &str,
) -> Result<ReportArtifact, VisionParseError> {
    let format: ReportFormat = format.parse()?;
    generate(results, format, batch_id)
}
