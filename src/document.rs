//! Uploaded documents and the MIME allow-list.
//!
//! A [`Document`] is one uploaded file as the caller hands it over: raw bytes,
//! the original filename and a MIME type. The core never mutates it and never
//! asks where it came from, so filesystem and blob-store uploads look the same.

use crate::error::VisionParseError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// MIME types the vision API accepts as inline data.
pub const SUPPORTED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "image/png",
    "image/jpeg",
    "image/gif",
    "image/bmp",
    "image/tiff",
];

/// Fallback when the extension gives no hint.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Whether `mime_type` is in [`SUPPORTED_MIME_TYPES`].
pub fn is_supported_mime(mime_type: &str) -> bool {
    SUPPORTED_MIME_TYPES.contains(&mime_type)
}

/// Guess a MIME type from a filename's extension (case-insensitive).
pub fn mime_from_filename(filename: &str) -> &'static str {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") | Some("jpe") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("tif") | Some("tiff") => "image/tiff",
        Some("txt") => "text/plain",
        Some("csv") => "text/csv",
        Some("json") => "application/json",
        Some("xml") => "application/xml",
        _ => OCTET_STREAM,
    }
}

/// Coarse grouping of a document by content kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Pdf,
    Image,
    Other,
}

impl FileCategory {
    pub fn from_mime(mime_type: &str) -> Self {
        if mime_type == "application/pdf" {
            FileCategory::Pdf
        } else if mime_type.starts_with("image/") {
            FileCategory::Image
        } else {
            FileCategory::Other
        }
    }
}

/// A single uploaded file.
///
/// Bytes sit behind an `Arc` so concurrent extraction tasks can share a
/// document without copying the payload.
#[derive(Clone)]
pub struct Document {
    bytes: Arc<[u8]>,
    filename: String,
    mime_type: String,
}

impl Document {
    /// Wrap uploaded bytes, detecting the MIME type from `filename`.
    pub fn from_bytes(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        let filename = filename.into();
        let mime_type = mime_from_filename(&filename).to_string();
        let bytes: Vec<u8> = bytes.into();
        Self {
            bytes: Arc::from(bytes),
            filename,
            mime_type,
        }
    }

    /// Override the detected MIME type (e.g. with the upload's `Content-Type`).
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    /// Read a document from disk.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, VisionParseError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => VisionParseError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => VisionParseError::Internal(format!("Failed to read '{}': {e}", path.display())),
        })?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "file".to_string());
        debug!("Loaded {} ({} bytes)", filename, bytes.len());
        Ok(Self::from_bytes(filename, bytes))
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn category(&self) -> FileCategory {
        FileCategory::from_mime(&self.mime_type)
    }

    /// Lower-cased extension of the original filename, empty if there is none.
    pub fn extension(&self) -> String {
        Path::new(&self.filename)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default()
    }

    pub fn is_supported(&self) -> bool {
        is_supported_mime(&self.mime_type)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("filename", &self.filename)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}
