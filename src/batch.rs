//! Batches: documents plus the options they are processed under.
//!
//! The core does not persist batches. It reads the options, and reports
//! status changes by mutating [`Batch::status`] so the caller can store them.

use crate::document::Document;
use crate::error::VisionParseError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Output encoding for a batch report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Csv,
    Json,
    Xlsx,
    Pdf,
    /// Legacy layout kept for consumers of the old XML export.
    Xml,
}

impl ReportFormat {
    pub const ALL: [ReportFormat; 5] = [
        ReportFormat::Csv,
        ReportFormat::Json,
        ReportFormat::Xlsx,
        ReportFormat::Pdf,
        ReportFormat::Xml,
    ];

    /// File extension, which is also the format token.
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Json => "json",
            ReportFormat::Xlsx => "xlsx",
            ReportFormat::Pdf => "pdf",
            ReportFormat::Xml => "xml",
        }
    }

    pub fn content_type(self) -> &'static str {
        content_type_for(self.extension())
    }
}

/// Static format → MIME table. Unknown tokens map to a generic binary type.
pub fn content_type_for(token: &str) -> &'static str {
    match token {
        "csv" => "text/csv",
        "json" => "application/json",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "pdf" => "application/pdf",
        "xml" => "application/xml",
        _ => "application/octet-stream",
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ReportFormat {
    type Err = VisionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ReportFormat::Csv),
            "json" => Ok(ReportFormat::Json),
            "xlsx" | "excel" => Ok(ReportFormat::Xlsx),
            "pdf" => Ok(ReportFormat::Pdf),
            "xml" => Ok(ReportFormat::Xml),
            _ => Err(VisionParseError::UnsupportedFormat {
                format: s.to_string(),
            }),
        }
    }
}

/// Batch lifecycle: `Pending → Processing → Completed | Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl BatchStatus {
    pub fn can_transition_to(self, next: BatchStatus) -> bool {
        matches!(
            (self, next),
            (BatchStatus::Pending, BatchStatus::Processing)
                | (BatchStatus::Processing, BatchStatus::Completed)
                | (BatchStatus::Processing, BatchStatus::Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, BatchStatus::Completed | BatchStatus::Failed)
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BatchStatus::Pending => "pending",
            BatchStatus::Processing => "processing",
            BatchStatus::Completed => "completed",
            BatchStatus::Failed => "failed",
        })
    }
}

/// User-chosen processing options shared by every document in a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOptions {
    /// Requested field names, in the order the user listed them.
    pub fields: Vec<String>,
    /// Restrict extraction to exactly `fields`.
    pub strict: bool,
    pub format: ReportFormat,
}

impl BatchOptions {
    pub fn new(fields: Vec<String>, strict: bool, format: ReportFormat) -> Self {
        Self {
            fields,
            strict,
            format,
        }
    }

    /// Build options from raw form input: a comma-separated field list and a
    /// format token. Blank entries are dropped; an unknown token is rejected.
    pub fn from_form(fields: &str, strict: bool, format: &str) -> Result<Self, VisionParseError> {
        let format = format.parse()?;
        Ok(Self::new(parse_field_list(fields), strict, format))
    }
}

/// Split `"invoice_number, total,,date"` into `["invoice_number", "total", "date"]`.
pub fn parse_field_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// An ordered set of documents processed together.
#[derive(Debug, Clone)]
pub struct Batch {
    pub id: String,
    pub documents: Vec<Document>,
    pub options: BatchOptions,
    pub status: BatchStatus,
    pub created_at: DateTime<Utc>,
}

impl Batch {
    /// New pending batch with a generated identifier.
    pub fn new(documents: Vec<Document>, options: BatchOptions) -> Self {
        Self::with_id(Uuid::new_v4().simple().to_string(), documents, options)
    }

    /// New pending batch under a caller-supplied identifier (e.g. a database key).
    pub fn with_id(id: impl Into<String>, documents: Vec<Document>, options: BatchOptions) -> Self {
        Self {
            id: id.into(),
            documents,
            options,
            status: BatchStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// Move to `next`, rejecting transitions the lifecycle does not allow.
    pub fn transition(&mut self, next: BatchStatus) -> Result<(), VisionParseError> {
        if !self.status.can_transition_to(next) {
            return Err(VisionParseError::InvalidStatusTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
