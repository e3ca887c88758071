use chrono::{DateTime, Local};
use serde::Serialize;

use crate::services::batch::FailedDocument;
use crate::services::envelope::FailedConversion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Operator-facing message attached to a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Info, message: message.into() }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Success, message: message.into() }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Warning, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: NoticeLevel::Error, message: message.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    /// The archive held no `.xml` documents.
    NoInput,
    Processed,
}

/// Result of loading (or reprocessing) an archive.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessReport {
    pub status: ProcessStatus,
    pub files_found: usize,
    pub files_processed: usize,
    pub rows: usize,
    pub columns: Vec<String>,
    pub default_columns: Vec<String>,
    pub selected_columns: Vec<String>,
    pub failures: Vec<FailedDocument>,
    pub notices: Vec<Notice>,
    pub processed_at: DateTime<Local>,
}

/// Spreadsheet ready for download.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Result of the signature-unwrap pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertReport {
    pub converted: Vec<String>,
    pub failures: Vec<FailedConversion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_path: Option<String>,
    pub notices: Vec<Notice>,
    pub processed_at: DateTime<Local>,
}
