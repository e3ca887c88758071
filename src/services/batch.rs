//! Batch run over every XML document below an extraction root.

use log::{debug, info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::AppResult;
use crate::models::BatchTable;
use crate::services::invoice_parser::{try_parse_xml_file, InvoiceOptions};

/// Case-sensitive suffix of the documents picked up by a batch run.
pub const XML_SUFFIX: &str = ".xml";

/// A document that contributed no rows because it could not be read or parsed.
#[derive(Debug, Clone, Serialize)]
pub struct FailedDocument {
    pub file_path: String,
    pub file_name: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchResult {
    pub table: BatchTable,
    pub files_processed: usize,
    pub failures: Vec<FailedDocument>,
}

/// `NoInput` means nothing matched; `Processed` may still hold an empty table.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", content = "result", rename_all = "snake_case")]
pub enum BatchOutcome {
    NoInput,
    Processed(BatchResult),
}

impl BatchOutcome {
    pub fn table(&self) -> Option<&BatchTable> {
        match self {
            BatchOutcome::NoInput => None,
            BatchOutcome::Processed(result) => Some(&result.table),
        }
    }

    pub fn into_result(self) -> Option<BatchResult> {
        match self {
            BatchOutcome::NoInput => None,
            BatchOutcome::Processed(result) => Some(result),
        }
    }
}

/// Every regular file below `root` whose name ends in `.xml`.
///
/// Entries are visited depth-first with siblings sorted by name, so the order
/// is stable across platforms.
pub fn discover_xml_files(root: &Path) -> AppResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_xml = entry
            .file_name()
            .to_str()
            .map(|name| name.ends_with(XML_SUFFIX))
            .unwrap_or(false);
        if is_xml {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

pub fn process_files(files: &[PathBuf], options: &InvoiceOptions) -> BatchResult {
    let mut rows = Vec::new();
    let mut failures = Vec::new();

    for path in files {
        match try_parse_xml_file(path, options) {
            Ok(file_rows) => {
                debug!("{}: {} row(s)", path.display(), file_rows.len());
                rows.extend(file_rows);
            }
            Err(e) => {
                warn!("Error in file {}: {}. Moving on to the next file.", path.display(), e);
                failures.push(FailedDocument {
                    file_path: path.to_string_lossy().to_string(),
                    file_name: path
                        .file_name()
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_default(),
                    error: e.to_string(),
                });
            }
        }
    }

    BatchResult {
        table: BatchTable::from_rows(rows),
        files_processed: files.len(),
        failures,
    }
}

pub fn process_all_files(root: &Path, options: &InvoiceOptions) -> AppResult<BatchOutcome> {
    let files = discover_xml_files(root)?;
    if files.is_empty() {
        info!("No XML files found under {}", root.display());
        return Ok(BatchOutcome::NoInput);
    }
    let result = process_files(&files, options);
    info!(
        "Processed {} file(s): {} row(s), {} column(s), {} failure(s)",
        result.files_processed,
        result.table.len(),
        result.table.columns().len(),
        result.failures.len()
    );
    Ok(BatchOutcome::Processed(result))
}
