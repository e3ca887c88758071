use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::Local;
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

use crate::columns::{default_selection, reselect, resolve_selection};
use crate::config::Settings;
use crate::error::{AppError, AppResult};
use crate::excel::{self, EXPORT_FILE_NAME, XLSX_CONTENT_TYPE};
use crate::models::BatchTable;
use crate::services::archive::{archive_name, extract_zip, write_zip};
use crate::services::batch::{discover_xml_files, process_files};
use crate::services::envelope::{unwrap_signed_files, EnvelopeDecoder, OUTPUT_ARCHIVE_NAME};
use crate::services::workspace::Workspace;
use crate::types::{ConvertReport, ExportArtifact, Notice, ProcessReport, ProcessStatus};

pub const NO_DATA_MESSAGE: &str = "No data found to process.";
pub const EXPORT_READY_MESSAGE: &str = "The Excel file is ready for download.";

impl From<&AppError> for Notice {
    fn from(err: &AppError) -> Self {
        match err {
            AppError::EmptySelection | AppError::NoData | AppError::NoSession => {
                Notice::warning(err.to_string())
            }
            _ => Notice::error(err.to_string()),
        }
    }
}

struct LoadedBatch {
    workspace: Workspace,
    table: BatchTable,
    selection: Vec<String>,
    include_line_detail: bool,
}

/// State of one interactive session: the last loaded archive and the column choice.
///
/// Loading a new archive discards the previous batch and its workspace.
pub struct Session {
    settings: Settings,
    loaded: Option<LoadedBatch>,
}

impl Session {
    pub fn new(settings: Settings) -> Self {
        Self { settings, loaded: None }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    fn batch(&self) -> AppResult<&LoadedBatch> {
        self.loaded.as_ref().ok_or(AppError::NoSession)
    }

    fn batch_mut(&mut self) -> AppResult<&mut LoadedBatch> {
        self.loaded.as_mut().ok_or(AppError::NoSession)
    }

    pub fn load_archive(&mut self, zip: &Path, include_line_detail: bool) -> AppResult<ProcessReport> {
        self.loaded = None;
        let workspace = Workspace::create(self.settings.work_dir.as_deref())?;
        let extracted = extract_zip(zip, &workspace.extraction_dir())?;
        info!("Extracted {} entr(ies) from {}", extracted, zip.display());
        self.run_batch(workspace, include_line_detail, None)
    }

    /// Re-run the batch over the already extracted files with a different expansion mode.
    pub fn set_line_detail(&mut self, include_line_detail: bool) -> AppResult<ProcessReport> {
        let previous = self.loaded.take().ok_or(AppError::NoSession)?;
        self.run_batch(previous.workspace, include_line_detail, Some(previous.selection))
    }

    fn run_batch(
        &mut self,
        workspace: Workspace,
        include_line_detail: bool,
        previous_selection: Option<Vec<String>>,
    ) -> AppResult<ProcessReport> {
        let files = discover_xml_files(&workspace.extraction_dir())?;
        let options = self.settings.invoice_options(include_line_detail);
        let mut notices = Vec::new();

        let (status, result) = if files.is_empty() {
            (ProcessStatus::NoInput, Default::default())
        } else {
            (ProcessStatus::Processed, process_files(&files, &options))
        };

        for failure in &result.failures {
            notices.push(Notice::error(format!(
                "Error in file {}: {}. Moving on to the next file.",
                failure.file_name, failure.error
            )));
        }

        let table = result.table;
        let selection = match previous_selection {
            Some(previous) => reselect(&previous, &table),
            None => default_selection(&table),
        };
        if table.is_empty() {
            notices.push(Notice::warning(NO_DATA_MESSAGE));
        } else {
            notices.push(Notice::info(format!(
                "Extracted {} row(s) with {} column(s) from {} file(s).",
                table.len(),
                table.columns().len(),
                result.files_processed
            )));
        }

        let report = ProcessReport {
            status,
            files_found: files.len(),
            files_processed: result.files_processed,
            rows: table.len(),
            columns: table.columns().to_vec(),
            default_columns: default_selection(&table),
            selected_columns: selection.clone(),
            failures: result.failures,
            notices,
            processed_at: Local::now(),
        };

        self.loaded = Some(LoadedBatch {
            workspace,
            table,
            selection,
            include_line_detail,
        });
        Ok(report)
    }

    pub fn include_line_detail(&self) -> AppResult<bool> {
        Ok(self.batch()?.include_line_detail)
    }

    pub fn table(&self) -> AppResult<&BatchTable> {
        Ok(&self.batch()?.table)
    }

    pub fn available_columns(&self) -> AppResult<&[String]> {
        Ok(self.batch()?.table.columns())
    }

    pub fn selected_columns(&self) -> AppResult<&[String]> {
        Ok(&self.batch()?.selection)
    }

    /// Replace the export selection. An empty result clears the selection and is an error.
    pub fn select_columns(&mut self, requested: &[String]) -> AppResult<Vec<String>> {
        let batch = self.batch_mut()?;
        match resolve_selection(requested, &batch.table) {
            Ok(selection) => {
                batch.selection = selection.clone();
                Ok(selection)
            }
            Err(e) => {
                batch.selection.clear();
                Err(e)
            }
        }
    }

    pub fn export_excel(&self) -> AppResult<ExportArtifact> {
        let batch = self.batch()?;
        let bytes = excel::export_to_buffer(&batch.table, &batch.selection, &self.settings.sheet_name)?;
        Ok(ExportArtifact {
            file_name: EXPORT_FILE_NAME.to_string(),
            content_type: XLSX_CONTENT_TYPE.to_string(),
            bytes,
        })
    }

    pub fn export_excel_base64(&self) -> AppResult<String> {
        Ok(BASE64.encode(self.export_excel()?.bytes))
    }

    /// Write the export to `dir`, or the configured output directory.
    pub fn save_excel(&self, dir: Option<&Path>) -> AppResult<PathBuf> {
        let batch = self.batch()?;
        let dir = dir
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.settings.resolved_output_dir());
        excel::save_export(&batch.table, &batch.selection, &self.settings.sheet_name, &dir)
    }
}

/// Unwrap every signed envelope in `zip` and package the decoded files into
/// `out_dir/converted_files.zip`.
pub fn convert_signed_archive(
    settings: &Settings,
    zip: &Path,
    decoder: &dyn EnvelopeDecoder,
    out_dir: &Path,
) -> AppResult<ConvertReport> {
    let workspace = Workspace::create(settings.work_dir.as_deref())?;
    let root = workspace.extraction_dir();
    extract_zip(zip, &root)?;

    let unwrapped = unwrap_signed_files(&root, decoder)?;
    let mut notices: Vec<Notice> = unwrapped
        .failures
        .iter()
        .map(|f| Notice::error(format!("Error converting {}: {}", f.file_name, f.error)))
        .collect();

    let archive_path = if unwrapped.converted.is_empty() {
        if unwrapped.failures.is_empty() {
            notices.push(Notice::warning("No signed (.p7m) files found in the archive."));
        } else {
            notices.push(Notice::warning("No files could be converted."));
        }
        None
    } else {
        fs::create_dir_all(out_dir)?;
        let out = out_dir.join(OUTPUT_ARCHIVE_NAME);
        write_zip(&root, &unwrapped.converted, &out)?;
        notices.push(Notice::success(format!(
            "{} file(s) converted. {} is ready for download.",
            unwrapped.converted.len(),
            OUTPUT_ARCHIVE_NAME
        )));
        Some(out.to_string_lossy().to_string())
    };

    Ok(ConvertReport {
        converted: unwrapped
            .converted
            .iter()
            .map(|p| archive_name(&root, p))
            .collect(),
        failures: unwrapped.failures,
        archive_path,
        notices,
        processed_at: Local::now(),
    })
}

#[cfg(test)]
#[path = "tests/commands_tests.rs"]
mod tests;
