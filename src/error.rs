use serde::Serialize;
use thiserror::Error;

use crate::services::envelope::DecodeError;
use crate::services::invoice_parser::InvoiceError;
use crate::services::xml_tree::XmlError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid or corrupt ZIP: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("Malformed XML: {0}")]
    Xml(#[from] XmlError),
    #[error("{0}")]
    Invoice(#[from] InvoiceError),
    #[error("Could not decode signed file: {0}")]
    Decode(#[from] DecodeError),
    #[error("Excel export failed: {0}")]
    Excel(#[from] rust_xlsxwriter::XlsxError),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("No columns selected for export.")]
    EmptySelection,
    #[error("There is no data to export.")]
    NoData,
    #[error("No archive has been loaded yet.")]
    NoSession,
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.to_string().as_ref())
    }
}

pub type AppResult<T> = Result<T, AppError>;
