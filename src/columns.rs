//! Export column selection.

use log::warn;

use crate::error::{AppError, AppResult};
use crate::models::BatchTable;

/// Columns pre-selected for export when present in the batch, in this order.
pub const DEFAULT_COLUMNS: &[&str] = &[
    "CedentePrestatore/DatiAnagrafici/IdFiscaleIVA/IdPaese",
    "CedentePrestatore/DatiAnagrafici/IdFiscaleIVA/IdCodice",
    "CedentePrestatore/DatiAnagrafici/Anagrafica/Denominazione",
    "CedentePrestatore/DatiAnagrafici/RegimeFiscale",
    "CedentePrestatore/Sede/Indirizzo",
    "CedentePrestatore/Sede/NumeroCivico",
    "CedentePrestatore/Sede/CAP",
    "CedentePrestatore/Sede/Comune",
    "TipoDocumento",
    "Data",
    "Numero",
    "ImportoTotaleDocumento",
    "AliquotaIVA",
    "ImponibileImporto",
    "Imposta",
    "Descrizione",
    "PrezzoTotale",
];

pub fn default_selection(table: &BatchTable) -> Vec<String> {
    DEFAULT_COLUMNS
        .iter()
        .filter(|c| table.has_column(c))
        .map(|c| c.to_string())
        .collect()
}

/// Keep the previously selected columns that still exist, in their previous order.
pub fn reselect(previous: &[String], table: &BatchTable) -> Vec<String> {
    previous
        .iter()
        .filter(|c| table.has_column(c))
        .cloned()
        .collect()
}

/// Validate an operator selection against the table.
///
/// Unknown names are dropped; the requested order is kept.
pub fn resolve_selection(requested: &[String], table: &BatchTable) -> AppResult<Vec<String>> {
    let mut selected: Vec<String> = Vec::with_capacity(requested.len());
    for column in requested {
        if !table.has_column(column) {
            warn!("Ignoring unknown column '{}'", column);
            continue;
        }
        if !selected.contains(column) {
            selected.push(column.clone());
        }
    }
    if selected.is_empty() {
        return Err(AppError::EmptySelection);
    }
    Ok(selected)
}

/// Parse a comma separated column list as given on the command line.
pub fn parse_column_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}
