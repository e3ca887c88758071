use log::info;
use rust_xlsxwriter::{Color, Format, Workbook, Worksheet, XlsxError};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::models::{BatchTable, Cell};

/// File name offered for the spreadsheet download.
pub const EXPORT_FILE_NAME: &str = "fattura_dati_combinati_selezionati.xlsx";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const DEFAULT_SHEET_NAME: &str = "Fatture";

/// Excel refuses longer strings in a single cell.
const MAX_CELL_CHARS: usize = 32_767;

/// Drop characters that cannot appear in sheet XML (control chars except tab/newline/CR)
/// and cap the text at the per-cell limit.
fn sanitize_cell(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars().take(MAX_CELL_CHARS) {
        let u = c as u32;
        if c == '\t' || c == '\n' || c == '\r' {
            out.push(c);
        } else if u < 0x20 || u == 0x7F || u == 0xFFFE || u == 0xFFFF {
            // skip control and invalid
        } else {
            out.push(c);
        }
    }
    out
}

/// Estimate column width from text length (char count × 1.2, clamped 10–60).
fn estimate_text_width(text: &str) -> f64 {
    let w = text.chars().count() as f64 * 1.2;
    w.clamp(10.0, 60.0)
}

/// Per-column widths: max of header width and cell widths.
fn calculate_column_widths(table: &BatchTable, columns: &[String]) -> Vec<f64> {
    columns
        .iter()
        .map(|column| {
            table
                .rows()
                .iter()
                .filter_map(|row| row.cell(column).as_text())
                .map(estimate_text_width)
                .fold(estimate_text_width(column), f64::max)
        })
        .collect()
}

fn write_text_cell_safe(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    text: &str,
    format: &Format,
) -> Result<(), XlsxError> {
    let cleaned = sanitize_cell(text);
    worksheet.write_string_with_format(row, col, &cleaned, format).map(|_| ())
}

fn header_format() -> Format {
    Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0x2563EB))
        .set_font_color(Color::RGB(0xFFFFFF))
}

/// Fill a new workbook with the selected columns of every row.
///
/// Rows keep table order; absent cells are left blank.
fn build_workbook(table: &BatchTable, columns: &[String], sheet_name: &str) -> AppResult<Workbook> {
    if table.is_empty() {
        return Err(AppError::NoData);
    }
    if columns.is_empty() {
        return Err(AppError::EmptySelection);
    }
    if columns.len() > u16::MAX as usize {
        return Err(AppError::Config(format!("Too many columns: {}", columns.len())));
    }

    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    let header_format = header_format();
    let text_format = Format::new();

    for (col, &w) in calculate_column_widths(table, columns).iter().enumerate() {
        worksheet.set_column_width(col as u16, w)?;
    }
    for (col, header) in columns.iter().enumerate() {
        write_text_cell_safe(worksheet, 0, col as u16, header, &header_format)?;
    }

    for (row_idx, row) in table.rows().iter().enumerate() {
        let sheet_row = u32::try_from(row_idx + 1)
            .map_err(|_| AppError::Config("Too many rows for one worksheet".to_string()))?;
        for (col_idx, column) in columns.iter().enumerate() {
            if let Cell::Text(value) = row.cell(column) {
                write_text_cell_safe(worksheet, sheet_row, col_idx as u16, value, &text_format)?;
            }
        }
    }

    worksheet.set_freeze_panes(1, 0)?;
    Ok(workbook)
}

/// Serialise the selected columns to an in-memory `.xlsx`.
pub fn export_to_buffer(
    table: &BatchTable,
    columns: &[String],
    sheet_name: &str,
) -> AppResult<Vec<u8>> {
    let mut workbook = build_workbook(table, columns, sheet_name)?;
    Ok(workbook.save_to_buffer()?)
}

/// `dir/name`, or a timestamped sibling when that file already exists.
fn unique_export_path(dir: &Path) -> PathBuf {
    let path = dir.join(EXPORT_FILE_NAME);
    if !path.exists() {
        return path;
    }
    let stem = EXPORT_FILE_NAME.trim_end_matches(".xlsx");
    let now = chrono::Local::now();
    let mut p = dir.join(format!("{}_{}.xlsx", stem, now.format("%Y%m%d_%H%M%S")));
    let mut counter = 2u32;
    while p.exists() {
        p = dir.join(format!(
            "{}_{}_{}.xlsx",
            stem,
            now.format("%Y%m%d_%H%M%S"),
            counter
        ));
        counter += 1;
    }
    p
}

/// Write the export into `dir` and return the file path. Never overwrites.
pub fn save_export(
    table: &BatchTable,
    columns: &[String],
    sheet_name: &str,
    dir: &Path,
) -> AppResult<PathBuf> {
    let bytes = export_to_buffer(table, columns, sheet_name)?;
    std::fs::create_dir_all(dir)?;
    let path = unique_export_path(dir);
    std::fs::write(&path, bytes)?;
    info!("Excel export written to {}", path.display());
    Ok(path)
}
