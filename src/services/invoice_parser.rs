//! One Fattura Elettronica document → one or more output rows.
//!
//! Sections are located by local tag name, flattened independently and then
//! combined. With line detail every `DettaglioLinee` becomes its own row; the
//! first row carries the header/general/summary columns and later rows carry
//! them only as absent placeholders. Without line detail the document is a
//! single row whose `Descrizione` joins every line description.

use log::{debug, warn};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::{CollisionPolicy, FieldMap, Row};
use crate::services::flattener::Flattener;
use crate::services::xml_tree::{XmlError, XmlTree};

pub const HEADER_PATH: &[&str] = &["FatturaElettronicaHeader"];
pub const GENERAL_DATA_PATH: &[&str] = &[
    "FatturaElettronicaBody",
    "DatiGenerali",
    "DatiGeneraliDocumento",
];
pub const SUMMARY_PATH: &[&str] = &["FatturaElettronicaBody", "DatiBeniServizi", "DatiRiepilogo"];
pub const LINE_PATH: &[&str] = &["FatturaElettronicaBody", "DettaglioLinee"];

pub const DESCRIPTION_FIELD: &str = "Descrizione";
pub const DESCRIPTION_SEPARATOR: &str = " | ";

#[derive(Debug, Error)]
pub enum InvoiceError {
    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed XML in {}: {source}", path.display())]
    Malformed { path: PathBuf, source: XmlError },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvoiceOptions {
    pub include_line_detail: bool,
    pub collision: CollisionPolicy,
}

impl Default for InvoiceOptions {
    fn default() -> Self {
        Self {
            include_line_detail: true,
            collision: CollisionPolicy::default(),
        }
    }
}

impl InvoiceOptions {
    pub fn with_line_detail(include_line_detail: bool) -> Self {
        Self {
            include_line_detail,
            ..Self::default()
        }
    }
}

/// Flattened sections of one document.
#[derive(Debug, Clone, Default)]
pub struct InvoiceSections {
    pub header: FieldMap,
    pub general: FieldMap,
    /// Every `DatiRiepilogo` block flattened into one mapping.
    pub summary: FieldMap,
    /// Line items, only retained when line detail is requested.
    pub lines: Vec<FieldMap>,
    /// `Descrizione` of every line item, in line order.
    pub descriptions: Vec<String>,
}

pub fn extract_sections(tree: &XmlTree, options: &InvoiceOptions) -> InvoiceSections {
    let flattener = Flattener::new(options.collision);
    let mut sections = InvoiceSections::default();

    if let Some(header) = tree.first_path(HEADER_PATH) {
        flattener.flatten_into(tree, header, &mut sections.header);
    }
    if let Some(general) = tree.first_path(GENERAL_DATA_PATH) {
        flattener.flatten_into(tree, general, &mut sections.general);
    }
    for summary in tree.find_path(SUMMARY_PATH) {
        flattener.flatten_into(tree, summary, &mut sections.summary);
    }
    for line in tree.find_path(LINE_PATH) {
        let fields = flattener.flatten(tree, line);
        if let Some(description) = fields.get(DESCRIPTION_FIELD) {
            sections
                .descriptions
                .push(description.clone().unwrap_or_default());
        }
        if options.include_line_detail {
            sections.lines.push(fields);
        }
    }
    sections
}

/// Combine flattened sections into output rows.
///
/// Union merges favour the right operand: header, then general data, then
/// summary, then (for the first row) the first line item.
pub fn expand_rows(sections: InvoiceSections, include_line_detail: bool) -> Vec<Row> {
    let InvoiceSections {
        header,
        general,
        summary,
        lines,
        descriptions,
    } = sections;

    let mut combined = header;
    combined.merge(&general);
    combined.merge(&summary);

    if !include_line_detail {
        if !descriptions.is_empty() {
            combined.insert(DESCRIPTION_FIELD, Some(descriptions.join(DESCRIPTION_SEPARATOR)));
        }
        return vec![combined];
    }

    let mut lines = lines.into_iter();
    let Some(first) = lines.next() else {
        return vec![combined];
    };
    combined.merge(&first);

    let placeholder = combined.blank_copy();
    let mut rows = Vec::with_capacity(lines.len() + 1);
    rows.push(combined);
    for line in lines {
        let mut row = placeholder.clone();
        row.merge(&line);
        rows.push(row);
    }
    rows
}

pub fn rows_from_tree(tree: &XmlTree, options: &InvoiceOptions) -> Vec<Row> {
    let sections = extract_sections(tree, options);
    expand_rows(sections, options.include_line_detail)
}

pub fn try_parse_xml_file(path: &Path, options: &InvoiceOptions) -> Result<Vec<Row>, InvoiceError> {
    let tree = XmlTree::parse_file(path).map_err(|e| match e {
        XmlError::Io(source) => InvoiceError::Read {
            path: path.to_path_buf(),
            source,
        },
        source => InvoiceError::Malformed {
            path: path.to_path_buf(),
            source,
        },
    })?;
    let rows = rows_from_tree(&tree, options);
    debug!("{}: {} row(s)", path.display(), rows.len());
    Ok(rows)
}

/// Lenient variant: a document that cannot be read or parsed yields no rows.
pub fn parse_xml_file(path: &Path, options: &InvoiceOptions) -> Vec<Row> {
    match try_parse_xml_file(path, options) {
        Ok(rows) => rows,
        Err(e) => {
            warn!("Skipping document: {}", e);
            Vec::new()
        }
    }
}

#[cfg(test)]
#[path = "tests/invoice_parser_tests.rs"]
mod tests;
