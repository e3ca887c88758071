//! Print every sheet of an `.xlsx` as tab-separated rows.
//!
//! Usage: dump_excel <file.xlsx>

use calamine::{open_workbook_auto, Data, Reader};
use std::process::ExitCode;

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn main() -> ExitCode {
    let Some(path) = std::env::args().nth(1) else {
        eprintln!("Usage: dump_excel <file.xlsx>");
        return ExitCode::FAILURE;
    };
    let mut workbook = match open_workbook_auto(&path) {
        Ok(wb) => wb,
        Err(e) => {
            eprintln!("Cannot open {}: {}", path, e);
            return ExitCode::FAILURE;
        }
    };
    for name in workbook.sheet_names().to_owned() {
        println!("== {} ==", name);
        match workbook.worksheet_range(&name) {
            Ok(range) => {
                for row in range.rows() {
                    let cells: Vec<String> = row.iter().map(cell_text).collect();
                    println!("{}", cells.join("\t"));
                }
            }
            Err(e) => eprintln!("Cannot read sheet {}: {}", name, e),
        }
    }
    ExitCode::SUCCESS
}
