pub mod cli;
pub mod columns;
pub mod commands;
pub mod config;
pub mod error;
pub mod excel;
pub mod models;
pub mod services;
pub mod types;

#[cfg(test)]
mod test_utils;

use clap::Parser;
use log::{info, warn};
use serde::Serialize;
use std::path::Path;

use cli::{Cli, Command};
use columns::parse_column_list;
use commands::{convert_signed_archive, Session, EXPORT_READY_MESSAGE};
use config::Settings;
use error::{AppError, AppResult};
use types::{Notice, NoticeLevel, ProcessReport};

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Stderr)
        .try_init();
}

#[derive(Serialize)]
struct ProcessOutput<'a> {
    #[serde(flatten)]
    report: &'a ProcessReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    excel_path: Option<String>,
}

fn print_notices(notices: &[Notice]) {
    for notice in notices {
        let tag = match notice.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Success => "ok",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        println!("[{}] {}", tag, notice.message);
    }
}

/// Export-side problems the operator can fix become notices; anything else is fatal.
fn recoverable(err: AppError, notices: &mut Vec<Notice>) -> AppResult<()> {
    match err {
        AppError::EmptySelection | AppError::NoData => {
            notices.push(Notice::from(&err));
            Ok(())
        }
        other => Err(other),
    }
}

fn open_file(path: &Path) {
    if let Err(e) = opener::open(path) {
        warn!("Could not open {}: {}", path.display(), e);
    }
}

pub fn run() -> AppResult<()> {
    run_with(Cli::parse())
}

pub fn run_with(cli: Cli) -> AppResult<()> {
    init_logging(cli.verbose);
    let mut settings = Settings::from_env()?;
    if let Some(policy) = cli.collision {
        settings.collision = policy;
    }

    match cli.command {
        Command::Process {
            archive,
            no_line_detail,
            columns,
            output_dir,
            json,
            open,
        } => {
            let mut session = Session::new(settings);
            let mut report = session.load_archive(&archive, !no_line_detail)?;

            if let Some(raw) = columns {
                match session.select_columns(&parse_column_list(&raw)) {
                    Ok(selection) => report.selected_columns = selection,
                    Err(e) => {
                        report.selected_columns.clear();
                        recoverable(e, &mut report.notices)?;
                    }
                }
            }

            let mut excel_path = None;
            match session.save_excel(output_dir.as_deref()) {
                Ok(path) => {
                    report.notices.push(Notice::success(format!(
                        "{} ({})",
                        EXPORT_READY_MESSAGE,
                        path.display()
                    )));
                    if open {
                        open_file(&path);
                    }
                    excel_path = Some(path.to_string_lossy().to_string());
                }
                Err(e) => recoverable(e, &mut report.notices)?,
            }

            if json {
                let output = ProcessOutput { report: &report, excel_path };
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                print_notices(&report.notices);
            }
        }
        Command::Columns { archive, no_line_detail } => {
            let mut session = Session::new(settings);
            let report = session.load_archive(&archive, !no_line_detail)?;
            for column in &report.columns {
                let marker = if report.default_columns.contains(column) { "*" } else { " " };
                println!("{} {}", marker, column);
            }
            print_notices(&report.notices);
        }
        Command::Unwrap {
            archive,
            output_dir,
            openssl,
            timeout_secs,
            json,
        } => {
            if let Some(bin) = openssl {
                settings.openssl_bin = bin;
            }
            if let Some(secs) = timeout_secs {
                settings.decode_timeout = (secs > 0).then(|| std::time::Duration::from_secs(secs));
            }
            let out_dir = output_dir.unwrap_or_else(|| settings.resolved_output_dir());
            let decoder = settings.decoder();
            let report = convert_signed_archive(&settings, &archive, &decoder, &out_dir)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_notices(&report.notices);
            }
        }
    }
    info!("Done");
    Ok(())
}
