use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::models::CollisionPolicy;

#[derive(Parser, Debug)]
#[command(name = "fattura-xml")]
#[command(about = "Extract Fattura Elettronica invoices from a ZIP into an Excel sheet")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// What to keep when a field path repeats inside one section: last, first or collect
    #[arg(long, global = true, value_name = "POLICY")]
    pub collision: Option<CollisionPolicy>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Process every XML invoice in an archive and export the selected columns
    Process {
        /// ZIP archive containing the XML invoices
        #[arg(short, long)]
        archive: PathBuf,

        /// One row per invoice instead of one row per line item
        #[arg(long = "no-line-detail")]
        no_line_detail: bool,

        /// Comma separated export columns (defaults to the preferred column list)
        #[arg(short, long, value_name = "C1,C2,..")]
        columns: Option<String>,

        /// Directory for the Excel file (defaults to Downloads)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,

        /// Open the Excel file once written
        #[arg(long)]
        open: bool,
    },

    /// List the columns discovered in an archive
    Columns {
        #[arg(short, long)]
        archive: PathBuf,

        #[arg(long = "no-line-detail")]
        no_line_detail: bool,
    },

    /// Decode signed (.p7m) invoices and repackage them as converted_files.zip
    Unwrap {
        /// ZIP archive containing the signed invoices
        #[arg(short, long)]
        archive: PathBuf,

        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// openssl executable
        #[arg(long, value_name = "BIN")]
        openssl: Option<PathBuf>,

        /// Seconds to wait per file before giving up (0 waits forever)
        #[arg(long, value_name = "N")]
        timeout_secs: Option<u64>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_process_with_global_flags() {
        let cli = Cli::try_parse_from([
            "fattura-xml",
            "process",
            "--archive",
            "in.zip",
            "--no-line-detail",
            "--columns",
            "Numero,Data",
            "-v",
            "--collision",
            "collect",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.collision, Some(CollisionPolicy::Collect));
        match cli.command {
            Command::Process {
                archive,
                no_line_detail,
                columns,
                json,
                ..
            } => {
                assert_eq!(archive, PathBuf::from("in.zip"));
                assert!(no_line_detail);
                assert_eq!(columns.as_deref(), Some("Numero,Data"));
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_collision_policy() {
        let parsed = Cli::try_parse_from(["fattura-xml", "--collision", "merge", "columns", "-a", "x.zip"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn parses_unwrap_overrides() {
        let cli = Cli::try_parse_from([
            "fattura-xml",
            "unwrap",
            "-a",
            "signed.zip",
            "--openssl",
            "/opt/openssl",
            "--timeout-secs",
            "0",
        ])
        .unwrap();
        match cli.command {
            Command::Unwrap { openssl, timeout_secs, .. } => {
                assert_eq!(openssl, Some(PathBuf::from("/opt/openssl")));
                assert_eq!(timeout_secs, Some(0));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
