//! Runtime settings from the environment (optionally seeded by a `.env` file).

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AppError, AppResult};
use crate::excel::DEFAULT_SHEET_NAME;
use crate::models::CollisionPolicy;
use crate::services::envelope::OpensslDecoder;
use crate::services::invoice_parser::InvoiceOptions;

pub const ENV_OPENSSL_BIN: &str = "FATTURA_OPENSSL_BIN";
pub const ENV_DECODE_TIMEOUT_SECS: &str = "FATTURA_DECODE_TIMEOUT_SECS";
pub const ENV_COLLISION_POLICY: &str = "FATTURA_COLLISION_POLICY";
pub const ENV_OUTPUT_DIR: &str = "FATTURA_OUTPUT_DIR";
pub const ENV_WORK_DIR: &str = "FATTURA_WORK_DIR";
pub const ENV_SHEET_NAME: &str = "FATTURA_SHEET_NAME";

const DEFAULT_DECODE_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone)]
pub struct Settings {
    pub openssl_bin: PathBuf,
    /// `None` waits for the decoder indefinitely.
    pub decode_timeout: Option<Duration>,
    pub collision: CollisionPolicy,
    pub output_dir: Option<PathBuf>,
    /// Parent directory for per-run workspaces; system temp dir when unset.
    pub work_dir: Option<PathBuf>,
    pub sheet_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            openssl_bin: PathBuf::from("openssl"),
            decode_timeout: Some(Duration::from_secs(DEFAULT_DECODE_TIMEOUT_SECS)),
            collision: CollisionPolicy::default(),
            output_dir: None,
            work_dir: None,
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
        }
    }
}

fn load_env() {
    let _ = dotenvy::dotenv();
}

impl Settings {
    pub fn from_env() -> AppResult<Self> {
        load_env();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut settings = Settings::default();

        if let Some(bin) = get(ENV_OPENSSL_BIN) {
            settings.openssl_bin = PathBuf::from(bin.trim());
        }
        if let Some(raw) = get(ENV_DECODE_TIMEOUT_SECS) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                AppError::Config(format!("{} must be a number of seconds, got '{}'", ENV_DECODE_TIMEOUT_SECS, raw))
            })?;
            settings.decode_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(raw) = get(ENV_COLLISION_POLICY) {
            settings.collision = raw.parse().map_err(AppError::Config)?;
        }
        if let Some(dir) = get(ENV_OUTPUT_DIR) {
            settings.output_dir = Some(PathBuf::from(dir.trim()));
        }
        if let Some(dir) = get(ENV_WORK_DIR) {
            settings.work_dir = Some(PathBuf::from(dir.trim()));
        }
        if let Some(name) = get(ENV_SHEET_NAME) {
            settings.sheet_name = name.trim().to_string();
        }
        Ok(settings)
    }

    /// Configured output directory, else Downloads, else Desktop, else the current directory.
    pub fn resolved_output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .or_else(dirs::download_dir)
            .or_else(dirs::desktop_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn decoder(&self) -> OpensslDecoder {
        OpensslDecoder::new(self.openssl_bin.clone(), self.decode_timeout)
    }

    pub fn invoice_options(&self, include_line_detail: bool) -> InvoiceOptions {
        InvoiceOptions {
            include_line_detail,
            collision: self.collision,
        }
    }
}
