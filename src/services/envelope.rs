//! Unwrapping of CMS-signed (`.p7m`) invoices back into plain XML.
//!
//! The signature container is only checked for structural integrity; signer
//! trust is not verified (`-noverify`).

use log::{debug, info, warn};
use serde::Serialize;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use thiserror::Error;
use walkdir::WalkDir;

use crate::error::AppResult;

/// Marker looked for (case-sensitive) in file names of signed envelopes.
pub const SIGNED_MARKER: &str = ".p7m";
/// Name of the archive holding every decoded file.
pub const OUTPUT_ARCHIVE_NAME: &str = "converted_files.zip";

const POLL_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("could not start {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("{program} exited with {status}: {diagnostics}")]
    Failed {
        program: String,
        status: String,
        diagnostics: String,
    },
    #[error("{program} did not finish within {seconds}s")]
    TimedOut { program: String, seconds: u64 },
    #[error("cannot derive an output name from {0}")]
    OutputName(String),
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Turns one signed envelope into the file it encloses.
pub trait EnvelopeDecoder {
    fn decode(&self, input: &Path, output: &Path) -> Result<(), DecodeError>;
}

/// Runs `openssl smime -verify -noverify -in <input> -inform DER -out <output>`.
#[derive(Debug, Clone)]
pub struct OpensslDecoder {
    program: PathBuf,
    timeout: Option<Duration>,
}

impl Default for OpensslDecoder {
    fn default() -> Self {
        Self::new("openssl", None)
    }
}

impl OpensslDecoder {
    pub fn new(program: impl Into<PathBuf>, timeout: Option<Duration>) -> Self {
        Self {
            program: program.into(),
            timeout,
        }
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }

    fn wait(&self, child: &mut std::process::Child) -> Result<ExitStatus, DecodeError> {
        let Some(timeout) = self.timeout else {
            return Ok(child.wait()?);
        };
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(DecodeError::TimedOut {
                    program: self.program_name(),
                    seconds: timeout.as_secs(),
                });
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

impl EnvelopeDecoder for OpensslDecoder {
    fn decode(&self, input: &Path, output: &Path) -> Result<(), DecodeError> {
        let mut child = Command::new(&self.program)
            .args(["smime", "-verify", "-noverify", "-in"])
            .arg(input)
            .args(["-inform", "DER", "-out"])
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| DecodeError::Spawn {
                program: self.program_name(),
                source,
            })?;

        // stderr is drained while waiting, not after.
        let stderr = child.stderr.take();
        let reader = std::thread::spawn(move || {
            let mut text = String::new();
            if let Some(mut pipe) = stderr {
                let _ = pipe.read_to_string(&mut text);
            }
            text
        });

        let status = self.wait(&mut child)?;
        let diagnostics = reader.join().unwrap_or_default();
        if !status.success() {
            return Err(DecodeError::Failed {
                program: self.program_name(),
                status: status.to_string(),
                diagnostics: diagnostics.trim().to_string(),
            });
        }
        debug!("{}: {}", input.display(), diagnostics.trim());
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedConversion {
    pub file_path: String,
    pub file_name: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct UnwrapReport {
    /// Decoded files, in processing order.
    pub converted: Vec<PathBuf>,
    pub failures: Vec<FailedConversion>,
}

/// `IT01234567890_00001.xml.p7m` → `IT01234567890_00001.xml`.
pub fn decoded_file_name(name: &str) -> Option<String> {
    let stripped = name.replace(SIGNED_MARKER, "");
    if stripped.is_empty() || stripped == name {
        None
    } else {
        Some(stripped)
    }
}

/// Every file below `root` whose name contains [`SIGNED_MARKER`], sorted per directory.
pub fn discover_signed_files(root: &Path) -> AppResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file()
            && entry
                .file_name()
                .to_str()
                .map(|n| n.contains(SIGNED_MARKER))
                .unwrap_or(false)
        {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn unwrap_one(path: &Path, decoder: &dyn EnvelopeDecoder) -> Result<PathBuf, DecodeError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let output_name = decoded_file_name(&name).ok_or_else(|| DecodeError::OutputName(name.clone()))?;
    let output = path.with_file_name(output_name);

    if let Err(e) = decoder.decode(path, &output) {
        if output.exists() {
            let _ = fs::remove_file(&output);
        }
        return Err(e);
    }
    if let Err(e) = fs::remove_file(path) {
        warn!("Could not remove {} after decoding: {}", path.display(), e);
    }
    Ok(output)
}

/// Decode every signed envelope below `root` in place.
///
/// A failing entry is reported and skipped; the remaining entries are still processed.
pub fn unwrap_signed_files(root: &Path, decoder: &dyn EnvelopeDecoder) -> AppResult<UnwrapReport> {
    let mut report = UnwrapReport::default();
    for path in discover_signed_files(root)? {
        match unwrap_one(&path, decoder) {
            Ok(output) => {
                debug!("Decoded {} -> {}", path.display(), output.display());
                report.converted.push(output);
            }
            Err(e) => {
                warn!("Could not decode {}: {}", path.display(), e);
                report.failures.push(FailedConversion {
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
    info!(
        "Decoded {} signed file(s), {} failure(s)",
        report.converted.len(),
        report.failures.len()
    );
    Ok(report)
}

#[cfg(test)]
#[path = "tests/envelope_tests.rs"]
mod tests;
