//! Per-run scratch directory.
//!
//! Every uploaded archive gets its own directory, removed when the
//! [`Workspace`] is dropped, so two runs never share extracted files.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::error::AppResult;

const PREFIX: &str = "fattura-xml-";
const EXTRACTED_DIR: &str = "extracted";

#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Create a fresh workspace under `parent`, or the system temp dir when `None`.
    pub fn create(parent: Option<&Path>) -> AppResult<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(PREFIX);
        let dir = match parent {
            Some(parent) => {
                std::fs::create_dir_all(parent)?;
                builder.tempdir_in(parent)?
            }
            None => builder.tempdir()?,
        };
        log::debug!("Workspace created at {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Where archive contents are unpacked.
    pub fn extraction_dir(&self) -> PathBuf {
        self.dir.path().join(EXTRACTED_DIR)
    }
}
