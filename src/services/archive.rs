//! ZIP extraction and packaging.

use log::{debug, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::error::AppResult;

/// Decompress every entry of `archive_path` into `dest`, preserving relative paths.
///
/// Any previous content of `dest` is removed first. Entries whose names would
/// land outside `dest` are skipped. Returns the number of files written.
pub fn extract_zip(archive_path: &Path, dest: &Path) -> AppResult<usize> {
    if dest.exists() {
        fs::remove_dir_all(dest)?;
    }
    fs::create_dir_all(dest)?;

    let file = fs::File::open(archive_path)?;
    let mut archive = ZipArchive::new(file)?;

    let mut count = 0usize;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let Some(rel) = entry.enclosed_name() else {
            warn!("Skipping unsafe archive entry: {}", entry.name());
            continue;
        };
        let output_path = dest.join(rel);

        if entry.is_dir() {
            fs::create_dir_all(&output_path)?;
            continue;
        }
        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut outfile = fs::File::create(&output_path)?;
        io::copy(&mut entry, &mut outfile)?;
        count += 1;
    }
    debug!(
        "Extracted {} file(s) from {} into {}",
        count,
        archive_path.display(),
        dest.display()
    );
    Ok(count)
}

/// Path of `file` relative to `root` with forward slashes, as stored in an archive.
pub fn archive_name(root: &Path, file: &Path) -> String {
    let rel = file.strip_prefix(root).unwrap_or(file);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Package `files` into a new archive at `out`, each stored relative to `root`.
pub fn write_zip(root: &Path, files: &[PathBuf], out: &Path) -> AppResult<()> {
    if let Some(parent) = out.parent() {
        fs::create_dir_all(parent)?;
    }
    let out_file = fs::File::create(out)?;
    let mut zip_writer = ZipWriter::new(out_file);
    let opts = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for file in files {
        let name = archive_name(root, file);
        zip_writer.start_file(name, opts)?;
        let mut input = fs::File::open(file)?;
        io::copy(&mut input, &mut zip_writer)?;
    }
    zip_writer.finish()?;
    Ok(())
}
