//! Zip container for exported variants.
//!
//! Entries are Deflate-compressed and stamped with a fixed modification time
//! (1980-01-01, the zip epoch), so the same entries always produce the same
//! archive bytes.

use std::fs;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use thiserror::Error;
use tracing::warn;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipArchive, ZipWriter};

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// One file inside the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: String,
    pub bytes: Vec<u8>,
}

impl ArchiveEntry {
    pub fn new(path: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            bytes,
        }
    }
}

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
}

/// Collapse repeated paths: the last bytes win, the first position is kept.
fn dedup_entries(entries: &[ArchiveEntry]) -> Vec<&ArchiveEntry> {
    let mut out: Vec<&ArchiveEntry> = Vec::with_capacity(entries.len());
    for entry in entries {
        match out.iter_mut().find(|e| e.path == entry.path) {
            Some(slot) => {
                warn!(path = %entry.path, "duplicate archive entry, keeping the later one");
                *slot = entry;
            }
            None => out.push(entry),
        }
    }
    out
}

/// Build a zip archive in memory.
pub fn write_archive(entries: &[ArchiveEntry]) -> Result<Vec<u8>, ArchiveError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = entry_options();

    for entry in dedup_entries(entries) {
        zip.start_file(entry.path.as_str(), options)?;
        zip.write_all(&entry.bytes)?;
    }

    Ok(zip.finish()?.into_inner())
}

/// Read every entry back, in archive order.
pub fn read_entries(bytes: &[u8]) -> Result<Vec<ArchiveEntry>, ArchiveError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut entries = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let mut bytes = Vec::with_capacity(file.size() as usize);
        file.read_to_end(&mut bytes)?;
        entries.push(ArchiveEntry::new(file.name(), bytes));
    }
    Ok(entries)
}

/// Write archive bytes to `path` without clobbering an existing archive on
/// failure: the bytes land in a sibling `.partial` file first, then replace
/// `path` in one rename.
pub fn persist(path: &Path, bytes: &[u8]) -> Result<(), ArchiveError> {
    let mut partial = path.as_os_str().to_owned();
    partial.push(".partial");
    let partial = Path::new(&partial);

    fs::write(partial, bytes)?;
    if let Err(e) = fs::rename(partial, path) {
        let _ = fs::remove_file(partial);
        return Err(e.into());
    }
    Ok(())
}
