//! Archive extraction for uploaded price lists
//!
//! Pulls the CSV payload out of an uploaded archive held in memory.
//!
//! # Supported Formats
//!
//! - **Zip** (`type=zip`): the first entry is the payload, whatever its name
//! - **Tar** (`type=tar`): the first regular file named `data.csv` or `test_data.csv` at the
//!   archive root (`./data.csv` counts, `nested/data.csv` does not)
//!
//! # Examples
//!
//! ```rust,ignore
//! use pricelist_server::ingest::archive::{extract, ArchiveKind};
//!
//! let kind: ArchiveKind = "tar".parse()?;
//! let csv_bytes = extract(&upload, kind)?;
//! ```

use std::io::{Cursor, Read};

use thiserror::Error;
use tracing::debug;

/// File names accepted as the payload inside a tar archive
pub const TAR_PAYLOAD_NAMES: &[&str] = &["data.csv", "test_data.csv"];

/// Errors raised while unpacking an upload
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Unsupported archive type '{0}', expected 'zip' or 'tar'")]
    UnsupportedKind(String),

    #[error("Archive contains no entries")]
    EmptyArchive,

    #[error("Archive has no data.csv or test_data.csv entry")]
    NoMatchingEntry,

    #[error("Archive could not be read: {0}")]
    CorruptArchive(String),
}

impl From<zip::result::ZipError> for ArchiveError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::CorruptArchive(err.to_string())
    }
}

impl From<std::io::Error> for ArchiveError {
    fn from(err: std::io::Error) -> Self {
        Self::CorruptArchive(err.to_string())
    }
}

/// Container format of an upload, taken from the `type` query parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArchiveKind {
    #[default]
    Zip,
    Tar,
}

impl ArchiveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveKind::Zip => "zip",
            ArchiveKind::Tar => "tar",
        }
    }
}

impl std::str::FromStr for ArchiveKind {
    type Err = ArchiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "zip" => Ok(ArchiveKind::Zip),
            "tar" => Ok(ArchiveKind::Tar),
            other => Err(ArchiveError::UnsupportedKind(other.to_string())),
        }
    }
}

impl std::fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extract the CSV payload from an archive
pub fn extract(data: &[u8], kind: ArchiveKind) -> Result<Vec<u8>, ArchiveError> {
    let payload = match kind {
        ArchiveKind::Zip => extract_zip(data)?,
        ArchiveKind::Tar => extract_tar(data)?,
    };
    debug!(kind = %kind, archive_bytes = data.len(), payload_bytes = payload.len(), "Extracted CSV payload");
    Ok(payload)
}

/// Read the first entry of a zip archive
///
/// The archive is assumed to be single-purpose, so the entry name is not checked.
pub fn extract_zip(data: &[u8]) -> Result<Vec<u8>, ArchiveError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data))?;

    if archive.is_empty() {
        return Err(ArchiveError::EmptyArchive);
    }

    let mut entry = archive.by_index(0)?;
    let mut contents = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut contents)?;
    debug!(entry = %entry.name(), bytes = contents.len(), "Read zip entry");
    Ok(contents)
}

/// Scan a tar archive for the payload entry
///
/// Non-regular entries (directories, links) are skipped. The whole entry name must match once
/// a leading `./` is stripped, so `./data.csv` qualifies and `export/data.csv` does not. The
/// first match wins.
pub fn extract_tar(data: &[u8]) -> Result<Vec<u8>, ArchiveError> {
    let mut archive = tar::Archive::new(Cursor::new(data));

    for entry in archive.entries()? {
        let mut entry = entry?;

        if !entry.header().entry_type().is_file() {
            continue;
        }

        let path = entry.path()?.to_string_lossy().into_owned();
        if !is_payload_name(&path) {
            debug!(%path, "Skipping tar entry");
            continue;
        }

        let mut contents = Vec::new();
        entry.read_to_end(&mut contents)?;
        debug!(%path, bytes = contents.len(), "Read tar entry");
        return Ok(contents);
    }

    Err(ArchiveError::NoMatchingEntry)
}

fn is_payload_name(path: &str) -> bool {
    let name = path.strip_prefix("./").unwrap_or(path);
    TAR_PAYLOAD_NAMES.contains(&name)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::io::{Cursor, Write};

    /// Build a zip archive from (name, contents) pairs
    pub fn zip_of(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        for (name, contents) in entries {
            writer.start_file(*name, options).unwrap();
            writer.write_all(contents).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    /// Build a tar archive from (path, contents) pairs; a trailing `/` makes a directory
    pub fn tar_of(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (path, contents) in entries {
            let mut header = tar::Header::new_gnu();
            if path.ends_with('/') {
                header.set_entry_type(tar::EntryType::Directory);
                header.set_size(0);
                header.set_mode(0o755);
                header.set_cksum();
                builder
                    .append_data(&mut header, path.trim_end_matches('/'), std::io::empty())
                    .unwrap();
            } else {
                header.set_entry_type(tar::EntryType::Regular);
                header.set_size(contents.len() as u64);
                header.set_mode(0o644);
                header.set_cksum();
                builder.append_data(&mut header, path, *contents).unwrap();
            }
        }
        builder.into_inner().unwrap()
    }
}
