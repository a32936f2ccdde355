//! Uploaded source archives.
//!
//! Wraps the `zip` reader so the rest of the pipeline only sees an
//! ordered list of entry names and an on-demand byte reader.

pub mod paths;

use std::io::{Cursor, Read};

use indexmap::IndexMap;
use thiserror::Error;

/// Errors while reading an archive.
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("invalid zip archive: {0}")]
    Invalid(#[from] zip::result::ZipError),

    #[error("archive entry not found: {0}")]
    MissingEntry(String),

    #[error("failed to read archive entry {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
}

/// How many raw bytes are read per output byte of the per-file ceiling.
/// Comment stripping and whitespace collapsing shrink text before the
/// ceiling applies, so the read allows some headroom.
pub const READ_HEADROOM: usize = 4;

/// Anything that can hand out the raw bytes of an entry by path.
pub trait EntrySource {
    /// Read at most `limit` bytes of the entry at `path`.
    fn read_entry(&mut self, path: &str, limit: usize) -> Result<Vec<u8>, ArchiveError>;
}

/// An in-memory ZIP archive.
pub struct SourceArchive {
    zip: zip::ZipArchive<Cursor<Vec<u8>>>,
    names: Vec<String>,
}

impl SourceArchive {
    /// Open an archive from its raw bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ArchiveError> {
        let mut zip = zip::ZipArchive::new(Cursor::new(bytes))?;
        let mut names = Vec::with_capacity(zip.len());
        for idx in 0..zip.len() {
            let entry = zip.by_index(idx)?;
            if !entry.is_dir() {
                names.push(entry.name().to_string());
            }
        }
        Ok(Self { zip, names })
    }

    /// File entry names in archive enumeration order.
    pub fn file_names(&self) -> &[String] {
        &self.names
    }
}

impl EntrySource for SourceArchive {
    fn read_entry(&mut self, path: &str, limit: usize) -> Result<Vec<u8>, ArchiveError> {
        let file = match self.zip.by_name(path) {
            Ok(f) => f,
            Err(zip::result::ZipError::FileNotFound) => {
                return Err(ArchiveError::MissingEntry(path.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        // Header sizes are untrusted; only the bounded reader decides.
        let mut buf = Vec::new();
        file.take(limit as u64)
            .read_to_end(&mut buf)
            .map_err(|source| ArchiveError::Read {
                path: path.to_string(),
                source,
            })?;
        Ok(buf)
    }
}

/// Path → bytes maps double as sources (dry runs and tests).
impl EntrySource for IndexMap<String, Vec<u8>> {
    fn read_entry(&mut self, path: &str, limit: usize) -> Result<Vec<u8>, ArchiveError> {
        self.get(path)
            .map(|bytes| bytes[..bytes.len().min(limit)].to_vec())
            .ok_or_else(|| ArchiveError::MissingEntry(path.to_string()))
    }
}
