use std::path::{Path, PathBuf};
use log::info;
use memmap2::Mmap;

use super::format::{preamble, scan};
use super::source::{self, ByteSource};
use super::types::error::Result;
use super::types::models::IndexModel;

/// An opened bag whose preamble has been validated.
///
/// Owns the byte source (a read-only memory map when opened from a path);
/// dropping the `OpenBag` releases it.
#[derive(Debug)]
pub struct OpenBag<S: ByteSource = Mmap> {
    source: S,
    path: Option<PathBuf>,
    first_record: usize,
}

impl OpenBag<Mmap> {
    /// Open a bag file from the given path.
    ///
    /// # Errors
    /// Returns an error if:
    /// - File cannot be opened or mapped
    /// - The magic string does not match
    /// - The version is not 2.0
    /// - The version line is not terminated by a newline
    ///
    /// On error the mapping is released before returning.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening bag file: {}", path.display());
        let mmap = source::map_file(path)?;

        let mut bag = Self::from_source(mmap)?;
        bag.path = Some(path.to_path_buf());
        Ok(bag)
    }
}

impl<S: ByteSource> OpenBag<S> {
    /// Validate the preamble of an in-memory or otherwise pre-loaded source.
    pub fn from_source(source: S) -> Result<Self> {
        let first_record = preamble::validate(source.bytes())?;
        Ok(Self {
            source,
            path: None,
            first_record,
        })
    }

    /// Scan every record after the preamble and build the index.
    ///
    /// Any error aborts the scan; no partial index is returned.
    pub fn scan(&self) -> Result<IndexModel> {
        scan::scan(self.source.bytes(), self.first_record)
    }

    /// The whole file, preamble included.
    pub fn bytes(&self) -> &[u8] {
        self.source.bytes()
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Offset of the first record, just past the preamble.
    pub fn first_record_offset(&self) -> usize {
        self.first_record
    }

    /// Path the bag was opened from, if it came from a file.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Release the underlying source now rather than at end of scope.
    pub fn close(self) {
        if let Some(path) = &self.path {
            info!("Closing bag file: {}", path.display());
        }
    }
}
