//! Byte sources a bag can be read from.

use std::fs::File;
use std::path::Path;
use log::debug;
use memmap2::Mmap;

use super::types::error::Result;

/// A read-only, contiguous view of a whole bag file.
///
/// Record views produced during a scan borrow from this view, so they cannot
/// outlive the source.
pub trait ByteSource {
    fn bytes(&self) -> &[u8];

    fn len(&self) -> usize {
        self.bytes().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ByteSource for Mmap {
    fn bytes(&self) -> &[u8] {
        self
    }
}

impl ByteSource for Vec<u8> {
    fn bytes(&self) -> &[u8] {
        self
    }
}

impl ByteSource for &[u8] {
    fn bytes(&self) -> &[u8] {
        self
    }
}

/// Maps a file read-only.
pub fn map_file(path: &Path) -> Result<Mmap> {
    let file = File::open(path)?;
    // The mapping is only ever read; the file must not be truncated while mapped.
    let mmap = unsafe { Mmap::map(&file)? };
    debug!("Mapped {} ({} bytes)", path.display(), mmap.len());
    Ok(mmap)
}
