//! Record framing.
//!
//! ```text
//! [4 bytes] header length H (little-endian u32)
//! [H bytes] header field block
//! [4 bytes] data length D (little-endian u32)
//! [D bytes] data
//! ```
//!
//! Records are returned as views into the underlying byte buffer; nothing is
//! copied, and every declared length is checked against the buffer bound
//! before a view is produced.

use log::trace;

use crate::bag::types::error::{BagError, Result};
use crate::bag::utils;

/// One framed record. Both views borrow from the mapped file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Record<'a> {
    /// Absolute position of the record's first byte.
    pub offset: u64,
    pub header: &'a [u8],
    /// Absolute position of the first byte of `data`.
    pub data_offset: u64,
    pub data: &'a [u8],
}

impl Record<'_> {
    pub fn data_len(&self) -> u32 {
        self.data.len() as u32
    }

    /// Absolute position just past the end of this record.
    pub fn end_offset(&self) -> u64 {
        self.data_offset + self.data.len() as u64
    }
}

/// A forward-only read position over a byte buffer.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor at `pos`, clamped to the end of the buffer.
    pub fn new(bytes: &'a [u8], pos: usize) -> Self {
        Self {
            bytes,
            pos: pos.min(bytes.len()),
        }
    }

    pub fn position(&self) -> u64 {
        self.pos as u64
    }

    pub fn is_at_end(&self) -> bool {
        self.pos == self.bytes.len()
    }

    /// Reads the record at the current position and advances past it.
    ///
    /// # Errors
    /// - [`BagError::CorruptFile`] if the buffer ends inside a length prefix.
    /// - [`BagError::CorruptRecord`] if a declared header or data length runs
    ///   past the end of the buffer.
    ///
    /// On error the cursor does not move.
    pub fn read_record(&mut self) -> Result<Record<'a>> {
        let offset = self.position();
        let bytes = self.bytes;
        let mut reader = &bytes[self.pos..];

        let header_len = utils::read_len_prefix(&mut reader).ok_or(BagError::CorruptFile { offset })?;
        let header = take_section(&mut reader, header_len, offset, "header")?;

        let data_len = utils::read_len_prefix(&mut reader).ok_or(BagError::CorruptFile {
            offset: offset + (utils::LEN_PREFIX_WIDTH + header.len()) as u64,
        })?;
        let data_offset = offset + (2 * utils::LEN_PREFIX_WIDTH + header.len()) as u64;
        let data = take_section(&mut reader, data_len, offset, "data")?;

        self.pos = bytes.len() - reader.len();
        trace!(
            "Record at {}: header {} bytes, data {} bytes",
            offset,
            header.len(),
            data.len()
        );

        Ok(Record {
            offset,
            header,
            data_offset,
            data,
        })
    }
}

fn take_section<'a>(reader: &mut &'a [u8], len: u32, offset: u64, section: &str) -> Result<&'a [u8]> {
    let available = reader.len();
    utils::take_bytes(reader, len as usize).ok_or_else(|| BagError::CorruptRecord {
        offset,
        reason: format!(
            "{} length {} exceeds the {} bytes remaining",
            section, len, available
        ),
    })
}
