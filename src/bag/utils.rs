//! Low-level byte reading utilities

use std::str::FromStr;
use byteorder::{LittleEndian, ReadBytesExt};

/// Width of every length prefix in the record stream.
pub const LEN_PREFIX_WIDTH: usize = 4;

/// Read a 4-byte little-endian length prefix, advancing the reader.
///
/// Returns `None` if fewer than four bytes remain; the reader is left untouched then.
pub fn read_len_prefix(reader: &mut &[u8]) -> Option<u32> {
    if reader.len() < LEN_PREFIX_WIDTH {
        return None;
    }
    reader.read_u32::<LittleEndian>().ok()
}

/// Split `len` bytes off the front of the reader without copying.
///
/// Returns `None` (reader untouched) if fewer than `len` bytes remain.
pub fn take_bytes<'a>(reader: &mut &'a [u8], len: usize) -> Option<&'a [u8]> {
    if reader.len() < len {
        return None;
    }
    let (head, tail) = reader.split_at(len);
    *reader = tail;
    Some(head)
}

/// Parse an ASCII decimal value such as `"42"`.
pub fn parse_decimal<T: FromStr>(bytes: &[u8]) -> Option<T> {
    std::str::from_utf8(bytes).ok()?.parse().ok()
}
