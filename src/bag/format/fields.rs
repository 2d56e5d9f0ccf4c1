//! Decoding of length-prefixed `name=value` field blocks.
//!
//! Both record headers and the data body of `CONNECTION` records are encoded
//! as a sequence of fields:
//!
//! ```text
//! [4 bytes] field length N (little-endian u32)
//! [N bytes] name '=' value
//! ```
//!
//! Names are ASCII text. Values are kept as raw bytes because the `op` field
//! holds a single binary byte; the typed accessors interpret everything else
//! as ASCII text.

use std::collections::HashMap;
use std::str::FromStr;
use byteorder::{ByteOrder, LittleEndian};
use log::trace;

use crate::bag::types::error::{BagError, Result};
use crate::bag::utils;

/// Name of the field carrying the record operation code.
pub const OP_FIELD: &str = "op";

/// A decoded field block. Names and values borrow from the source span.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields<'a> {
    map: HashMap<&'a str, &'a [u8]>,
}

/// Decodes a field block.
///
/// Duplicate names are resolved in favour of the last occurrence, except
/// `op`, which may appear at most once.
///
/// # Errors
/// [`BagError::MalformedField`] if a length prefix is truncated, a declared
/// length runs past the span, a field has no `=` separator, a name is not
/// NUL-free UTF-8, or `op` is repeated.
pub fn decode(span: &[u8]) -> Result<Fields<'_>> {
    let mut reader = span;
    let mut map = HashMap::new();

    while !reader.is_empty() {
        let field_start = span.len() - reader.len();
        let field_len = utils::read_len_prefix(&mut reader).ok_or_else(|| BagError::MalformedField {
            reason: format!(
                "truncated length prefix at byte {} of a {}-byte field block",
                field_start,
                span.len()
            ),
        })?;
        let field = utils::take_bytes(&mut reader, field_len as usize).ok_or_else(|| {
            BagError::MalformedField {
                reason: format!(
                    "field at byte {} declares {} bytes but only {} remain",
                    field_start,
                    field_len,
                    reader.len()
                ),
            }
        })?;

        let sep = field
            .iter()
            .position(|&b| b == b'=')
            .ok_or_else(|| BagError::MalformedField {
                reason: format!("field at byte {} has no '=' separator", field_start),
            })?;
        let (name, value) = (&field[..sep], &field[sep + 1..]);
        if name.contains(&0) {
            return Err(BagError::MalformedField {
                reason: format!("field name at byte {} contains a NUL byte", field_start),
            });
        }
        let name = std::str::from_utf8(name).map_err(|_| BagError::MalformedField {
            reason: format!("field name at byte {} is not valid UTF-8", field_start),
        })?;

        trace!("Field '{}' ({} value bytes)", name, value.len());
        if map.insert(name, value).is_some() && name == OP_FIELD {
            return Err(BagError::MalformedField {
                reason: format!("field block repeats '{}' at byte {}", OP_FIELD, field_start),
            });
        }
    }

    Ok(Fields { map })
}

/// Encodes fields into the on-disk block layout, in iteration order.
///
/// # Errors
/// [`BagError::MalformedField`] if a name contains `=` or NUL, or a field is
/// longer than a length prefix can express.
pub fn encode<'b, I>(fields: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = (&'b str, &'b [u8])>,
{
    let mut out = Vec::new();
    for (name, value) in fields {
        if name.contains(['=', '\0']) {
            return Err(BagError::MalformedField {
                reason: format!("field name {:?} contains '=' or NUL", name),
            });
        }
        let field_len = u32::try_from(name.len() + 1 + value.len()).map_err(|_| {
            BagError::MalformedField {
                reason: format!("field '{}' is too long to encode", name),
            }
        })?;

        let mut prefix = [0u8; utils::LEN_PREFIX_WIDTH];
        LittleEndian::write_u32(&mut prefix, field_len);
        out.extend_from_slice(&prefix);
        out.extend_from_slice(name.as_bytes());
        out.push(b'=');
        out.extend_from_slice(value);
    }
    Ok(out)
}

impl<'a> Fields<'a> {
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// Raw value bytes of a field, if present.
    pub fn get(&self, name: &str) -> Option<&'a [u8]> {
        self.map.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a str, &'a [u8])> + '_ {
        self.map.iter().map(|(name, value)| (*name, *value))
    }

    /// The record operation code byte.
    ///
    /// # Errors
    /// [`BagError::MissingField`] if there is no `op` field,
    /// [`BagError::FieldTypeError`] if its value is not exactly one byte.
    pub fn op(&self) -> Result<u8> {
        match self.require(OP_FIELD)? {
            [byte] => Ok(*byte),
            _ => Err(type_error(OP_FIELD, "single-byte operation code")),
        }
    }

    pub fn get_str(&self, name: &str) -> Result<&'a str> {
        let value = self.require(name)?;
        std::str::from_utf8(value).map_err(|_| type_error(name, "UTF-8 string"))
    }

    pub fn get_string(&self, name: &str) -> Result<String> {
        self.get_str(name).map(str::to_owned)
    }

    /// Like [`Fields::get_string`], but an absent field yields `None`.
    pub fn get_optional_string(&self, name: &str) -> Result<Option<String>> {
        if self.contains(name) {
            self.get_string(name).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn get_u32(&self, name: &str) -> Result<u32> {
        self.get_number(name, "unsigned 32-bit integer")
    }

    pub fn get_u64(&self, name: &str) -> Result<u64> {
        self.get_number(name, "unsigned 64-bit integer")
    }

    pub fn get_i64(&self, name: &str) -> Result<i64> {
        self.get_number(name, "signed 64-bit integer")
    }

    /// Reads a flag: `"1"` is true, any other value is false.
    pub fn get_bool(&self, name: &str) -> Result<bool> {
        Ok(self.require(name)? == b"1")
    }

    fn get_number<T: FromStr>(&self, name: &str, expected: &'static str) -> Result<T> {
        let value = self.require(name)?;
        utils::parse_decimal(value).ok_or_else(|| type_error(name, expected))
    }

    fn require(&self, name: &str) -> Result<&'a [u8]> {
        self.get(name).ok_or_else(|| BagError::MissingField {
            name: name.to_string(),
        })
    }
}

fn type_error(name: &str, expected: &'static str) -> BagError {
    BagError::FieldTypeError {
        name: name.to_string(),
        expected,
    }
}
