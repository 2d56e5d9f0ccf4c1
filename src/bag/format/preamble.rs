//! Bag preamble validation.
//!
//! # Preamble Structure
//! ```text
//! [9 bytes] magic "#ROSBAG V"
//! [3 bytes] version, only "2.0" is supported
//! [1 byte]  '\n'
//! ```

use log::{debug, trace};

use crate::bag::types::error::{BagError, Result};

pub const MAGIC: &[u8] = b"#ROSBAG V";
pub const SUPPORTED_VERSION: &[u8; 3] = b"2.0";

/// Total preamble length; the first record starts here.
pub const PREAMBLE_LEN: usize = MAGIC.len() + SUPPORTED_VERSION.len() + 1;

/// Validates the preamble at the start of `bytes`.
///
/// Returns the offset of the first record.
pub fn validate(bytes: &[u8]) -> Result<usize> {
    let magic = bytes.get(..MAGIC.len()).unwrap_or(bytes);
    if magic != MAGIC {
        return Err(BagError::Format(format!(
            "this doesn't appear to be a bag file (magic {:?})",
            String::from_utf8_lossy(magic)
        )));
    }

    let version = bytes
        .get(MAGIC.len()..MAGIC.len() + SUPPORTED_VERSION.len())
        .ok_or_else(|| BagError::Format("file ends inside the version string".to_string()))?;
    trace!("Bag version token: {:?}", String::from_utf8_lossy(version));
    if version != SUPPORTED_VERSION {
        return Err(BagError::Format(format!(
            "unsupported bag file version {:?}, only 2.0 is supported",
            String::from_utf8_lossy(version)
        )));
    }

    if bytes.get(PREAMBLE_LEN - 1) != Some(&b'\n') {
        return Err(BagError::Format(
            "no newline after the version string, the file may be corrupted".to_string(),
        ));
    }

    debug!("Preamble valid, first record at offset {}", PREAMBLE_LEN);
    Ok(PREAMBLE_LEN)
}
