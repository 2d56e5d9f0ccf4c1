//! Core bag reader module

pub mod format;
pub mod reader;
pub mod source;
pub mod types;
mod utils;

use std::path::Path;

pub use reader::OpenBag;
pub use types::error::{BagError, Result};

/// Open a bag file and validate its preamble.
///
/// Shorthand for [`OpenBag::open`].
pub fn open(path: impl AsRef<Path>) -> Result<OpenBag> {
    OpenBag::open(path)
}
