//! File format parsing layer for bag files.
//!
//! This module provides the parsing layer between the raw mapped bytes and
//! the high-level [`OpenBag`](crate::bag::reader::OpenBag).
//!
//! # Module Organization
//!
//! - [`preamble`]: Validates the magic and version line
//! - [`record`]: Frames length-prefixed records without copying
//! - [`fields`]: Decodes `name=value` field blocks
//! - [`scan`]: Dispatches records by operation code and builds the index
//!
//! # Architecture
//!
//! ```text
//! File Structure:
//! ┌─────────────────┐
//! │  Preamble       │ ← preamble::validate()
//! ├─────────────────┤
//! │  Bag header     │
//! │  Chunk          │ ← record::Cursor::read_record()
//! │  Index data     │   fields::decode()
//! │  ...            │   scan::scan()
//! │  Connections    │
//! │  Chunk infos    │
//! └─────────────────┘
//! ```

pub mod fields;
pub mod preamble;
pub mod record;
pub mod scan;
