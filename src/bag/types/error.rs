//! Custom error types for the bag-reader crate.

use thiserror::Error;

/// The primary error type for all operations in this crate.
///
/// Every variant is fatal: the scan stops and any partially built index must
/// be discarded. Recoverable conditions (a malformed `CONNECTION` record, an
/// unknown operation code) are logged and skipped instead of surfacing here.
#[derive(Debug, Error)]
pub enum BagError {
    /// An error originating from I/O operations (opening or mapping the file).
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    /// The preamble is not a supported bag preamble (bad magic, version or newline).
    #[error("Invalid bag format: {0}")]
    Format(String),

    /// A declared header or data length runs past the end of the mapped region.
    #[error("Corrupt record at offset {offset}: {reason}")]
    CorruptRecord { offset: u64, reason: String },

    /// A `name=value` field block is inconsistent with its enclosing span.
    #[error("Malformed field: {reason}")]
    MalformedField { reason: String },

    /// A structurally required field is absent.
    #[error("Missing required field '{name}'")]
    MissingField { name: String },

    /// A field is present but its value cannot be read as the requested type.
    #[error("Field '{name}' is not a valid {expected}")]
    FieldTypeError { name: String, expected: &'static str },

    /// An `INDEX_DATA` record references a connection outside the table.
    #[error("Connection id {conn} is out of range (table holds ids up to {limit})")]
    IndexOutOfRange { conn: u32, limit: u32 },

    /// An `INDEX_DATA` record arrived before any `CHUNK` record.
    #[error("Index data for connection {conn} precedes any chunk")]
    NoChunk { conn: u32 },

    /// A `CHUNK_INFO` record points at a position where no chunk was seen.
    #[error("No chunk found at position {chunk_pos}")]
    ChunkNotFound { chunk_pos: u64 },

    /// The record stream ends in the middle of a record.
    #[error("Corrupt file: record stream truncated at offset {offset}")]
    CorruptFile { offset: u64 },

    /// A second `BAG_HEADER` record was found.
    #[error("Duplicate bag header record at offset {offset}")]
    DuplicateBagHeader { offset: u64 },
}

/// A convenience `Result` type alias using the crate's `BagError` type.
pub type Result<T> = std::result::Result<T, BagError>;
