//! # bag-reader
//!
//! A reader for ROS bag files (format version 2.0).
//! Validates the preamble and scans the record stream into an index of
//! connections, chunks and per-connection index blocks, without decoding
//! message payloads.
//!
//! **Note:** Chunk payloads are left opaque; decompression and message
//! retrieval are up to the consumer of the index.
pub mod bag;

// Re-export the main types for convenience
pub use bag::{
    open,
    OpenBag,
    BagError,
    Result,
    source::ByteSource,
    types::models::{
        Chunk,
        ChunkHandle,
        ChunkInfo,
        Connection,
        ConnectionData,
        IndexBlock,
        IndexEntry,
        IndexModel,
        OpCode,
    },
};
