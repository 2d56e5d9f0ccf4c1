//! Core data structures for the bag index.
//!
//! This module defines the types produced by a scan:
//! - Record operation codes
//! - Connections and their metadata
//! - Chunks, chunk info and per-connection index blocks
//! - The aggregate [`IndexModel`]

use std::fmt;

/// Operation code carried in the `op` field of every record header.
///
/// The value is a single raw byte rather than ASCII text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    Unset = 0x00,
    MessageData = 0x02,
    BagHeader = 0x03,
    IndexData = 0x04,
    Chunk = 0x05,
    ChunkInfo = 0x06,
    Connection = 0x07,
}

impl TryFrom<u8> for OpCode {
    /// The unrecognized byte is handed back so the caller can report it.
    type Error = u8;

    fn try_from(value: u8) -> std::result::Result<Self, u8> {
        match value {
            0x00 => Ok(Self::Unset),
            0x02 => Ok(Self::MessageData),
            0x03 => Ok(Self::BagHeader),
            0x04 => Ok(Self::IndexData),
            0x05 => Ok(Self::Chunk),
            0x06 => Ok(Self::ChunkInfo),
            0x07 => Ok(Self::Connection),
            other => Err(other),
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            OpCode::Unset => "UNSET",
            OpCode::MessageData => "MESSAGE_DATA",
            OpCode::BagHeader => "BAG_HEADER",
            OpCode::IndexData => "INDEX_DATA",
            OpCode::Chunk => "CHUNK",
            OpCode::ChunkInfo => "CHUNK_INFO",
            OpCode::Connection => "CONNECTION",
        };
        write!(f, "{}", name)
    }
}

/// Type metadata attached to a connection by its `CONNECTION` record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionData {
    /// Message type name, e.g. `std_msgs/String`.
    pub message_type: String,
    pub md5sum: String,
    /// Full text of the message definition the payloads were written with.
    pub message_definition: String,
    pub callerid: Option<String>,
    pub latching: Option<bool>,
}

/// A named, typed message stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Connection {
    /// 1-based connection id; equals this connection's slot in the table.
    pub id: u32,
    /// Empty until a `CONNECTION` record defines the slot.
    pub topic: String,
    pub data: ConnectionData,
    /// Index blocks in the order their `INDEX_DATA` records were read.
    pub blocks: Vec<IndexBlock>,
}

impl Connection {
    fn empty(id: u32) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Returns true once a `CONNECTION` record has populated this slot.
    pub fn is_defined(&self) -> bool {
        !self.topic.is_empty()
    }

    /// Total number of index entries across all blocks.
    pub fn num_entries(&self) -> usize {
        self.blocks.iter().map(|b| b.entries.len()).sum()
    }
}

/// Summary of a chunk, filled in by the matching `CHUNK_INFO` record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChunkInfo {
    pub start_time: u64,
    pub end_time: u64,
    pub message_count: u32,
}

/// A chunk record located during the scan.
///
/// The payload is kept opaque (it may be compressed); only its location and
/// the advisory header values are recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// File position of the `CHUNK` record itself.
    pub offset: u64,
    /// Compression scheme named in the chunk header (`none`, `bz2`, `lz4`).
    pub compression: String,
    /// Payload size after decompression.
    pub uncompressed_size: u32,
    /// Absolute file position of the (possibly compressed) payload.
    pub data_offset: u64,
    pub data_len: u32,
    pub info: ChunkInfo,
}

/// Stable handle to a chunk in an [`IndexModel`].
///
/// Handles are positions in the append-only chunk list, so they stay valid
/// however many chunks are appended afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChunkHandle(usize);

impl ChunkHandle {
    /// Position of the chunk in [`IndexModel::chunks`].
    pub fn index(self) -> usize {
        self.0
    }
}

/// One message recorded for a connection within a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry {
    /// Receive time in nanoseconds.
    pub time: i64,
    /// Offset of the message record within the decompressed chunk payload.
    pub offset: u32,
}

/// Per-connection, per-chunk index produced by an `INDEX_DATA` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexBlock {
    pub chunk: ChunkHandle,
    pub version: u32,
    pub entries: Vec<IndexEntry>,
}

/// The index built by a scan.
///
/// Mutated only while scanning; read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexModel {
    connections: Vec<Connection>,
    chunks: Vec<Chunk>,
    index_pos: u64,
}

impl IndexModel {
    /// The connection table, addressable by id. Slot 0 is never defined.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// File offset of the trailer index section.
    pub fn index_pos(&self) -> u64 {
        self.index_pos
    }

    /// Looks up a defined connection by id.
    pub fn connection(&self, id: u32) -> Option<&Connection> {
        self.connections
            .get(id as usize)
            .filter(|c| c.is_defined())
    }

    /// Returns the first defined connection publishing on `topic`.
    pub fn connection_by_topic(&self, topic: &str) -> Option<&Connection> {
        self.connections
            .iter()
            .find(|c| c.is_defined() && c.topic == topic)
    }

    pub fn chunk(&self, handle: ChunkHandle) -> Option<&Chunk> {
        self.chunks.get(handle.0)
    }

    /// Sum of the message counts reported by `CHUNK_INFO` records.
    pub fn message_count(&self) -> u64 {
        self.chunks.iter().map(|c| c.info.message_count as u64).sum()
    }

    /// Earliest start and latest end time over chunks that hold messages.
    pub fn time_range(&self) -> Option<(u64, u64)> {
        self.chunks
            .iter()
            .filter(|c| c.info.message_count > 0)
            .map(|c| (c.info.start_time, c.info.end_time))
            .reduce(|(start, end), (s, e)| (start.min(s), end.max(e)))
    }

    /// Sizes the connection table for ids `1..=conn_count` and reserves chunk storage.
    pub(crate) fn reset_tables(&mut self, conn_count: u32, chunk_capacity: usize, index_pos: u64) {
        self.connections = (0..=conn_count).map(Connection::empty).collect();
        self.chunks.reserve(chunk_capacity);
        self.index_pos = index_pos;
    }

    pub(crate) fn connection_mut(&mut self, id: u32) -> Option<&mut Connection> {
        self.connections.get_mut(id as usize)
    }

    /// Highest addressable connection id, or `None` before the table exists.
    pub(crate) fn max_connection_id(&self) -> Option<u32> {
        self.connections.len().checked_sub(1).map(|n| n as u32)
    }

    pub(crate) fn push_chunk(&mut self, chunk: Chunk) -> ChunkHandle {
        self.chunks.push(chunk);
        ChunkHandle(self.chunks.len() - 1)
    }

    pub(crate) fn last_chunk(&self) -> Option<ChunkHandle> {
        self.chunks.len().checked_sub(1).map(ChunkHandle)
    }

    pub(crate) fn chunk_at_mut(&mut self, offset: u64) -> Option<&mut Chunk> {
        self.chunks.iter_mut().find(|c| c.offset == offset)
    }
}
