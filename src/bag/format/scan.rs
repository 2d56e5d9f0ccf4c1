//! # Record Dispatch
//!
//! A single forward pass over the record stream. Each record's header is
//! decoded, its operation code classified, and the matching handler folds the
//! record into the [`IndexModel`].
//!
//! Handlers report one of two outcomes: the record was applied, or it was
//! skipped. Any `Err` aborts the whole scan.

use byteorder::{LittleEndian, ReadBytesExt};
use log::{debug, info, warn};

use crate::bag::format::fields::{self, Fields};
use crate::bag::format::record::{Cursor, Record};
use crate::bag::types::error::{BagError, Result};
use crate::bag::types::models::{Chunk, ChunkInfo, ConnectionData, IndexBlock, IndexEntry, IndexModel, OpCode};

/// Size of one `INDEX_DATA` entry: 8-byte time + 4-byte offset.
pub const INDEX_ENTRY_LEN: usize = 12;

/// Smallest possible record: two empty length-prefixed sections.
const MIN_RECORD_LEN: usize = 8;

/// Smallest `CONNECTION` record that defines a slot: the two section prefixes,
/// a header holding `op`, a one-digit `conn` and a one-byte `topic`, and a body
/// holding empty `type`, `md5sum` and `message_definition` fields.
const MIN_CONNECTION_RECORD_LEN: usize = 8 + (4 + 4) + (4 + 6) + (4 + 7) + (4 + 5) + (4 + 7) + (4 + 19);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Applied,
    Skipped,
}

/// Scans the record stream of `bytes` starting at `start` and builds the index.
///
/// `start` is normally the offset returned by preamble validation. The scan
/// succeeds only if the last record ends exactly at the end of `bytes`.
pub fn scan(bytes: &[u8], start: usize) -> Result<IndexModel> {
    info!("Scanning records from offset {} ({} bytes)", start, bytes.len());

    let mut cursor = Cursor::new(bytes, start);
    let mut scanner = Scanner::new(bytes.len());

    while !cursor.is_at_end() {
        let record = cursor.read_record()?;
        scanner.dispatch(&record)?;
    }

    let model = scanner.finish();
    info!(
        "Scan complete: {} connections defined, {} chunks, index at {}",
        model.connections().iter().filter(|c| c.is_defined()).count(),
        model.chunks().len(),
        model.index_pos()
    );
    Ok(model)
}

struct Scanner {
    model: IndexModel,
    file_len: usize,
    seen_bag_header: bool,
    applied: u64,
    skipped: u64,
}

impl Scanner {
    fn new(file_len: usize) -> Self {
        Self {
            model: IndexModel::default(),
            file_len,
            seen_bag_header: false,
            applied: 0,
            skipped: 0,
        }
    }

    fn finish(self) -> IndexModel {
        debug!("{} records applied, {} skipped", self.applied, self.skipped);
        self.model
    }

    fn dispatch(&mut self, record: &Record) -> Result<()> {
        let header = fields::decode(record.header)?;
        let outcome = match OpCode::try_from(header.op()?) {
            Ok(op) => {
                debug!("Record at {}: {}", record.offset, op);
                match op {
                    OpCode::BagHeader => self.on_bag_header(record, &header)?,
                    OpCode::Chunk => self.on_chunk(record, &header)?,
                    OpCode::IndexData => self.on_index_data(record, &header)?,
                    OpCode::Connection => self.on_connection(record, &header)?,
                    OpCode::MessageData => Outcome::Applied,
                    OpCode::ChunkInfo => self.on_chunk_info(&header)?,
                    OpCode::Unset => {
                        warn!("Skipping record at {} with unset operation code", record.offset);
                        Outcome::Skipped
                    }
                }
            }
            Err(byte) => {
                warn!("Skipping record at {} with unknown operation code {:#04x}", record.offset, byte);
                Outcome::Skipped
            }
        };

        match outcome {
            Outcome::Applied => self.applied += 1,
            Outcome::Skipped => self.skipped += 1,
        }
        Ok(())
    }

    fn on_bag_header(&mut self, record: &Record, header: &Fields) -> Result<Outcome> {
        if self.seen_bag_header {
            return Err(BagError::DuplicateBagHeader { offset: record.offset });
        }

        let conn_count = header.get_u32("conn_count")?;
        let chunk_count = header.get_u32("chunk_count")?;
        let index_pos = header.get_u64("index_pos")?;

        // Each connection slot needs a CONNECTION record of its own.
        let max_connections = self.file_len / MIN_CONNECTION_RECORD_LEN;
        if conn_count as usize > max_connections {
            return Err(BagError::CorruptRecord {
                offset: record.offset,
                reason: format!(
                    "conn_count {} exceeds the {} connection records a {}-byte file can hold",
                    conn_count, max_connections, self.file_len
                ),
            });
        }

        info!(
            "Bag header: {} connections, {} chunks, index at {}",
            conn_count, chunk_count, index_pos
        );
        self.model
            .reset_tables(conn_count, (chunk_count as usize).min(self.file_len / MIN_RECORD_LEN), index_pos);
        self.seen_bag_header = true;
        Ok(Outcome::Applied)
    }

    fn on_chunk(&mut self, record: &Record, header: &Fields) -> Result<Outcome> {
        let compression = header
            .get_optional_string("compression")?
            .unwrap_or_else(|| "none".to_string());
        let uncompressed_size = if header.contains("size") {
            header.get_u32("size")?
        } else {
            record.data_len()
        };

        let handle = self.model.push_chunk(Chunk {
            offset: record.offset,
            compression,
            uncompressed_size,
            data_offset: record.data_offset,
            data_len: record.data_len(),
            info: ChunkInfo::default(),
        });
        debug!(
            "Chunk #{} at {}: {} payload bytes",
            handle.index(),
            record.offset,
            record.data_len()
        );
        Ok(Outcome::Applied)
    }

    fn on_index_data(&mut self, record: &Record, header: &Fields) -> Result<Outcome> {
        let version = header.get_u32("ver")?;
        let conn = header.get_u32("conn")?;
        let count = header.get_u32("count")?;

        let limit = match self.model.max_connection_id() {
            Some(limit) if conn <= limit => limit,
            limit => {
                return Err(BagError::IndexOutOfRange {
                    conn,
                    limit: limit.unwrap_or(0),
                })
            }
        };
        let chunk = self.model.last_chunk().ok_or(BagError::NoChunk { conn })?;

        let entries = read_index_entries(record, count)?;
        debug!(
            "Index block v{} for connection {}: {} entries into chunk #{}",
            version,
            conn,
            entries.len(),
            chunk.index()
        );

        let connection = self
            .model
            .connection_mut(conn)
            .ok_or(BagError::IndexOutOfRange { conn, limit })?;
        connection.blocks.push(IndexBlock {
            chunk,
            version,
            entries,
        });
        Ok(Outcome::Applied)
    }

    fn on_connection(&mut self, record: &Record, header: &Fields) -> Result<Outcome> {
        let id = header.get_u32("conn").ok();
        let topic = header.get_str("topic").ok().filter(|t| !t.is_empty());

        let limit = self.model.max_connection_id();
        let (conn, topic) = match (id, topic, limit) {
            (Some(conn), Some(topic), Some(limit)) if conn >= 1 && conn <= limit => (conn, topic),
            _ => {
                warn!(
                    "Skipping connection record at {}: id {:?} topic {:?}",
                    record.offset,
                    header.get("conn").map(String::from_utf8_lossy),
                    header.get("topic").map(String::from_utf8_lossy)
                );
                return Ok(Outcome::Skipped);
            }
        };

        let body = fields::decode(record.data)?;
        let data = ConnectionData {
            message_type: body.get_string("type")?,
            md5sum: body.get_string("md5sum")?,
            message_definition: body.get_string("message_definition")?,
            callerid: body.get_optional_string("callerid")?,
            latching: if body.contains("latching") {
                Some(body.get_bool("latching")?)
            } else {
                None
            },
        };

        let Some(connection) = self.model.connection_mut(conn) else {
            return Ok(Outcome::Skipped);
        };
        if connection.is_defined() {
            debug!("Connection {} redefined (was {:?})", conn, connection.topic);
        }
        debug!("Connection {}: {} [{}]", conn, topic, data.message_type);
        connection.topic = topic.to_string();
        connection.data = data;
        Ok(Outcome::Applied)
    }

    fn on_chunk_info(&mut self, header: &Fields) -> Result<Outcome> {
        let version = header.get_u32("ver")?;
        let chunk_pos = header.get_u64("chunk_pos")?;
        let start_time = header.get_u64("start_time")?;
        let end_time = header.get_u64("end_time")?;
        let count = header.get_u32("count")?;

        let chunk = self
            .model
            .chunk_at_mut(chunk_pos)
            .ok_or(BagError::ChunkNotFound { chunk_pos })?;
        debug!(
            "Chunk info v{} for chunk at {}: {} messages in [{}, {}]",
            version, chunk_pos, count, start_time, end_time
        );
        chunk.info = ChunkInfo {
            start_time,
            end_time,
            message_count: count,
        };
        Ok(Outcome::Applied)
    }
}

/// Reads exactly `count` fixed-size entries from an `INDEX_DATA` data span.
fn read_index_entries(record: &Record, count: u32) -> Result<Vec<IndexEntry>> {
    let fits = (count as usize)
        .checked_mul(INDEX_ENTRY_LEN)
        .is_some_and(|needed| needed <= record.data.len());
    if !fits {
        return Err(BagError::CorruptRecord {
            offset: record.offset,
            reason: format!(
                "{} index entries do not fit in {} data bytes",
                count,
                record.data.len()
            ),
        });
    }

    let mut reader = record.data;
    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let time = reader.read_i64::<LittleEndian>()?;
        let offset = reader.read_u32::<LittleEndian>()?;
        entries.push(IndexEntry { time, offset });
    }
    Ok(entries)
}
