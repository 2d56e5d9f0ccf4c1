//! Synthetic bag construction shared by the integration tests.

#![allow(dead_code)]

use bag_reader::bag::format::fields;
use bag_reader::OpCode;

pub const PREAMBLE: &[u8] = b"#ROSBAG V2.0\n";

/// Writes a bag byte-by-byte. Record-writing methods return the offset of
/// the record they wrote.
pub struct BagBuilder {
    bytes: Vec<u8>,
}

impl BagBuilder {
    pub fn new() -> Self {
        Self {
            bytes: PREAMBLE.to_vec(),
        }
    }

    pub fn position(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn raw_record(&mut self, header: &[u8], data: &[u8]) -> u64 {
        let offset = self.position();
        self.bytes.extend_from_slice(&(header.len() as u32).to_le_bytes());
        self.bytes.extend_from_slice(header);
        self.bytes.extend_from_slice(&(data.len() as u32).to_le_bytes());
        self.bytes.extend_from_slice(data);
        offset
    }

    pub fn record(&mut self, op: OpCode, header: &[(&str, String)], data: &[u8]) -> u64 {
        self.raw_record(&header_bytes(op as u8, header), data)
    }

    pub fn bag_header(&mut self, conn_count: u32, chunk_count: u32, index_pos: u64) -> u64 {
        self.record(
            OpCode::BagHeader,
            &[
                ("conn_count", conn_count.to_string()),
                ("chunk_count", chunk_count.to_string()),
                ("index_pos", index_pos.to_string()),
            ],
            &[],
        )
    }

    pub fn chunk(&mut self, compression: &str, payload: &[u8]) -> u64 {
        self.record(
            OpCode::Chunk,
            &[
                ("compression", compression.to_string()),
                ("size", payload.len().to_string()),
            ],
            payload,
        )
    }

    pub fn connection(&mut self, conn: u32, topic: &str, body: &[(&str, &str)]) -> u64 {
        let body: Vec<(&str, &[u8])> = body.iter().map(|(n, v)| (*n, v.as_bytes())).collect();
        let data = fields::encode(body).expect("encode connection body");
        self.record(
            OpCode::Connection,
            &[("conn", conn.to_string()), ("topic", topic.to_string())],
            &data,
        )
    }

    /// A connection with the three mandatory body fields set.
    pub fn simple_connection(&mut self, conn: u32, topic: &str, message_type: &str) -> u64 {
        self.connection(
            conn,
            topic,
            &[
                ("type", message_type),
                ("md5sum", "992ce8a1687cec8c8bd883ec73ca41d1"),
                ("message_definition", "string data\n"),
            ],
        )
    }

    pub fn index_data(&mut self, conn: u32, entries: &[(i64, u32)]) -> u64 {
        let mut data = Vec::new();
        for (time, offset) in entries {
            data.extend_from_slice(&time.to_le_bytes());
            data.extend_from_slice(&offset.to_le_bytes());
        }
        self.record(
            OpCode::IndexData,
            &[
                ("ver", "1".to_string()),
                ("conn", conn.to_string()),
                ("count", entries.len().to_string()),
            ],
            &data,
        )
    }

    pub fn chunk_info(&mut self, chunk_pos: u64, start_time: u64, end_time: u64, count: u32) -> u64 {
        self.record(
            OpCode::ChunkInfo,
            &[
                ("ver", "1".to_string()),
                ("chunk_pos", chunk_pos.to_string()),
                ("start_time", start_time.to_string()),
                ("end_time", end_time.to_string()),
                ("count", count.to_string()),
            ],
            &[],
        )
    }

    pub fn message_data(&mut self, conn: u32, payload: &[u8]) -> u64 {
        self.record(OpCode::MessageData, &[("conn", conn.to_string())], payload)
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

/// Encodes a header block with a raw `op` byte followed by `fields`.
pub fn header_bytes(op: u8, header: &[(&str, String)]) -> Vec<u8> {
    let op = [op];
    let mut all: Vec<(&str, &[u8])> = vec![("op", &op[..])];
    all.extend(header.iter().map(|(n, v)| (*n, v.as_bytes())));
    fields::encode(all).expect("encode header")
}

/// The layout from the end-to-end example: one connection, one chunk with
/// two indexed messages, and its chunk info. Returns the bytes and the chunk offset.
pub fn single_chunk_bag(index_pos: u64) -> (Vec<u8>, u64) {
    let mut bag = BagBuilder::new();
    bag.bag_header(1, 1, index_pos);
    let chunk_pos = bag.chunk("none", b"two serialized messages");
    bag.simple_connection(1, "/t", "std_msgs/String");
    bag.index_data(1, &[(1_000, 0), (2_000, 12)]);
    bag.chunk_info(chunk_pos, 1_000, 2_000, 2);
    (bag.build(), chunk_pos)
}
