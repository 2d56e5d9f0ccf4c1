mod common;

use bag_reader::bag::format::{fields, preamble, record::Cursor};
use bag_reader::{BagError, OpenBag};
use common::{single_chunk_bag, PREAMBLE};
use std::collections::HashMap;

fn field_block(fields: &[(&str, &[u8])]) -> Vec<u8> {
    fields::encode(fields.iter().copied()).expect("encode fields")
}

#[test]
fn fields_round_trip() {
    let input: &[(&str, &[u8])] = &[
        ("topic", b"/camera/image_raw"),
        ("type", b"sensor_msgs/Image"),
        ("empty", b""),
        ("message_definition", b"uint32 height\nuint32 width\n# with spaces = and more\n"),
        ("op", &[0x07]),
    ];
    let encoded = field_block(input);
    let decoded = fields::decode(&encoded).expect("decode");

    let expected: HashMap<&str, &[u8]> = input.iter().copied().collect();
    let actual: HashMap<&str, &[u8]> = decoded.iter().collect();
    assert_eq!(expected, actual);
    assert_eq!(decoded.len(), input.len());
}

#[test]
fn fields_split_at_first_separator() {
    let encoded = field_block(&[("callerid", b"a=b=c")]);
    let decoded = fields::decode(&encoded).expect("decode");
    assert_eq!(decoded.get_str("callerid").expect("callerid"), "a=b=c");
}

#[test]
fn fields_last_duplicate_wins() {
    let encoded = field_block(&[("topic", b"/first"), ("md5sum", b"x"), ("topic", b"/second")]);
    let decoded = fields::decode(&encoded).expect("decode");
    assert_eq!(decoded.len(), 2);
    assert_eq!(decoded.get_str("topic").expect("topic"), "/second");
}

#[test]
fn repeated_op_field_is_malformed() {
    let encoded = field_block(&[("op", &[0x03]), ("topic", b"/t"), ("op", &[0x05])]);
    match fields::decode(&encoded) {
        Err(BagError::MalformedField { reason }) => assert!(reason.contains("'op'"), "{}", reason),
        other => panic!("expected MalformedField, got {:?}", other),
    }
}

#[test]
fn empty_field_block_decodes_to_nothing() {
    let decoded = fields::decode(&[]).expect("decode");
    assert!(decoded.is_empty());
}

#[test]
fn field_length_past_span_is_malformed() {
    let mut encoded = field_block(&[("topic", b"/t")]);
    encoded.truncate(encoded.len() - 1);
    assert!(matches!(
        fields::decode(&encoded),
        Err(BagError::MalformedField { .. })
    ));
}

#[test]
fn truncated_length_prefix_is_malformed() {
    let mut encoded = field_block(&[("topic", b"/t")]);
    encoded.extend_from_slice(&[3, 0]);
    assert!(matches!(
        fields::decode(&encoded),
        Err(BagError::MalformedField { .. })
    ));
}

#[test]
fn field_without_separator_is_malformed() {
    let mut encoded = Vec::new();
    encoded.extend_from_slice(&5u32.to_le_bytes());
    encoded.extend_from_slice(b"topic");
    assert!(matches!(
        fields::decode(&encoded),
        Err(BagError::MalformedField { .. })
    ));
}

#[test]
fn encode_rejects_separator_in_name() {
    assert!(matches!(
        fields::encode([("a=b", &b"c"[..])]),
        Err(BagError::MalformedField { .. })
    ));
}

#[test]
fn typed_accessors() {
    let encoded = field_block(&[
        ("count", b"42"),
        ("index_pos", b"18446744073709551615"),
        ("time", b"-5"),
        ("latching", b"1"),
        ("other_flag", b"true"),
        ("bogus", b"4x2"),
        ("op", &[0x05]),
    ]);
    let decoded = fields::decode(&encoded).expect("decode");

    assert_eq!(decoded.get_u32("count").expect("count"), 42);
    assert_eq!(decoded.get_u64("index_pos").expect("index_pos"), u64::MAX);
    assert_eq!(decoded.get_i64("time").expect("time"), -5);
    assert!(decoded.get_bool("latching").expect("latching"));
    assert!(!decoded.get_bool("other_flag").expect("other_flag"));
    assert_eq!(decoded.op().expect("op"), 0x05);
    assert_eq!(decoded.get_optional_string("callerid").expect("callerid"), None);

    match decoded.get_u32("bogus") {
        Err(BagError::FieldTypeError { name, .. }) => assert_eq!(name, "bogus"),
        other => panic!("expected FieldTypeError, got {:?}", other),
    }
    assert!(matches!(
        decoded.get_u32("index_pos"),
        Err(BagError::FieldTypeError { .. })
    ));
    match decoded.get_u32("conn") {
        Err(BagError::MissingField { name }) => assert_eq!(name, "conn"),
        other => panic!("expected MissingField, got {:?}", other),
    }
}

#[test]
fn op_must_be_a_single_byte() {
    let missing_block = field_block(&[("topic", b"/t")]);
    let missing = fields::decode(&missing_block).expect("decode");
    assert!(matches!(missing.op(), Err(BagError::MissingField { .. })));

    let wide_block = field_block(&[("op", b"03")]);
    let wide = fields::decode(&wide_block).expect("decode");
    assert!(matches!(wide.op(), Err(BagError::FieldTypeError { .. })));
}

#[test]
fn preamble_accepts_version_2_0() {
    let bag = OpenBag::from_source(PREAMBLE.to_vec()).expect("open");
    assert_eq!(bag.first_record_offset(), PREAMBLE.len());
    assert_eq!(bag.first_record_offset(), preamble::PREAMBLE_LEN);

    let index = bag.scan().expect("scan of an empty record stream");
    assert!(index.chunks().is_empty());
    assert!(index.connections().is_empty());
}

#[test]
fn preamble_rejects_bad_magic() {
    let result = OpenBag::from_source(b"#NOTABAG V2.0\n".to_vec());
    assert!(matches!(result, Err(BagError::Format(_))));
}

#[test]
fn preamble_rejects_other_versions() {
    let result = OpenBag::from_source(b"#ROSBAG V1.2\n".to_vec());
    assert!(matches!(result, Err(BagError::Format(_))));
}

#[test]
fn preamble_requires_newline() {
    let result = OpenBag::from_source(b"#ROSBAG V2.0 ".to_vec());
    assert!(matches!(result, Err(BagError::Format(_))));
    let result = OpenBag::from_source(b"#ROSBAG V2.0".to_vec());
    assert!(matches!(result, Err(BagError::Format(_))));
}

#[test]
fn preamble_rejects_short_input() {
    for len in 0..PREAMBLE.len() {
        let result = OpenBag::from_source(PREAMBLE[..len].to_vec());
        assert!(
            matches!(result, Err(BagError::Format(_))),
            "prefix of {} bytes should be rejected",
            len
        );
    }
}

#[test]
fn read_record_returns_views_and_advances() {
    let (bytes, chunk_pos) = single_chunk_bag(0);
    let mut cursor = Cursor::new(&bytes, PREAMBLE.len());

    let bag_header = cursor.read_record().expect("bag header record");
    assert_eq!(bag_header.offset, PREAMBLE.len() as u64);
    assert!(bag_header.data.is_empty());
    assert_eq!(cursor.position(), bag_header.end_offset());
    assert_eq!(cursor.position(), chunk_pos);

    let chunk = cursor.read_record().expect("chunk record");
    assert_eq!(chunk.offset, chunk_pos);
    assert_eq!(chunk.data, b"two serialized messages");
    assert_eq!(
        &bytes[chunk.data_offset as usize..chunk.end_offset() as usize],
        chunk.data
    );
    assert_eq!(chunk.data_len() as usize, chunk.data.len());
}

#[test]
fn header_length_past_end_is_corrupt_record() {
    let mut bytes = PREAMBLE.to_vec();
    bytes.extend_from_slice(&100u32.to_le_bytes());
    bytes.extend_from_slice(&[0u8; 10]);

    let mut cursor = Cursor::new(&bytes, PREAMBLE.len());
    assert!(matches!(
        cursor.read_record(),
        Err(BagError::CorruptRecord { .. })
    ));
    assert_eq!(cursor.position(), PREAMBLE.len() as u64);
}

#[test]
fn data_length_past_end_is_corrupt_record() {
    let mut bytes = PREAMBLE.to_vec();
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&u32::MAX.to_le_bytes());
    bytes.extend_from_slice(b"short");

    let mut cursor = Cursor::new(&bytes, PREAMBLE.len());
    assert!(matches!(
        cursor.read_record(),
        Err(BagError::CorruptRecord { .. })
    ));
}

#[test]
fn eof_inside_length_prefix_is_corrupt_file() {
    let mut bytes = PREAMBLE.to_vec();
    bytes.extend_from_slice(&[1, 0]);

    let mut cursor = Cursor::new(&bytes, PREAMBLE.len());
    match cursor.read_record() {
        Err(BagError::CorruptFile { offset }) => assert_eq!(offset, PREAMBLE.len() as u64),
        other => panic!("expected CorruptFile, got {:?}", other),
    }
}

#[test]
fn read_record_never_exceeds_buffer_on_truncation() {
    let (bytes, _) = single_chunk_bag(0);

    for cut in PREAMBLE.len()..bytes.len() {
        let truncated = &bytes[..cut];
        let mut cursor = Cursor::new(truncated, PREAMBLE.len());
        while !cursor.is_at_end() {
            match cursor.read_record() {
                Ok(record) => assert!(record.end_offset() <= cut as u64),
                Err(BagError::CorruptRecord { .. }) | Err(BagError::CorruptFile { .. }) => break,
                Err(other) => panic!("unexpected framing error {:?}", other),
            }
        }
    }
}
