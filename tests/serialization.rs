//! Integration tests for alternative serialization formats
//!
//! Tests the MultiFormat trait implementation on wire value trees and entity
//! records: Bincode (default), JSON (human-readable), and MessagePack (compact).

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::panic,
    clippy::uninlined_format_args,
    clippy::expect_fun_call
)]

use replication_core::core::keys::{ComponentType, ViewComponent};
use replication_core::core::serialization::{MultiFormat, SerializationFormat};
use replication_core::core::wire_value::WireValue;
use replication_core::error::ReplicationError;
use replication_core::protocol::entity_record::{ComponentRecord, EntityRecord};
use replication_core::protocol::{read_entity, write_entity, ValueTreeReader, ValueTreeWriter};
use replication_core::value::{ReplicatedValue, StringMap, Vector3};

const FORMATS: [SerializationFormat; 3] = [
    SerializationFormat::Bincode,
    SerializationFormat::Json,
    SerializationFormat::MessagePack,
];

fn sample_record() -> EntityRecord {
    let mut settings = StringMap::new();
    settings.insert("loop".to_string(), ReplicatedValue::from(true));
    settings.insert("volume".to_string(), ReplicatedValue::from(0.5_f32));

    let mut record = EntityRecord::new(300, 1, 12);
    record.components.push(ComponentRecord {
        id: 2,
        component_type: ComponentType(14),
        properties: vec![
            (0, ReplicatedValue::from("https://cdn.invalid/clip.ogg")),
            (1, ReplicatedValue::from(settings)),
            (2, ReplicatedValue::from(Vector3::new(0.0, 1.5, -2.0))),
        ],
    });
    record
        .views
        .insert(ViewComponent::LockType, ReplicatedValue::from(1_i64));
    record
}

fn entity_tree(record: &EntityRecord) -> WireValue {
    let mut writer = ValueTreeWriter::new();
    write_entity(&mut writer, record).expect("write");
    writer.finish().expect("tree")
}

#[test]
fn test_wire_tree_all_formats() {
    let tree = entity_tree(&sample_record());
    for format in FORMATS {
        let bytes = tree
            .serialize_format(format)
            .expect(&format!("serialize {}", format.name()));
        let recovered = WireValue::deserialize_format(&bytes, format)
            .expect(&format!("deserialize {}", format.name()));
        assert_eq!(tree, recovered, "roundtrip failed for {}", format.name());
    }
}

#[test]
fn test_entity_record_all_formats() {
    let record = sample_record();
    for format in FORMATS {
        let bytes = record.serialize_format(format).expect("serialize");
        let recovered = EntityRecord::deserialize_format(&bytes, format).expect("deserialize");
        assert_eq!(record, recovered, "roundtrip failed for {}", format.name());
    }
}

#[test]
fn test_header_detects_format() {
    let tree = entity_tree(&sample_record());
    for format in FORMATS {
        let bytes = tree.serialize_with_header(format).expect("serialize");
        assert_eq!(bytes[0], format.format_byte());
        let (recovered, detected) = WireValue::deserialize_with_header(&bytes).expect("deserialize");
        assert_eq!(detected, format);

        // the decoded tree still replays as the same entity
        let mut reader = ValueTreeReader::new(&recovered);
        assert_eq!(read_entity(&mut reader).expect("replay"), sample_record());
    }
}

#[test]
fn test_json_is_readable() {
    let bytes = sample_record()
        .serialize_format(SerializationFormat::Json)
        .expect("serialize");
    let text = String::from_utf8(bytes).expect("utf-8");
    assert!(text.contains("clip.ogg"));
    assert!(text.contains("LockType"));
}

#[test]
fn test_messagepack_smaller_than_json() {
    let tree = entity_tree(&sample_record());
    let json = tree.serialize_format(SerializationFormat::Json).expect("json");
    let msgpack = tree
        .serialize_format(SerializationFormat::MessagePack)
        .expect("msgpack");
    assert!(msgpack.len() < json.len());
}

#[test]
fn test_invalid_headers() {
    assert!(WireValue::deserialize_with_header(&[]).is_err());
    assert!(WireValue::deserialize_with_header(&[0xFF, 0x00]).is_err());
}

#[test]
fn test_corrupted_payload() {
    let bytes = entity_tree(&sample_record())
        .serialize_with_header(SerializationFormat::Bincode)
        .expect("serialize");
    let truncated = &bytes[..bytes.len() / 2];
    assert!(WireValue::deserialize_with_header(truncated).is_err());
}

#[test]
fn test_bounded_decode() {
    let bytes = entity_tree(&sample_record())
        .serialize_with_header(SerializationFormat::MessagePack)
        .expect("serialize");
    assert!(WireValue::deserialize_bounded(&bytes, bytes.len()).is_ok());
    assert!(WireValue::deserialize_bounded(&bytes, bytes.len() - 1).is_err());
}

fn nested_arrays(levels: usize) -> WireValue {
    let mut tree = WireValue::Null;
    for _ in 0..levels {
        tree = WireValue::Array(vec![tree]);
    }
    tree
}

fn nested_maps(levels: usize) -> ReplicatedValue {
    let mut value = ReplicatedValue::from(1_i64);
    for _ in 0..levels {
        let mut outer = StringMap::new();
        outer.insert("inner".to_string(), value);
        value = ReplicatedValue::from(outer);
    }
    value
}

#[test]
fn test_deeply_nested_bincode_is_refused() {
    // Array variant tag and a one-element length, repeated, then Null
    let mut bytes = vec![SerializationFormat::Bincode.format_byte()];
    for _ in 0..200_000 {
        bytes.extend_from_slice(&9_u32.to_le_bytes());
        bytes.extend_from_slice(&1_u64.to_le_bytes());
    }
    bytes.extend_from_slice(&0_u32.to_le_bytes());

    assert!(matches!(
        WireValue::deserialize_bounded(&bytes, 16 * 1024 * 1024),
        Err(ReplicationError::DeserializeError(_))
    ));
}

#[test]
fn test_deeply_nested_trees_are_refused_in_every_format() {
    let tree = nested_arrays(200);
    for format in FORMATS {
        let bytes = tree
            .serialize_with_header(format)
            .expect(&format!("serialize {}", format.name()));
        assert!(
            matches!(
                WireValue::deserialize_with_header(&bytes),
                Err(ReplicationError::DeserializeError(_))
            ),
            "{} accepted 200 levels",
            format.name()
        );
    }
}

#[test]
fn test_deeply_nested_record_property_is_refused() {
    let mut record = EntityRecord::new(1, 0, 0);
    record.components.push(ComponentRecord {
        id: 1,
        component_type: ComponentType(3),
        properties: vec![(0, nested_maps(200))],
    });
    let bytes = record
        .serialize_with_header(SerializationFormat::MessagePack)
        .expect("serialize");
    assert!(matches!(
        EntityRecord::deserialize_with_header(&bytes),
        Err(ReplicationError::DeserializeError(_))
    ));
}

#[test]
fn test_moderate_nesting_roundtrips() {
    let tree = nested_arrays(40);
    let mut record = EntityRecord::new(1, 0, 0);
    record.components.push(ComponentRecord {
        id: 1,
        component_type: ComponentType(3),
        properties: vec![(0, nested_maps(40))],
    });

    for format in FORMATS {
        let bytes = tree.serialize_with_header(format).expect("serialize tree");
        assert_eq!(WireValue::deserialize_with_header(&bytes).expect("tree").0, tree);

        let bytes = record.serialize_with_header(format).expect("serialize record");
        assert_eq!(EntityRecord::deserialize_with_header(&bytes).expect("record").0, record);
    }
}

#[test]
fn test_json_refuses_non_finite_floats() {
    for tree in [
        WireValue::Float32(f32::NAN),
        WireValue::Double(f64::INFINITY),
        WireValue::Array(vec![WireValue::FloatArray(vec![1.0, f32::NEG_INFINITY])]),
    ] {
        assert!(matches!(
            tree.serialize_format(SerializationFormat::Json),
            Err(ReplicationError::SerializeError(_))
        ));

        let bytes = tree
            .serialize_with_header(SerializationFormat::Bincode)
            .expect("bincode keeps non-finite floats");
        let (recovered, _) = WireValue::deserialize_with_header(&bytes).expect("decode");
        assert!(!recovered.is_finite());
    }

    let mut record = sample_record();
    record.components[0]
        .properties
        .push((3, ReplicatedValue::from(f32::NAN)));
    assert!(matches!(
        record.serialize_format(SerializationFormat::Json),
        Err(ReplicationError::SerializeError(_))
    ));
    assert!(record.serialize_format(SerializationFormat::MessagePack).is_ok());
}
