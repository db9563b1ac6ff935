//! Example: Shipping an Entity in Different Byte Formats
//!
//! Builds an entity from a component store, streams it through the entity
//! codec, then serializes the resulting wire tree as Bincode, JSON and
//! MessagePack.
//!
//! Run with: `cargo run --example serialization_formats`

#![allow(clippy::uninlined_format_args)]

use replication_core::config::LoggingConfig;
use replication_core::core::keys::{ComponentType, ViewComponent};
use replication_core::core::serialization::{MultiFormat, SerializationFormat};
use replication_core::core::wire_value::WireValue;
use replication_core::protocol::{
    read_entity, write_entity, ComponentRecord, EntityRecord, ValueTreeReader, ValueTreeWriter,
};
use replication_core::store::PropertyStore;
use replication_core::utils::logging::init_logging;
use replication_core::value::{ReplicatedValue, Vector3, Vector4};

const FORMATS: [SerializationFormat; 3] = [
    SerializationFormat::Bincode,
    SerializationFormat::Json,
    SerializationFormat::MessagePack,
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging(&LoggingConfig::default())?;

    println!("=== Entity Serialization Formats Demo ===\n");

    // 1. Populate a component store and edit it locally
    let mut transform = PropertyStore::new(
        1,
        ComponentType(1),
        [
            (0, ReplicatedValue::from(Vector3::ZERO)),
            (1, ReplicatedValue::from(Vector4::IDENTITY)),
            (2, ReplicatedValue::from(true)),
        ],
    )?;
    transform.set_property(0, Vector3::new(4.0, 0.0, -2.5))?;

    let mut record = EntityRecord::new(1001, 1, 7);
    record.components.push(ComponentRecord::from_store(&transform));
    record
        .views
        .insert(ViewComponent::LockType, ReplicatedValue::from(0_i64));
    println!("Entity: {:?}\n", record);

    // 2. Stream it through the entity codec
    let mut writer = ValueTreeWriter::new();
    write_entity(&mut writer, &record)?;
    let tree = writer.finish()?;
    println!("Wire tree kind: {}\n", tree.kind_name());

    // 3. Serialize the tree with every format
    let mut sizes = Vec::new();
    for format in FORMATS {
        let bytes = tree.serialize_with_header(format)?;
        let (recovered, detected) = WireValue::deserialize_with_header(&bytes)?;

        let mut reader = ValueTreeReader::new(&recovered);
        let replayed = read_entity(&mut reader)?;

        println!(
            "   - {:10} | Header byte: 0x{:02X} | Detected: {:10} | Size: {:4} bytes | Roundtrip: {}",
            format.name(),
            format.format_byte(),
            detected.name(),
            bytes.len(),
            if replayed == record { "✓" } else { "✗" }
        );
        sizes.push((format, bytes.len()));
    }
    println!();

    // 4. JSON is readable as-is
    let json = record.serialize_format(SerializationFormat::Json)?;
    println!("Record as JSON:\n{}\n", std::str::from_utf8(&json)?);

    // 5. Size comparison against Bincode
    if let Some(&(_, baseline)) = sizes.first() {
        println!("SIZE COMPARISON");
        for (format, size) in &sizes {
            println!(
                "   - {:12} {} bytes ({:+.1}%)",
                format.name(),
                size,
                ((*size as f64 / baseline as f64) - 1.0) * 100.0
            );
        }
    }

    Ok(())
}
