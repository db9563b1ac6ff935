#![no_main]

use libfuzzer_sys::fuzz_target;
use replication_core::core::packer::unpack_value;
use replication_core::core::serialization::MultiFormat;
use replication_core::core::wire_value::WireValue;
use replication_core::protocol::{read_entity, ValueTreeReader};

fuzz_target!(|data: &[u8]| {
    // Arbitrary framed bytes must never panic the unpacker or the entity reader
    if let Ok((tree, _)) = WireValue::deserialize_with_header(data) {
        let _ = unpack_value(&tree);
        let mut reader = ValueTreeReader::new(&tree);
        let _ = read_entity(&mut reader);
    }
});
