#![no_main]

use libfuzzer_sys::fuzz_target;
use replication_core::core::serialization::MultiFormat;
use replication_core::core::wire_value::WireValue;
use replication_core::protocol::{InboundEvent, NetworkEventDecoder};

fuzz_target!(|data: &[u8]| {
    let Ok((framed, _)) = WireValue::deserialize_with_header(data) else {
        return;
    };
    if let Ok(inbound) = InboundEvent::from_wire(&framed) {
        let _ = NetworkEventDecoder::new().decode_inbound(&inbound);
    }
});
