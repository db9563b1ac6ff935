//! # Serialization Formats
//!
//! Byte encodings for wire value trees and entity records.
//! Supports bincode (default), JSON (debugging/interop), and MessagePack (compact encoding).
//!
//! The value tree itself is transport-agnostic; this module is one way to turn it
//! into bytes when the embedding transport does not bring its own encoding.
//!
//! ## Features
//! - **Multiple formats**: Bincode, JSON, MessagePack with automatic format detection
//! - **Format metadata**: Optional format byte prefix for automatic detection
//! - **Size limit**: Payloads larger than the configured maximum are refused on decode
//! - **Depth limit**: Trees nested deeper than
//!   [`MAX_DECODE_DEPTH`](crate::core::nesting::MAX_DECODE_DEPTH) are refused on decode
//! - **Finite floats for JSON**: JSON has no NaN or infinity, so such values are
//!   refused on encode instead of turning into `null`
//!
//! ## Usage
//! ```rust
//! use replication_core::core::serialization::{MultiFormat, SerializationFormat};
//! use replication_core::core::wire_value::WireValue;
//!
//! let value = WireValue::FloatArray(vec![1.0, 2.0, 3.0]);
//! let bytes = value.serialize_with_header(SerializationFormat::MessagePack).unwrap();
//! let (decoded, format) = WireValue::deserialize_with_header(&bytes).unwrap();
//! assert_eq!(decoded, value);
//! assert_eq!(format, SerializationFormat::MessagePack);
//! ```

use crate::core::wire_value::WireValue;
use crate::error::constants::ERR_JSON_NON_FINITE;
use crate::error::{ReplicationError, Result};
use serde::{Deserialize, Serialize};

/// Supported serialization formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerializationFormat {
    /// Binary compact format (default, fastest)
    #[default]
    Bincode,
    /// Human-readable JSON format (debugging, interop)
    Json,
    /// Compact binary format (MessagePack, efficient)
    MessagePack,
}

impl SerializationFormat {
    /// Get the format identifier byte for wire protocol
    pub fn format_byte(self) -> u8 {
        match self {
            SerializationFormat::Bincode => 0x01,
            SerializationFormat::Json => 0x02,
            SerializationFormat::MessagePack => 0x03,
        }
    }

    /// Detect format from identifier byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(SerializationFormat::Bincode),
            0x02 => Some(SerializationFormat::Json),
            0x03 => Some(SerializationFormat::MessagePack),
            _ => None,
        }
    }

    /// Get human-readable name
    pub fn name(self) -> &'static str {
        match self {
            SerializationFormat::Bincode => "Bincode",
            SerializationFormat::Json => "JSON",
            SerializationFormat::MessagePack => "MessagePack",
        }
    }
}

/// Trait for types that support multiple serialization formats
pub trait MultiFormat: Serialize + for<'de> Deserialize<'de> + Sized {
    /// Whether the value survives JSON, which has no NaN or infinity.
    /// Checked before JSON encoding.
    fn json_representable(&self) -> bool {
        true
    }

    /// Serialize to bytes using the specified format
    fn serialize_format(&self, format: SerializationFormat) -> Result<Vec<u8>> {
        match format {
            SerializationFormat::Bincode => bincode::serialize(self)
                .map_err(|e| ReplicationError::SerializeError(e.to_string())),
            SerializationFormat::Json if !self.json_representable() => Err(
                ReplicationError::SerializeError(ERR_JSON_NON_FINITE.to_string()),
            ),
            SerializationFormat::Json => serde_json::to_vec(self)
                .map_err(|e| ReplicationError::SerializeError(e.to_string())),
            SerializationFormat::MessagePack => rmp_serde::to_vec(self)
                .map_err(|e| ReplicationError::SerializeError(e.to_string())),
        }
    }

    /// Serialize to bytes with format header
    fn serialize_with_header(&self, format: SerializationFormat) -> Result<Vec<u8>> {
        let mut data = vec![format.format_byte()];
        let mut payload = self.serialize_format(format)?;
        data.append(&mut payload);
        Ok(data)
    }

    /// Deserialize from bytes using the specified format
    fn deserialize_format(data: &[u8], format: SerializationFormat) -> Result<Self> {
        match format {
            SerializationFormat::Bincode => bincode::deserialize(data)
                .map_err(|e| ReplicationError::DeserializeError(e.to_string())),
            SerializationFormat::Json => serde_json::from_slice(data)
                .map_err(|e| ReplicationError::DeserializeError(e.to_string())),
            SerializationFormat::MessagePack => rmp_serde::from_slice(data)
                .map_err(|e| ReplicationError::DeserializeError(e.to_string())),
        }
    }

    /// Deserialize from bytes with format header
    fn deserialize_with_header(data: &[u8]) -> Result<(Self, SerializationFormat)> {
        let Some((&format_byte, payload)) = data.split_first() else {
            return Err(ReplicationError::DeserializeError("Empty data".to_string()));
        };

        let format = SerializationFormat::from_byte(format_byte).ok_or_else(|| {
            ReplicationError::DeserializeError(format!("Unknown format byte: {format_byte}"))
        })?;

        let value = Self::deserialize_format(payload, format)?;
        Ok((value, format))
    }

    /// Deserialize with header, refusing payloads above `max_payload_size` bytes
    fn deserialize_bounded(data: &[u8], max_payload_size: usize) -> Result<(Self, SerializationFormat)> {
        if data.len() > max_payload_size {
            return Err(ReplicationError::DeserializeError(format!(
                "Payload of {} bytes exceeds limit of {max_payload_size}",
                data.len()
            )));
        }
        Self::deserialize_with_header(data)
    }
}

impl MultiFormat for WireValue {
    fn json_representable(&self) -> bool {
        self.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn sample_tree() -> WireValue {
        let mut nested = BTreeMap::new();
        nested.insert("speed".to_string(), WireValue::Float32(2.5));
        nested.insert("label".to_string(), WireValue::String("door".to_string()));

        WireValue::Array(vec![
            WireValue::UInt64(42),
            WireValue::Bool(true),
            WireValue::IntMap(vec![
                (0, WireValue::FloatArray(vec![1.0, 2.0, 3.0])),
                (7, WireValue::StringMap(nested)),
            ]),
        ])
    }

    #[test]
    #[allow(clippy::expect_used)]
    fn test_format_byte_roundtrip() {
        for format in &[
            SerializationFormat::Bincode,
            SerializationFormat::Json,
            SerializationFormat::MessagePack,
        ] {
            let byte = format.format_byte();
            let recovered = SerializationFormat::from_byte(byte).expect("valid format byte");
            assert_eq!(*format, recovered);
        }
    }

    #[test]
    fn test_format_names() {
        assert_eq!(SerializationFormat::Bincode.name(), "Bincode");
        assert_eq!(SerializationFormat::Json.name(), "JSON");
        assert_eq!(SerializationFormat::MessagePack.name(), "MessagePack");
    }

    #[test]
    fn test_default_format() {
        assert_eq!(SerializationFormat::default(), SerializationFormat::Bincode);
    }

    #[test]
    #[allow(clippy::expect_used)]
    fn test_tree_all_formats() {
        let tree = sample_tree();
        for format in [
            SerializationFormat::Bincode,
            SerializationFormat::Json,
            SerializationFormat::MessagePack,
        ] {
            let bytes = tree.serialize_format(format).expect("serialize");
            let recovered = WireValue::deserialize_format(&bytes, format).expect("deserialize");
            assert_eq!(tree, recovered, "roundtrip failed for {}", format.name());
        }
    }

    #[test]
    fn test_bounded_rejects_oversized() {
        let bytes = sample_tree()
            .serialize_with_header(SerializationFormat::Bincode)
            .unwrap_or_default();
        assert!(WireValue::deserialize_bounded(&bytes, 4).is_err());
        assert!(WireValue::deserialize_bounded(&bytes, bytes.len()).is_ok());
    }
}
