//! # Wire Values
//!
//! Transport-level value tree exchanged with the messaging layer.
//!
//! `WireValue` is deliberately wider than [`ReplicatedValue`](crate::value::ReplicatedValue):
//! it can carry bytes, unsigned integers, doubles, plain arrays and integer-keyed
//! maps that the replicated model has no kind for. Vectors travel as float arrays
//! and are told apart only by length.
//!
//! The type implements serde, so a whole tree can be shipped with any format
//! supported by [`MultiFormat`](crate::core::serialization::MultiFormat). Decoding
//! is bounded by [`MAX_DECODE_DEPTH`](crate::core::nesting::MAX_DECODE_DEPTH).

use crate::core::nesting::NestingGuard;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Integer-keyed map, entries kept in transmission order
pub type WireIntMap = Vec<(u64, WireValue)>;

/// A loosely-typed transport value
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub enum WireValue {
    #[default]
    Null,
    Bool(bool),
    Byte(u8),
    Int64(i64),
    UInt64(u64),
    Float32(f32),
    Double(f64),
    String(String),
    FloatArray(Vec<f32>),
    Array(Vec<WireValue>),
    StringMap(BTreeMap<String, WireValue>),
    IntMap(WireIntMap),
}

/// Decoding shape of [`WireValue`]; children go back through the bounded impl
#[derive(Deserialize)]
#[serde(rename = "WireValue")]
enum WireValueRepr {
    Null,
    Bool(bool),
    Byte(u8),
    Int64(i64),
    UInt64(u64),
    Float32(f32),
    Double(f64),
    String(String),
    FloatArray(Vec<f32>),
    Array(Vec<WireValue>),
    StringMap(BTreeMap<String, WireValue>),
    IntMap(WireIntMap),
}

impl<'de> Deserialize<'de> for WireValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let _level = NestingGuard::enter::<D::Error>()?;
        Ok(match WireValueRepr::deserialize(deserializer)? {
            WireValueRepr::Null => WireValue::Null,
            WireValueRepr::Bool(v) => WireValue::Bool(v),
            WireValueRepr::Byte(v) => WireValue::Byte(v),
            WireValueRepr::Int64(v) => WireValue::Int64(v),
            WireValueRepr::UInt64(v) => WireValue::UInt64(v),
            WireValueRepr::Float32(v) => WireValue::Float32(v),
            WireValueRepr::Double(v) => WireValue::Double(v),
            WireValueRepr::String(v) => WireValue::String(v),
            WireValueRepr::FloatArray(v) => WireValue::FloatArray(v),
            WireValueRepr::Array(v) => WireValue::Array(v),
            WireValueRepr::StringMap(v) => WireValue::StringMap(v),
            WireValueRepr::IntMap(v) => WireValue::IntMap(v),
        })
    }
}

impl WireValue {
    /// Name of the active wire kind, for diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            WireValue::Null => "null",
            WireValue::Bool(_) => "bool",
            WireValue::Byte(_) => "byte",
            WireValue::Int64(_) => "int64",
            WireValue::UInt64(_) => "uint64",
            WireValue::Float32(_) => "float32",
            WireValue::Double(_) => "double",
            WireValue::String(_) => "string",
            WireValue::FloatArray(_) => "float array",
            WireValue::Array(_) => "array",
            WireValue::StringMap(_) => "string map",
            WireValue::IntMap(_) => "int map",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, WireValue::Null)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, WireValue::Array(_))
    }

    /// Entries of an integer-keyed map
    pub fn as_int_map(&self) -> Option<&[(u64, WireValue)]> {
        match self {
            WireValue::IntMap(entries) => Some(entries),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[WireValue]> {
        match self {
            WireValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Whether every float payload in the tree is finite
    pub fn is_finite(&self) -> bool {
        match self {
            WireValue::Float32(v) => v.is_finite(),
            WireValue::Double(v) => v.is_finite(),
            WireValue::FloatArray(items) => items.iter().all(|v| v.is_finite()),
            WireValue::Array(items) => items.iter().all(WireValue::is_finite),
            WireValue::StringMap(entries) => entries.values().all(WireValue::is_finite),
            WireValue::IntMap(entries) => entries.iter().all(|(_, v)| v.is_finite()),
            _ => true,
        }
    }

    /// Look up a key in an integer-keyed map
    pub fn int_map_get(&self, key: u64) -> Option<&WireValue> {
        self.as_int_map()?
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }
}
