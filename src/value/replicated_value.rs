//! # Replicated Values
//!
//! [`ReplicatedValue`] is the closed set of kinds a networked property can hold.
//!
//! ## Semantics
//! - **Kind and payload are one**: the enum variant *is* the kind, so constructing or
//!   assigning a value replaces both at once.
//! - **Checked access**: typed getters return [`ReplicationError::WrongKind`] rather
//!   than reinterpreting the payload.
//! - **Equality**: values of different kinds are never equal.
//! - **Ordering**: only Integer/Integer and Float/Float pairs are ordered; every
//!   cross-kind `<` or `>` comparison is false.
//! - **Hashing**: consistent with equality; string maps hash independently of
//!   insertion order and vectors hash dependent on component position.
//! - **Deep copies**: `Clone` copies nested maps recursively.

use crate::core::nesting::NestingGuard;
use crate::error::{ReplicationError, Result};
use crate::value::vector::{Vector2, Vector3, Vector4};
use serde::{Deserialize, Deserializer, Serialize};
use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// Nested string-keyed map of replicated values
pub type StringMap = BTreeMap<String, ReplicatedValue>;

/// The kind tag of a [`ReplicatedValue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ReplicatedValueKind {
    Invalid,
    Bool,
    Integer,
    Float,
    String,
    Vector2,
    Vector3,
    Vector4,
    StringMap,
}

impl ReplicatedValueKind {
    /// Get human-readable name
    pub fn name(self) -> &'static str {
        match self {
            ReplicatedValueKind::Invalid => "invalid",
            ReplicatedValueKind::Bool => "bool",
            ReplicatedValueKind::Integer => "integer",
            ReplicatedValueKind::Float => "float",
            ReplicatedValueKind::String => "string",
            ReplicatedValueKind::Vector2 => "vector2",
            ReplicatedValueKind::Vector3 => "vector3",
            ReplicatedValueKind::Vector4 => "vector4",
            ReplicatedValueKind::StringMap => "stringMap",
        }
    }
}

/// A single replicated property value
#[derive(Debug, Clone, Default, Serialize)]
pub enum ReplicatedValue {
    #[default]
    Invalid,
    Bool(bool),
    Integer(i64),
    Float(f32),
    String(String),
    Vector2(Vector2),
    Vector3(Vector3),
    Vector4(Vector4),
    StringMap(StringMap),
}

/// Decoding shape of [`ReplicatedValue`]; nested maps go back through the bounded impl
#[derive(Deserialize)]
#[serde(rename = "ReplicatedValue")]
enum ReplicatedValueRepr {
    Invalid,
    Bool(bool),
    Integer(i64),
    Float(f32),
    String(String),
    Vector2(Vector2),
    Vector3(Vector3),
    Vector4(Vector4),
    StringMap(StringMap),
}

impl<'de> Deserialize<'de> for ReplicatedValue {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let _level = NestingGuard::enter::<D::Error>()?;
        Ok(match ReplicatedValueRepr::deserialize(deserializer)? {
            ReplicatedValueRepr::Invalid => ReplicatedValue::Invalid,
            ReplicatedValueRepr::Bool(v) => ReplicatedValue::Bool(v),
            ReplicatedValueRepr::Integer(v) => ReplicatedValue::Integer(v),
            ReplicatedValueRepr::Float(v) => ReplicatedValue::Float(v),
            ReplicatedValueRepr::String(v) => ReplicatedValue::String(v),
            ReplicatedValueRepr::Vector2(v) => ReplicatedValue::Vector2(v),
            ReplicatedValueRepr::Vector3(v) => ReplicatedValue::Vector3(v),
            ReplicatedValueRepr::Vector4(v) => ReplicatedValue::Vector4(v),
            ReplicatedValueRepr::StringMap(v) => ReplicatedValue::StringMap(v),
        })
    }
}

impl ReplicatedValue {
    /// The active kind tag
    pub fn kind(&self) -> ReplicatedValueKind {
        match self {
            ReplicatedValue::Invalid => ReplicatedValueKind::Invalid,
            ReplicatedValue::Bool(_) => ReplicatedValueKind::Bool,
            ReplicatedValue::Integer(_) => ReplicatedValueKind::Integer,
            ReplicatedValue::Float(_) => ReplicatedValueKind::Float,
            ReplicatedValue::String(_) => ReplicatedValueKind::String,
            ReplicatedValue::Vector2(_) => ReplicatedValueKind::Vector2,
            ReplicatedValue::Vector3(_) => ReplicatedValueKind::Vector3,
            ReplicatedValue::Vector4(_) => ReplicatedValueKind::Vector4,
            ReplicatedValue::StringMap(_) => ReplicatedValueKind::StringMap,
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, ReplicatedValue::Invalid)
    }

    /// Whether every float payload, nested maps included, is finite
    pub fn is_finite(&self) -> bool {
        match self {
            ReplicatedValue::Float(v) => v.is_finite(),
            ReplicatedValue::Vector2(v) => v.to_array().iter().all(|c| c.is_finite()),
            ReplicatedValue::Vector3(v) => v.to_array().iter().all(|c| c.is_finite()),
            ReplicatedValue::Vector4(v) => v.to_array().iter().all(|c| c.is_finite()),
            ReplicatedValue::StringMap(map) => map.values().all(ReplicatedValue::is_finite),
            _ => true,
        }
    }

    /// Move the value out, leaving `Invalid` behind.
    pub fn take(&mut self) -> ReplicatedValue {
        std::mem::take(self)
    }

    fn wrong_kind(&self, expected: ReplicatedValueKind) -> ReplicationError {
        ReplicationError::WrongKind {
            expected,
            actual: self.kind(),
        }
    }

    // Typed getters

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            ReplicatedValue::Bool(v) => Ok(*v),
            _ => Err(self.wrong_kind(ReplicatedValueKind::Bool)),
        }
    }

    pub fn as_integer(&self) -> Result<i64> {
        match self {
            ReplicatedValue::Integer(v) => Ok(*v),
            _ => Err(self.wrong_kind(ReplicatedValueKind::Integer)),
        }
    }

    pub fn as_float(&self) -> Result<f32> {
        match self {
            ReplicatedValue::Float(v) => Ok(*v),
            _ => Err(self.wrong_kind(ReplicatedValueKind::Float)),
        }
    }

    pub fn as_string(&self) -> Result<&str> {
        match self {
            ReplicatedValue::String(v) => Ok(v),
            _ => Err(self.wrong_kind(ReplicatedValueKind::String)),
        }
    }

    pub fn as_vector2(&self) -> Result<Vector2> {
        match self {
            ReplicatedValue::Vector2(v) => Ok(*v),
            _ => Err(self.wrong_kind(ReplicatedValueKind::Vector2)),
        }
    }

    pub fn as_vector3(&self) -> Result<Vector3> {
        match self {
            ReplicatedValue::Vector3(v) => Ok(*v),
            _ => Err(self.wrong_kind(ReplicatedValueKind::Vector3)),
        }
    }

    pub fn as_vector4(&self) -> Result<Vector4> {
        match self {
            ReplicatedValue::Vector4(v) => Ok(*v),
            _ => Err(self.wrong_kind(ReplicatedValueKind::Vector4)),
        }
    }

    pub fn as_string_map(&self) -> Result<&StringMap> {
        match self {
            ReplicatedValue::StringMap(v) => Ok(v),
            _ => Err(self.wrong_kind(ReplicatedValueKind::StringMap)),
        }
    }

    pub fn as_string_map_mut(&mut self) -> Result<&mut StringMap> {
        match self {
            ReplicatedValue::StringMap(v) => Ok(v),
            _ => Err(self.wrong_kind(ReplicatedValueKind::StringMap)),
        }
    }

    /// Read an Integer value as an enum declared with
    /// [`replicated_enum!`](crate::replicated_enum).
    pub fn to_enum<E>(&self) -> Result<E>
    where
        E: TryFrom<i64>,
    {
        let raw = self.as_integer()?;
        E::try_from(raw).map_err(|_| ReplicationError::InvalidEnumValue {
            type_name: std::any::type_name::<E>().to_string(),
            value: raw,
        })
    }

    /// Build an Integer value from any enum convertible to `i64`.
    pub fn from_enum<E>(value: E) -> Self
    where
        E: Into<i64>,
    {
        ReplicatedValue::Integer(value.into())
    }

    // Typed setters; each replaces kind and payload together

    pub fn set_bool(&mut self, value: bool) {
        *self = ReplicatedValue::Bool(value);
    }

    pub fn set_integer(&mut self, value: i64) {
        *self = ReplicatedValue::Integer(value);
    }

    pub fn set_float(&mut self, value: f32) {
        *self = ReplicatedValue::Float(value);
    }

    pub fn set_string(&mut self, value: impl Into<String>) {
        *self = ReplicatedValue::String(value.into());
    }

    pub fn set_vector2(&mut self, value: Vector2) {
        *self = ReplicatedValue::Vector2(value);
    }

    pub fn set_vector3(&mut self, value: Vector3) {
        *self = ReplicatedValue::Vector3(value);
    }

    pub fn set_vector4(&mut self, value: Vector4) {
        *self = ReplicatedValue::Vector4(value);
    }

    pub fn set_string_map(&mut self, value: StringMap) {
        *self = ReplicatedValue::StringMap(value);
    }
}

impl PartialEq for ReplicatedValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ReplicatedValue::Invalid, ReplicatedValue::Invalid) => true,
            (ReplicatedValue::Bool(a), ReplicatedValue::Bool(b)) => a == b,
            (ReplicatedValue::Integer(a), ReplicatedValue::Integer(b)) => a == b,
            (ReplicatedValue::Float(a), ReplicatedValue::Float(b)) => float_eq(*a, *b),
            (ReplicatedValue::String(a), ReplicatedValue::String(b)) => a == b,
            (ReplicatedValue::Vector2(a), ReplicatedValue::Vector2(b)) => {
                components_eq(&a.to_array(), &b.to_array())
            }
            (ReplicatedValue::Vector3(a), ReplicatedValue::Vector3(b)) => {
                components_eq(&a.to_array(), &b.to_array())
            }
            (ReplicatedValue::Vector4(a), ReplicatedValue::Vector4(b)) => {
                components_eq(&a.to_array(), &b.to_array())
            }
            (ReplicatedValue::StringMap(a), ReplicatedValue::StringMap(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for ReplicatedValue {}

impl PartialOrd for ReplicatedValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (ReplicatedValue::Integer(a), ReplicatedValue::Integer(b)) => Some(a.cmp(b)),
            (ReplicatedValue::Float(a), ReplicatedValue::Float(b)) if float_eq(*a, *b) => {
                Some(Ordering::Equal)
            }
            (ReplicatedValue::Float(a), ReplicatedValue::Float(b)) => a.partial_cmp(b),
            _ if self == other => Some(Ordering::Equal),
            _ => None,
        }
    }
}

/// IEEE equality, except that every NaN equals every other NaN so `Eq` stays
/// reflexive.
fn float_eq(a: f32, b: f32) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

fn components_eq(a: &[f32], b: &[f32]) -> bool {
    a.iter().zip(b).all(|(x, y)| float_eq(*x, *y))
}

/// Bit pattern of a float with both zeroes folded together and every NaN folded
/// to one pattern, matching [`float_eq`].
fn float_bits(value: f32) -> u32 {
    if value == 0.0 {
        0
    } else if value.is_nan() {
        f32::NAN.to_bits()
    } else {
        value.to_bits()
    }
}

fn hash_one<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Position-dependent combination of per-component hashes.
fn hash_components(components: &[f32]) -> u64 {
    components
        .iter()
        .enumerate()
        .fold(0u64, |acc, (index, component)| {
            acc ^ (hash_one(&float_bits(*component)) << index)
        })
}

impl Hash for ReplicatedValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind().hash(state);
        match self {
            ReplicatedValue::Invalid => {}
            ReplicatedValue::Bool(v) => v.hash(state),
            ReplicatedValue::Integer(v) => v.hash(state),
            ReplicatedValue::Float(v) => float_bits(*v).hash(state),
            ReplicatedValue::String(v) => v.as_bytes().hash(state),
            ReplicatedValue::Vector2(v) => hash_components(&v.to_array()).hash(state),
            ReplicatedValue::Vector3(v) => hash_components(&v.to_array()).hash(state),
            ReplicatedValue::Vector4(v) => hash_components(&v.to_array()).hash(state),
            ReplicatedValue::StringMap(map) => {
                let combined = map.iter().fold(0u64, |acc, (key, value)| {
                    acc.wrapping_add(hash_one(key.as_bytes()) ^ hash_one(value).rotate_left(1))
                });
                combined.hash(state);
            }
        }
    }
}

impl From<bool> for ReplicatedValue {
    fn from(value: bool) -> Self {
        ReplicatedValue::Bool(value)
    }
}

impl From<i64> for ReplicatedValue {
    fn from(value: i64) -> Self {
        ReplicatedValue::Integer(value)
    }
}

impl From<i32> for ReplicatedValue {
    fn from(value: i32) -> Self {
        ReplicatedValue::Integer(i64::from(value))
    }
}

impl From<u32> for ReplicatedValue {
    fn from(value: u32) -> Self {
        ReplicatedValue::Integer(i64::from(value))
    }
}

impl From<f32> for ReplicatedValue {
    fn from(value: f32) -> Self {
        ReplicatedValue::Float(value)
    }
}

impl From<&str> for ReplicatedValue {
    fn from(value: &str) -> Self {
        ReplicatedValue::String(value.to_string())
    }
}

impl From<String> for ReplicatedValue {
    fn from(value: String) -> Self {
        ReplicatedValue::String(value)
    }
}

impl From<Vector2> for ReplicatedValue {
    fn from(value: Vector2) -> Self {
        ReplicatedValue::Vector2(value)
    }
}

impl From<Vector3> for ReplicatedValue {
    fn from(value: Vector3) -> Self {
        ReplicatedValue::Vector3(value)
    }
}

impl From<Vector4> for ReplicatedValue {
    fn from(value: Vector4) -> Self {
        ReplicatedValue::Vector4(value)
    }
}

impl From<StringMap> for ReplicatedValue {
    fn from(value: StringMap) -> Self {
        ReplicatedValue::StringMap(value)
    }
}
