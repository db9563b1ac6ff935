//! # Component Packing
//!
//! Converts between a [`PropertyStore`]'s in-memory values and the transport's
//! [`WireValue`]s.
//!
//! ## Value Mapping
//! ```text
//! Bool        <-> Bool
//! Integer     <-> Int64            (UInt64, Byte also accepted inbound)
//! Float       <-> Float32          (never widened; Double is rejected)
//! String      <-> String
//! Vector2/3/4 <-> FloatArray[2/3/4] (any other length is rejected)
//! StringMap   <-> StringMap        (recursive)
//! Invalid     <-> Null
//! ```
//!
//! ## Packed Component Layout
//! A packed component is an integer-keyed map whose first entry is
//! [`COMPONENT_TYPE_PROPERTY_KEY`] carrying the component type as `UInt64`,
//! followed by every property in ascending key order.

use crate::core::keys::{
    is_reserved_property_key, is_view_component_key, ComponentType, PropertyKey,
    COMPONENT_TYPE_PROPERTY_KEY,
};
use crate::core::wire_value::{WireIntMap, WireValue};
use crate::error::{ReplicationError, Result};
use crate::store::PropertyStore;
use crate::utils::metrics::global_metrics;
use crate::value::{ReplicatedValue, StringMap, Vector2, Vector3, Vector4};
use std::collections::BTreeMap;
use tracing::debug;

/// Nesting limit applied when no explicit limit is configured
pub const DEFAULT_MAX_MAP_DEPTH: usize = 16;

/// Convert one replicated value to its wire form.
pub fn pack_value(value: &ReplicatedValue) -> WireValue {
    match value {
        ReplicatedValue::Invalid => WireValue::Null,
        ReplicatedValue::Bool(v) => WireValue::Bool(*v),
        ReplicatedValue::Integer(v) => WireValue::Int64(*v),
        ReplicatedValue::Float(v) => WireValue::Float32(*v),
        ReplicatedValue::String(v) => WireValue::String(v.clone()),
        ReplicatedValue::Vector2(v) => WireValue::FloatArray(v.to_array().to_vec()),
        ReplicatedValue::Vector3(v) => WireValue::FloatArray(v.to_array().to_vec()),
        ReplicatedValue::Vector4(v) => WireValue::FloatArray(v.to_array().to_vec()),
        ReplicatedValue::StringMap(map) => WireValue::StringMap(
            map.iter()
                .map(|(key, entry)| (key.clone(), pack_value(entry)))
                .collect(),
        ),
    }
}

/// Convert a wire value back into a replicated value.
///
/// # Errors
/// Returns a schema violation for any wire shape without a replicated equivalent.
pub fn unpack_value(wire: &WireValue) -> Result<ReplicatedValue> {
    unpack_value_with_depth(wire, DEFAULT_MAX_MAP_DEPTH)
}

/// Like [`unpack_value`], rejecting string maps nested deeper than `max_depth`.
pub fn unpack_value_with_depth(wire: &WireValue, max_depth: usize) -> Result<ReplicatedValue> {
    let result = unpack_nested(wire, max_depth, 0);
    if result.is_err() {
        global_metrics().schema_violation();
    }
    result
}

fn unpack_nested(wire: &WireValue, max_depth: usize, depth: usize) -> Result<ReplicatedValue> {
    match wire {
        WireValue::Null => Ok(ReplicatedValue::Invalid),
        WireValue::Bool(v) => Ok(ReplicatedValue::Bool(*v)),
        WireValue::Byte(v) => Ok(ReplicatedValue::Integer(i64::from(*v))),
        WireValue::Int64(v) => Ok(ReplicatedValue::Integer(*v)),
        WireValue::UInt64(v) => i64::try_from(*v)
            .map(ReplicatedValue::Integer)
            .map_err(|_| ReplicationError::IntegerOutOfRange(*v)),
        WireValue::Float32(v) => Ok(ReplicatedValue::Float(*v)),
        WireValue::Double(_) => Err(ReplicationError::UnsupportedWireKind(
            "double".to_string(),
        )),
        WireValue::String(v) => Ok(ReplicatedValue::String(v.clone())),
        WireValue::FloatArray(items) => match items.as_slice() {
            [x, y] => Ok(ReplicatedValue::Vector2(Vector2::new(*x, *y))),
            [x, y, z] => Ok(ReplicatedValue::Vector3(Vector3::new(*x, *y, *z))),
            [x, y, z, w] => Ok(ReplicatedValue::Vector4(Vector4::new(*x, *y, *z, *w))),
            other => Err(ReplicationError::InvalidVectorLength(other.len())),
        },
        WireValue::StringMap(entries) => {
            if depth >= max_depth {
                return Err(ReplicationError::MapTooDeep(max_depth));
            }
            let mut map = StringMap::new();
            for (key, entry) in entries {
                map.insert(key.clone(), unpack_nested(entry, max_depth, depth + 1)?);
            }
            Ok(ReplicatedValue::StringMap(map))
        }
        WireValue::Array(_) | WireValue::IntMap(_) => {
            Err(ReplicationError::UnexpectedWireShape {
                expected: "replicated value".to_string(),
                found: wire.kind_name().to_string(),
            })
        }
    }
}

/// Pack any integer-backed enum through the Int64 path.
pub fn pack_enum<E>(value: E) -> WireValue
where
    E: Into<i64>,
{
    WireValue::Int64(value.into())
}

/// Unpack an integer-backed enum.
///
/// # Errors
/// Schema violation when the wire value is not an integer or the ordinal is unknown.
pub fn unpack_enum<E>(wire: &WireValue) -> Result<E>
where
    E: TryFrom<i64>,
{
    unpack_value(wire)?.to_enum::<E>().map_err(|e| match e {
        ReplicationError::WrongKind { actual, .. } => ReplicationError::UnexpectedWireShape {
            expected: "integer".to_string(),
            found: actual.name().to_string(),
        },
        other => other,
    })
}

/// Converts component property sets into packed wire maps.
pub struct ComponentPacker;

impl ComponentPacker {
    /// Pack a whole component: type key first, then every property.
    pub fn pack(store: &PropertyStore) -> WireIntMap {
        Self::pack_properties(store.component_type(), store.properties())
    }

    /// Pack an arbitrary property set under `component_type`.
    pub fn pack_properties<'a, I>(component_type: ComponentType, properties: I) -> WireIntMap
    where
        I: IntoIterator<Item = (&'a PropertyKey, &'a ReplicatedValue)>,
    {
        let mut packed = vec![(
            u64::from(COMPONENT_TYPE_PROPERTY_KEY),
            WireValue::UInt64(component_type.0),
        )];
        packed.extend(
            properties
                .into_iter()
                .map(|(key, value)| (u64::from(*key), pack_value(value))),
        );
        global_metrics().component_packed();
        packed
    }
}

/// A component reconstructed from its packed form
#[derive(Debug, Clone, PartialEq)]
pub struct UnpackedComponent {
    pub component_type: ComponentType,
    pub properties: BTreeMap<PropertyKey, ReplicatedValue>,
}

/// Reads an entity's packed component map.
pub struct ComponentUnpacker<'a> {
    components: &'a [(u64, WireValue)],
}

impl<'a> ComponentUnpacker<'a> {
    /// Wrap an entity's component map (component id -> packed component).
    pub fn new(components: &'a [(u64, WireValue)]) -> Self {
        Self { components }
    }

    /// Number of ordinary components, excluding view components
    pub fn runtime_components_count(&self) -> usize {
        self.components
            .iter()
            .filter(|(key, _)| !is_view_component_key(*key))
            .count()
    }

    /// Number of view components
    pub fn view_components_count(&self) -> usize {
        self.total_count() - self.runtime_components_count()
    }

    pub fn total_count(&self) -> usize {
        self.components.len()
    }

    /// Unpack one packed component.
    ///
    /// # Errors
    /// - `MissingComponentType` when the type key is absent
    /// - a schema violation for any property that cannot be unpacked
    pub fn unpack_component(packed: &[(u64, WireValue)]) -> Result<UnpackedComponent> {
        Self::unpack_component_with_depth(packed, DEFAULT_MAX_MAP_DEPTH)
    }

    pub fn unpack_component_with_depth(
        packed: &[(u64, WireValue)],
        max_depth: usize,
    ) -> Result<UnpackedComponent> {
        let mut component_type = None;
        let mut properties = BTreeMap::new();

        for (key, wire) in packed {
            if *key == u64::from(COMPONENT_TYPE_PROPERTY_KEY) {
                component_type = Some(Self::component_type_of(wire)?);
                continue;
            }

            let key = PropertyKey::try_from(*key).map_err(|_| {
                ReplicationError::UnexpectedWireShape {
                    expected: "32-bit property key".to_string(),
                    found: key.to_string(),
                }
            })?;

            if is_reserved_property_key(key) {
                debug!(key, "Skipping unrecognised reserved property key");
                continue;
            }

            properties.insert(key, unpack_value_with_depth(wire, max_depth)?);
        }

        let component_type = component_type.ok_or_else(|| {
            global_metrics().schema_violation();
            ReplicationError::MissingComponentType
        })?;

        global_metrics().component_unpacked();
        Ok(UnpackedComponent {
            component_type,
            properties,
        })
    }

    /// Unpack `packed` and apply it to `store` as a remote update.
    pub fn unpack_into(packed: &[(u64, WireValue)], store: &mut PropertyStore) -> Result<()> {
        Self::unpack_into_with_depth(packed, store, DEFAULT_MAX_MAP_DEPTH)
    }

    /// Like [`unpack_into`](Self::unpack_into), rejecting string maps nested
    /// deeper than `max_depth`.
    pub fn unpack_into_with_depth(
        packed: &[(u64, WireValue)],
        store: &mut PropertyStore,
        max_depth: usize,
    ) -> Result<()> {
        let unpacked = Self::unpack_component_with_depth(packed, max_depth)?;
        if unpacked.component_type != store.component_type() {
            return Err(ReplicationError::UnexpectedWireShape {
                expected: format!("component type {}", store.component_type()),
                found: format!("component type {}", unpacked.component_type),
            });
        }
        for (key, value) in unpacked.properties {
            store.apply_remote(key, value)?;
        }
        Ok(())
    }

    pub(crate) fn component_type_of(wire: &WireValue) -> Result<ComponentType> {
        match wire {
            WireValue::UInt64(v) => Ok(ComponentType(*v)),
            WireValue::Int64(v) if *v >= 0 => Ok(ComponentType(v.unsigned_abs())),
            other => Err(ReplicationError::UnexpectedWireShape {
                expected: "uint64 component type".to_string(),
                found: other.kind_name().to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_stays_single_precision() {
        assert_eq!(
            pack_value(&ReplicatedValue::Float(1.25)),
            WireValue::Float32(1.25)
        );
    }

    #[test]
    fn test_double_rejected() {
        let err = unpack_value(&WireValue::Double(1.0)).unwrap_err();
        assert!(matches!(err, ReplicationError::UnsupportedWireKind(_)));
    }

    #[test]
    fn test_vector_length_disambiguation() {
        assert!(matches!(
            unpack_value(&WireValue::FloatArray(vec![1.0, 2.0, 3.0])),
            Ok(ReplicatedValue::Vector3(_))
        ));
        assert!(matches!(
            unpack_value(&WireValue::FloatArray(vec![1.0; 5])),
            Err(ReplicationError::InvalidVectorLength(5))
        ));
        assert!(matches!(
            unpack_value(&WireValue::FloatArray(vec![])),
            Err(ReplicationError::InvalidVectorLength(0))
        ));
    }

    #[test]
    fn test_int_map_in_value_position_rejected() {
        let wire = WireValue::IntMap(vec![(1, WireValue::Bool(true))]);
        assert!(matches!(
            unpack_value(&wire),
            Err(ReplicationError::UnexpectedWireShape { .. })
        ));
    }

    #[test]
    fn test_uint64_overflow_rejected() {
        assert!(matches!(
            unpack_value(&WireValue::UInt64(u64::MAX)),
            Err(ReplicationError::IntegerOutOfRange(_))
        ));
        assert_eq!(
            unpack_value(&WireValue::UInt64(7)).ok(),
            Some(ReplicatedValue::Integer(7))
        );
    }

    #[test]
    fn test_depth_limit() {
        let mut wire = WireValue::StringMap(BTreeMap::new());
        for _ in 0..3 {
            let mut outer = BTreeMap::new();
            outer.insert("inner".to_string(), wire);
            wire = WireValue::StringMap(outer);
        }
        assert!(unpack_value_with_depth(&wire, 4).is_ok());
        assert!(matches!(
            unpack_value_with_depth(&wire, 3),
            Err(ReplicationError::MapTooDeep(3))
        ));
    }

    #[test]
    fn test_type_key_written_first() {
        let properties = BTreeMap::from([(2, ReplicatedValue::Bool(true))]);
        let packed = ComponentPacker::pack_properties(ComponentType(9), &properties);
        assert_eq!(packed[0].0, u64::from(COMPONENT_TYPE_PROPERTY_KEY));
        assert_eq!(packed[0].1, WireValue::UInt64(9));
        assert_eq!(packed.len(), 2);
    }

    #[test]
    fn test_missing_type_key() {
        let packed = vec![(0, WireValue::Bool(true))];
        assert!(matches!(
            ComponentUnpacker::unpack_component(&packed),
            Err(ReplicationError::MissingComponentType)
        ));
    }
}
