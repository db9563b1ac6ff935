//! Integration tests for the replicated value model
//!
//! Covers kind tracking, typed access, equality/hash consistency and the
//! cross-kind partial order.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use replication_core::error::{ErrorCategory, ReplicationError};
use replication_core::value::{ReplicatedValue, ReplicatedValueKind, StringMap, Vector2, Vector3, Vector4};
use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

fn hash_of(value: &ReplicatedValue) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

#[test]
fn test_default_is_invalid() {
    let value = ReplicatedValue::default();
    assert_eq!(value.kind(), ReplicatedValueKind::Invalid);
    assert!(!value.is_valid());
}

#[test]
fn test_constructors_set_kind() {
    let cases = [
        (ReplicatedValue::from(true), ReplicatedValueKind::Bool),
        (ReplicatedValue::from(3_i64), ReplicatedValueKind::Integer),
        (ReplicatedValue::from(3_i32), ReplicatedValueKind::Integer),
        (ReplicatedValue::from(1.5_f32), ReplicatedValueKind::Float),
        (ReplicatedValue::from("text"), ReplicatedValueKind::String),
        (ReplicatedValue::from(Vector2::ONE), ReplicatedValueKind::Vector2),
        (ReplicatedValue::from(Vector3::ONE), ReplicatedValueKind::Vector3),
        (ReplicatedValue::from(Vector4::IDENTITY), ReplicatedValueKind::Vector4),
        (ReplicatedValue::from(StringMap::new()), ReplicatedValueKind::StringMap),
    ];
    for (value, kind) in cases {
        assert_eq!(value.kind(), kind);
        assert!(value.is_valid());
    }
}

#[test]
fn test_wrong_kind_read_is_contract_violation() {
    let value = ReplicatedValue::from(42_i64);
    let err = value.as_string().unwrap_err();
    assert!(matches!(
        err,
        ReplicationError::WrongKind {
            expected: ReplicatedValueKind::String,
            actual: ReplicatedValueKind::Integer,
        }
    ));
    assert_eq!(err.category(), ErrorCategory::ContractViolation);
    assert_eq!(value.as_integer().unwrap(), 42);
}

#[test]
fn test_setters_replace_kind() {
    let mut value = ReplicatedValue::from(1_i64);
    value.set_string("now a string");
    assert_eq!(value.kind(), ReplicatedValueKind::String);
    assert_eq!(value.as_string().unwrap(), "now a string");

    value.set_vector3(Vector3::new(1.0, 2.0, 3.0));
    assert_eq!(value.as_vector3().unwrap(), Vector3::new(1.0, 2.0, 3.0));
}

#[test]
fn test_take_leaves_invalid() {
    let mut value = ReplicatedValue::from("moved");
    let taken = value.take();
    assert_eq!(taken.as_string().unwrap(), "moved");
    assert!(!value.is_valid());
}

#[test]
fn test_clone_is_deep() {
    let mut inner = StringMap::new();
    inner.insert("leaf".to_string(), ReplicatedValue::from(1_i64));
    let mut outer = StringMap::new();
    outer.insert("inner".to_string(), ReplicatedValue::from(inner));
    let original = ReplicatedValue::from(outer);

    let mut copy = original.clone();
    copy.as_string_map_mut()
        .unwrap()
        .get_mut("inner")
        .unwrap()
        .as_string_map_mut()
        .unwrap()
        .insert("leaf".to_string(), ReplicatedValue::from(2_i64));

    let leaf = original.as_string_map().unwrap()["inner"]
        .as_string_map()
        .unwrap()["leaf"]
        .clone();
    assert_eq!(leaf, ReplicatedValue::from(1_i64));
    assert_ne!(original, copy);
}

#[test]
fn test_equality_requires_same_kind() {
    assert_ne!(ReplicatedValue::from(1_i64), ReplicatedValue::from(1.0_f32));
    assert_ne!(ReplicatedValue::from(0_i64), ReplicatedValue::from(false));
    assert_eq!(ReplicatedValue::Invalid, ReplicatedValue::Invalid);
}

#[test]
fn test_equal_values_hash_equal() {
    let pairs = [
        (ReplicatedValue::from(0.0_f32), ReplicatedValue::from(-0.0_f32)),
        (ReplicatedValue::from("abc"), ReplicatedValue::from(String::from("abc"))),
        (
            ReplicatedValue::from(Vector3::new(1.0, 2.0, 3.0)),
            ReplicatedValue::from(Vector3::new(1.0, 2.0, 3.0)),
        ),
    ];
    for (a, b) in pairs {
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }
}

#[test]
fn test_vector_with_zero_component_hashes_equal() {
    let a = ReplicatedValue::from(Vector3::new(15.0, 0.0, 999.99));
    let b = ReplicatedValue::from(Vector3::new(15.0, -0.0, 999.99));
    assert_eq!(a, a.clone());
    assert_eq!(a, b);
    assert_eq!(hash_of(&a), hash_of(&a.clone()));
    assert_eq!(hash_of(&a), hash_of(&b));
}

#[test]
fn test_integer_and_float_of_same_number_stay_apart() {
    let integer = ReplicatedValue::from(42_i64);
    let float = ReplicatedValue::from(42.0_f32);
    assert_ne!(integer, float);
    assert_ne!(hash_of(&integer), hash_of(&float));
    assert!(!(integer < float));
    assert!(!(integer > float));
}

#[test]
fn test_nan_equals_itself() {
    let nan = ReplicatedValue::from(f32::NAN);
    assert_eq!(nan, nan.clone());
    assert_eq!(nan.partial_cmp(&nan), Some(Ordering::Equal));
    assert_ne!(nan, ReplicatedValue::from(0.0_f32));

    let other_nan = ReplicatedValue::from(f32::from_bits(f32::NAN.to_bits() ^ 1));
    assert_eq!(nan, other_nan);
    assert_eq!(hash_of(&nan), hash_of(&other_nan));

    let mut set = HashSet::new();
    set.insert(nan.clone());
    set.insert(other_nan);
    set.insert(ReplicatedValue::from(Vector2::new(f32::NAN, 1.0)));
    set.insert(ReplicatedValue::from(Vector2::new(f32::NAN, 1.0)));
    assert_eq!(set.len(), 2);
    assert!(set.contains(&nan));
}

#[test]
fn test_string_map_hash_ignores_insertion_order() {
    let mut first = StringMap::new();
    first.insert("a".to_string(), ReplicatedValue::from(1_i64));
    first.insert("b".to_string(), ReplicatedValue::from(true));

    let mut second = StringMap::new();
    second.insert("b".to_string(), ReplicatedValue::from(true));
    second.insert("a".to_string(), ReplicatedValue::from(1_i64));

    let first = ReplicatedValue::from(first);
    let second = ReplicatedValue::from(second);
    assert_eq!(first, second);
    assert_eq!(hash_of(&first), hash_of(&second));
}

#[test]
fn test_vector_component_order_affects_hash_set() {
    let mut set = HashSet::new();
    set.insert(ReplicatedValue::from(Vector2::new(1.0, 2.0)));
    set.insert(ReplicatedValue::from(Vector2::new(2.0, 1.0)));
    set.insert(ReplicatedValue::from(Vector2::new(1.0, 2.0)));
    assert_eq!(set.len(), 2);
}

#[test]
fn test_partial_order() {
    let one = ReplicatedValue::from(1_i64);
    let two = ReplicatedValue::from(2_i64);
    assert!(one < two);
    assert_eq!(one.partial_cmp(&one), Some(Ordering::Equal));

    let low = ReplicatedValue::from(0.5_f32);
    let high = ReplicatedValue::from(1.5_f32);
    assert!(low < high);

    // different kinds are unordered
    assert_eq!(one.partial_cmp(&high), None);
    assert!(!(one < high) && !(one > high));

    // same non-numeric kind: only equality is defined
    let a = ReplicatedValue::from("a");
    let b = ReplicatedValue::from("b");
    assert_eq!(a.partial_cmp(&a.clone()), Some(Ordering::Equal));
    assert_eq!(a.partial_cmp(&b), None);
}
