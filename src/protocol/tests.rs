// test-only module included via protocol/mod.rs
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use crate::core::keys::{ComponentType, ViewComponent};
use crate::core::wire_value::WireValue;
use crate::protocol::entity_codec::{EntityReader, EntityWriter};
use crate::protocol::value_tree::{ValueTreeReader, ValueTreeWriter};
use crate::store::PropertyStore;
use crate::value::{ReplicatedValue, Vector3};

#[test]
fn test_store_roundtrip_through_codec() {
    // =================== Step 1: Local store ===================
    let mut local = PropertyStore::new(
        7,
        ComponentType(3),
        [
            (0, ReplicatedValue::from(Vector3::ZERO)),
            (1, ReplicatedValue::from(true)),
        ],
    )
    .expect("valid defaults");
    local
        .set_property(0, Vector3::new(1.0, 2.0, 3.0))
        .expect("same kind");

    // =================== Step 2: Write entity ===================
    let mut writer = ValueTreeWriter::new();
    writer.begin_entity().expect("begin entity");
    writer.write_uint64(99).expect("entity id");
    writer.begin_components().expect("begin components");
    writer.write_store(&local).expect("write store");
    writer.end_components().expect("end components");
    writer
        .add_view_component(ViewComponent::Name, &"crate".into())
        .expect("view");
    writer.end_entity().expect("end entity");
    let tree = writer.finish().expect("completed tree");

    // =================== Step 3: Remote replica ===================
    let mut remote = PropertyStore::new(
        7,
        ComponentType(3),
        [
            (0, ReplicatedValue::from(Vector3::ZERO)),
            (1, ReplicatedValue::from(true)),
        ],
    )
    .expect("valid defaults");

    let mut reader = ValueTreeReader::new(&tree);
    reader.enter_entity().expect("enter entity");
    assert_eq!(reader.read_uint64().expect("entity id"), 99);
    reader.enter_components().expect("enter components");
    assert_eq!(reader.num_components().expect("count"), 2);
    assert_eq!(reader.num_real_components().expect("count"), 1);

    let (id, component_type) = reader.enter_component().expect("component");
    assert_eq!((id, component_type), (7, ComponentType(3)));
    reader.read_into_store(&mut remote).expect("apply");
    reader.leave_component().expect("leave component");
    reader.leave_components().expect("leave components");
    assert!(reader
        .has_view_component(ViewComponent::Name)
        .expect("view lookup"));
    reader.leave_entity().expect("leave entity");

    // =================== Step 4: Replicas agree ===================
    assert_eq!(remote.properties(), local.properties());
}

#[test]
fn test_skip_tolerates_unknown_trailing_fields() {
    let tree = WireValue::Array(vec![
        WireValue::UInt64(1),
        WireValue::String("added by a newer peer".to_string()),
        WireValue::Array(vec![WireValue::Bool(true)]),
        WireValue::IntMap(Vec::new()),
    ]);

    let mut reader = ValueTreeReader::new(&tree);
    reader.enter_entity().expect("enter");
    assert_eq!(reader.read_uint64().expect("id"), 1);
    reader.skip().expect("skip string");
    assert!(reader.next_value_is_array());
    reader.skip().expect("skip array");
    assert!(reader.read_bool().is_err());
    reader.enter_components().expect("components");
    assert_eq!(reader.num_real_components().expect("count"), 0);
    reader.leave_components().expect("leave components");
    reader.leave_entity().expect("leave");
}
