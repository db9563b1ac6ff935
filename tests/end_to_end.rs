//! End-to-end replication of one entity between two peers

#![allow(clippy::expect_used, clippy::unwrap_used)]

use replication_core::core::keys::{ComponentType, ViewComponent};
use replication_core::core::serialization::{MultiFormat, SerializationFormat};
use replication_core::core::wire_value::WireValue;
use replication_core::protocol::{
    EntityReader, EntityWriter, EventDispatcher, InboundEvent, ValueTreeReader, ValueTreeWriter,
};
use replication_core::store::{ComponentTemplates, DirtyComponents, PropertyStore};
use replication_core::value::{ReplicatedValue, Vector3};
use std::sync::Arc;

const TRANSFORM: ComponentType = ComponentType(1);
const POSITION: u32 = 0;
const IS_VISIBLE: u32 = 1;

fn transform_store(component_id: u16) -> PropertyStore {
    PropertyStore::new(
        component_id,
        TRANSFORM,
        [
            (POSITION, ReplicatedValue::from(Vector3::ZERO)),
            (IS_VISIBLE, ReplicatedValue::from(true)),
        ],
    )
    .unwrap()
}

fn write_entity_tree(entity_id: u64, store: &PropertyStore) -> WireValue {
    let mut writer = ValueTreeWriter::new();
    writer.begin_entity().unwrap();
    writer.write_uint64(entity_id).unwrap();
    writer.write_string("Crate").unwrap();
    writer.begin_components().unwrap();
    writer.write_store(store).unwrap();
    writer
        .add_view_component(ViewComponent::LockType, &ReplicatedValue::from(0_i64))
        .unwrap();
    writer.end_components().unwrap();
    writer.end_entity().unwrap();
    writer.finish().unwrap()
}

#[test]
fn test_local_edit_reaches_remote_peer() {
    // Step 1: local peer edits two properties
    let dirty = Arc::new(DirtyComponents::new());
    let mut local = transform_store(3).with_notifier(dirty.clone());

    local.set_property(POSITION, Vector3::new(1.0, 2.0, 3.0)).unwrap();
    local.set_property(IS_VISIBLE, false).unwrap();
    assert_eq!(dirty.take_dirty(), vec![3]);

    // Step 2: serialize the entity and ship it as bytes
    let tree = write_entity_tree(55, &local);
    let bytes = tree
        .serialize_with_header(SerializationFormat::MessagePack)
        .unwrap();
    let (received, _) = WireValue::deserialize_with_header(&bytes).unwrap();

    // Step 3: remote peer replays it into its own copy
    let remote_dirty = Arc::new(DirtyComponents::new());
    let mut remote = transform_store(3).with_notifier(remote_dirty.clone());

    let mut reader = ValueTreeReader::new(&received);
    reader.enter_entity().unwrap();
    assert_eq!(reader.read_uint64().unwrap(), 55);
    assert_eq!(reader.read_string().unwrap(), "Crate");
    reader.enter_components().unwrap();
    assert_eq!(reader.num_components().unwrap(), 2);
    assert_eq!(reader.num_real_components().unwrap(), 1);
    assert!(reader.has_view_component(ViewComponent::LockType).unwrap());

    let (component_id, component_type) = reader.enter_component().unwrap();
    assert_eq!((component_id, component_type), (3, TRANSFORM));
    reader.read_into_store(&mut remote).unwrap();
    reader.leave_component().unwrap();
    reader.leave_components().unwrap();
    reader.leave_entity().unwrap();

    // Step 4: both copies agree and the inbound patch was not echoed
    assert_eq!(remote.properties(), local.properties());
    assert!(remote_dirty.is_empty());
}

#[test]
fn test_kind_conflict_leaves_remote_untouched() {
    let mut local = PropertyStore::new(
        3,
        TRANSFORM,
        [(POSITION, ReplicatedValue::from("not a vector"))],
    )
    .unwrap();
    local.set_property(POSITION, "still not a vector").unwrap();

    let tree = write_entity_tree(1, &local);
    let mut remote = transform_store(3);

    let mut reader = ValueTreeReader::new(&tree);
    reader.enter_entity().unwrap();
    reader.enter_components().unwrap();
    reader.enter_component().unwrap();
    assert!(reader.read_into_store(&mut remote).is_err());
    assert_eq!(remote.get_property(POSITION), &ReplicatedValue::from(Vector3::ZERO));
}

#[test]
fn test_template_backed_stores_replicate() {
    let templates = ComponentTemplates::from_json(
        r#"{"components": [{"type": 1, "name": "Transform", "properties": [
            {"name": "Position", "type": "vec3", "value": [0, 0, 0]},
            {"name": "IsVisible", "type": "bool", "value": true}
        ]}]}"#,
    )
    .unwrap();

    let mut local = templates.instantiate(TRANSFORM, 9).unwrap();
    let position = templates.get(TRANSFORM).unwrap().key_of("Position").unwrap();
    local.set_property(position, Vector3::ONE).unwrap();

    let tree = write_entity_tree(2, &local);
    let mut remote = templates.instantiate(TRANSFORM, 9).unwrap();
    let mut reader = ValueTreeReader::new(&tree);
    reader.enter_entity().unwrap();
    reader.enter_components().unwrap();
    reader.enter_component().unwrap();
    reader.read_into_store(&mut remote).unwrap();

    assert_eq!(remote.get_property(position), &ReplicatedValue::from(Vector3::ONE));
}

#[test]
fn test_change_event_follows_entity_update() {
    let dispatcher = EventDispatcher::new();
    let received = Arc::new(std::sync::Mutex::new(None));
    let sink = received.clone();
    dispatcher
        .register("EntityTouched", move |event| {
            *sink.lock().unwrap() = Some(event.clone());
            Ok(())
        })
        .unwrap();

    let inbound = InboundEvent::new(
        "EntityTouched",
        4,
        vec![WireValue::Int64(55), WireValue::FloatArray(vec![1.0, 2.0, 3.0])],
    );
    let framed = inbound.to_wire();
    dispatcher
        .dispatch_inbound(&InboundEvent::from_wire(&framed).unwrap())
        .unwrap();

    let event = received.lock().unwrap().take().unwrap();
    assert_eq!(event.sender_client_id, 4);
}
