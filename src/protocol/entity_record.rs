//! # Entity Records
//!
//! Owned snapshot of one replicated entity, and the field order used to stream it
//! through any [`EntityWriter`]/[`EntityReader`] binding.
//!
//! ## Field Order
//! ```text
//! 0  id               uint64
//! 1  entity type      uint64
//! 2  is transferable  bool
//! 3  is persistent    bool
//! 4  owner id         uint64
//! 5  parent id        uint64 | null
//! ```
//! followed by the components section. Fields appended after the parent id by a
//! newer peer are ignored on read.

use crate::core::keys::{ComponentId, ComponentType, PropertyKey, ViewComponent};
use crate::core::serialization::MultiFormat;
use crate::error::Result;
use crate::protocol::entity_codec::{EntityReader, EntityWriter};
use crate::store::PropertyStore;
use crate::value::ReplicatedValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::instrument;

/// One component and its properties, in written order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub id: ComponentId,
    pub component_type: ComponentType,
    pub properties: Vec<(PropertyKey, ReplicatedValue)>,
}

impl ComponentRecord {
    pub fn from_store(store: &PropertyStore) -> Self {
        Self {
            id: store.component_id(),
            component_type: store.component_type(),
            properties: store
                .properties()
                .iter()
                .map(|(key, value)| (*key, value.clone()))
                .collect(),
        }
    }

    /// Build a store whose default set is exactly this record's properties.
    pub fn to_store(&self) -> Result<PropertyStore> {
        PropertyStore::new(self.id, self.component_type, self.properties.iter().cloned())
    }
}

/// A full entity as exchanged on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: u64,
    pub entity_type: u64,
    pub is_transferable: bool,
    pub is_persistent: bool,
    pub owner_id: u64,
    pub parent_id: Option<u64>,
    pub components: Vec<ComponentRecord>,
    pub views: BTreeMap<ViewComponent, ReplicatedValue>,
}

impl EntityRecord {
    pub fn new(id: u64, entity_type: u64, owner_id: u64) -> Self {
        Self {
            id,
            entity_type,
            is_transferable: true,
            is_persistent: true,
            owner_id,
            parent_id: None,
            components: Vec::new(),
            views: BTreeMap::new(),
        }
    }

    pub fn component(&self, id: ComponentId) -> Option<&ComponentRecord> {
        self.components.iter().find(|component| component.id == id)
    }

    pub fn view(&self, view: ViewComponent) -> Option<&ReplicatedValue> {
        self.views.get(&view)
    }
}

impl MultiFormat for EntityRecord {
    fn json_representable(&self) -> bool {
        self.views.values().all(ReplicatedValue::is_finite)
            && self.components.iter().all(|component| {
                component
                    .properties
                    .iter()
                    .all(|(_, value)| value.is_finite())
            })
    }
}

/// Stream `record` through `writer` as one bracketed entity.
#[instrument(level = "debug", skip_all, fields(entity_id = record.id))]
pub fn write_entity<W>(writer: &mut W, record: &EntityRecord) -> Result<()>
where
    W: EntityWriter + ?Sized,
{
    writer.begin_entity()?;

    writer.write_uint64(record.id)?;
    writer.write_uint64(record.entity_type)?;
    writer.write_bool(record.is_transferable)?;
    writer.write_bool(record.is_persistent)?;
    writer.write_uint64(record.owner_id)?;
    match record.parent_id {
        Some(parent) => writer.write_uint64(parent)?,
        None => writer.write_null()?,
    }

    writer.begin_components()?;
    for component in &record.components {
        writer.begin_component(component.id, component.component_type)?;
        for (key, value) in &component.properties {
            writer.write_property(*key, value)?;
        }
        writer.end_component()?;
    }
    writer.end_components()?;

    for (view, value) in &record.views {
        writer.add_view_component(*view, value)?;
    }

    writer.end_entity()
}

/// Replay one bracketed entity from `reader`.
#[instrument(level = "debug", skip_all)]
pub fn read_entity<R>(reader: &mut R) -> Result<EntityRecord>
where
    R: EntityReader + ?Sized,
{
    reader.enter_entity()?;

    let id = reader.read_uint64()?;
    let entity_type = reader.read_uint64()?;
    let is_transferable = reader.read_bool()?;
    let is_persistent = reader.read_bool()?;
    let owner_id = reader.read_uint64()?;
    let parent_id = if reader.next_value_is_null() {
        reader.read_null()?;
        None
    } else {
        Some(reader.read_uint64()?)
    };

    reader.enter_components()?;
    let count = reader.num_real_components()?;
    let mut components = Vec::with_capacity(count);
    for _ in 0..count {
        let (component_id, component_type) = reader.enter_component()?;
        let property_count = reader.num_properties()?;
        let mut properties = Vec::with_capacity(property_count);
        for _ in 0..property_count {
            properties.push(reader.read_property()?);
        }
        reader.leave_component()?;
        components.push(ComponentRecord {
            id: component_id,
            component_type,
            properties,
        });
    }
    reader.leave_components()?;

    let mut views = BTreeMap::new();
    for view in ViewComponent::ALL {
        if let Some(value) = reader.view_component(view)? {
            views.insert(view, value);
        }
    }

    reader.leave_entity()?;

    Ok(EntityRecord {
        id,
        entity_type,
        is_transferable,
        is_persistent,
        owner_id,
        parent_id,
        components,
        views,
    })
}
