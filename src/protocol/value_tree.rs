//! # Value-Tree Binding
//!
//! Implements the entity codec over [`WireValue`] trees.
//!
//! ## Entity Layout
//! ```text
//! Array [
//!     field 0, field 1, ...,                 entity fields in written order
//!     IntMap {                               always the last element
//!         component id -> IntMap {           ordinary components, written order
//!             0xFFFF0000 -> UInt64(type),    type key first
//!             property key -> packed value,
//!         },
//!         view key -> packed value,          view components, keys >= 0xFF00
//!     }
//! ]
//! ```
//!
//! Readers tolerate entity fields they do not read (a newer peer may append some)
//! and reserved property keys they do not know.

use crate::config::CodecConfig;
use crate::core::keys::{
    is_reserved_property_key, is_view_component_key, ComponentId, ComponentType, PropertyKey,
    ViewComponent, COMPONENT_TYPE_PROPERTY_KEY,
};
use crate::core::packer::{
    pack_value, unpack_value_with_depth, ComponentUnpacker, DEFAULT_MAX_MAP_DEPTH,
};
use crate::core::wire_value::{WireIntMap, WireValue};
use crate::error::{constants, ReplicationError, Result};
use crate::protocol::entity_codec::{EntityReader, EntityWriter};
use crate::utils::metrics::global_metrics;
use crate::value::{ReplicatedValue, Vector2, Vector3, Vector4};
use tracing::{debug, trace};

enum WriteFrame {
    Entity {
        fields: Vec<WireValue>,
        components: Option<WireIntMap>,
        views: WireIntMap,
    },
    Array(Vec<WireValue>),
    Components(WireIntMap),
    Component {
        id: ComponentId,
        entries: WireIntMap,
    },
}

impl WriteFrame {
    fn name(&self) -> &'static str {
        match self {
            WriteFrame::Entity { .. } => "entity",
            WriteFrame::Array(_) => "array",
            WriteFrame::Components(_) => "components",
            WriteFrame::Component { .. } => "component",
        }
    }
}

/// Builds one entity as a [`WireValue`] tree.
///
/// The writer can be reused: every `begin_entity` starts a fresh tree, and
/// [`take_output`](Self::take_output) hands back the last completed one.
#[derive(Default)]
pub struct ValueTreeWriter {
    stack: Vec<WriteFrame>,
    output: Option<WireValue>,
}

impl ValueTreeWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of open brackets
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Take the completed entity tree.
    ///
    /// # Errors
    /// `CodecState` if an entity is still open or none was written.
    pub fn take_output(&mut self) -> Result<WireValue> {
        if let Some(open) = self.stack.last() {
            return Err(ReplicationError::CodecState(format!(
                "cannot take output while {} is open",
                open.name()
            )));
        }
        self.output
            .take()
            .ok_or_else(|| ReplicationError::codec(constants::ERR_NOT_IN_ENTITY))
    }

    /// Consume the writer, returning the completed entity tree.
    pub fn finish(mut self) -> Result<WireValue> {
        self.take_output()
    }

    fn unbalanced(&self, call: &str) -> ReplicationError {
        match self.stack.last() {
            Some(open) => {
                ReplicationError::CodecState(format!("{call} called while {} is open", open.name()))
            }
            None => ReplicationError::CodecState(format!("{call} called outside an entity")),
        }
    }

    fn push_field(&mut self, value: WireValue) -> Result<()> {
        match self.stack.last_mut() {
            Some(WriteFrame::Array(items)) => {
                items.push(value);
                Ok(())
            }
            Some(WriteFrame::Entity {
                fields,
                components: None,
                ..
            }) => {
                fields.push(value);
                Ok(())
            }
            Some(WriteFrame::Entity { .. }) => {
                Err(ReplicationError::codec(constants::ERR_COMPONENTS_CLOSED))
            }
            _ => Err(self.unbalanced("write")),
        }
    }
}

impl EntityWriter for ValueTreeWriter {
    fn begin_entity(&mut self) -> Result<()> {
        if !self.stack.is_empty() {
            return Err(self.unbalanced("begin_entity"));
        }
        self.output = None;
        self.stack.push(WriteFrame::Entity {
            fields: Vec::new(),
            components: None,
            views: Vec::new(),
        });
        Ok(())
    }

    fn end_entity(&mut self) -> Result<()> {
        if self.stack.len() != 1 {
            return Err(self.unbalanced("end_entity"));
        }
        let Some(WriteFrame::Entity {
            mut fields,
            components,
            views,
        }) = self.stack.pop()
        else {
            return Err(ReplicationError::codec(constants::ERR_NOT_IN_ENTITY));
        };

        let mut components = components.unwrap_or_default();
        debug!(
            fields = fields.len(),
            components = components.len(),
            views = views.len(),
            "Entity written"
        );
        components.extend(views);
        fields.push(WireValue::IntMap(components));
        self.output = Some(WireValue::Array(fields));
        Ok(())
    }

    fn write_bool(&mut self, value: bool) -> Result<()> {
        self.push_field(WireValue::Bool(value))
    }

    fn write_byte(&mut self, value: u8) -> Result<()> {
        self.push_field(WireValue::Byte(value))
    }

    fn write_double(&mut self, value: f64) -> Result<()> {
        self.push_field(WireValue::Double(value))
    }

    fn write_int64(&mut self, value: i64) -> Result<()> {
        self.push_field(WireValue::Int64(value))
    }

    fn write_uint64(&mut self, value: u64) -> Result<()> {
        self.push_field(WireValue::UInt64(value))
    }

    fn write_string(&mut self, value: &str) -> Result<()> {
        self.push_field(WireValue::String(value.to_string()))
    }

    fn write_vector2(&mut self, value: Vector2) -> Result<()> {
        self.push_field(WireValue::FloatArray(value.to_array().to_vec()))
    }

    fn write_vector3(&mut self, value: Vector3) -> Result<()> {
        self.push_field(WireValue::FloatArray(value.to_array().to_vec()))
    }

    fn write_vector4(&mut self, value: Vector4) -> Result<()> {
        self.push_field(WireValue::FloatArray(value.to_array().to_vec()))
    }

    fn write_null(&mut self) -> Result<()> {
        self.push_field(WireValue::Null)
    }

    fn begin_array(&mut self) -> Result<()> {
        match self.stack.last() {
            Some(WriteFrame::Array(_))
            | Some(WriteFrame::Entity {
                components: None, ..
            }) => {
                self.stack.push(WriteFrame::Array(Vec::new()));
                Ok(())
            }
            Some(WriteFrame::Entity { .. }) => {
                Err(ReplicationError::codec(constants::ERR_COMPONENTS_CLOSED))
            }
            _ => Err(self.unbalanced("begin_array")),
        }
    }

    fn end_array(&mut self) -> Result<()> {
        match self.stack.pop() {
            Some(WriteFrame::Array(items)) => self.push_field(WireValue::Array(items)),
            Some(other) => {
                self.stack.push(other);
                Err(self.unbalanced("end_array"))
            }
            None => Err(self.unbalanced("end_array")),
        }
    }

    fn begin_components(&mut self) -> Result<()> {
        match self.stack.last() {
            Some(WriteFrame::Entity {
                components: None, ..
            }) => {
                self.stack.push(WriteFrame::Components(Vec::new()));
                Ok(())
            }
            Some(WriteFrame::Entity { .. }) => {
                Err(ReplicationError::codec(constants::ERR_COMPONENTS_CLOSED))
            }
            _ => Err(self.unbalanced("begin_components")),
        }
    }

    fn begin_component(&mut self, id: ComponentId, component_type: ComponentType) -> Result<()> {
        let Some(WriteFrame::Components(written)) = self.stack.last() else {
            return Err(self.unbalanced("begin_component"));
        };
        if is_view_component_key(u64::from(id)) {
            return Err(ReplicationError::CodecState(format!(
                "component id {id:#x} is reserved for view components"
            )));
        }
        if written.iter().any(|(key, _)| *key == u64::from(id)) {
            return Err(ReplicationError::DuplicateComponent(id));
        }
        self.stack.push(WriteFrame::Component {
            id,
            entries: vec![(
                u64::from(COMPONENT_TYPE_PROPERTY_KEY),
                WireValue::UInt64(component_type.0),
            )],
        });
        Ok(())
    }

    fn write_property(&mut self, key: PropertyKey, value: &ReplicatedValue) -> Result<()> {
        if is_reserved_property_key(key) {
            return Err(ReplicationError::ReservedPropertyKey(key));
        }
        match self.stack.last_mut() {
            Some(WriteFrame::Component { entries, .. }) => {
                entries.push((u64::from(key), pack_value(value)));
                Ok(())
            }
            _ => Err(self.unbalanced("write_property")),
        }
    }

    fn end_component(&mut self) -> Result<()> {
        match self.stack.pop() {
            Some(WriteFrame::Component { id, entries }) => match self.stack.last_mut() {
                Some(WriteFrame::Components(written)) => {
                    trace!(component_id = id, properties = entries.len() - 1, "Component written");
                    written.push((u64::from(id), WireValue::IntMap(entries)));
                    global_metrics().component_packed();
                    Ok(())
                }
                _ => Err(self.unbalanced("end_component")),
            },
            Some(other) => {
                self.stack.push(other);
                Err(self.unbalanced("end_component"))
            }
            None => Err(self.unbalanced("end_component")),
        }
    }

    fn end_components(&mut self) -> Result<()> {
        match self.stack.pop() {
            Some(WriteFrame::Components(written)) => match self.stack.last_mut() {
                Some(WriteFrame::Entity { components, .. }) => {
                    *components = Some(written);
                    Ok(())
                }
                _ => Err(self.unbalanced("end_components")),
            },
            Some(other) => {
                self.stack.push(other);
                Err(self.unbalanced("end_components"))
            }
            None => Err(self.unbalanced("end_components")),
        }
    }

    fn add_view_component(&mut self, view: ViewComponent, value: &ReplicatedValue) -> Result<()> {
        let Some(WriteFrame::Entity { views, .. }) = self.stack.first_mut() else {
            return Err(ReplicationError::codec(constants::ERR_NOT_IN_ENTITY));
        };
        let packed = pack_value(value);
        match views.iter_mut().find(|(key, _)| *key == view.key()) {
            Some((_, existing)) => *existing = packed,
            None => views.push((view.key(), packed)),
        }
        Ok(())
    }
}

struct FieldCursor<'a> {
    items: &'a [WireValue],
    pos: usize,
}

struct ComponentCursor<'a> {
    entries: &'a [(u64, WireValue)],
    pos: usize,
}

struct EntityState<'a> {
    /// Field cursors; the first is the entity itself, the rest are open arrays
    cursors: Vec<FieldCursor<'a>>,
    components: &'a [(u64, WireValue)],
    in_components: bool,
    next_component: usize,
    current: Option<ComponentCursor<'a>>,
}

/// Replays an entity [`WireValue`] tree through [`EntityReader`].
pub struct ValueTreeReader<'a> {
    root: &'a WireValue,
    max_map_depth: usize,
    state: Option<EntityState<'a>>,
}

impl<'a> ValueTreeReader<'a> {
    pub fn new(root: &'a WireValue) -> Self {
        Self::with_max_depth(root, DEFAULT_MAX_MAP_DEPTH)
    }

    /// Reader using the configured map nesting limit
    pub fn with_config(root: &'a WireValue, config: &CodecConfig) -> Self {
        Self::with_max_depth(root, config.max_map_depth)
    }

    /// Reader that rejects string maps nested deeper than `max_map_depth`
    pub fn with_max_depth(root: &'a WireValue, max_map_depth: usize) -> Self {
        Self {
            root,
            max_map_depth,
            state: None,
        }
    }

    fn state(&self) -> Result<&EntityState<'a>> {
        self.state
            .as_ref()
            .ok_or_else(|| ReplicationError::codec(constants::ERR_NOT_IN_ENTITY))
    }

    fn state_mut(&mut self) -> Result<&mut EntityState<'a>> {
        self.state
            .as_mut()
            .ok_or_else(|| ReplicationError::codec(constants::ERR_NOT_IN_ENTITY))
    }

    fn peek_field(&self) -> Option<&'a WireValue> {
        let state = self.state.as_ref()?;
        if state.in_components {
            return None;
        }
        let cursor = state.cursors.last()?;
        cursor.items.get(cursor.pos)
    }

    fn next_field(&mut self) -> Result<&'a WireValue> {
        let state = self.state_mut()?;
        if state.in_components {
            return Err(ReplicationError::codec(constants::ERR_COMPONENTS_CLOSED));
        }
        let cursor = state
            .cursors
            .last_mut()
            .ok_or_else(|| ReplicationError::codec(constants::ERR_NOT_IN_ENTITY))?;
        let value = cursor
            .items
            .get(cursor.pos)
            .ok_or(ReplicationError::UnexpectedEndOfInput)?;
        cursor.pos += 1;
        Ok(value)
    }

    fn current_component(&self) -> Result<&ComponentCursor<'a>> {
        self.state()?
            .current
            .as_ref()
            .ok_or_else(|| ReplicationError::codec(constants::ERR_NOT_IN_COMPONENT))
    }

    fn view_entry(&self, view: ViewComponent) -> Result<Option<&'a WireValue>> {
        Ok(self
            .state()?
            .components
            .iter()
            .find(|(key, _)| *key == view.key())
            .map(|(_, value)| value))
    }
}

fn shape_error(expected: &str, found: &WireValue) -> ReplicationError {
    global_metrics().schema_violation();
    ReplicationError::UnexpectedWireShape {
        expected: expected.to_string(),
        found: found.kind_name().to_string(),
    }
}

fn read_floats<const N: usize>(value: &WireValue) -> Result<[f32; N]> {
    match value {
        WireValue::FloatArray(items) => <[f32; N]>::try_from(items.as_slice())
            .map_err(|_| ReplicationError::InvalidVectorLength(items.len())),
        other => Err(shape_error("float array", other)),
    }
}

/// Ordinary property entries: not the type key, not any other reserved key
fn is_ordinary_property(key: u64) -> bool {
    PropertyKey::try_from(key).map_or(true, |key| !is_reserved_property_key(key))
}

impl<'a> EntityReader for ValueTreeReader<'a> {
    fn enter_entity(&mut self) -> Result<()> {
        if self.state.is_some() {
            return Err(ReplicationError::CodecState(
                "enter_entity called while an entity is open".to_string(),
            ));
        }
        let Some((last, fields)) = self.root.as_array().and_then(<[WireValue]>::split_last)
        else {
            return Err(ReplicationError::codec(constants::ERR_ENTITY_NOT_ARRAY));
        };
        let components = last
            .as_int_map()
            .ok_or_else(|| ReplicationError::codec(constants::ERR_ENTITY_MISSING_COMPONENTS))?;

        self.state = Some(EntityState {
            cursors: vec![FieldCursor {
                items: fields,
                pos: 0,
            }],
            components,
            in_components: false,
            next_component: 0,
            current: None,
        });
        Ok(())
    }

    fn leave_entity(&mut self) -> Result<()> {
        let state = self.state()?;
        if state.in_components || state.cursors.len() != 1 {
            return Err(ReplicationError::CodecState(
                "leave_entity called with an open section".to_string(),
            ));
        }
        self.state = None;
        Ok(())
    }

    fn read_bool(&mut self) -> Result<bool> {
        match self.next_field()? {
            WireValue::Bool(v) => Ok(*v),
            other => Err(shape_error("bool", other)),
        }
    }

    fn read_byte(&mut self) -> Result<u8> {
        match self.next_field()? {
            WireValue::Byte(v) => Ok(*v),
            other => Err(shape_error("byte", other)),
        }
    }

    fn read_double(&mut self) -> Result<f64> {
        match self.next_field()? {
            WireValue::Double(v) => Ok(*v),
            other => Err(shape_error("double", other)),
        }
    }

    fn read_int64(&mut self) -> Result<i64> {
        match self.next_field()? {
            WireValue::Int64(v) => Ok(*v),
            other => Err(shape_error("int64", other)),
        }
    }

    fn read_uint64(&mut self) -> Result<u64> {
        match self.next_field()? {
            WireValue::UInt64(v) => Ok(*v),
            // Some transports narrow small unsigned values to signed ones
            WireValue::Int64(v) if *v >= 0 => Ok(v.unsigned_abs()),
            other => Err(shape_error("uint64", other)),
        }
    }

    fn read_string(&mut self) -> Result<String> {
        match self.next_field()? {
            WireValue::String(v) => Ok(v.clone()),
            other => Err(shape_error("string", other)),
        }
    }

    fn read_vector2(&mut self) -> Result<Vector2> {
        read_floats::<2>(self.next_field()?).map(Vector2::from)
    }

    fn read_vector3(&mut self) -> Result<Vector3> {
        read_floats::<3>(self.next_field()?).map(Vector3::from)
    }

    fn read_vector4(&mut self) -> Result<Vector4> {
        read_floats::<4>(self.next_field()?).map(Vector4::from)
    }

    fn read_null(&mut self) -> Result<()> {
        match self.next_field()? {
            WireValue::Null => Ok(()),
            other => Err(shape_error("null", other)),
        }
    }

    fn next_value_is_null(&self) -> bool {
        self.peek_field().is_some_and(WireValue::is_null)
    }

    fn next_value_is_array(&self) -> bool {
        self.peek_field().is_some_and(WireValue::is_array)
    }

    fn enter_array(&mut self) -> Result<usize> {
        let items = match self.next_field()? {
            WireValue::Array(items) => items.as_slice(),
            other => return Err(shape_error("array", other)),
        };
        self.state_mut()?
            .cursors
            .push(FieldCursor { items, pos: 0 });
        Ok(items.len())
    }

    fn leave_array(&mut self) -> Result<()> {
        let state = self.state_mut()?;
        if state.in_components || state.cursors.len() < 2 {
            return Err(ReplicationError::codec(constants::ERR_NOT_IN_ARRAY));
        }
        state.cursors.pop();
        Ok(())
    }

    fn skip(&mut self) -> Result<()> {
        self.next_field().map(|_| ())
    }

    fn enter_components(&mut self) -> Result<()> {
        let state = self.state_mut()?;
        if state.in_components {
            return Err(ReplicationError::CodecState(
                "enter_components called twice".to_string(),
            ));
        }
        if state.cursors.len() != 1 {
            return Err(ReplicationError::CodecState(
                "enter_components called inside an array".to_string(),
            ));
        }
        state.in_components = true;
        state.next_component = 0;
        Ok(())
    }

    fn num_components(&self) -> Result<usize> {
        Ok(ComponentUnpacker::new(self.state()?.components).total_count())
    }

    fn num_real_components(&self) -> Result<usize> {
        Ok(ComponentUnpacker::new(self.state()?.components).runtime_components_count())
    }

    fn enter_component(&mut self) -> Result<(ComponentId, ComponentType)> {
        let state = self.state_mut()?;
        if !state.in_components {
            return Err(ReplicationError::codec(constants::ERR_NOT_IN_COMPONENTS));
        }
        if state.current.is_some() {
            return Err(ReplicationError::CodecState(
                "enter_component called while a component is open".to_string(),
            ));
        }

        let components = state.components;
        let Some(offset) = components[state.next_component..]
            .iter()
            .position(|(key, _)| !is_view_component_key(*key))
        else {
            return Err(ReplicationError::codec(constants::ERR_NO_MORE_COMPONENTS));
        };
        let index = state.next_component + offset;
        state.next_component = index + 1;

        let (key, packed) = &components[index];
        let id = ComponentId::try_from(*key).map_err(|_| ReplicationError::UnexpectedWireShape {
            expected: "16-bit component id".to_string(),
            found: key.to_string(),
        })?;
        let entries = packed
            .as_int_map()
            .ok_or_else(|| shape_error("int map component", packed))?;
        let component_type = entries
            .iter()
            .find(|(k, _)| *k == u64::from(COMPONENT_TYPE_PROPERTY_KEY))
            .map(|(_, wire)| ComponentUnpacker::component_type_of(wire))
            .transpose()?
            .ok_or_else(|| {
                global_metrics().schema_violation();
                ReplicationError::MissingComponentType
            })?;

        state.current = Some(ComponentCursor { entries, pos: 0 });
        Ok((id, component_type))
    }

    fn num_properties(&self) -> Result<usize> {
        Ok(self
            .current_component()?
            .entries
            .iter()
            .filter(|(key, _)| is_ordinary_property(*key))
            .count())
    }

    fn read_property(&mut self) -> Result<(PropertyKey, ReplicatedValue)> {
        let max_depth = self.max_map_depth;
        let state = self.state_mut()?;
        let cursor = state
            .current
            .as_mut()
            .ok_or_else(|| ReplicationError::codec(constants::ERR_NOT_IN_COMPONENT))?;

        while let Some((key, wire)) = cursor.entries.get(cursor.pos) {
            cursor.pos += 1;
            if !is_ordinary_property(*key) {
                continue;
            }
            let key = PropertyKey::try_from(*key).map_err(|_| {
                ReplicationError::UnexpectedWireShape {
                    expected: "32-bit property key".to_string(),
                    found: key.to_string(),
                }
            })?;
            return Ok((key, unpack_value_with_depth(wire, max_depth)?));
        }
        Err(ReplicationError::codec(constants::ERR_NO_MORE_PROPERTIES))
    }

    fn leave_component(&mut self) -> Result<()> {
        let state = self.state_mut()?;
        if state.current.take().is_none() {
            return Err(ReplicationError::codec(constants::ERR_NOT_IN_COMPONENT));
        }
        global_metrics().component_unpacked();
        Ok(())
    }

    fn leave_components(&mut self) -> Result<()> {
        let state = self.state_mut()?;
        if !state.in_components {
            return Err(ReplicationError::codec(constants::ERR_NOT_IN_COMPONENTS));
        }
        if state.current.is_some() {
            return Err(ReplicationError::CodecState(
                "leave_components called while a component is open".to_string(),
            ));
        }
        state.in_components = false;
        Ok(())
    }

    fn has_view_component(&self, view: ViewComponent) -> Result<bool> {
        Ok(self.view_entry(view)?.is_some())
    }

    fn view_component(&self, view: ViewComponent) -> Result<Option<ReplicatedValue>> {
        self.view_entry(view)?
            .map(|wire| unpack_value_with_depth(wire, self.max_map_depth))
            .transpose()
    }
}
