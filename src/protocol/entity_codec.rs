//! # Entity Codec Protocol
//!
//! Bracketed, order-sensitive streaming of a whole entity.
//!
//! ## Writer Sequence
//! ```text
//! begin_entity
//!   (write_* | begin_array ... end_array)*          entity fields
//!   begin_components
//!     (begin_component(id, type)
//!        write_property(key, value)*
//!      end_component)*
//!   end_components
//!   add_view_component(view, value)                 any time inside the entity
//! end_entity
//! ```
//!
//! The reader mirrors every `begin_*`/`end_*` with `enter_*`/`leave_*`. Each opening
//! call has exactly one matching closing call, strictly nested; bindings report a
//! [`CodecState`](crate::error::ReplicationError::CodecState) error otherwise.
//!
//! The protocol is independent of the value representation. Any binding must
//! preserve call order between its writer and reader so a replay reproduces the
//! written sequence. [`value_tree`](crate::protocol::value_tree) is the reference
//! binding.

use crate::core::keys::{ComponentId, ComponentType, PropertyKey, ViewComponent};
use crate::error::Result;
use crate::store::PropertyStore;
use crate::value::{ReplicatedValue, Vector2, Vector3, Vector4};

/// Writing half of the entity codec
pub trait EntityWriter {
    fn begin_entity(&mut self) -> Result<()>;
    fn end_entity(&mut self) -> Result<()>;

    // Scalar fields. The wire carries primitives (byte, double, uint64) that
    // ReplicatedValue has no kind for.
    fn write_bool(&mut self, value: bool) -> Result<()>;
    fn write_byte(&mut self, value: u8) -> Result<()>;
    fn write_double(&mut self, value: f64) -> Result<()>;
    fn write_int64(&mut self, value: i64) -> Result<()>;
    fn write_uint64(&mut self, value: u64) -> Result<()>;
    fn write_string(&mut self, value: &str) -> Result<()>;
    fn write_vector2(&mut self, value: Vector2) -> Result<()>;
    fn write_vector3(&mut self, value: Vector3) -> Result<()>;
    fn write_vector4(&mut self, value: Vector4) -> Result<()>;
    fn write_null(&mut self) -> Result<()>;

    fn begin_array(&mut self) -> Result<()>;
    fn end_array(&mut self) -> Result<()>;

    fn begin_components(&mut self) -> Result<()>;
    fn begin_component(&mut self, id: ComponentId, component_type: ComponentType) -> Result<()>;
    fn write_property(&mut self, key: PropertyKey, value: &ReplicatedValue) -> Result<()>;
    fn end_component(&mut self) -> Result<()>;
    fn end_components(&mut self) -> Result<()>;

    /// Set a view component; valid anywhere between `begin_entity` and `end_entity`.
    fn add_view_component(&mut self, view: ViewComponent, value: &ReplicatedValue) -> Result<()>;

    /// Write a whole store as one component. Must be inside `begin_components`.
    fn write_store(&mut self, store: &PropertyStore) -> Result<()> {
        self.begin_component(store.component_id(), store.component_type())?;
        for (key, value) in store.properties() {
            self.write_property(*key, value)?;
        }
        self.end_component()
    }
}

/// Reading half of the entity codec
pub trait EntityReader {
    fn enter_entity(&mut self) -> Result<()>;
    fn leave_entity(&mut self) -> Result<()>;

    fn read_bool(&mut self) -> Result<bool>;
    fn read_byte(&mut self) -> Result<u8>;
    fn read_double(&mut self) -> Result<f64>;
    fn read_int64(&mut self) -> Result<i64>;
    fn read_uint64(&mut self) -> Result<u64>;
    fn read_string(&mut self) -> Result<String>;
    fn read_vector2(&mut self) -> Result<Vector2>;
    fn read_vector3(&mut self) -> Result<Vector3>;
    fn read_vector4(&mut self) -> Result<Vector4>;
    fn read_null(&mut self) -> Result<()>;

    /// Whether the next field is null. False when no field remains.
    fn next_value_is_null(&self) -> bool;
    /// Whether the next field is an array. False when no field remains.
    fn next_value_is_array(&self) -> bool;

    /// Enter an array field, returning its length
    fn enter_array(&mut self) -> Result<usize>;
    fn leave_array(&mut self) -> Result<()>;

    /// Advance past one field without interpreting it
    fn skip(&mut self) -> Result<()>;

    /// Enter the components section. Unread entity fields are ignored.
    fn enter_components(&mut self) -> Result<()>;
    /// Number of entries in the component map, view components included
    fn num_components(&self) -> Result<usize>;
    /// Number of ordinary components, view components excluded
    fn num_real_components(&self) -> Result<usize>;
    /// Enter the next ordinary component in written order
    fn enter_component(&mut self) -> Result<(ComponentId, ComponentType)>;
    /// Number of ordinary properties in the current component
    fn num_properties(&self) -> Result<usize>;
    /// Read the next property of the current component in written order
    fn read_property(&mut self) -> Result<(PropertyKey, ReplicatedValue)>;
    fn leave_component(&mut self) -> Result<()>;
    fn leave_components(&mut self) -> Result<()>;

    fn has_view_component(&self, view: ViewComponent) -> Result<bool>;
    /// Value of a view component, `None` when the entity does not carry it
    fn view_component(&self, view: ViewComponent) -> Result<Option<ReplicatedValue>>;

    /// Read the current component's properties into `store` as remote updates.
    /// Must be called right after `enter_component`.
    fn read_into_store(&mut self, store: &mut PropertyStore) -> Result<()> {
        for _ in 0..self.num_properties()? {
            let (key, value) = self.read_property()?;
            store.apply_remote(key, value)?;
        }
        Ok(())
    }
}
