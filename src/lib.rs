//! # Replication Core
//!
//! Value model, component storage, wire packing and event decoding for the
//! replicated state of a multiplayer client.
//!
//! ## Layers
//! - [`value`]: [`ReplicatedValue`], the closed tagged union every property holds
//! - [`store`]: [`PropertyStore`], kind-pinned property maps with dirty notification
//! - [`core`]: [`WireValue`] trees, reserved keys, component packing, byte formats
//! - [`protocol`]: bracketed entity codec, entity records, named-event decoding
//! - [`config`], [`error`], [`utils`]: configuration, errors, logging and metrics
//!
//! ## Example
//! ```rust
//! use replication_core::core::packer::ComponentPacker;
//! use replication_core::core::keys::ComponentType;
//! use replication_core::core::packer::ComponentUnpacker;
//! use replication_core::store::PropertyStore;
//! use replication_core::value::{ReplicatedValue, Vector3};
//!
//! let mut store = PropertyStore::new(
//!     1,
//!     ComponentType(7),
//!     [(0, ReplicatedValue::from(Vector3::ZERO))],
//! )?;
//! store.set_property(0, Vector3::new(1.0, 2.0, 3.0))?;
//!
//! let packed = ComponentPacker::pack(&store);
//! let unpacked = ComponentUnpacker::unpack_component(&packed)?;
//! assert_eq!(unpacked.properties[&0_u32], ReplicatedValue::from(Vector3::new(1.0, 2.0, 3.0)));
//! # Ok::<(), replication_core::ReplicationError>(())
//! ```

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod store;
pub mod utils;
pub mod value;

pub use crate::config::ReplicationConfig;
pub use crate::core::keys::{ComponentId, ComponentType, PropertyKey, ViewComponent};
pub use crate::core::wire_value::WireValue;
pub use crate::error::{ErrorCategory, ReplicationError, Result};
pub use crate::protocol::{
    EntityReader, EntityRecord, EntityWriter, EventDispatcher, NetworkEvent,
    NetworkEventDecoder,
};
pub use crate::store::{DirtyNotifier, PropertyStore};
pub use crate::value::{ReplicatedValue, ReplicatedValueKind, Vector2, Vector3, Vector4};
