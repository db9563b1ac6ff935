//! # Protocol Layer
//!
//! Whole-entity streaming and named-event handling.
//!
//! ## Components
//! - **Entity codec**: bracketed [`EntityWriter`]/[`EntityReader`] traits
//! - **Value tree**: the reference binding over [`WireValue`](crate::core::wire_value::WireValue)
//! - **Entity record**: owned entity snapshot with [`write_entity`]/[`read_entity`]
//! - **Events**: typed payloads, positional decoding and name-based dispatch

pub mod dispatcher;
pub mod entity_codec;
pub mod entity_record;
pub mod event;
pub mod event_decoder;
pub mod value_tree;

pub use dispatcher::EventDispatcher;
pub use entity_codec::{EntityReader, EntityWriter};
pub use entity_record::{read_entity, write_entity, ComponentRecord, EntityRecord};
pub use event::{EventPayload, InboundEvent, NetworkEvent, SequenceChange};
pub use event_decoder::NetworkEventDecoder;
pub use value_tree::{ValueTreeReader, ValueTreeWriter};

#[cfg(test)]
mod tests;
