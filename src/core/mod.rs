//! # Core Wire Components
//!
//! Transport-level values and the conversions to and from the replicated model.
//!
//! This module provides the foundation for the replication protocol: the wire value
//! union, reserved key ranges, component packing and byte-level serialization.
//!
//! ## Components
//! - **Keys**: component/property identifiers and reserved ranges
//! - **Nesting**: depth limit applied while decoding recursive values from bytes
//! - **WireValue**: loosely-typed transport value tree
//! - **Packer**: `ReplicatedValue <-> WireValue`, whole components, enum helpers
//! - **Serialization**: bincode / JSON / MessagePack encodings of wire trees
//!
//! ## Packed Component Format
//! ```text
//! IntMap[ (TYPE_KEY, UInt64(type)), (key_0, value_0), (key_1, value_1), ... ]
//! ```

pub mod keys;
pub mod nesting;
pub mod packer;
pub mod serialization;
pub mod wire_value;
