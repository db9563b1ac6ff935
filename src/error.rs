//! # Error Types
//!
//! Error handling for the replication core.
//!
//! Every fallible operation in the crate returns [`ReplicationError`]. Variants are
//! grouped into categories (see [`ErrorCategory`]) that tell the caller how to react:
//!
//! ## Error Categories
//! - **Contract violations**: wrong-kind reads, writes to unknown keys, kind-changing writes.
//!   Local misuse; the store is left untouched and the condition is logged.
//! - **Schema violations**: wire shapes with no [`ReplicatedValue`](crate::value::ReplicatedValue)
//!   equivalent (e.g. `double`). Indicates a peer version mismatch; never coerced.
//! - **Malformed events**: named events with the wrong argument count or kinds.
//! - **Codec errors**: unbalanced Begin/End or Enter/Leave sequences, truncated input.
//! - **Infrastructure**: I/O, serialization, configuration, template loading.
//!
//! ## Example Usage
//! ```rust
//! use replication_core::error::ErrorCategory;
//! use replication_core::value::ReplicatedValue;
//!
//! let value = ReplicatedValue::from(42_i64);
//! match value.as_string() {
//!     Ok(s) => println!("{s}"),
//!     Err(e) => assert_eq!(e.category(), ErrorCategory::ContractViolation),
//! }
//! ```

use crate::value::ReplicatedValueKind;
use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Dispatcher-related error messages
    pub const ERR_DISPATCHER_WRITE_LOCK: &str = "Failed to acquire write lock on event dispatcher";
    pub const ERR_DISPATCHER_READ_LOCK: &str = "Failed to acquire read lock on event dispatcher";

    /// Codec state errors
    pub const ERR_NOT_IN_ENTITY: &str = "No entity is open";
    pub const ERR_NOT_IN_ARRAY: &str = "No array is open";
    pub const ERR_NOT_IN_COMPONENTS: &str = "Components section is not open";
    pub const ERR_NOT_IN_COMPONENT: &str = "No component is open";
    pub const ERR_COMPONENTS_CLOSED: &str = "Components section already written";
    pub const ERR_NO_MORE_COMPONENTS: &str = "No more components to read";
    pub const ERR_NO_MORE_PROPERTIES: &str = "No more properties to read";
    pub const ERR_ENTITY_NOT_ARRAY: &str = "Entity root must be an array";
    pub const ERR_ENTITY_MISSING_COMPONENTS: &str = "Entity has no components map";

    /// Event errors
    pub const ERR_EVENT_NOT_ARRAY: &str = "Inbound event must be an array";
    pub const ERR_TOO_FEW_ARGUMENTS: &str = "Too few arguments";

    /// Serialization errors
    pub const ERR_JSON_NON_FINITE: &str = "JSON cannot represent NaN or infinite floats";

    /// Logging
    pub const ERR_SUBSCRIBER_INSTALLED: &str = "A global tracing subscriber is already installed";
}

/// Broad classification of a [`ReplicationError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Local misuse of the value or store API
    ContractViolation,
    /// Inbound wire data with no defined equivalent
    SchemaViolation,
    /// Named event with the wrong argument shape
    MalformedEvent,
    /// Bracketed entity codec misuse or truncated input
    Codec,
    /// I/O, serialization, configuration, templates
    Infrastructure,
}

// ReplicationError is the error type for all replication operations
#[derive(Error, Debug, Serialize, Deserialize)]
pub enum ReplicationError {
    #[error("Wrong value kind: expected {expected:?}, found {actual:?}")]
    WrongKind {
        expected: ReplicatedValueKind,
        actual: ReplicatedValueKind,
    },

    #[error("Component {component_id} has no property with key {key}")]
    UnknownProperty { component_id: u16, key: u32 },

    #[error("Property {key} is {expected:?}-kinded and cannot hold a {actual:?} value")]
    KindMismatch {
        key: u32,
        expected: ReplicatedValueKind,
        actual: ReplicatedValueKind,
    },

    #[error("Property key {0:#x} is reserved")]
    ReservedPropertyKey(u32),

    #[error("Unsupported wire kind: {0}")]
    UnsupportedWireKind(String),

    #[error("Float array of length {0} has no vector equivalent")]
    InvalidVectorLength(usize),

    #[error("Unexpected wire shape: expected {expected}, found {found}")]
    UnexpectedWireShape { expected: String, found: String },

    #[error("Integer {0} does not fit in a signed 64-bit value")]
    IntegerOutOfRange(u64),

    #[error("{value} is not a valid {type_name} ordinal")]
    InvalidEnumValue { type_name: String, value: i64 },

    #[error("Nested map depth exceeds the limit of {0}")]
    MapTooDeep(usize),

    #[error("Packed component has no component type key")]
    MissingComponentType,

    #[error("Remote update for property {key} carries {actual:?}, local kind is {expected:?}")]
    RemoteKindMismatch {
        key: u32,
        expected: ReplicatedValueKind,
        actual: ReplicatedValueKind,
    },

    #[error("Malformed '{event}' event: {reason}")]
    MalformedEvent { event: String, reason: String },

    #[error("No handler registered for event '{0}'")]
    UnexpectedEvent(String),

    #[error("Codec state error: {0}")]
    CodecState(String),

    #[error("Unexpected end of input")]
    UnexpectedEndOfInput,

    #[error("Duplicate component id {0}")]
    DuplicateComponent(u16),

    #[error("I/O error: {0}")]
    #[serde(skip_serializing, skip_deserializing)]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    #[serde(skip_serializing, skip_deserializing)]
    Serialization(#[from] bincode::Error),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Deserialize error: {0}")]
    DeserializeError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Template error: {0}")]
    TemplateError(String),

    #[error("Custom error: {0}")]
    Custom(String),
}

impl ReplicationError {
    /// Classify this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ReplicationError::WrongKind { .. }
            | ReplicationError::UnknownProperty { .. }
            | ReplicationError::KindMismatch { .. }
            | ReplicationError::ReservedPropertyKey(_) => ErrorCategory::ContractViolation,

            ReplicationError::UnsupportedWireKind(_)
            | ReplicationError::InvalidVectorLength(_)
            | ReplicationError::UnexpectedWireShape { .. }
            | ReplicationError::IntegerOutOfRange(_)
            | ReplicationError::InvalidEnumValue { .. }
            | ReplicationError::MapTooDeep(_)
            | ReplicationError::MissingComponentType
            | ReplicationError::RemoteKindMismatch { .. } => ErrorCategory::SchemaViolation,

            ReplicationError::MalformedEvent { .. } | ReplicationError::UnexpectedEvent(_) => {
                ErrorCategory::MalformedEvent
            }

            ReplicationError::CodecState(_)
            | ReplicationError::UnexpectedEndOfInput
            | ReplicationError::DuplicateComponent(_) => ErrorCategory::Codec,

            ReplicationError::Io(_)
            | ReplicationError::Serialization(_)
            | ReplicationError::SerializeError(_)
            | ReplicationError::DeserializeError(_)
            | ReplicationError::ConfigError(_)
            | ReplicationError::TemplateError(_)
            | ReplicationError::Custom(_) => ErrorCategory::Infrastructure,
        }
    }

    /// Shorthand for a codec state error with a static message.
    pub(crate) fn codec(message: &str) -> Self {
        ReplicationError::CodecState(message.to_string())
    }

    /// Shorthand for a malformed event.
    pub(crate) fn malformed(event: &str, reason: impl Into<String>) -> Self {
        ReplicationError::MalformedEvent {
            event: event.to_string(),
            reason: reason.into(),
        }
    }
}

/// Type alias for Results using ReplicationError
pub type Result<T> = std::result::Result<T, ReplicationError>;
