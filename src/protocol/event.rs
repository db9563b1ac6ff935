//! # Network Events
//!
//! Named events arrive as `(name, sender, ordered values)` with no embedded schema.
//! [`InboundEvent`] is that raw form; [`NetworkEvent`] is the decoded form whose
//! [`EventPayload`] is either one of the typed projections below or the general
//! fallback.

use crate::core::wire_value::WireValue;
use crate::error::{constants, ReplicationError, Result};
use crate::replicated_enum;
use crate::value::ReplicatedValue;

/// Event names with a typed payload
pub mod names {
    pub const ASSET_DETAIL_BLOB_CHANGED: &str = "AssetDetailBlobChanged";
    pub const CONVERSATION: &str = "ConversationEvent";
    pub const ACCESS_CONTROL_CHANGED: &str = "AccessControlChanged";
    pub const SEQUENCE_CHANGED: &str = "SequenceChanged";
}

replicated_enum! {
    /// What happened to an asset's detail blob
    pub enum AssetChangeType {
        Created = 0,
        Updated = 1,
        Deleted = 2,
    }
}

replicated_enum! {
    pub enum AssetType {
        Image = 0,
        Thumbnail = 1,
        Simulation = 2,
        Model = 3,
        Video = 4,
        ScriptLibrary = 5,
        HolocapVideo = 6,
        HolocapAudio = 7,
        Audio = 8,
        GaussianSplat = 9,
        Material = 10,
        Annotation = 11,
        AnnotationThumbnail = 12,
    }
}

replicated_enum! {
    pub enum ConversationEventType {
        NewConversation = 0,
        NewMessage = 1,
        DeleteMessage = 2,
        DeleteConversation = 3,
        ConversationInformation = 4,
        MessageInformation = 5,
    }
}

replicated_enum! {
    pub enum SpaceUserRole {
        Owner = 0,
        Moderator = 1,
        User = 2,
    }
}

replicated_enum! {
    pub enum PermissionChangeType {
        Created = 0,
        Updated = 1,
        Removed = 2,
    }
}

replicated_enum! {
    pub enum SequenceUpdateType {
        Create = 0,
        Update = 1,
        Rename = 2,
        Delete = 3,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetDetailBlobChanged {
    pub change_type: AssetChangeType,
    pub asset_id: String,
    pub version: String,
    pub asset_type: AssetType,
    pub asset_collection_id: String,
}

/// Conversation or message fields carried by a conversation event
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageInfo {
    pub conversation_id: String,
    pub created_timestamp: String,
    pub edited_timestamp: String,
    pub user_id: String,
    pub message: String,
    pub message_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationEvent {
    pub message_type: ConversationEventType,
    pub info: MessageInfo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessControlChanged {
    pub space_id: String,
    pub user_roles: Vec<SpaceUserRole>,
    pub change_type: PermissionChangeType,
    pub user_id: String,
}

/// A sequence change, split by whether the key names a hotspot sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequenceChange {
    Sequence {
        update_type: SequenceUpdateType,
        key: String,
        new_key: Option<String>,
    },
    /// Key of the form `Hotspots:<space_id>:<name>`
    HotspotSequence {
        update_type: SequenceUpdateType,
        space_id: String,
        name: String,
        new_name: Option<String>,
    },
}

impl SequenceChange {
    pub fn update_type(&self) -> SequenceUpdateType {
        match self {
            SequenceChange::Sequence { update_type, .. }
            | SequenceChange::HotspotSequence { update_type, .. } => *update_type,
        }
    }
}

/// Decoded payload of a [`NetworkEvent`]
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    /// Every argument unpacked as-is, for names without a typed projection
    General(Vec<ReplicatedValue>),
    AssetDetailBlobChanged(AssetDetailBlobChanged),
    Conversation(ConversationEvent),
    AccessControlChanged(AccessControlChanged),
    SequenceChanged(SequenceChange),
}

/// A decoded named event
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkEvent {
    pub name: String,
    pub sender_client_id: u64,
    pub payload: EventPayload,
}

/// A named event as delivered by the transport, before decoding
#[derive(Debug, Clone, PartialEq)]
pub struct InboundEvent {
    pub name: String,
    pub sender_client_id: u64,
    pub values: Vec<WireValue>,
}

impl InboundEvent {
    pub fn new(name: impl Into<String>, sender_client_id: u64, values: Vec<WireValue>) -> Self {
        Self {
            name: name.into(),
            sender_client_id,
            values,
        }
    }

    /// Parse the transport framing `[name: String, sender: Int64|UInt64, values: Array]`.
    pub fn from_wire(wire: &WireValue) -> Result<Self> {
        let items = wire
            .as_array()
            .ok_or_else(|| ReplicationError::codec(constants::ERR_EVENT_NOT_ARRAY))?;

        let [name, sender, values, ..] = items else {
            return Err(ReplicationError::UnexpectedWireShape {
                expected: "[name, sender, values]".to_string(),
                found: format!("array of {}", items.len()),
            });
        };

        let WireValue::String(name) = name else {
            return Err(shape("string event name", name));
        };
        let sender_client_id = match sender {
            WireValue::UInt64(v) => *v,
            WireValue::Int64(v) if *v >= 0 => v.unsigned_abs(),
            other => return Err(shape("uint64 sender id", other)),
        };
        let values = values
            .as_array()
            .ok_or_else(|| shape("array of event values", values))?;

        Ok(Self {
            name: name.clone(),
            sender_client_id,
            values: values.to_vec(),
        })
    }

    /// Wire framing accepted by [`from_wire`](Self::from_wire)
    pub fn to_wire(&self) -> WireValue {
        WireValue::Array(vec![
            WireValue::String(self.name.clone()),
            WireValue::UInt64(self.sender_client_id),
            WireValue::Array(self.values.clone()),
        ])
    }
}

fn shape(expected: &str, found: &WireValue) -> ReplicationError {
    ReplicationError::UnexpectedWireShape {
        expected: expected.to_string(),
        found: found.kind_name().to_string(),
    }
}
