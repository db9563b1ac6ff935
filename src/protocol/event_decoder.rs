//! # Event Decoding
//!
//! Positional decoding of named events. Each specialized name has a fixed argument
//! list; argument `i` must have the expected wire kind. Rules:
//!
//! - fewer arguments than required, a wrong kind, or an unknown enum ordinal is a
//!   [`MalformedEvent`](crate::error::ReplicationError::MalformedEvent)
//! - trailing arguments beyond the required ones are ignored
//! - names without a specialization decode to [`EventPayload::General`]
//!
//! Reordered arguments on the sender cannot be detected; a reorder is a contract
//! break between peers.

use crate::config::CodecConfig;
use crate::core::packer::{unpack_value_with_depth, DEFAULT_MAX_MAP_DEPTH};
use crate::core::wire_value::WireValue;
use crate::error::{constants, ReplicationError, Result};
use crate::protocol::event::{
    names, AccessControlChanged, AssetDetailBlobChanged, ConversationEvent, EventPayload,
    InboundEvent, MessageInfo, NetworkEvent, SequenceChange,
};
use crate::utils::metrics::global_metrics;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, instrument, warn};

/// Prefix of sequence keys that address a space hotspot
pub const HOTSPOT_SEQUENCE_PREFIX: &str = "Hotspots";

type DecodeFn = dyn Fn(&EventArgs<'_>) -> Result<EventPayload> + Send + Sync + 'static;

/// Positional view over one event's arguments
pub struct EventArgs<'a> {
    event: &'a str,
    values: &'a [WireValue],
}

impl<'a> EventArgs<'a> {
    pub fn new(event: &'a str, values: &'a [WireValue]) -> Self {
        Self { event, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn malformed(&self, reason: impl Into<String>) -> ReplicationError {
        ReplicationError::malformed(self.event, reason)
    }

    /// Fail unless at least `count` arguments are present.
    pub fn require(&self, count: usize) -> Result<()> {
        if self.values.len() < count {
            return Err(self.malformed(format!(
                "{}: expected at least {count}, got {}",
                constants::ERR_TOO_FEW_ARGUMENTS,
                self.values.len()
            )));
        }
        Ok(())
    }

    pub fn get(&self, index: usize) -> Result<&'a WireValue> {
        self.values.get(index).ok_or_else(|| {
            self.malformed(format!(
                "{}: argument {index} is missing",
                constants::ERR_TOO_FEW_ARGUMENTS
            ))
        })
    }

    fn wrong_kind(&self, index: usize, expected: &str, found: &WireValue) -> ReplicationError {
        self.malformed(format!(
            "argument {index} should be {expected}, found {}",
            found.kind_name()
        ))
    }

    pub fn integer(&self, index: usize) -> Result<i64> {
        match self.get(index)? {
            WireValue::Int64(v) => Ok(*v),
            WireValue::Byte(v) => Ok(i64::from(*v)),
            WireValue::UInt64(v) => i64::try_from(*v)
                .map_err(|_| self.malformed(format!("argument {index} is out of range: {v}"))),
            other => Err(self.wrong_kind(index, "an integer", other)),
        }
    }

    pub fn string(&self, index: usize) -> Result<String> {
        match self.get(index)? {
            WireValue::String(v) => Ok(v.clone()),
            other => Err(self.wrong_kind(index, "a string", other)),
        }
    }

    /// A string that may be absent or null
    pub fn optional_string(&self, index: usize) -> Result<Option<String>> {
        match self.values.get(index) {
            None | Some(WireValue::Null) => Ok(None),
            Some(WireValue::String(v)) => Ok(Some(v.clone())),
            Some(other) => Err(self.wrong_kind(index, "a string or null", other)),
        }
    }

    pub fn enumeration<E>(&self, index: usize) -> Result<E>
    where
        E: TryFrom<i64>,
    {
        let ordinal = self.integer(index)?;
        E::try_from(ordinal).map_err(|_| {
            self.malformed(format!(
                "argument {index}: {ordinal} is not a valid {}",
                short_type_name::<E>()
            ))
        })
    }

    /// An array of integer ordinals
    pub fn enumeration_list<E>(&self, index: usize) -> Result<Vec<E>>
    where
        E: TryFrom<i64>,
    {
        let items = match self.get(index)? {
            WireValue::Array(items) => items,
            other => return Err(self.wrong_kind(index, "an array", other)),
        };
        items
            .iter()
            .enumerate()
            .map(|(position, item)| {
                let ordinal = match item {
                    WireValue::Int64(v) => *v,
                    WireValue::Byte(v) => i64::from(*v),
                    WireValue::UInt64(v) => i64::try_from(*v).map_err(|_| {
                        self.malformed(format!(
                            "argument {index}[{position}] is out of range: {v}"
                        ))
                    })?,
                    other => {
                        return Err(self.malformed(format!(
                            "argument {index}[{position}] should be an integer, found {}",
                            other.kind_name()
                        )))
                    }
                };
                E::try_from(ordinal).map_err(|_| {
                    self.malformed(format!(
                        "argument {index}[{position}]: {ordinal} is not a valid {}",
                        short_type_name::<E>()
                    ))
                })
            })
            .collect()
    }
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    full.rsplit("::").next().unwrap_or(full)
}

/// Registry of positional decoders keyed by event name.
pub struct NetworkEventDecoder {
    decoders: HashMap<Cow<'static, str>, Box<DecodeFn>>,
    max_map_depth: usize,
}

impl Default for NetworkEventDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NetworkEventDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.decoders.keys().map(Cow::as_ref).collect();
        names.sort_unstable();
        f.debug_struct("NetworkEventDecoder")
            .field("specializations", &names)
            .field("max_map_depth", &self.max_map_depth)
            .finish()
    }
}

impl NetworkEventDecoder {
    /// Decoder with every built-in specialization registered
    pub fn new() -> Self {
        let mut decoder = Self::empty();
        decoder.register(names::ASSET_DETAIL_BLOB_CHANGED, decode_asset_detail_blob_changed);
        decoder.register(names::CONVERSATION, decode_conversation);
        decoder.register(names::ACCESS_CONTROL_CHANGED, decode_access_control_changed);
        decoder.register(names::SEQUENCE_CHANGED, decode_sequence_changed);
        decoder
    }

    /// Decoder with no specializations; every event decodes to `General`
    pub fn empty() -> Self {
        Self {
            decoders: HashMap::new(),
            max_map_depth: DEFAULT_MAX_MAP_DEPTH,
        }
    }

    /// Decoder with every built-in specialization and the configured nesting limit
    pub fn from_config(config: &CodecConfig) -> Self {
        Self::new().with_max_map_depth(config.max_map_depth)
    }

    /// Limit string-map nesting in `General` payloads
    pub fn with_max_map_depth(mut self, max_map_depth: usize) -> Self {
        self.max_map_depth = max_map_depth;
        self
    }

    /// Register (or replace) the decoder for `name`.
    pub fn register<F>(&mut self, name: impl Into<Cow<'static, str>>, decoder: F)
    where
        F: Fn(&EventArgs<'_>) -> Result<EventPayload> + Send + Sync + 'static,
    {
        self.decoders.insert(name.into(), Box::new(decoder));
    }

    pub fn has_specialization(&self, name: &str) -> bool {
        self.decoders.contains_key(name)
    }

    /// Decode one event.
    ///
    /// # Errors
    /// - `MalformedEvent` when a specialized event's arguments do not fit its signature
    /// - a schema violation when a `General` argument has no replicated equivalent
    #[instrument(level = "debug", skip(self, values), fields(args = values.len()))]
    pub fn decode(
        &self,
        name: &str,
        sender_client_id: u64,
        values: &[WireValue],
    ) -> Result<NetworkEvent> {
        let payload = match self.decoders.get(name) {
            Some(decoder) => decoder(&EventArgs::new(name, values)).map_err(|e| {
                if matches!(e, ReplicationError::MalformedEvent { .. }) {
                    warn!(event = name, error = %e, "Dropping malformed event");
                    global_metrics().malformed_event();
                }
                e
            })?,
            None => {
                debug!(event = name, "No specialization, decoding as general event");
                EventPayload::General(
                    values
                        .iter()
                        .map(|value| unpack_value_with_depth(value, self.max_map_depth))
                        .collect::<Result<_>>()?,
                )
            }
        };

        global_metrics().event_decoded();
        Ok(NetworkEvent {
            name: name.to_string(),
            sender_client_id,
            payload,
        })
    }

    pub fn decode_inbound(&self, event: &InboundEvent) -> Result<NetworkEvent> {
        self.decode(&event.name, event.sender_client_id, &event.values)
    }
}

fn decode_asset_detail_blob_changed(args: &EventArgs<'_>) -> Result<EventPayload> {
    args.require(5)?;
    Ok(EventPayload::AssetDetailBlobChanged(AssetDetailBlobChanged {
        change_type: args.enumeration(0)?,
        asset_id: args.string(1)?,
        version: args.string(2)?,
        asset_type: args.enumeration(3)?,
        asset_collection_id: args.string(4)?,
    }))
}

fn decode_conversation(args: &EventArgs<'_>) -> Result<EventPayload> {
    args.require(7)?;
    Ok(EventPayload::Conversation(ConversationEvent {
        message_type: args.enumeration(0)?,
        info: MessageInfo {
            conversation_id: args.string(1)?,
            created_timestamp: args.string(2)?,
            edited_timestamp: args.string(3)?,
            user_id: args.string(4)?,
            message: args.string(5)?,
            message_id: args.string(6)?,
        },
    }))
}

fn decode_access_control_changed(args: &EventArgs<'_>) -> Result<EventPayload> {
    args.require(4)?;
    Ok(EventPayload::AccessControlChanged(AccessControlChanged {
        space_id: args.string(0)?,
        user_roles: args.enumeration_list(1)?,
        change_type: args.enumeration(2)?,
        user_id: args.string(3)?,
    }))
}

fn decode_sequence_changed(args: &EventArgs<'_>) -> Result<EventPayload> {
    args.require(2)?;
    let update_type = args.enumeration(0)?;
    let key = args.string(1)?;
    let new_key = args.optional_string(2)?;

    let change = match parse_hotspot_key(&key) {
        Some((space_id, name)) => SequenceChange::HotspotSequence {
            update_type,
            space_id: space_id.to_string(),
            name: name.to_string(),
            new_name: new_key.map(|new_key| match parse_hotspot_key(&new_key) {
                Some((_, new_name)) => new_name.to_string(),
                None => new_key,
            }),
        },
        None => SequenceChange::Sequence {
            update_type,
            key,
            new_key,
        },
    };
    Ok(EventPayload::SequenceChanged(change))
}

/// Split `Hotspots:<space_id>:<name>` into `(space_id, name)`. The name may itself
/// contain `:`.
pub fn parse_hotspot_key(key: &str) -> Option<(&str, &str)> {
    let rest = key.strip_prefix(HOTSPOT_SEQUENCE_PREFIX)?.strip_prefix(':')?;
    let (space_id, name) = rest.split_once(':')?;
    if space_id.is_empty() || name.is_empty() {
        return None;
    }
    Some((space_id, name))
}
