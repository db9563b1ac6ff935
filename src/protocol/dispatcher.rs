use crate::error::{constants, ReplicationError, Result};
use crate::protocol::event::{InboundEvent, NetworkEvent};
use crate::protocol::event_decoder::NetworkEventDecoder;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::trace;

type HandlerFn = dyn Fn(&NetworkEvent) -> Result<()> + Send + Sync + 'static;

/// Routes decoded events to handlers by event name.
///
/// Handlers can be registered from any thread through a shared reference; the
/// decoder is fixed at construction.
pub struct EventDispatcher {
    decoder: NetworkEventDecoder,
    handlers: Arc<RwLock<HashMap<Cow<'static, str>, Box<HandlerFn>>>>,
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::with_decoder(NetworkEventDecoder::new())
    }

    pub fn with_decoder(decoder: NetworkEventDecoder) -> Self {
        Self {
            decoder,
            handlers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn decoder(&self) -> &NetworkEventDecoder {
        &self.decoder
    }

    /// Register (or replace) the handler for `name`.
    pub fn register<F>(&self, name: impl Into<Cow<'static, str>>, handler: F) -> Result<()>
    where
        F: Fn(&NetworkEvent) -> Result<()> + Send + Sync + 'static,
    {
        let mut handlers = self.handlers.write().map_err(|_| {
            ReplicationError::Custom(constants::ERR_DISPATCHER_WRITE_LOCK.to_string())
        })?;

        handlers.insert(name.into(), Box::new(handler));
        Ok(())
    }

    pub fn unregister(&self, name: &str) -> Result<bool> {
        let mut handlers = self.handlers.write().map_err(|_| {
            ReplicationError::Custom(constants::ERR_DISPATCHER_WRITE_LOCK.to_string())
        })?;
        Ok(handlers.remove(name).is_some())
    }

    /// Hand an already decoded event to its handler.
    ///
    /// # Errors
    /// `UnexpectedEvent` when no handler is registered for the event's name, or
    /// whatever the handler returns.
    pub fn dispatch(&self, event: &NetworkEvent) -> Result<()> {
        let handlers = self.handlers.read().map_err(|_| {
            ReplicationError::Custom(constants::ERR_DISPATCHER_READ_LOCK.to_string())
        })?;

        trace!(event = %event.name, sender = event.sender_client_id, "Dispatching event");
        handlers
            .get(event.name.as_str())
            .ok_or_else(|| ReplicationError::UnexpectedEvent(event.name.clone()))
            .and_then(|handler| handler(event))
    }

    /// Decode an inbound event and dispatch it, returning the decoded form.
    pub fn dispatch_inbound(&self, inbound: &InboundEvent) -> Result<NetworkEvent> {
        let event = self.decoder.decode_inbound(inbound)?;
        self.dispatch(&event)?;
        Ok(event)
    }
}
