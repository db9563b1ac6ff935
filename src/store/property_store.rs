//! # Property Store
//!
//! Keyed property container backing one component instance.
//!
//! ## Invariants
//! - The key set and every key's kind are fixed by the default population passed
//!   to [`PropertyStore::new`]; local writes can never add a key or change a kind.
//! - Every successful local mutation notifies the injected [`DirtyNotifier`].
//! - Remote updates ([`PropertyStore::apply_remote`]) never notify, so inbound
//!   patches are not echoed back out.
//! - [`keys`](PropertyStore::keys) and [`values`](PropertyStore::values) return
//!   owned snapshots, detached from later mutation.

use crate::core::keys::{is_reserved_property_key, ComponentId, ComponentType, PropertyKey};
use crate::error::{ReplicationError, Result};
use crate::store::dirty::DirtyNotifier;
use crate::utils::metrics::global_metrics;
use crate::value::ReplicatedValue;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Returned by reference for absent keys
static INVALID_VALUE: ReplicatedValue = ReplicatedValue::Invalid;

/// Properties of a single component instance
#[derive(Clone)]
pub struct PropertyStore {
    component_id: ComponentId,
    component_type: ComponentType,
    properties: BTreeMap<PropertyKey, ReplicatedValue>,
    notifier: Option<Arc<dyn DirtyNotifier>>,
}

impl fmt::Debug for PropertyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyStore")
            .field("component_id", &self.component_id)
            .field("component_type", &self.component_type)
            .field("properties", &self.properties)
            .field("has_notifier", &self.notifier.is_some())
            .finish()
    }
}

impl PropertyStore {
    /// Create a store populated with its full default property set.
    ///
    /// # Errors
    /// Returns `ReservedPropertyKey` if a default uses a key from the reserved range.
    pub fn new<I>(
        component_id: ComponentId,
        component_type: ComponentType,
        defaults: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = (PropertyKey, ReplicatedValue)>,
    {
        let mut properties = BTreeMap::new();
        for (key, value) in defaults {
            if is_reserved_property_key(key) {
                return Err(ReplicationError::ReservedPropertyKey(key));
            }
            properties.insert(key, value);
        }

        Ok(Self {
            component_id,
            component_type,
            properties,
            notifier: None,
        })
    }

    /// Attach the capability notified on every successful local mutation.
    pub fn with_notifier(mut self, notifier: Arc<dyn DirtyNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn set_notifier(&mut self, notifier: Arc<dyn DirtyNotifier>) {
        self.notifier = Some(notifier);
    }

    pub fn component_id(&self) -> ComponentId {
        self.component_id
    }

    pub fn component_type(&self) -> ComponentType {
        self.component_type
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn contains_key(&self, key: PropertyKey) -> bool {
        self.properties.contains_key(&key)
    }

    /// Live view of the property map, used by the packer
    pub fn properties(&self) -> &BTreeMap<PropertyKey, ReplicatedValue> {
        &self.properties
    }

    /// Overwrite a property with a value of the same kind.
    ///
    /// # Errors
    /// - `UnknownProperty` if `key` was not part of the default set
    /// - `KindMismatch` if `value` has a different kind from the stored value
    ///
    /// The store is unchanged on error.
    pub fn set_property(
        &mut self,
        key: PropertyKey,
        value: impl Into<ReplicatedValue>,
    ) -> Result<()> {
        let value = value.into();
        let component_id = self.component_id;

        let Some(existing) = self.properties.get_mut(&key) else {
            warn!(component_id, key, "Ignoring write to unknown property");
            global_metrics().contract_violation();
            return Err(ReplicationError::UnknownProperty { component_id, key });
        };

        if existing.kind() != value.kind() {
            warn!(
                component_id,
                key,
                expected = existing.kind().name(),
                actual = value.kind().name(),
                "Ignoring write that would change a property's kind"
            );
            global_metrics().contract_violation();
            return Err(ReplicationError::KindMismatch {
                key,
                expected: existing.kind(),
                actual: value.kind(),
            });
        }

        *existing = value;
        self.notify();
        Ok(())
    }

    /// Current value for `key`, or an `Invalid` value if the key is absent.
    pub fn get_property(&self, key: PropertyKey) -> &ReplicatedValue {
        match self.properties.get(&key) {
            Some(value) => value,
            None => {
                debug!(
                    component_id = self.component_id,
                    key, "Read of absent property"
                );
                &INVALID_VALUE
            }
        }
    }

    pub fn try_get_property(&self, key: PropertyKey) -> Option<&ReplicatedValue> {
        self.properties.get(&key)
    }

    /// Snapshot of the current keys, in ascending order
    pub fn keys(&self) -> Vec<PropertyKey> {
        self.properties.keys().copied().collect()
    }

    /// Deep snapshot of the current values, in key order
    pub fn values(&self) -> Vec<ReplicatedValue> {
        self.properties.values().cloned().collect()
    }

    /// Drop a key entirely.
    pub fn remove_property(&mut self, key: PropertyKey) -> Option<ReplicatedValue> {
        let removed = self.properties.remove(&key);
        if removed.is_some() {
            self.notify();
        }
        removed
    }

    /// Drop every key.
    pub fn clear(&mut self) {
        if !self.properties.is_empty() {
            self.properties.clear();
            self.notify();
        }
    }

    /// Apply a value received from a peer.
    ///
    /// Known keys are overwritten when the kind matches; unknown keys (sent by a
    /// newer peer) are inserted. No dirty notification is raised.
    ///
    /// # Errors
    /// `RemoteKindMismatch` when a known key arrives with a different kind.
    pub fn apply_remote(&mut self, key: PropertyKey, value: ReplicatedValue) -> Result<()> {
        match self.properties.get_mut(&key) {
            Some(existing) if existing.kind() != value.kind() => {
                global_metrics().schema_violation();
                Err(ReplicationError::RemoteKindMismatch {
                    key,
                    expected: existing.kind(),
                    actual: value.kind(),
                })
            }
            Some(existing) => {
                *existing = value;
                Ok(())
            }
            None => {
                debug!(
                    component_id = self.component_id,
                    key, "Inserting property unknown to this component"
                );
                self.properties.insert(key, value);
                Ok(())
            }
        }
    }

    fn notify(&self) {
        if let Some(notifier) = &self.notifier {
            notifier.mark_dirty(self.component_id);
        }
    }
}
