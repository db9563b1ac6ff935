//! Open-ended, string-named properties.
//!
//! The fixed integer-keyed model cannot grow new keys at runtime, so named
//! properties live inside a single `StringMap` property. The wire carries them as
//! a nested string-keyed map and no integer key has to be derived from a name.

use crate::core::keys::{ComponentId, ComponentType, PropertyKey};
use crate::error::{ReplicationError, Result};
use crate::store::PropertyStore;
use crate::value::{ReplicatedValue, ReplicatedValueKind, StringMap};

/// Key of the map property holding every named entry
pub const CUSTOM_PROPERTIES_KEY: PropertyKey = 0;

/// Component holding arbitrary named values
#[derive(Debug, Clone)]
pub struct CustomProperties {
    store: PropertyStore,
}

impl CustomProperties {
    pub fn new(component_id: ComponentId, component_type: ComponentType) -> Result<Self> {
        let store = PropertyStore::new(
            component_id,
            component_type,
            [(CUSTOM_PROPERTIES_KEY, ReplicatedValue::StringMap(StringMap::new()))],
        )?;
        Ok(Self { store })
    }

    /// Wrap an existing store, e.g. one rebuilt from the wire.
    ///
    /// # Errors
    /// `WrongKind` when the store does not hold a map under [`CUSTOM_PROPERTIES_KEY`].
    pub fn from_store(store: PropertyStore) -> Result<Self> {
        let kind = store.get_property(CUSTOM_PROPERTIES_KEY).kind();
        if kind != ReplicatedValueKind::StringMap {
            return Err(ReplicationError::WrongKind {
                expected: ReplicatedValueKind::StringMap,
                actual: kind,
            });
        }
        Ok(Self { store })
    }

    /// The backing map; absent only if the key was removed through `store_mut`
    fn entries(&self) -> Result<&StringMap> {
        self.store.get_property(CUSTOM_PROPERTIES_KEY).as_string_map()
    }

    /// Insert or replace a named value. Unlike ordinary properties, a named entry
    /// may change kind; the pinned kind is that of the enclosing map.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<ReplicatedValue>) -> Result<()> {
        let mut entries = self.entries()?.clone();
        entries.insert(name.into(), value.into());
        self.store
            .set_property(CUSTOM_PROPERTIES_KEY, ReplicatedValue::StringMap(entries))
    }

    pub fn get(&self, name: &str) -> Option<&ReplicatedValue> {
        self.entries().ok()?.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn remove(&mut self, name: &str) -> Result<Option<ReplicatedValue>> {
        let mut entries = self.entries()?.clone();
        let removed = entries.remove(name);
        if removed.is_some() {
            self.store
                .set_property(CUSTOM_PROPERTIES_KEY, ReplicatedValue::StringMap(entries))?;
        }
        Ok(removed)
    }

    /// Snapshot of the active names, sorted
    pub fn names(&self) -> Vec<String> {
        self.entries()
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.entries().map(StringMap::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn store(&self) -> &PropertyStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut PropertyStore {
        &mut self.store
    }

    pub fn into_store(self) -> PropertyStore {
        self.store
    }
}
