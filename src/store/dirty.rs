//! Dirty tracking for outbound replication.
//!
//! A [`PropertyStore`](super::PropertyStore) never references its owning entity.
//! Instead it holds a [`DirtyNotifier`] capability and calls it after every
//! successful local mutation.

use crate::core::keys::ComponentId;
use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

/// Something that can be told a component changed locally
pub trait DirtyNotifier: Send + Sync {
    fn mark_dirty(&self, component_id: ComponentId);
}

/// Dirty set of component ids for one entity.
///
/// Share one instance (behind an `Arc`) between every store of an entity, then
/// drain it with [`take_dirty`](Self::take_dirty) when building the next patch.
#[derive(Debug, Default)]
pub struct DirtyComponents {
    dirty: Mutex<BTreeSet<ComponentId>>,
}

impl DirtyComponents {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeSet<ComponentId>> {
        // A poisoned set is still a valid set of ids
        self.dirty.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_dirty(&self, component_id: ComponentId) -> bool {
        self.lock().contains(&component_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drain the dirty set in ascending component id order.
    pub fn take_dirty(&self) -> Vec<ComponentId> {
        std::mem::take(&mut *self.lock()).into_iter().collect()
    }
}

impl DirtyNotifier for DirtyComponents {
    fn mark_dirty(&self, component_id: ComponentId) {
        self.lock().insert(component_id);
    }
}
