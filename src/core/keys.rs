//! Identifiers and reserved key ranges shared by the store, packer and entity codec.
//!
//! Two reserved ranges exist:
//! - property keys at or above [`RESERVED_PROPERTY_KEY_START`] are never assigned to
//!   ordinary properties; the component type travels under one of them
//! - component ids at or above the view threshold address [`ViewComponent`]s, the
//!   fixed entity metadata carried alongside ordinary components

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a component within its owning entity
pub type ComponentId = u16;

/// Identifies a property within a component type
pub type PropertyKey = u32;

/// Start of the reserved property key range
pub const RESERVED_PROPERTY_KEY_START: PropertyKey = 0xFFFF_0000;

/// Synthetic key carrying the component type in every packed component
pub const COMPONENT_TYPE_PROPERTY_KEY: PropertyKey = RESERVED_PROPERTY_KEY_START;

/// First component id reserved for view components. Callers only observe this
/// through the runtime/view component counts.
pub(crate) const VIEW_COMPONENT_KEY_START: u64 = 0xFF00;

/// Whether `key` is inside the reserved property range
pub fn is_reserved_property_key(key: PropertyKey) -> bool {
    key >= RESERVED_PROPERTY_KEY_START
}

/// Whether a component map key addresses a view component
pub(crate) fn is_view_component_key(key: u64) -> bool {
    key >= VIEW_COMPONENT_KEY_START
}

/// Type identifier of a component definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentType(pub u64);

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ComponentType {
    fn from(value: u64) -> Self {
        ComponentType(value)
    }
}

/// Entity metadata replicated outside the ordinary component list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ViewComponent {
    Name,
    Position,
    Rotation,
    Scale,
    SelectedClientId,
    ThirdPartyRef,
    ThirdPartyPlatform,
    LockType,
}

impl ViewComponent {
    pub const ALL: [ViewComponent; 8] = [
        ViewComponent::Name,
        ViewComponent::Position,
        ViewComponent::Rotation,
        ViewComponent::Scale,
        ViewComponent::SelectedClientId,
        ViewComponent::ThirdPartyRef,
        ViewComponent::ThirdPartyPlatform,
        ViewComponent::LockType,
    ];

    fn offset(self) -> u64 {
        match self {
            ViewComponent::Name => 0,
            ViewComponent::Position => 1,
            ViewComponent::Rotation => 2,
            ViewComponent::Scale => 3,
            ViewComponent::SelectedClientId => 4,
            ViewComponent::ThirdPartyRef => 5,
            ViewComponent::ThirdPartyPlatform => 6,
            ViewComponent::LockType => 7,
        }
    }

    /// Key of this view component in an entity's component map
    pub fn key(self) -> u64 {
        VIEW_COMPONENT_KEY_START + self.offset()
    }

    /// Look up the view component addressed by a component map key
    pub fn from_key(key: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|view| view.key() == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_keys_roundtrip() {
        for view in ViewComponent::ALL {
            assert!(is_view_component_key(view.key()));
            assert_eq!(ViewComponent::from_key(view.key()), Some(view));
        }
        assert_eq!(ViewComponent::from_key(3), None);
    }

    #[test]
    fn test_reserved_property_range() {
        assert!(is_reserved_property_key(COMPONENT_TYPE_PROPERTY_KEY));
        assert!(!is_reserved_property_key(0));
        assert!(!is_reserved_property_key(RESERVED_PROPERTY_KEY_START - 1));
    }
}
