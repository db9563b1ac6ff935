//! # Component Property Storage
//!
//! Per-component property containers and the pieces around them.
//!
//! ## Components
//! - **PropertyStore**: kind-pinned `PropertyKey -> ReplicatedValue` map for one component
//! - **DirtyNotifier**: capability a store calls after each successful local write
//! - **CustomProperties**: open-ended named values on top of a single map property
//! - **ComponentTemplates**: JSON registry of component definitions and defaults

pub mod custom_properties;
pub mod dirty;
pub mod property_store;
pub mod template;

pub use custom_properties::{CustomProperties, CUSTOM_PROPERTIES_KEY};
pub use dirty::{DirtyComponents, DirtyNotifier};
pub use property_store::PropertyStore;
pub use template::{ComponentTemplate, ComponentTemplates, PropertyTemplate};
