//! # Replicated Value Model
//!
//! The in-memory representation of one replicated property.
//!
//! ## Components
//! - **ReplicatedValue**: closed tagged union over bool, integer, float, string,
//!   vectors and nested string maps
//! - **Vectors**: `f32` two, three and four component vectors
//! - **Enums**: `replicated_enum!` for enums carried as integers

pub mod enums;
pub mod replicated_value;
pub mod vector;

pub use replicated_value::{ReplicatedValue, ReplicatedValueKind, StringMap};
pub use vector::{Vector2, Vector3, Vector4};
