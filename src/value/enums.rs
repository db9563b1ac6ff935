//! Integer-backed enums carried through the Integer path.
//!
//! Enums travel on the wire as their underlying integer. Rather than writing a
//! conversion per enum, [`replicated_enum!`](crate::replicated_enum) derives
//! `From<E> for i64` and `TryFrom<i64> for E`, and every generic helper
//! ([`ReplicatedValue::from_enum`](crate::value::ReplicatedValue::from_enum),
//! [`pack_enum`](crate::core::packer::pack_enum), ...) is written once against
//! those bounds.

/// Declare a fieldless enum with explicit discriminants that converts to and
/// from `i64`.
///
/// ```rust
/// use replication_core::replicated_enum;
/// use replication_core::value::ReplicatedValue;
///
/// replicated_enum! {
///     /// Light shape
///     pub enum LightType {
///         Directional = 0,
///         Point = 1,
///         Spot = 2,
///     }
/// }
///
/// let value = ReplicatedValue::from_enum(LightType::Spot);
/// assert_eq!(value.to_enum::<LightType>().ok(), Some(LightType::Spot));
/// assert!(LightType::try_from(7_i64).is_err());
/// ```
#[macro_export]
macro_rules! replicated_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$variant_meta:meta])* $variant:ident = $value:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$variant_meta])* $variant = $value ),+
        }

        impl ::core::convert::From<$name> for i64 {
            fn from(value: $name) -> i64 {
                value as i64
            }
        }

        impl ::core::convert::TryFrom<i64> for $name {
            type Error = i64;

            fn try_from(value: i64) -> ::core::result::Result<Self, i64> {
                $(
                    if value == $name::$variant as i64 {
                        return Ok($name::$variant);
                    }
                )+
                Err(value)
            }
        }
    };
}
