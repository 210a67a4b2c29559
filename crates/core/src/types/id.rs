//! Newtype IDs for type-safe entity references.
//!
//! The CRM backend numbers leads, owners and follow-ups independently with
//! unsigned counters. Use the `define_id!` macro to create wrappers that
//! prevent accidentally passing a lead ID where an owner ID is expected.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `u64` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_u64()`
/// - `From<u64>` and `Into<u64>` implementations
/// - `FromStr` so IDs can be taken from URL path segments
///
/// # Example
///
/// ```rust
/// # use estate_crm_core::define_id;
/// define_id!(LeadId);
/// define_id!(OwnerId);
///
/// let lead_id = LeadId::new(1);
/// let owner_id = OwnerId::new(1);
///
/// // These are different types, so this won't compile:
/// // let _: LeadId = owner_id;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Create a new ID from a u64 value.
            #[must_use]
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            /// Get the underlying u64 value.
            #[must_use]
            pub const fn as_u64(&self) -> u64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.parse::<u64>().map(Self)
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(LeadId);
define_id!(OwnerId);
define_id!(FollowUpId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_from_path_segment() {
        let id: LeadId = "42".parse().unwrap();
        assert_eq!(id, LeadId::new(42));
        assert!("forty-two".parse::<LeadId>().is_err());
        assert!("-1".parse::<OwnerId>().is_err());
    }

    #[test]
    fn test_id_serializes_as_plain_number() {
        let json = serde_json::to_string(&FollowUpId::new(7)).unwrap();
        assert_eq!(json, "7");
        let parsed: FollowUpId = serde_json::from_str("7").unwrap();
        assert_eq!(parsed.as_u64(), 7);
    }
}
