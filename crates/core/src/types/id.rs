//! Newtype IDs for type-safe entity references.
//!
//! Backend records use integer keys, wrapped with the `define_id!` macro.
//! Users are keyed by the identity provider's opaque uid, wrapped in [`UserId`].

use core::fmt;

use serde::{Deserialize, Serialize};

/// Macro to define a type-safe integer ID wrapper.
///
/// Creates a newtype wrapper around `i32` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `Ord`
/// - Conversion methods: `new()`, `as_i32()`
/// - `From<i32>`, `Into<i32>` and `FromStr` implementations
///
/// # Example
///
/// ```rust
/// # use herbal_garden_core::define_id;
/// define_id!(HerbId);
/// define_id!(RegionId);
///
/// let herb = HerbId::new(1);
/// let region = RegionId::new(1);
///
/// // These are different types, so this won't compile:
/// // let _: HerbId = region;
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
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Create a new ID from an i32 value.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Get the underlying i32 value.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse::<i32>().map(Self)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(PlantId);
define_id!(BookmarkId);

/// Opaque user identifier issued by the identity provider.
///
/// The backend calls this the user's `google_id`; it is sent verbatim in
/// bookmark paths and bodies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap a provider uid.
    #[must_use]
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    /// Returns the uid as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_plant_id_parse() {
        let id: PlantId = " 42 ".parse().unwrap();
        assert_eq!(id, PlantId::new(42));
        assert!("neem".parse::<PlantId>().is_err());
    }

    #[test]
    fn test_plant_id_display_honors_width() {
        assert_eq!(format!("{:>5}", PlantId::new(7)), "    7");
        assert_eq!(format!("{:<3}|", PlantId::new(12)), "12 |");
    }

    #[test]
    fn test_plant_id_serde_is_transparent() {
        let json = serde_json::to_string(&PlantId::new(5)).unwrap();
        assert_eq!(json, "5");
        let back: PlantId = serde_json::from_str("7").unwrap();
        assert_eq!(back.as_i32(), 7);
    }

    #[test]
    fn test_user_id_display() {
        let uid = UserId::new("u1");
        assert_eq!(uid.to_string(), "u1");
        assert_eq!(format!("[{uid:<4}]"), "[u1  ]");
        assert_eq!(serde_json::to_string(&uid).unwrap(), "\"u1\"");
    }
}
