//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i64` (the backend's `Long` keys) with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `Display`, `FromStr`
/// - Conversion methods: `new()`, `as_i64()`
/// - `From<i64>` and `Into<i64>` implementations
///
/// # Example
///
/// ```rust
/// # use onlineshop_core::define_id;
/// define_id!(CustomerId);
/// define_id!(OrderId);
///
/// let customer_id = CustomerId::new(1);
/// let order_id = OrderId::new(1);
///
/// // These are different types, so this won't compile:
/// // let _: CustomerId = order_id;
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
        pub struct $name(i64);

        impl $name {
            /// Create a new ID from an i64 value.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the underlying i64 value.
            #[must_use]
            pub const fn as_i64(&self) -> i64 {
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
                s.trim().parse::<i64>().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Define standard entity IDs
define_id!(CustomerId);
define_id!(ProductId);
define_id!(OrderId);

/// Deserialize an ID that the wire may carry as a JSON number or a numeric string.
///
/// The login endpoint returns `userId` as a number, while older persisted
/// credential files stored it as a string.
///
/// # Errors
///
/// Returns an error if the value is neither an integer nor a string holding one.
pub fn deserialize_lenient_id<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: From<i64>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    lenient_id_from_value(&value)
        .map(T::from)
        .ok_or_else(|| D::Error::custom(format!("expected integer id, got {value}")))
}

/// Like [`deserialize_lenient_id`] but maps `null`/missing to `None`.
///
/// # Errors
///
/// Returns an error if a present value is not an integer id.
pub fn deserialize_optional_lenient_id<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: From<i64>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(value) => lenient_id_from_value(&value)
            .map(|id| Some(T::from(id)))
            .ok_or_else(|| D::Error::custom(format!("expected integer id, got {value}"))),
    }
}

fn lenient_id_from_value(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(number) => number.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Wrapper {
        #[serde(deserialize_with = "deserialize_lenient_id")]
        id: CustomerId,
    }

    #[derive(Deserialize)]
    struct OptionalWrapper {
        #[serde(default, deserialize_with = "deserialize_optional_lenient_id")]
        id: Option<CustomerId>,
    }

    #[test]
    fn test_lenient_id_accepts_number() {
        let parsed: Wrapper = serde_json::from_str(r#"{"id": 42}"#).unwrap();
        assert_eq!(parsed.id, CustomerId::new(42));
    }

    #[test]
    fn test_lenient_id_accepts_numeric_string() {
        let parsed: Wrapper = serde_json::from_str(r#"{"id": " 7 "}"#).unwrap();
        assert_eq!(parsed.id, CustomerId::new(7));
    }

    #[test]
    fn test_lenient_id_rejects_garbage() {
        assert!(serde_json::from_str::<Wrapper>(r#"{"id": "abc"}"#).is_err());
        assert!(serde_json::from_str::<Wrapper>(r#"{"id": 1.5}"#).is_err());
        assert!(serde_json::from_str::<Wrapper>(r#"{"id": true}"#).is_err());
    }

    #[test]
    fn test_optional_lenient_id() {
        let missing: OptionalWrapper = serde_json::from_str("{}").unwrap();
        assert_eq!(missing.id, None);

        let null: OptionalWrapper = serde_json::from_str(r#"{"id": null}"#).unwrap();
        assert_eq!(null.id, None);

        let present: OptionalWrapper = serde_json::from_str(r#"{"id": "3"}"#).unwrap();
        assert_eq!(present.id, Some(CustomerId::new(3)));
    }

    #[test]
    fn test_id_display_and_parse() {
        let id: OrderId = "15".parse().unwrap();
        assert_eq!(id.as_i64(), 15);
        assert_eq!(id.to_string(), "15");
        assert!("x".parse::<OrderId>().is_err());
    }
}
