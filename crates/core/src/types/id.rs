//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types. Server ids are opaque
//! strings (UUIDs in practice), so every wrapper is backed by a `String`.

/// Macro to define a type-safe, string-backed ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use bazaar_core::define_id;
/// define_id!(SellerId);
/// define_id!(ReviewId);
///
/// let seller = SellerId::new("s-1");
/// let review = ReviewId::new("s-1");
///
/// // These are different types, so this won't compile:
/// // let _: SellerId = review;
/// assert_eq!(seller.as_str(), review.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Convert into the inner string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(UserId);
define_id!(ProductId);
define_id!(CategoryId);
define_id!(CartLineId);
define_id!(AddressId);
define_id!(OrderId);
define_id!(WishlistEntryId);

/// Prefix marking address ids minted on the device rather than by the server.
const LOCAL_ADDRESS_PREFIX: &str = "local-";

/// Prefix of order ids synthesized for guest checkouts.
const GUEST_ORDER_PREFIX: &str = "order-";

impl AddressId {
    /// Mint a device-local address id.
    ///
    /// Local ids never reach the server as foreign keys; the next address
    /// sync replaces them with server-issued ids.
    #[must_use]
    pub fn local() -> Self {
        Self(format!("{LOCAL_ADDRESS_PREFIX}{}", uuid::Uuid::new_v4()))
    }

    /// Whether this id was minted on the device.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.0.starts_with(LOCAL_ADDRESS_PREFIX)
    }
}

impl OrderId {
    /// Build the id of a guest order placed at `placed_at`.
    #[must_use]
    pub fn guest(placed_at: chrono::DateTime<chrono::Utc>) -> Self {
        Self(format!(
            "{GUEST_ORDER_PREFIX}{}",
            placed_at.timestamp_millis()
        ))
    }

    /// Whether this order exists only on the device.
    #[must_use]
    pub fn is_guest(&self) -> bool {
        self.0.starts_with(GUEST_ORDER_PREFIX)
    }
}
