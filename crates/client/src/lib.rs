//! Sudanese Bazaar client library.
//!
//! This crate holds everything the shopping app does besides rendering: the
//! REST gateway, the local state store and its persistence, the session and
//! synchronization state machine, and order placement.
//!
//! # Architecture
//!
//! - [`Bazaar`] is the root object. It exclusively owns the [`Store`] and
//!   applies every mutation under `&mut self`, so there is a single writer.
//! - Cart, wishlist and address writes are optimistic: the store changes
//!   immediately and the matching API call is spawned in the background,
//!   its result ignored and errors logged.
//! - Pull-syncs replace server-owned collections wholesale.
//!
//! ```rust,ignore
//! use bazaar_client::{Bazaar, ClientConfig};
//!
//! let config = ClientConfig::from_env()?;
//! let mut bazaar = Bazaar::from_config(&config)?;
//! bazaar.hydrate().await;
//!
//! bazaar.add_to_cart(CartItem::new(product, 2));
//! let order = bazaar.place_order(None).await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod background;
pub mod bazaar;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod store;
pub mod token;

pub use api::{ApiClient, ApiError, AuthSession, ErrorKind, ProductQuery};
pub use bazaar::{Bazaar, RegisterInput, SyncReport, SyncTarget};
pub use catalog::Catalog;
pub use checkout::{CheckoutSummary, DELIVERY_FEE_CENTS};
pub use config::{ClientConfig, ConfigError};
pub use error::{AppError, Result};
pub use store::{CartChange, Store};
pub use store::persist::{FileStorage, MemoryStorage, PersistError, PersistedState, StateStorage};
pub use token::SessionToken;
