//! Core types for the bazaar.
//!
//! This module provides type-safe wrappers for common domain concepts and
//! the records exchanged between the store, the gateway and the UI.

pub mod address;
pub mod cart;
pub mod email;
pub mod id;
pub mod money;
pub mod order;
pub mod product;
pub mod status;
pub mod user;

pub use address::{Address, AddressSnapshot};
pub use cart::{CartItem, LineKey};
pub use email::{Email, EmailError};
pub use id::*;
pub use money::{CURRENCY_CODE, Money, MoneyError};
pub use order::{DELIVERY_DAYS, Order, OrderItem};
pub use product::{Category, ColorOption, Product, ProductVariants};
pub use status::*;
pub use user::User;
