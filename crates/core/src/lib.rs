//! Sudanese Bazaar Core - Shared domain types.
//!
//! This crate provides the types used across all bazaar components:
//! - `client` - API gateway, local state store, sync and checkout
//! - `cli` - Command-line front end over the client
//! - `integration-tests` - Fake REST API and end-to-end tests
//!
//! # Architecture
//!
//! The core crate contains only types and pure rules (line-item identity,
//! money arithmetic, order status ordering) - no I/O, no HTTP clients, no
//! persistence. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Ids, money, email, statuses and the catalog/cart/order records

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
