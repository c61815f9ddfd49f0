//! Subcommand implementations. Output goes through `tracing::info!`.

pub mod account;
pub mod address;
pub mod cart;
pub mod catalog;
pub mod orders;
