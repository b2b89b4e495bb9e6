//! Comanda Core - Shared domain types.
//!
//! This crate provides the types used across all Comanda components:
//! - `console` - Restaurant management console (HTTP API)
//! - `cli` - Command-line tools for migrations and institution codes
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, staff roles, customer segments, slugs,
//!   institution codes, and order-activity derivations

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
