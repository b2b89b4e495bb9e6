//! Comanda console library.
//!
//! The multi-tenant restaurant console API: staff identity and onboarding,
//! branch context, institution (invite) codes, staff administration and the
//! customer list. The binary in `main.rs` wires it to `PostgreSQL`; the
//! integration tests drive the same router over [`db::MemoryStore`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
