//! Data access for the console.
//!
//! # Schema: `console`
//!
//! - `auth_account` - identity-provider accounts (session subjects)
//! - `tenant`, `branch` - institutions and their locations
//! - `staff_user` - application profile of an account, with role
//! - `institution_code` - invite codes for staff signup
//! - `customer`, `orders`, `customer_tag`, `customer_tag_assignment`
//! - `customer_stats` - per-customer order aggregates and segment (view)
//! - `session` - tower-sessions storage
//!
//! # Stores
//!
//! Access goes through the traits in [`store`]. [`PgStore`] is the production
//! implementation; [`MemoryStore`] keeps everything in process memory.
//!
//! # Migrations
//!
//! Migrations live in `crates/console/migrations/` and are run with:
//! ```bash
//! cargo run -p comanda-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;
pub mod store;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::{
    AccountStore, BranchStore, CodeStore, ConsoleStore, CustomerStore, OnboardedTenant,
    OnboardingRecord, RegisteredStaff, RegistrationError, StaffRegistration, StaffStore,
    TenantStore,
};

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique slug).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
