//! `PostgreSQL` store.
//!
//! Queries are checked at runtime (`query_as` with `FromRow` row structs);
//! rows are converted into domain types at this boundary.

mod accounts;
mod codes;
mod customers;
mod rows;
mod staff;
mod tenants;

use sqlx::PgPool;

use super::RepositoryError;
use super::store::ConsoleStore;

/// Store backed by a `PostgreSQL` pool. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl ConsoleStore for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Map a unique violation to `Conflict(what)`, anything else to `Database`.
fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(what.to_owned());
    }
    RepositoryError::Database(e)
}
