//! CLI subcommands.

pub mod code;
pub mod migrate;

use sqlx::PgPool;
use thiserror::Error;

use comanda_console::db::RepositoryError;

/// Errors surfaced by any subcommand.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Invalid tenant id: {0}")]
    InvalidTenant(String),

    #[error("Tenant not found: {0}")]
    TenantNotFound(String),

    #[error("Invalid code: {0}")]
    InvalidCode(String),

    #[error("Institution code already exists: {0}")]
    CodeExists(String),
}

/// Database URL from `CONSOLE_DATABASE_URL`, falling back to `DATABASE_URL`.
fn database_url() -> Result<String, CommandError> {
    dotenvy::dotenv().ok();
    std::env::var("CONSOLE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| CommandError::MissingEnvVar("CONSOLE_DATABASE_URL"))
}

async fn connect() -> Result<PgPool, CommandError> {
    let url = database_url()?;
    tracing::info!("Connecting to console database...");
    Ok(PgPool::connect(&url).await?)
}
