//! Database migrations.
//!
//! Migration files live in `crates/console/migrations/` and are embedded at
//! compile time.

use super::{CommandError, connect};

/// Run all pending console migrations.
///
/// # Errors
///
/// Connection or migration failures.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running console migrations...");
    sqlx::migrate!("../console/migrations").run(&pool).await?;

    tracing::info!("Console migrations complete!");
    Ok(())
}
