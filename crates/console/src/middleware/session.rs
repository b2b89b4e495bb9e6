//! Session middleware configuration.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions with strict
//! cookie settings (`SameSite=Strict`, HTTP-only, inactivity expiry).

use sqlx::PgPool;
use tower_sessions::{Expiry, Session, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use comanda_core::BranchId;

use crate::config::ConsoleConfig;
use crate::error::AppError;
use crate::models::session_keys;
use crate::services::branch_context::SelectionPersistence;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "comanda_session";

/// Create the session layer with `PostgreSQL` store.
///
/// # Panics
///
/// Panics if the schema name or table name is invalid (should never happen
/// with hardcoded "console" and "session" values).
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &ConsoleConfig,
) -> SessionManagerLayer<PostgresStore> {
    // Note: The session table is created by the console migrations.
    let store = PostgresStore::new(pool.clone())
        .with_schema_name("console")
        .expect("valid schema name")
        .with_table_name("session")
        .expect("valid table name");

    session_layer(store, config.is_secure(), config.session_hours)
}

/// Session layer over any store (the HTTP tests use the in-memory one).
#[must_use]
pub fn session_layer<St: SessionStore + Clone>(
    store: St,
    secure: bool,
    expiry_hours: i64,
) -> SessionManagerLayer<St> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::hours(expiry_hours),
        ))
        .with_secure(secure)
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
}

/// Persists the selected branch under the `selected_branch_id` session key.
#[derive(Debug, Clone)]
pub struct SessionSelection {
    session: Session,
}

impl SessionSelection {
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

impl SelectionPersistence for SessionSelection {
    async fn load(&self) -> Result<Option<BranchId>, AppError> {
        Ok(self
            .session
            .get::<BranchId>(session_keys::SELECTED_BRANCH_ID)
            .await?)
    }

    async fn save(&self, id: BranchId) -> Result<(), AppError> {
        self.session
            .insert(session_keys::SELECTED_BRANCH_ID, id)
            .await?;
        Ok(())
    }
}
