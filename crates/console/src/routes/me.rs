//! Current user endpoint.

use axum::{Json, Router, extract::State, routing::get};
use tracing::instrument;

use crate::db::ConsoleStore;
use crate::error::{AppError, set_sentry_user};
use crate::middleware::CurrentSubject;
use crate::services::identity::{self, Identity};
use crate::state::AppState;

pub fn router<S: ConsoleStore>() -> Router<AppState<S>> {
    Router::new().route("/api/me", get(me::<S>))
}

/// Resolve the signed-in user, creating the staff profile on first call.
#[instrument(skip_all, fields(subject = %subject))]
async fn me<S: ConsoleStore>(
    State(state): State<AppState<S>>,
    CurrentSubject(subject): CurrentSubject,
) -> Result<Json<Identity>, AppError> {
    let identity = identity::resolve(state.store(), subject).await?;
    set_sentry_user(identity.user.id, identity.user.email.as_deref());
    Ok(Json(identity))
}
