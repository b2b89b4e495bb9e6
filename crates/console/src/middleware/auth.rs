//! Authentication extractors.
//!
//! The pipeline for tenant-scoped routes is fixed: session subject
//! (`Unauthorized`), then staff profile (`ProfileNotFound`), then tenant
//! (`OnboardingRequired`). Role checks happen in the services.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use comanda_core::SubjectId;

use crate::db::ConsoleStore;
use crate::error::{AppError, set_sentry_user};
use crate::models::session_keys;
use crate::services::{Caller, resolve_caller};
use crate::state::AppState;

/// Extractor that requires a signed-in session.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(CurrentSubject(subject): CurrentSubject) -> impl IntoResponse {
///     subject.to_string()
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CurrentSubject(pub SubjectId);

impl<S> FromRequestParts<S> for CurrentSubject
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Get the session from extensions (set by SessionManagerLayer)
        let session = parts
            .extensions
            .get::<Session>()
            .ok_or_else(AppError::unauthorized)?;

        let subject = session
            .get::<SubjectId>(session_keys::SUBJECT)
            .await?
            .ok_or_else(AppError::unauthorized)?;

        Ok(Self(subject))
    }
}

/// Extractor that requires a staff user linked to a tenant.
///
/// Also tags the Sentry scope with the staff user.
#[derive(Debug, Clone)]
pub struct TenantStaff(pub Caller);

impl<S: ConsoleStore> FromRequestParts<AppState<S>> for TenantStaff {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentSubject(subject) = CurrentSubject::from_request_parts(parts, state).await?;
        let caller = resolve_caller(state.store(), subject).await?;
        set_sentry_user(caller.user.id, caller.user.email.as_deref());
        Ok(Self(caller))
    }
}

/// Store the signed-in subject, rotating the session id first.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_subject(
    session: &Session,
    subject: SubjectId,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::SUBJECT, subject).await
}

/// Drop all session data (logout).
///
/// # Errors
///
/// Returns an error if the session cannot be deleted.
pub async fn clear_session(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
