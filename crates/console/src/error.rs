//! Unified error handling for the console API.
//!
//! Every handler returns [`AppError`] on failure. Client errors carry a short
//! message meant for the user; server errors are reported to Sentry and
//! logged with their context, and the client only sees a generic message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use comanda_core::{StaffUserId, TenantId};

use crate::db::RepositoryError;

/// Application-level error type for the console.
#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or invalid session.
    #[error("{0}")]
    Unauthorized(String),

    /// Valid session but no staff profile linked to it.
    #[error("User profile not found")]
    ProfileNotFound,

    /// The staff user has no tenant yet.
    #[error("Onboarding required")]
    OnboardingRequired,

    /// Role insufficient for the operation.
    #[error("{0}")]
    PermissionDenied(String),

    /// Malformed or missing input.
    #[error("{0}")]
    Validation(String),

    /// Uniqueness violation.
    #[error("{0}")]
    Conflict(String),

    /// Target row absent, or owned by another tenant.
    #[error("{0}")]
    NotFound(String),

    /// Underlying store failure.
    #[error("store error in {operation}: {source}")]
    Store {
        operation: &'static str,
        tenant_id: Option<TenantId>,
        #[source]
        source: RepositoryError,
    },

    /// Anything else.
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::ProfileNotFound | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::OnboardingRequired | Self::PermissionDenied(_) => StatusCode::FORBIDDEN,
            Self::Validation(_) | Self::Conflict(_) => StatusCode::BAD_REQUEST,
            Self::Store { .. } | Self::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[must_use]
    pub fn unauthorized() -> Self {
        Self::Unauthorized("Not signed in".to_owned())
    }

    #[must_use]
    pub fn owner_or_manager_required() -> Self {
        Self::PermissionDenied("Only owners and managers can perform this action".to_owned())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            match &self {
                Self::Store {
                    operation,
                    tenant_id,
                    source,
                } => tracing::error!(
                    operation,
                    tenant_id = tenant_id.map(|id| id.to_string()),
                    error = %source,
                    sentry_event_id = %event_id,
                    "Store operation failed"
                ),
                _ => tracing::error!(
                    error = %self,
                    sentry_event_id = %event_id,
                    "Console request error"
                ),
            }
        }

        // Don't expose internal error details to clients
        let message = if status.is_server_error() {
            "Internal server error".to_owned()
        } else {
            self.to_string()
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(e: tower_sessions::session::Error) -> Self {
        Self::Unexpected(format!("session error: {e}"))
    }
}

/// Attach operation and tenant context to a store result.
pub trait StoreContext<T> {
    /// # Errors
    ///
    /// Wraps any repository error in [`AppError::Store`].
    fn store_context(
        self,
        operation: &'static str,
        tenant_id: Option<TenantId>,
    ) -> Result<T, AppError>;
}

impl<T> StoreContext<T> for Result<T, RepositoryError> {
    fn store_context(
        self,
        operation: &'static str,
        tenant_id: Option<TenantId>,
    ) -> Result<T, AppError> {
        self.map_err(|source| AppError::Store {
            operation,
            tenant_id,
            source,
        })
    }
}

/// Set the Sentry user context from the resolved staff user.
pub fn set_sentry_user(staff_user_id: StaffUserId, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(staff_user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::unauthorized().status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::ProfileNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::OnboardingRequired.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::owner_or_manager_required().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Validation("x".to_owned()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Conflict("x".to_owned()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("x".to_owned()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Unexpected("x".to_owned()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_client_error_body() {
        let (status, body) = body_of(AppError::NotFound("User not found".to_owned())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "User not found" }));
    }

    #[tokio::test]
    async fn test_store_error_hides_details() {
        let err: Result<(), _> = Err(RepositoryError::DataCorruption("bad row".to_owned()));
        let err = err.store_context("list_codes", None).unwrap_err();
        assert!(err.to_string().contains("list_codes"));

        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Internal server error" }));
    }
}
