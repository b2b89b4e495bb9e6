//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;
use crate::error::AppError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] comanda_core::EmailError),

    /// Invalid credentials (wrong password or account not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Account already exists.
    #[error("account already exists")]
    AccountAlreadyExists,

    /// Password too weak or invalid.
    #[error("{0}")]
    WeakPassword(String),

    /// A required field was blank.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidEmail(_) => Self::Validation("Invalid email address".to_owned()),
            AuthError::InvalidCredentials => {
                Self::Unauthorized("Invalid email or password".to_owned())
            }
            AuthError::AccountAlreadyExists => {
                Self::Conflict("An account with this email already exists".to_owned())
            }
            AuthError::WeakPassword(msg) => Self::Validation(msg),
            AuthError::MissingField(_) => Self::Validation(e.to_string()),
            AuthError::Repository(source) => Self::Store {
                operation: "auth",
                tenant_id: None,
                source,
            },
            AuthError::PasswordHash => Self::Unexpected(e.to_string()),
        }
    }
}
