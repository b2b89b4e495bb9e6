//! Account authentication service.
//!
//! Email/password accounts with Argon2id hashes. A successful login yields the
//! account whose id becomes the session subject.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde_json::json;
use tracing::instrument;

use comanda_core::Email;

use crate::db::{AccountStore, RepositoryError};
use crate::models::{AuthAccount, NewAccount};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
pub struct AuthService<'a, S> {
    store: &'a S,
}

impl<'a, S: AccountStore> AuthService<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Register a restaurant owner. The staff profile is created on first
    /// `/api/me`, and the tenant at onboarding.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingField`, `InvalidEmail` or `WeakPassword` for
    /// bad input, and `AuthError::AccountAlreadyExists` if the email is taken.
    #[instrument(skip(self, password))]
    pub async fn register_owner(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthAccount, AuthError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::MissingField("name"));
        }
        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let account = self
            .store
            .create_account(NewAccount {
                email,
                password_hash,
                display_name: name.to_owned(),
                phone: None,
                metadata: json!({ "name": name }),
                confirmed: false,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::AccountAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(subject = %account.id, "Account registered");
        Ok(account)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthAccount, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let account = self
            .store
            .find_account_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &account.password_hash)?;

        Ok(account)
    }
}

/// Validate password meets requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` below [`MIN_PASSWORD_LENGTH`] characters.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_short_password_rejected() {
        assert!(matches!(
            validate_password("1234567"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("12345678").is_ok());
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);

        let account = auth
            .register_owner("Ana", "Ana@Example.com", "s3cure-pass")
            .await
            .unwrap();
        assert!(account.confirmed_at.is_none());

        let logged_in = auth.login("ana@example.com", "s3cure-pass").await.unwrap();
        assert_eq!(logged_in.id, account.id);

        assert!(matches!(
            auth.login("ana@example.com", "nope-nope").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("nobody@example.com", "s3cure-pass").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let store = MemoryStore::new();
        let auth = AuthService::new(&store);
        auth.register_owner("Ana", "ana@example.com", "s3cure-pass")
            .await
            .unwrap();
        assert!(matches!(
            auth.register_owner("Ana B", "ANA@example.com", "s3cure-pass")
                .await,
            Err(AuthError::AccountAlreadyExists)
        ));
    }
}
