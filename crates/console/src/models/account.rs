//! Identity-provider accounts.
//!
//! An account is what a session authenticates as; its id is the session
//! subject. The application-side profile is a [`StaffUser`](super::StaffUser)
//! linked through `auth_subject`.

use chrono::{DateTime, Utc};

use comanda_core::{Email, SubjectId};

/// An account row (domain type).
///
/// `Debug` is implemented manually so password hashes never reach logs.
#[derive(Clone)]
pub struct AuthAccount {
    pub id: SubjectId,
    pub email: Email,
    pub password_hash: String,
    pub display_name: String,
    pub phone: Option<String>,
    /// Free-form profile data written at signup (role, tenant id, ...).
    pub metadata: serde_json::Value,
    /// Set when the address is confirmed. Invite-code signups start confirmed.
    pub confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for AuthAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthAccount")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("display_name", &self.display_name)
            .field("phone", &self.phone)
            .field("metadata", &self.metadata)
            .field("confirmed_at", &self.confirmed_at)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Data needed to create an account.
#[derive(Clone)]
pub struct NewAccount {
    pub email: Email,
    pub password_hash: String,
    pub display_name: String,
    pub phone: Option<String>,
    pub metadata: serde_json::Value,
    pub confirmed: bool,
}

impl std::fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewAccount")
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("display_name", &self.display_name)
            .field("confirmed", &self.confirmed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_password_hash() {
        let account = NewAccount {
            email: Email::parse("ana@example.com").unwrap(),
            password_hash: "$argon2id$v=19$secret".to_owned(),
            display_name: "Ana".to_owned(),
            phone: None,
            metadata: serde_json::json!({}),
            confirmed: true,
        };
        let debug = format!("{account:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("argon2id"));
    }
}
