//! Institution (invite) codes.
//!
//! A code lets a new staff member join a tenant without the owner creating
//! the account. Codes are stored normalized (see [`comanda_core::normalize_code`]).

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use comanda_core::{InstitutionCodeId, StaffUserId, TenantId};

/// An institution code row (domain type).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionCode {
    pub id: InstitutionCodeId,
    pub tenant_id: TenantId,
    pub code: String,
    pub name: Option<String>,
    /// `None` means unlimited.
    pub max_uses: Option<i32>,
    pub uses_count: i32,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_by: Option<StaffUserId>,
    pub created_at: DateTime<Utc>,
}

/// Why a code cannot be used to sign up. The messages are shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CodeRejection {
    #[error("Invalid institution code.")]
    Unknown,
    #[error("This institution code is no longer active")]
    Inactive,
    #[error("This institution code has expired")]
    Expired,
    #[error("This institution code has reached its usage limit")]
    Exhausted,
}

impl InstitutionCode {
    /// Check that the code may admit one more signup at `now`.
    ///
    /// # Errors
    ///
    /// Returns the first failing condition: inactive, expired, then exhausted.
    pub fn check_usable(&self, now: DateTime<Utc>) -> Result<(), CodeRejection> {
        if !self.is_active {
            return Err(CodeRejection::Inactive);
        }
        if self.expires_at.is_some_and(|at| at <= now) {
            return Err(CodeRejection::Expired);
        }
        if self.max_uses.is_some_and(|max| self.uses_count >= max) {
            return Err(CodeRejection::Exhausted);
        }
        Ok(())
    }
}

/// Data needed to create a code. `code` must already be normalized.
#[derive(Debug, Clone)]
pub struct NewInstitutionCode {
    pub code: String,
    pub name: Option<String>,
    pub max_uses: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_by: Option<StaffUserId>,
}
