//! Staff users: the application-side profile of an account.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use comanda_core::{BranchId, StaffRole, StaffUserId, SubjectId, TenantId};

/// A staff user (domain type).
///
/// A null `tenant_id` means the user is still onboarding and must not see any
/// tenant-scoped data.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffUser {
    pub id: StaffUserId,
    /// Identity-provider subject. Unique; null for staff that never signed in.
    pub auth_subject: Option<SubjectId>,
    pub tenant_id: Option<TenantId>,
    pub branch_id: Option<BranchId>,
    pub role: StaffRole,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StaffUser {
    #[must_use]
    pub const fn needs_onboarding(&self) -> bool {
        self.tenant_id.is_none()
    }
}

/// Data needed to create a staff user.
#[derive(Debug, Clone)]
pub struct NewStaffUser {
    pub auth_subject: Option<SubjectId>,
    pub tenant_id: Option<TenantId>,
    pub branch_id: Option<BranchId>,
    pub role: StaffRole,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Whether a staff user has ever signed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffStatus {
    Active,
    Pending,
}

/// A row of the staff list, with the branch name flattened in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffListing {
    pub id: StaffUserId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub role: StaffRole,
    pub branch_id: Option<BranchId>,
    pub branch_name: Option<String>,
    pub status: StaffStatus,
    pub created_at: DateTime<Utc>,
}

impl StaffListing {
    #[must_use]
    pub fn new(user: StaffUser, branch_name: Option<String>) -> Self {
        let status = if user.auth_subject.is_some() {
            StaffStatus::Active
        } else {
            StaffStatus::Pending
        };
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            role: user.role,
            branch_id: user.branch_id,
            branch_name,
            status,
            created_at: user.created_at,
        }
    }
}

/// Partial update of a staff user. `None` leaves a field untouched;
/// `branch_id: Some(None)` clears the branch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaffPatch {
    pub role: Option<StaffRole>,
    pub branch_id: Option<Option<BranchId>>,
}

impl StaffPatch {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.role.is_none() && self.branch_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(subject: Option<SubjectId>) -> StaffUser {
        StaffUser {
            id: StaffUserId::generate(),
            auth_subject: subject,
            tenant_id: None,
            branch_id: None,
            role: StaffRole::Cashier,
            name: "Luis".to_owned(),
            email: None,
            phone: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_listing_status() {
        let active = StaffListing::new(user(Some(SubjectId::generate())), None);
        assert_eq!(active.status, StaffStatus::Active);
        let pending = StaffListing::new(user(None), Some("Centro".to_owned()));
        assert_eq!(pending.status, StaffStatus::Pending);
        assert_eq!(pending.branch_name.as_deref(), Some("Centro"));
    }

    #[test]
    fn test_needs_onboarding() {
        let mut u = user(None);
        assert!(u.needs_onboarding());
        u.tenant_id = Some(TenantId::generate());
        assert!(!u.needs_onboarding());
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(StaffPatch::default().is_empty());
        let clear_branch = StaffPatch {
            role: None,
            branch_id: Some(None),
        };
        assert!(!clear_branch.is_empty());
    }
}
