//! Business logic for the console API.
//!
//! Route handlers stay thin: they extract the caller and the request body and
//! call into these modules. Services own validation, role checks and the
//! same-tenant rule, and are generic over the store traits so they run against
//! `PostgreSQL` in production and [`MemoryStore`](crate::db::MemoryStore) in
//! tests.

pub mod auth;
pub mod branch_context;
pub mod codes;
pub mod customers;
pub mod identity;
pub mod onboarding;
pub mod signup;
pub mod users;

use comanda_core::{SubjectId, TenantId};

use crate::db::StaffStore;
use crate::error::{AppError, StoreContext};
use crate::models::StaffUser;

/// A signed-in staff user that belongs to a tenant.
///
/// Every tenant-scoped operation takes one of these, so a user still in
/// onboarding can never reach tenant data.
#[derive(Debug, Clone)]
pub struct Caller {
    pub user: StaffUser,
    pub tenant_id: TenantId,
}

impl Caller {
    /// # Errors
    ///
    /// Returns `AppError::OnboardingRequired` if the user has no tenant yet.
    pub fn new(user: StaffUser) -> Result<Self, AppError> {
        let tenant_id = user.tenant_id.ok_or(AppError::OnboardingRequired)?;
        Ok(Self { user, tenant_id })
    }

    /// # Errors
    ///
    /// Returns `AppError::PermissionDenied` unless the caller is an owner or
    /// manager.
    pub fn require_manager(&self) -> Result<(), AppError> {
        if self.user.role.can_manage() {
            Ok(())
        } else {
            Err(AppError::owner_or_manager_required())
        }
    }
}

/// Look up the staff profile behind a session subject and require a tenant.
///
/// # Errors
///
/// `ProfileNotFound` when the subject has no staff user, `OnboardingRequired`
/// when the user has no tenant.
pub async fn resolve_caller<S: StaffStore>(
    store: &S,
    subject: SubjectId,
) -> Result<Caller, AppError> {
    let user = store
        .find_staff_by_subject(subject)
        .await
        .store_context("find_staff_by_subject", None)?
        .ok_or(AppError::ProfileNotFound)?;
    Caller::new(user)
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use comanda_core::StaffRole;

    use super::testing::{staff, tenant};
    use super::*;
    use crate::db::MemoryStore;

    #[tokio::test]
    async fn test_resolve_caller_requires_profile() {
        let store = MemoryStore::new();
        let err = resolve_caller(&store, SubjectId::generate())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ProfileNotFound));
    }

    #[tokio::test]
    async fn test_resolve_caller_requires_tenant() {
        let store = MemoryStore::new();
        let user = staff(&store, None, StaffRole::Owner);
        let err = resolve_caller(&store, user.auth_subject.unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::OnboardingRequired));
    }

    #[tokio::test]
    async fn test_require_manager() {
        let store = MemoryStore::new();
        let t = tenant(&store, "Pho 88");
        for role in StaffRole::ALL {
            let user = staff(&store, Some(t.id), role);
            let caller = resolve_caller(&store, user.auth_subject.unwrap())
                .await
                .unwrap();
            assert_eq!(caller.tenant_id, t.id);
            assert_eq!(caller.require_manager().is_ok(), role.can_manage());
        }
    }
}
