//! Store traits.
//!
//! Every tenant-scoped read takes the tenant id explicitly. Lookups by primary
//! key do not, so callers can tell a foreign row from a missing one and still
//! report both the same way.

use chrono::{DateTime, Utc};
use serde_json::json;
use thiserror::Error;

use comanda_core::{
    BranchId, Email, InstitutionCodeId, StaffRole, StaffUserId, SubjectId, TenantId,
};

use super::RepositoryError;
use crate::models::{
    AuthAccount, Branch, CodeRejection, CustomerAggregate, CustomerTagAssignment,
    InstitutionCode, NewAccount, NewBranch, NewInstitutionCode, NewStaffUser, NewTenant,
    OrderSummary, StaffListing, StaffPatch, StaffUser, Tenant,
};

// ---------------------------------------------------------------------------
// Composite write inputs and outputs
// ---------------------------------------------------------------------------

/// Everything onboarding writes, applied in one transaction.
#[derive(Debug, Clone)]
pub struct OnboardingRecord {
    pub tenant: NewTenant,
    pub branch: NewBranch,
}

/// Result of a completed onboarding.
#[derive(Debug, Clone)]
pub struct OnboardedTenant {
    pub tenant: Tenant,
    pub branch: Branch,
    pub user: StaffUser,
}

/// A staff signup through an institution code.
///
/// `code` is already normalized and `password_hash` already computed.
#[derive(Clone)]
pub struct StaffRegistration {
    pub code: String,
    pub email: Email,
    pub password_hash: String,
    pub name: String,
    pub phone: Option<String>,
}

impl std::fmt::Debug for StaffRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaffRegistration")
            .field("code", &self.code)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("name", &self.name)
            .field("phone", &self.phone)
            .finish()
    }
}

impl StaffRegistration {
    /// Role given to every staff member that joins with a code.
    pub const ROLE: StaffRole = StaffRole::Cashier;

    /// The pre-confirmed account to create once the code's tenant is known.
    #[must_use]
    pub fn account(&self, tenant_id: TenantId) -> NewAccount {
        NewAccount {
            email: self.email.clone(),
            password_hash: self.password_hash.clone(),
            display_name: self.name.clone(),
            phone: self.phone.clone(),
            metadata: json!({
                "role": Self::ROLE,
                "tenant_id": tenant_id,
                "name": self.name,
                "phone": self.phone,
            }),
            confirmed: true,
        }
    }

    /// The staff profile linked to the new account.
    #[must_use]
    pub fn staff_user(&self, subject: SubjectId, tenant_id: TenantId) -> NewStaffUser {
        NewStaffUser {
            auth_subject: Some(subject),
            tenant_id: Some(tenant_id),
            branch_id: None,
            role: Self::ROLE,
            name: self.name.clone(),
            email: Some(self.email.as_str().to_owned()),
            phone: self.phone.clone(),
        }
    }
}

/// Result of a successful staff signup.
#[derive(Debug, Clone)]
pub struct RegisteredStaff {
    pub account: AuthAccount,
    pub user: StaffUser,
    pub tenant: Tenant,
}

/// Why a staff signup was not applied. Nothing is written in any case.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error(transparent)]
    Code(#[from] CodeRejection),

    #[error("email already registered")]
    EmailTaken,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<sqlx::Error> for RegistrationError {
    fn from(e: sqlx::Error) -> Self {
        Self::Repository(RepositoryError::Database(e))
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

pub trait AccountStore: Send + Sync {
    /// # Errors
    /// `Conflict` if the email is already registered.
    fn create_account(
        &self,
        account: NewAccount,
    ) -> impl Future<Output = Result<AuthAccount, RepositoryError>> + Send;

    /// Case-insensitive lookup.
    fn find_account_by_email(
        &self,
        email: &Email,
    ) -> impl Future<Output = Result<Option<AuthAccount>, RepositoryError>> + Send;

    fn find_account(
        &self,
        id: SubjectId,
    ) -> impl Future<Output = Result<Option<AuthAccount>, RepositoryError>> + Send;
}

pub trait StaffStore: Send + Sync {
    fn find_staff_by_subject(
        &self,
        subject: SubjectId,
    ) -> impl Future<Output = Result<Option<StaffUser>, RepositoryError>> + Send;

    fn find_staff(
        &self,
        id: StaffUserId,
    ) -> impl Future<Output = Result<Option<StaffUser>, RepositoryError>> + Send;

    /// # Errors
    /// `Conflict` if a staff user already exists for the subject.
    fn create_staff(
        &self,
        user: NewStaffUser,
    ) -> impl Future<Output = Result<StaffUser, RepositoryError>> + Send;

    /// Staff of a tenant, newest first.
    fn list_staff(
        &self,
        tenant_id: TenantId,
    ) -> impl Future<Output = Result<Vec<StaffListing>, RepositoryError>> + Send;

    /// # Errors
    /// `NotFound` if no such user exists in the tenant.
    fn update_staff(
        &self,
        id: StaffUserId,
        tenant_id: TenantId,
        patch: &StaffPatch,
    ) -> impl Future<Output = Result<StaffUser, RepositoryError>> + Send;

    /// Create the tenant and its main branch and promote the subject's staff
    /// user to owner of it, atomically.
    ///
    /// # Errors
    /// `NotFound` if the subject has no staff user, `Conflict` if that user
    /// already belongs to a tenant or the slug is taken.
    fn complete_onboarding(
        &self,
        subject: SubjectId,
        record: OnboardingRecord,
    ) -> impl Future<Output = Result<OnboardedTenant, RepositoryError>> + Send;

    /// Re-check the code under lock, then create the account and staff user
    /// and count the use, atomically.
    fn register_staff(
        &self,
        registration: StaffRegistration,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<RegisteredStaff, RegistrationError>> + Send;
}

pub trait TenantStore: Send + Sync {
    fn find_tenant(
        &self,
        id: TenantId,
    ) -> impl Future<Output = Result<Option<Tenant>, RepositoryError>> + Send;
}

pub trait BranchStore: Send + Sync {
    /// Branches of a tenant, ordered by name.
    fn list_branches(
        &self,
        tenant_id: TenantId,
    ) -> impl Future<Output = Result<Vec<Branch>, RepositoryError>> + Send;

    fn find_branch(
        &self,
        id: BranchId,
    ) -> impl Future<Output = Result<Option<Branch>, RepositoryError>> + Send;
}

pub trait CodeStore: Send + Sync {
    /// Codes of a tenant, newest first.
    fn list_codes(
        &self,
        tenant_id: TenantId,
    ) -> impl Future<Output = Result<Vec<InstitutionCode>, RepositoryError>> + Send;

    fn find_code(
        &self,
        id: InstitutionCodeId,
    ) -> impl Future<Output = Result<Option<InstitutionCode>, RepositoryError>> + Send;

    /// Lookup by normalized code value.
    fn find_code_by_value(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<Option<InstitutionCode>, RepositoryError>> + Send;

    /// New codes start active with zero uses.
    ///
    /// # Errors
    /// `Conflict` if the code value exists (in any tenant).
    fn create_code(
        &self,
        tenant_id: TenantId,
        code: NewInstitutionCode,
    ) -> impl Future<Output = Result<InstitutionCode, RepositoryError>> + Send;

    /// # Errors
    /// `NotFound` if no such code exists in the tenant.
    fn set_code_active(
        &self,
        id: InstitutionCodeId,
        tenant_id: TenantId,
        is_active: bool,
    ) -> impl Future<Output = Result<InstitutionCode, RepositoryError>> + Send;

    /// Hard delete. Returns false when nothing matched.
    fn delete_code(
        &self,
        id: InstitutionCodeId,
        tenant_id: TenantId,
    ) -> impl Future<Output = Result<bool, RepositoryError>> + Send;
}

pub trait CustomerStore: Send + Sync {
    fn customer_aggregates(
        &self,
        tenant_id: TenantId,
    ) -> impl Future<Output = Result<Vec<CustomerAggregate>, RepositoryError>> + Send;

    fn customer_tags(
        &self,
        tenant_id: TenantId,
    ) -> impl Future<Output = Result<Vec<CustomerTagAssignment>, RepositoryError>> + Send;

    /// The tenant's most recent orders, newest first.
    fn recent_orders(
        &self,
        tenant_id: TenantId,
        limit: i64,
    ) -> impl Future<Output = Result<Vec<OrderSummary>, RepositoryError>> + Send;
}

/// Everything the HTTP layer needs from a store.
pub trait ConsoleStore:
    AccountStore
    + StaffStore
    + TenantStore
    + BranchStore
    + CodeStore
    + CustomerStore
    + Clone
    + 'static
{
    /// Cheap connectivity check for readiness probes.
    fn ping(&self) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_account_metadata() {
        let registration = StaffRegistration {
            code: "PLAT-2024".to_owned(),
            email: Email::parse("Luis@Example.com").unwrap(),
            password_hash: "hash".to_owned(),
            name: "Luis".to_owned(),
            phone: Some("555-0101".to_owned()),
        };
        let tenant = TenantId::generate();
        let account = registration.account(tenant);

        assert!(account.confirmed);
        assert_eq!(account.email.as_str(), "luis@example.com");
        assert_eq!(account.metadata["role"], "cashier");
        assert_eq!(account.metadata["tenant_id"], tenant.to_string());
        assert_eq!(account.metadata["phone"], "555-0101");
    }

    #[test]
    fn test_registration_debug_redacts_hash() {
        let registration = StaffRegistration {
            code: "X".to_owned(),
            email: Email::parse("a@b.co").unwrap(),
            password_hash: "argon-secret".to_owned(),
            name: "A".to_owned(),
            phone: None,
        };
        assert!(!format!("{registration:?}").contains("argon-secret"));
    }
}
