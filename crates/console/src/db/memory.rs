//! In-process store.
//!
//! Implements every store trait over plain vectors behind one mutex. Multi-step
//! writes validate and stage everything before touching the tables, so a
//! failure leaves no partial state (the same guarantee the `PostgreSQL`
//! transactions give).
//!
//! Failures can be injected per operation with [`MemoryStore::fail_operation`].
//! Operation names are the trait method names, plus these steps inside the
//! composite writes:
//!
//! - `complete_onboarding`: `insert_tenant`, `insert_branch`, `promote_owner`
//! - `register_staff`: `insert_account`, `insert_staff`, `count_code_use`

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use comanda_core::{
    BranchId, CustomerId, Email, InstitutionCodeId, StaffRole, StaffUserId, SubjectId, TagId,
    TenantId,
};

use super::RepositoryError;
use super::store::{
    AccountStore, BranchStore, CodeStore, ConsoleStore, CustomerStore, OnboardedTenant,
    OnboardingRecord, RegisteredStaff, RegistrationError, StaffRegistration, StaffStore,
    TenantStore,
};
use crate::models::{
    AuthAccount, Branch, CodeRejection, CustomerAggregate, CustomerTagAssignment,
    InstitutionCode, NewAccount, NewInstitutionCode, NewStaffUser, OrderSummary, StaffListing,
    StaffPatch, StaffUser, Tenant,
};

/// A customer as stored; statistics are computed from orders on read.
#[derive(Debug, Clone)]
pub struct MemoryCustomer {
    pub id: CustomerId,
    pub tenant_id: TenantId,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub birth_month: Option<u32>,
    /// Segment reported for this customer (the database derives it in a view).
    pub segment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct MemoryTag {
    pub id: TagId,
    pub tenant_id: TenantId,
    pub name: String,
    pub color: Option<String>,
}

#[derive(Debug, Default)]
struct Tables {
    accounts: Vec<AuthAccount>,
    tenants: Vec<Tenant>,
    branches: Vec<Branch>,
    staff: Vec<StaffUser>,
    codes: Vec<InstitutionCode>,
    customers: Vec<MemoryCustomer>,
    orders: Vec<(TenantId, OrderSummary)>,
    tags: Vec<MemoryTag>,
    tag_assignments: Vec<(CustomerId, TagId)>,
    failing: HashSet<String>,
}

impl Tables {
    fn check(&self, operation: &str) -> Result<(), RepositoryError> {
        if self.failing.contains(operation) {
            return Err(RepositoryError::Database(sqlx::Error::Protocol(format!(
                "injected failure: {operation}"
            ))));
        }
        Ok(())
    }

    fn new_account(account: NewAccount, now: DateTime<Utc>) -> AuthAccount {
        AuthAccount {
            id: SubjectId::generate(),
            email: account.email,
            password_hash: account.password_hash,
            display_name: account.display_name,
            phone: account.phone,
            metadata: account.metadata,
            confirmed_at: account.confirmed.then_some(now),
            created_at: now,
        }
    }

    fn new_staff(user: NewStaffUser, now: DateTime<Utc>) -> StaffUser {
        StaffUser {
            id: StaffUserId::generate(),
            auth_subject: user.auth_subject,
            tenant_id: user.tenant_id,
            branch_id: user.branch_id,
            role: user.role,
            name: user.name,
            email: user.email,
            phone: user.phone,
            created_at: now,
            updated_at: now,
        }
    }

    fn email_taken(&self, email: &Email) -> bool {
        self.accounts.iter().any(|a| a.email == *email)
    }
}

/// Process-local store. Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every later call of `operation` fail with a database error.
    pub fn fail_operation(&self, operation: &str) {
        self.tables().failing.insert(operation.to_owned());
    }

    pub fn clear_failures(&self) {
        self.tables().failing.clear();
    }

    // -- fixtures -----------------------------------------------------------

    pub fn insert_account(&self, account: AuthAccount) {
        self.tables().accounts.push(account);
    }

    pub fn insert_tenant(&self, tenant: Tenant) {
        self.tables().tenants.push(tenant);
    }

    pub fn insert_branch(&self, branch: Branch) {
        self.tables().branches.push(branch);
    }

    pub fn insert_staff(&self, user: StaffUser) {
        self.tables().staff.push(user);
    }

    pub fn insert_code(&self, code: InstitutionCode) {
        self.tables().codes.push(code);
    }

    pub fn insert_customer(&self, customer: MemoryCustomer) {
        self.tables().customers.push(customer);
    }

    pub fn insert_order(&self, tenant_id: TenantId, order: OrderSummary) {
        self.tables().orders.push((tenant_id, order));
    }

    pub fn insert_tag(&self, tag: MemoryTag) {
        self.tables().tags.push(tag);
    }

    pub fn tag_customer(&self, customer_id: CustomerId, tag_id: TagId) {
        self.tables().tag_assignments.push((customer_id, tag_id));
    }

    // -- snapshots ----------------------------------------------------------

    #[must_use]
    pub fn accounts(&self) -> Vec<AuthAccount> {
        self.tables().accounts.clone()
    }

    #[must_use]
    pub fn tenants(&self) -> Vec<Tenant> {
        self.tables().tenants.clone()
    }

    #[must_use]
    pub fn branches(&self) -> Vec<Branch> {
        self.tables().branches.clone()
    }

    #[must_use]
    pub fn staff(&self) -> Vec<StaffUser> {
        self.tables().staff.clone()
    }

    #[must_use]
    pub fn codes(&self) -> Vec<InstitutionCode> {
        self.tables().codes.clone()
    }
}

impl AccountStore for MemoryStore {
    async fn create_account(&self, account: NewAccount) -> Result<AuthAccount, RepositoryError> {
        let mut t = self.tables();
        t.check("create_account")?;
        if t.email_taken(&account.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        let account = Tables::new_account(account, Utc::now());
        t.accounts.push(account.clone());
        Ok(account)
    }

    async fn find_account_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<AuthAccount>, RepositoryError> {
        let t = self.tables();
        t.check("find_account_by_email")?;
        Ok(t.accounts.iter().find(|a| a.email == *email).cloned())
    }

    async fn find_account(&self, id: SubjectId) -> Result<Option<AuthAccount>, RepositoryError> {
        let t = self.tables();
        t.check("find_account")?;
        Ok(t.accounts.iter().find(|a| a.id == id).cloned())
    }
}

impl StaffStore for MemoryStore {
    async fn find_staff_by_subject(
        &self,
        subject: SubjectId,
    ) -> Result<Option<StaffUser>, RepositoryError> {
        let t = self.tables();
        t.check("find_staff_by_subject")?;
        Ok(t
            .staff
            .iter()
            .find(|u| u.auth_subject == Some(subject))
            .cloned())
    }

    async fn find_staff(&self, id: StaffUserId) -> Result<Option<StaffUser>, RepositoryError> {
        let t = self.tables();
        t.check("find_staff")?;
        Ok(t.staff.iter().find(|u| u.id == id).cloned())
    }

    async fn create_staff(&self, user: NewStaffUser) -> Result<StaffUser, RepositoryError> {
        let mut t = self.tables();
        t.check("create_staff")?;
        if user.auth_subject.is_some()
            && t.staff.iter().any(|u| u.auth_subject == user.auth_subject)
        {
            return Err(RepositoryError::Conflict(
                "staff user already exists".to_owned(),
            ));
        }
        let user = Tables::new_staff(user, Utc::now());
        t.staff.push(user.clone());
        Ok(user)
    }

    async fn list_staff(&self, tenant_id: TenantId) -> Result<Vec<StaffListing>, RepositoryError> {
        let t = self.tables();
        t.check("list_staff")?;
        let mut users: Vec<&StaffUser> = t
            .staff
            .iter()
            .filter(|u| u.tenant_id == Some(tenant_id))
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(users
            .into_iter()
            .map(|u| {
                let branch_name = u.branch_id.and_then(|id| {
                    t.branches
                        .iter()
                        .find(|b| b.id == id)
                        .map(|b| b.name.clone())
                });
                StaffListing::new(u.clone(), branch_name)
            })
            .collect())
    }

    async fn update_staff(
        &self,
        id: StaffUserId,
        tenant_id: TenantId,
        patch: &StaffPatch,
    ) -> Result<StaffUser, RepositoryError> {
        let mut t = self.tables();
        t.check("update_staff")?;
        let user = t
            .staff
            .iter_mut()
            .find(|u| u.id == id && u.tenant_id == Some(tenant_id))
            .ok_or(RepositoryError::NotFound)?;
        if let Some(role) = patch.role {
            user.role = role;
        }
        if let Some(branch_id) = patch.branch_id {
            user.branch_id = branch_id;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn complete_onboarding(
        &self,
        subject: SubjectId,
        record: OnboardingRecord,
    ) -> Result<OnboardedTenant, RepositoryError> {
        let mut t = self.tables();
        t.check("complete_onboarding")?;
        let now = Utc::now();

        let mut user = t
            .staff
            .iter()
            .find(|u| u.auth_subject == Some(subject))
            .cloned()
            .ok_or(RepositoryError::NotFound)?;
        if !user.needs_onboarding() {
            return Err(RepositoryError::Conflict(
                "onboarding already completed".to_owned(),
            ));
        }

        t.check("insert_tenant")?;
        if t.tenants.iter().any(|x| x.slug == record.tenant.slug) {
            return Err(RepositoryError::Conflict(
                "institution slug already exists".to_owned(),
            ));
        }
        let tenant = Tenant {
            id: TenantId::generate(),
            name: record.tenant.name,
            slug: record.tenant.slug,
            email: record.tenant.email,
            phone: record.tenant.phone,
            address: record.tenant.address,
            city: record.tenant.city,
            created_at: now,
        };

        t.check("insert_branch")?;
        let branch = Branch {
            id: BranchId::generate(),
            tenant_id: tenant.id,
            name: record.branch.name,
            address: record.branch.address,
            city: record.branch.city,
            phone: record.branch.phone,
            is_active: true,
            is_main: record.branch.is_main,
            created_at: now,
        };

        t.check("promote_owner")?;
        user.tenant_id = Some(tenant.id);
        user.branch_id = Some(branch.id);
        user.role = StaffRole::Owner;
        user.updated_at = now;

        t.tenants.push(tenant.clone());
        t.branches.push(branch.clone());
        if let Some(slot) = t.staff.iter_mut().find(|u| u.id == user.id) {
            *slot = user.clone();
        }

        Ok(OnboardedTenant {
            tenant,
            branch,
            user,
        })
    }

    async fn register_staff(
        &self,
        registration: StaffRegistration,
        now: DateTime<Utc>,
    ) -> Result<RegisteredStaff, RegistrationError> {
        let mut t = self.tables();
        t.check("register_staff")?;

        let code = t
            .codes
            .iter()
            .find(|c| c.code == registration.code)
            .cloned()
            .ok_or(CodeRejection::Unknown)?;
        code.check_usable(now)?;

        let tenant = t
            .tenants
            .iter()
            .find(|x| x.id == code.tenant_id)
            .cloned()
            .ok_or_else(|| {
                RepositoryError::DataCorruption(format!("code {} has no tenant", code.id))
            })?;

        t.check("insert_account")?;
        if t.email_taken(&registration.email) {
            return Err(RegistrationError::EmailTaken);
        }
        let account = Tables::new_account(registration.account(tenant.id), now);

        t.check("insert_staff")?;
        let user = Tables::new_staff(registration.staff_user(account.id, tenant.id), now);

        t.check("count_code_use")?;
        t.accounts.push(account.clone());
        t.staff.push(user.clone());
        if let Some(stored) = t.codes.iter_mut().find(|c| c.id == code.id) {
            stored.uses_count += 1;
        }

        Ok(RegisteredStaff {
            account,
            user,
            tenant,
        })
    }
}

impl TenantStore for MemoryStore {
    async fn find_tenant(&self, id: TenantId) -> Result<Option<Tenant>, RepositoryError> {
        let t = self.tables();
        t.check("find_tenant")?;
        Ok(t.tenants.iter().find(|x| x.id == id).cloned())
    }
}

impl BranchStore for MemoryStore {
    async fn list_branches(&self, tenant_id: TenantId) -> Result<Vec<Branch>, RepositoryError> {
        let t = self.tables();
        t.check("list_branches")?;
        let mut branches: Vec<Branch> = t
            .branches
            .iter()
            .filter(|b| b.tenant_id == tenant_id)
            .cloned()
            .collect();
        branches.sort_by(|a, b| a.name.cmp(&b.name).then(a.created_at.cmp(&b.created_at)));
        Ok(branches)
    }

    async fn find_branch(&self, id: BranchId) -> Result<Option<Branch>, RepositoryError> {
        let t = self.tables();
        t.check("find_branch")?;
        Ok(t.branches.iter().find(|b| b.id == id).cloned())
    }
}

impl CodeStore for MemoryStore {
    async fn list_codes(&self, tenant_id: TenantId) -> Result<Vec<InstitutionCode>, RepositoryError> {
        let t = self.tables();
        t.check("list_codes")?;
        let mut codes: Vec<InstitutionCode> = t
            .codes
            .iter()
            .filter(|c| c.tenant_id == tenant_id)
            .cloned()
            .collect();
        codes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(codes)
    }

    async fn find_code(
        &self,
        id: InstitutionCodeId,
    ) -> Result<Option<InstitutionCode>, RepositoryError> {
        let t = self.tables();
        t.check("find_code")?;
        Ok(t.codes.iter().find(|c| c.id == id).cloned())
    }

    async fn find_code_by_value(
        &self,
        code: &str,
    ) -> Result<Option<InstitutionCode>, RepositoryError> {
        let t = self.tables();
        t.check("find_code_by_value")?;
        Ok(t.codes.iter().find(|c| c.code == code).cloned())
    }

    async fn create_code(
        &self,
        tenant_id: TenantId,
        code: NewInstitutionCode,
    ) -> Result<InstitutionCode, RepositoryError> {
        let mut t = self.tables();
        t.check("create_code")?;
        if t.codes.iter().any(|c| c.code == code.code) {
            return Err(RepositoryError::Conflict(
                "institution code already exists".to_owned(),
            ));
        }
        let code = InstitutionCode {
            id: InstitutionCodeId::generate(),
            tenant_id,
            code: code.code,
            name: code.name,
            max_uses: code.max_uses,
            uses_count: 0,
            expires_at: code.expires_at,
            is_active: true,
            created_by: code.created_by,
            created_at: Utc::now(),
        };
        t.codes.push(code.clone());
        Ok(code)
    }

    async fn set_code_active(
        &self,
        id: InstitutionCodeId,
        tenant_id: TenantId,
        is_active: bool,
    ) -> Result<InstitutionCode, RepositoryError> {
        let mut t = self.tables();
        t.check("set_code_active")?;
        let code = t
            .codes
            .iter_mut()
            .find(|c| c.id == id && c.tenant_id == tenant_id)
            .ok_or(RepositoryError::NotFound)?;
        code.is_active = is_active;
        Ok(code.clone())
    }

    async fn delete_code(
        &self,
        id: InstitutionCodeId,
        tenant_id: TenantId,
    ) -> Result<bool, RepositoryError> {
        let mut t = self.tables();
        t.check("delete_code")?;
        let before = t.codes.len();
        t.codes.retain(|c| !(c.id == id && c.tenant_id == tenant_id));
        Ok(t.codes.len() < before)
    }
}

impl CustomerStore for MemoryStore {
    async fn customer_aggregates(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<CustomerAggregate>, RepositoryError> {
        let t = self.tables();
        t.check("customer_aggregates")?;

        let mut aggregates: Vec<CustomerAggregate> = t
            .customers
            .iter()
            .filter(|c| c.tenant_id == tenant_id)
            .map(|c| {
                let orders: Vec<&OrderSummary> = t
                    .orders
                    .iter()
                    .map(|(_, o)| o)
                    .filter(|o| o.customer_id == Some(c.id) && o.status != "cancelled")
                    .collect();
                let total_orders = i64::try_from(orders.len()).unwrap_or(i64::MAX);
                let total_spent: Decimal = orders.iter().map(|o| o.total).sum();
                let average_order_value = if total_orders > 0 {
                    (total_spent / Decimal::from(total_orders)).round_dp(2)
                } else {
                    Decimal::ZERO
                };
                CustomerAggregate {
                    customer_id: c.id,
                    name: c.name.clone(),
                    phone: c.phone.clone(),
                    email: c.email.clone(),
                    birth_month: c.birth_month,
                    segment: c.segment.clone(),
                    total_orders,
                    total_spent,
                    average_order_value,
                    first_order_at: orders.iter().map(|o| o.created_at).min(),
                    last_order_at: orders.iter().map(|o| o.created_at).max(),
                    created_at: c.created_at,
                }
            })
            .collect();

        aggregates.sort_by(|a, b| {
            b.last_order_at
                .cmp(&a.last_order_at)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(aggregates)
    }

    async fn customer_tags(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<CustomerTagAssignment>, RepositoryError> {
        let t = self.tables();
        t.check("customer_tags")?;
        let mut tags: Vec<CustomerTagAssignment> = t
            .tag_assignments
            .iter()
            .filter_map(|(customer_id, tag_id)| {
                t.tags
                    .iter()
                    .find(|tag| tag.id == *tag_id && tag.tenant_id == tenant_id)
                    .map(|tag| CustomerTagAssignment {
                        customer_id: *customer_id,
                        tag_id: tag.id,
                        name: tag.name.clone(),
                        color: tag.color.clone(),
                    })
            })
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn recent_orders(
        &self,
        tenant_id: TenantId,
        limit: i64,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        let t = self.tables();
        t.check("recent_orders")?;
        let mut orders: Vec<OrderSummary> = t
            .orders
            .iter()
            .filter(|(tenant, _)| *tenant == tenant_id)
            .map(|(_, o)| o.clone())
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(orders)
    }
}

impl ConsoleStore for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        self.tables().check("ping")
    }
}
