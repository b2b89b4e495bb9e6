use chrono::{DateTime, Utc};

use comanda_core::{StaffRole, StaffUserId, SubjectId, TenantId};

use super::rows::{
    AccountRow, BranchRow, InstitutionCodeRow, StaffListingRow, StaffUserRow, TenantRow,
};
use super::{PgStore, conflict_on_unique};
use crate::db::RepositoryError;
use crate::db::store::{
    OnboardedTenant, OnboardingRecord, RegisteredStaff, RegistrationError, StaffRegistration,
    StaffStore,
};
use crate::models::{
    AuthAccount, Branch, CodeRejection, InstitutionCode, NewStaffUser, StaffListing, StaffPatch,
    StaffUser, Tenant,
};

impl StaffStore for PgStore {
    async fn find_staff_by_subject(
        &self,
        subject: SubjectId,
    ) -> Result<Option<StaffUser>, RepositoryError> {
        let row = sqlx::query_as::<_, StaffUserRow>(
            r"
            SELECT id, auth_subject, tenant_id, branch_id, role::text AS role,
                   name, email, phone, created_at, updated_at
            FROM console.staff_user
            WHERE auth_subject = $1
            ",
        )
        .bind(subject)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_staff(&self, id: StaffUserId) -> Result<Option<StaffUser>, RepositoryError> {
        let row = sqlx::query_as::<_, StaffUserRow>(
            r"
            SELECT id, auth_subject, tenant_id, branch_id, role::text AS role,
                   name, email, phone, created_at, updated_at
            FROM console.staff_user
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn create_staff(&self, user: NewStaffUser) -> Result<StaffUser, RepositoryError> {
        // A concurrent bootstrap for the same subject loses the race quietly.
        let row = sqlx::query_as::<_, StaffUserRow>(
            r"
            INSERT INTO console.staff_user
                (auth_subject, tenant_id, branch_id, role, name, email, phone)
            VALUES ($1, $2, $3, $4::console.staff_role, $5, $6, $7)
            ON CONFLICT (auth_subject) DO NOTHING
            RETURNING id, auth_subject, tenant_id, branch_id, role::text AS role,
                      name, email, phone, created_at, updated_at
            ",
        )
        .bind(user.auth_subject)
        .bind(user.tenant_id)
        .bind(user.branch_id)
        .bind(user.role.as_str())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| RepositoryError::Conflict("staff user already exists".to_owned()))?
            .try_into()
    }

    async fn list_staff(&self, tenant_id: TenantId) -> Result<Vec<StaffListing>, RepositoryError> {
        let rows = sqlx::query_as::<_, StaffListingRow>(
            r"
            SELECT u.id, u.auth_subject, u.tenant_id, u.branch_id, u.role::text AS role,
                   u.name, u.email, u.phone, u.created_at, u.updated_at,
                   b.name AS branch_name
            FROM console.staff_user u
            LEFT JOIN console.branch b ON b.id = u.branch_id
            WHERE u.tenant_id = $1
            ORDER BY u.created_at DESC
            ",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn update_staff(
        &self,
        id: StaffUserId,
        tenant_id: TenantId,
        patch: &StaffPatch,
    ) -> Result<StaffUser, RepositoryError> {
        let row = sqlx::query_as::<_, StaffUserRow>(
            r"
            UPDATE console.staff_user
            SET role = COALESCE($3::console.staff_role, role),
                branch_id = CASE WHEN $4 THEN $5 ELSE branch_id END,
                updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING id, auth_subject, tenant_id, branch_id, role::text AS role,
                      name, email, phone, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(tenant_id)
        .bind(patch.role.map(StaffRole::as_str))
        .bind(patch.branch_id.is_some())
        .bind(patch.branch_id.flatten())
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    async fn complete_onboarding(
        &self,
        subject: SubjectId,
        record: OnboardingRecord,
    ) -> Result<OnboardedTenant, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let user: StaffUser = sqlx::query_as::<_, StaffUserRow>(
            r"
            SELECT id, auth_subject, tenant_id, branch_id, role::text AS role,
                   name, email, phone, created_at, updated_at
            FROM console.staff_user
            WHERE auth_subject = $1
            FOR UPDATE
            ",
        )
        .bind(subject)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?
        .try_into()?;

        if !user.needs_onboarding() {
            return Err(RepositoryError::Conflict(
                "onboarding already completed".to_owned(),
            ));
        }

        let tenant: Tenant = sqlx::query_as::<_, TenantRow>(
            r"
            INSERT INTO console.tenant (name, slug, email, phone, address, city)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, slug, email, phone, address, city, created_at
            ",
        )
        .bind(&record.tenant.name)
        .bind(&record.tenant.slug)
        .bind(&record.tenant.email)
        .bind(&record.tenant.phone)
        .bind(&record.tenant.address)
        .bind(&record.tenant.city)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| conflict_on_unique(e, "institution slug already exists"))?
        .into();

        let branch: Branch = sqlx::query_as::<_, BranchRow>(
            r"
            INSERT INTO console.branch (tenant_id, name, address, city, phone, is_active, is_main)
            VALUES ($1, $2, $3, $4, $5, TRUE, $6)
            RETURNING id, tenant_id, name, address, city, phone, is_active, is_main, created_at
            ",
        )
        .bind(tenant.id)
        .bind(&record.branch.name)
        .bind(&record.branch.address)
        .bind(&record.branch.city)
        .bind(&record.branch.phone)
        .bind(record.branch.is_main)
        .fetch_one(&mut *tx)
        .await?
        .into();

        let user: StaffUser = sqlx::query_as::<_, StaffUserRow>(
            r"
            UPDATE console.staff_user
            SET tenant_id = $2, branch_id = $3, role = 'owner', updated_at = NOW()
            WHERE id = $1
            RETURNING id, auth_subject, tenant_id, branch_id, role::text AS role,
                      name, email, phone, created_at, updated_at
            ",
        )
        .bind(user.id)
        .bind(tenant.id)
        .bind(branch.id)
        .fetch_one(&mut *tx)
        .await?
        .try_into()?;

        tx.commit().await?;

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
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent signups on the same code.
        let code: InstitutionCode = sqlx::query_as::<_, InstitutionCodeRow>(
            r"
            SELECT id, tenant_id, code, name, max_uses, uses_count, expires_at,
                   is_active, created_by, created_at
            FROM console.institution_code
            WHERE code = $1
            FOR UPDATE
            ",
        )
        .bind(&registration.code)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(CodeRejection::Unknown)?
        .into();

        code.check_usable(now)?;

        let tenant: Tenant = sqlx::query_as::<_, TenantRow>(
            r"
            SELECT id, name, slug, email, phone, address, city, created_at
            FROM console.tenant
            WHERE id = $1
            ",
        )
        .bind(code.tenant_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            RepositoryError::DataCorruption(format!("code {} has no tenant", code.id))
        })?
        .into();

        let account = registration.account(tenant.id);
        let account: AuthAccount = sqlx::query_as::<_, AccountRow>(
            r"
            INSERT INTO console.auth_account
                (email, password_hash, display_name, phone, metadata, confirmed_at)
            VALUES ($1, $2, $3, $4, $5, CASE WHEN $6 THEN NOW() END)
            RETURNING id, email, password_hash, display_name, phone, metadata,
                      confirmed_at, created_at
            ",
        )
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.display_name)
        .bind(&account.phone)
        .bind(&account.metadata)
        .bind(account.confirmed)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match conflict_on_unique(e, "email already exists") {
            RepositoryError::Conflict(_) => RegistrationError::EmailTaken,
            other => RegistrationError::Repository(other),
        })?
        .try_into()?;

        let staff = registration.staff_user(account.id, tenant.id);
        let user: StaffUser = sqlx::query_as::<_, StaffUserRow>(
            r"
            INSERT INTO console.staff_user
                (auth_subject, tenant_id, branch_id, role, name, email, phone)
            VALUES ($1, $2, $3, $4::console.staff_role, $5, $6, $7)
            RETURNING id, auth_subject, tenant_id, branch_id, role::text AS role,
                      name, email, phone, created_at, updated_at
            ",
        )
        .bind(staff.auth_subject)
        .bind(staff.tenant_id)
        .bind(staff.branch_id)
        .bind(staff.role.as_str())
        .bind(&staff.name)
        .bind(&staff.email)
        .bind(&staff.phone)
        .fetch_one(&mut *tx)
        .await?
        .try_into()?;

        sqlx::query(
            r"
            UPDATE console.institution_code
            SET uses_count = uses_count + 1
            WHERE id = $1
            ",
        )
        .bind(code.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(RegisteredStaff {
            account,
            user,
            tenant,
        })
    }
}
