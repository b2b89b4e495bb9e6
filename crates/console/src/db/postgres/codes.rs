use comanda_core::{InstitutionCodeId, TenantId};

use super::rows::InstitutionCodeRow;
use super::{PgStore, conflict_on_unique};
use crate::db::RepositoryError;
use crate::db::store::CodeStore;
use crate::models::{InstitutionCode, NewInstitutionCode};

impl CodeStore for PgStore {
    async fn list_codes(&self, tenant_id: TenantId) -> Result<Vec<InstitutionCode>, RepositoryError> {
        let rows = sqlx::query_as::<_, InstitutionCodeRow>(
            r"
            SELECT id, tenant_id, code, name, max_uses, uses_count, expires_at,
                   is_active, created_by, created_at
            FROM console.institution_code
            WHERE tenant_id = $1
            ORDER BY created_at DESC
            ",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_code(
        &self,
        id: InstitutionCodeId,
    ) -> Result<Option<InstitutionCode>, RepositoryError> {
        let row = sqlx::query_as::<_, InstitutionCodeRow>(
            r"
            SELECT id, tenant_id, code, name, max_uses, uses_count, expires_at,
                   is_active, created_by, created_at
            FROM console.institution_code
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn find_code_by_value(
        &self,
        code: &str,
    ) -> Result<Option<InstitutionCode>, RepositoryError> {
        let row = sqlx::query_as::<_, InstitutionCodeRow>(
            r"
            SELECT id, tenant_id, code, name, max_uses, uses_count, expires_at,
                   is_active, created_by, created_at
            FROM console.institution_code
            WHERE code = $1
            ",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    async fn create_code(
        &self,
        tenant_id: TenantId,
        code: NewInstitutionCode,
    ) -> Result<InstitutionCode, RepositoryError> {
        let row = sqlx::query_as::<_, InstitutionCodeRow>(
            r"
            INSERT INTO console.institution_code
                (tenant_id, code, name, max_uses, uses_count, expires_at, is_active, created_by)
            VALUES ($1, $2, $3, $4, 0, $5, TRUE, $6)
            RETURNING id, tenant_id, code, name, max_uses, uses_count, expires_at,
                      is_active, created_by, created_at
            ",
        )
        .bind(tenant_id)
        .bind(&code.code)
        .bind(&code.name)
        .bind(code.max_uses)
        .bind(code.expires_at)
        .bind(code.created_by)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "institution code already exists"))?;

        Ok(row.into())
    }

    async fn set_code_active(
        &self,
        id: InstitutionCodeId,
        tenant_id: TenantId,
        is_active: bool,
    ) -> Result<InstitutionCode, RepositoryError> {
        let row = sqlx::query_as::<_, InstitutionCodeRow>(
            r"
            UPDATE console.institution_code
            SET is_active = $3
            WHERE id = $1 AND tenant_id = $2
            RETURNING id, tenant_id, code, name, max_uses, uses_count, expires_at,
                      is_active, created_by, created_at
            ",
        )
        .bind(id)
        .bind(tenant_id)
        .bind(is_active)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    async fn delete_code(
        &self,
        id: InstitutionCodeId,
        tenant_id: TenantId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM console.institution_code
            WHERE id = $1 AND tenant_id = $2
            ",
        )
        .bind(id)
        .bind(tenant_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
