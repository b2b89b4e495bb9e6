use comanda_core::{BranchId, TenantId};

use super::PgStore;
use super::rows::{BranchRow, TenantRow};
use crate::db::RepositoryError;
use crate::db::store::{BranchStore, TenantStore};
use crate::models::{Branch, Tenant};

impl TenantStore for PgStore {
    async fn find_tenant(&self, id: TenantId) -> Result<Option<Tenant>, RepositoryError> {
        let row = sqlx::query_as::<_, TenantRow>(
            r"
            SELECT id, name, slug, email, phone, address, city, created_at
            FROM console.tenant
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }
}

impl BranchStore for PgStore {
    async fn list_branches(&self, tenant_id: TenantId) -> Result<Vec<Branch>, RepositoryError> {
        let rows = sqlx::query_as::<_, BranchRow>(
            r"
            SELECT id, tenant_id, name, address, city, phone, is_active, is_main, created_at
            FROM console.branch
            WHERE tenant_id = $1
            ORDER BY name, created_at
            ",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_branch(&self, id: BranchId) -> Result<Option<Branch>, RepositoryError> {
        let row = sqlx::query_as::<_, BranchRow>(
            r"
            SELECT id, tenant_id, name, address, city, phone, is_active, is_main, created_at
            FROM console.branch
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }
}
