use comanda_core::TenantId;

use super::PgStore;
use super::rows::{CustomerStatsRow, OrderRow, TagAssignmentRow};
use crate::db::RepositoryError;
use crate::db::store::CustomerStore;
use crate::models::{CustomerAggregate, CustomerTagAssignment, OrderSummary};

impl CustomerStore for PgStore {
    async fn customer_aggregates(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<CustomerAggregate>, RepositoryError> {
        let rows = sqlx::query_as::<_, CustomerStatsRow>(
            r"
            SELECT customer_id, name, phone, email, birth_month, segment,
                   total_orders, total_spent, average_order_value,
                   first_order_at, last_order_at, created_at
            FROM console.customer_stats
            WHERE tenant_id = $1
            ORDER BY last_order_at DESC NULLS LAST, name
            ",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn customer_tags(
        &self,
        tenant_id: TenantId,
    ) -> Result<Vec<CustomerTagAssignment>, RepositoryError> {
        let rows = sqlx::query_as::<_, TagAssignmentRow>(
            r"
            SELECT a.customer_id, t.id AS tag_id, t.name, t.color
            FROM console.customer_tag_assignment a
            JOIN console.customer_tag t ON t.id = a.tag_id
            WHERE t.tenant_id = $1
            ORDER BY t.name
            ",
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn recent_orders(
        &self,
        tenant_id: TenantId,
        limit: i64,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, customer_id, branch_id, order_number, total, order_type,
                   payment_method, status, created_at
            FROM console.orders
            WHERE tenant_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            ",
        )
        .bind(tenant_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
