//! Internal row types and their conversions into domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use comanda_core::{
    BranchId, CustomerId, Email, InstitutionCodeId, OrderId, StaffRole, StaffUserId, SubjectId,
    TagId, TenantId,
};

use crate::db::RepositoryError;
use crate::models::{
    AuthAccount, Branch, CustomerAggregate, CustomerTagAssignment, InstitutionCode, OrderSummary,
    StaffListing, StaffUser, Tenant,
};

#[derive(Debug, sqlx::FromRow)]
pub(super) struct AccountRow {
    id: SubjectId,
    email: String,
    password_hash: String,
    display_name: String,
    phone: Option<String>,
    metadata: serde_json::Value,
    confirmed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for AuthAccount {
    type Error = RepositoryError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            email,
            password_hash: row.password_hash,
            display_name: row.display_name,
            phone: row.phone,
            metadata: row.metadata,
            confirmed_at: row.confirmed_at,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct TenantRow {
    id: TenantId,
    name: String,
    slug: String,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    city: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<TenantRow> for Tenant {
    fn from(row: TenantRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            email: row.email,
            phone: row.phone,
            address: row.address,
            city: row.city,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct BranchRow {
    id: BranchId,
    tenant_id: TenantId,
    name: String,
    address: Option<String>,
    city: Option<String>,
    phone: Option<String>,
    is_active: bool,
    is_main: bool,
    created_at: DateTime<Utc>,
}

impl From<BranchRow> for Branch {
    fn from(row: BranchRow) -> Self {
        Self {
            id: row.id,
            tenant_id: row.tenant_id,
            name: row.name,
            address: row.address,
            city: row.city,
            phone: row.phone,
            is_active: row.is_active,
            is_main: row.is_main,
            created_at: row.created_at,
        }
    }
}

/// `role` is selected as `role::text`.
#[derive(Debug, sqlx::FromRow)]
pub(super) struct StaffUserRow {
    id: StaffUserId,
    auth_subject: Option<SubjectId>,
    tenant_id: Option<TenantId>,
    branch_id: Option<BranchId>,
    role: String,
    name: String,
    email: Option<String>,
    phone: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<StaffUserRow> for StaffUser {
    type Error = RepositoryError;

    fn try_from(row: StaffUserRow) -> Result<Self, Self::Error> {
        let role: StaffRole = row.role.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid staff role in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            auth_subject: row.auth_subject,
            tenant_id: row.tenant_id,
            branch_id: row.branch_id,
            role,
            name: row.name,
            email: row.email,
            phone: row.phone,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct StaffListingRow {
    #[sqlx(flatten)]
    user: StaffUserRow,
    branch_name: Option<String>,
}

impl TryFrom<StaffListingRow> for StaffListing {
    type Error = RepositoryError;

    fn try_from(row: StaffListingRow) -> Result<Self, Self::Error> {
        Ok(Self::new(row.user.try_into()?, row.branch_name))
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct InstitutionCodeRow {
    id: InstitutionCodeId,
    tenant_id: TenantId,
    code: String,
    name: Option<String>,
    max_uses: Option<i32>,
    uses_count: i32,
    expires_at: Option<DateTime<Utc>>,
    is_active: bool,
    created_by: Option<StaffUserId>,
    created_at: DateTime<Utc>,
}

impl From<InstitutionCodeRow> for InstitutionCode {
    fn from(row: InstitutionCodeRow) -> Self {
        Self {
            id: row.id,
            tenant_id: row.tenant_id,
            code: row.code,
            name: row.name,
            max_uses: row.max_uses,
            uses_count: row.uses_count,
            expires_at: row.expires_at,
            is_active: row.is_active,
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct CustomerStatsRow {
    customer_id: CustomerId,
    name: String,
    phone: Option<String>,
    email: Option<String>,
    birth_month: Option<i16>,
    segment: Option<String>,
    total_orders: i64,
    total_spent: Decimal,
    average_order_value: Decimal,
    first_order_at: Option<DateTime<Utc>>,
    last_order_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<CustomerStatsRow> for CustomerAggregate {
    type Error = RepositoryError;

    fn try_from(row: CustomerStatsRow) -> Result<Self, Self::Error> {
        let birth_month = row
            .birth_month
            .map(|m| {
                u32::try_from(m)
                    .ok()
                    .filter(|m| (1..=12).contains(m))
                    .ok_or_else(|| {
                        RepositoryError::DataCorruption(format!("invalid birth month: {m}"))
                    })
            })
            .transpose()?;

        Ok(Self {
            customer_id: row.customer_id,
            name: row.name,
            phone: row.phone,
            email: row.email,
            birth_month,
            segment: row.segment,
            total_orders: row.total_orders,
            total_spent: row.total_spent,
            average_order_value: row.average_order_value,
            first_order_at: row.first_order_at,
            last_order_at: row.last_order_at,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct TagAssignmentRow {
    customer_id: CustomerId,
    tag_id: TagId,
    name: String,
    color: Option<String>,
}

impl From<TagAssignmentRow> for CustomerTagAssignment {
    fn from(row: TagAssignmentRow) -> Self {
        Self {
            customer_id: row.customer_id,
            tag_id: row.tag_id,
            name: row.name,
            color: row.color,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(super) struct OrderRow {
    id: OrderId,
    customer_id: Option<CustomerId>,
    branch_id: Option<BranchId>,
    order_number: Option<String>,
    total: Decimal,
    order_type: Option<String>,
    payment_method: Option<String>,
    status: String,
    created_at: DateTime<Utc>,
}

impl From<OrderRow> for OrderSummary {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            customer_id: row.customer_id,
            branch_id: row.branch_id,
            order_number: row.order_number,
            total: row.total,
            order_type: row.order_type,
            payment_method: row.payment_method,
            status: row.status,
            created_at: row.created_at,
        }
    }
}
