//! Customer read models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use comanda_core::{BranchId, CustomerId, OrderId, TagId};

/// One customer with the store's precomputed order statistics.
#[derive(Debug, Clone)]
pub struct CustomerAggregate {
    pub customer_id: CustomerId,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// 1-12.
    pub birth_month: Option<u32>,
    /// Raw store value (`new`, `regular`, `vip`, `inactive`, `at_risk`).
    pub segment: Option<String>,
    pub total_orders: i64,
    pub total_spent: Decimal,
    pub average_order_value: Decimal,
    pub first_order_at: Option<DateTime<Utc>>,
    pub last_order_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// A tag attached to a customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerTagAssignment {
    pub customer_id: CustomerId,
    pub tag_id: TagId,
    pub name: String,
    pub color: Option<String>,
}

/// An order as seen by the customer list.
#[derive(Debug, Clone)]
pub struct OrderSummary {
    pub id: OrderId,
    pub customer_id: Option<CustomerId>,
    pub branch_id: Option<BranchId>,
    pub order_number: Option<String>,
    pub total: Decimal,
    pub order_type: Option<String>,
    pub payment_method: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
