//! Customer list with derived activity metrics.
//!
//! Segment, recency, frequency and preferences are derived on every request
//! from the store's aggregates and the tenant's most recent orders; nothing
//! here is written back. The whole customer set is loaded and then filtered
//! in memory.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use comanda_core::{CustomerId, CustomerSegment, Frequency, OrderId, Recency, TagId};

use super::Caller;
use crate::db::CustomerStore;
use crate::error::{AppError, StoreContext};
use crate::models::{CustomerAggregate, CustomerTagAssignment, OrderSummary};

/// Orders considered for recent-order lists and preferences.
pub const RECENT_ORDER_WINDOW: i64 = 100;
/// Recent orders shown per customer.
pub const RECENT_ORDERS_PER_CUSTOMER: usize = 5;
pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

/// Query string of `GET /api/customers`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerQuery {
    pub search: Option<String>,
    pub segment: Option<String>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagView {
    pub id: TagId,
    pub name: String,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentOrderView {
    pub id: OrderId,
    pub order_number: Option<String>,
    pub total: Decimal,
    pub order_type: Option<String>,
    pub payment_method: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<&OrderSummary> for RecentOrderView {
    fn from(order: &OrderSummary) -> Self {
        Self {
            id: order.id,
            order_number: order.order_number.clone(),
            total: order.total,
            order_type: order.order_type.clone(),
            payment_method: order.payment_method.clone(),
            status: order.status.clone(),
            created_at: order.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerView {
    pub id: CustomerId,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub segment: CustomerSegment,
    pub total_orders: i64,
    pub total_spent: Decimal,
    pub average_order_value: Decimal,
    pub first_order_at: Option<DateTime<Utc>>,
    pub last_order_at: Option<DateTime<Utc>>,
    pub days_since_last_order: Option<i64>,
    pub last_visit: String,
    pub frequency: String,
    pub birthday_this_month: bool,
    pub tags: Vec<TagView>,
    pub recent_orders: Vec<RecentOrderView>,
    pub preferred_order_type: Option<String>,
    pub preferred_payment_method: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentCounts {
    pub all: usize,
    pub new: usize,
    pub regular: usize,
    pub vip: usize,
    pub inactive: usize,
    pub at_risk: usize,
}

impl SegmentCounts {
    fn add(&mut self, segment: CustomerSegment) {
        self.all += 1;
        match segment {
            CustomerSegment::New => self.new += 1,
            CustomerSegment::Regular => self.regular += 1,
            CustomerSegment::Vip => self.vip += 1,
            CustomerSegment::Inactive => self.inactive += 1,
            CustomerSegment::AtRisk => self.at_risk += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPage {
    pub customers: Vec<CustomerView>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub segment_counts: SegmentCounts,
}

/// Most frequent value; ties go to the value seen first. Input is newest
/// first, so that is the most recent one.
fn most_frequent<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Option<String> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for value in values.flatten() {
        match counts.iter_mut().find(|(seen, _)| *seen == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (value, count) in counts {
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value.to_owned())
}

fn matches_search(customer: &CustomerAggregate, needle: &str) -> bool {
    let hit = |field: Option<&str>| field.is_some_and(|f| f.to_lowercase().contains(needle));
    hit(Some(&customer.name)) || hit(customer.phone.as_deref()) || hit(customer.email.as_deref())
}

fn customer_view(
    customer: CustomerAggregate,
    segment: CustomerSegment,
    tags: Vec<TagView>,
    orders: &[&OrderSummary],
    now: DateTime<Utc>,
) -> CustomerView {
    let recency = Recency::since(customer.last_order_at, now);
    let frequency = Frequency::derive(
        customer.total_orders,
        customer.first_order_at,
        customer.last_order_at,
    );

    CustomerView {
        id: customer.customer_id,
        name: customer.name,
        phone: customer.phone,
        email: customer.email,
        segment,
        total_orders: customer.total_orders,
        total_spent: customer.total_spent,
        average_order_value: customer.average_order_value,
        first_order_at: customer.first_order_at,
        last_order_at: customer.last_order_at,
        days_since_last_order: recency.days(),
        last_visit: recency.to_string(),
        frequency: frequency.to_string(),
        birthday_this_month: customer.birth_month == Some(now.month()),
        tags,
        recent_orders: orders
            .iter()
            .take(RECENT_ORDERS_PER_CUSTOMER)
            .map(|o| RecentOrderView::from(*o))
            .collect(),
        preferred_order_type: most_frequent(orders.iter().map(|o| o.order_type.as_deref())),
        preferred_payment_method: most_frequent(
            orders.iter().map(|o| o.payment_method.as_deref()),
        ),
        created_at: customer.created_at,
    }
}

/// The segment tab filter. Blank or `all` means no filter.
fn segment_tab(raw: Option<&str>) -> Result<Option<CustomerSegment>, AppError> {
    match raw
        .map(str::trim)
        .filter(|tab| !tab.is_empty() && !tab.eq_ignore_ascii_case("all"))
    {
        None => Ok(None),
        Some(tab) => CustomerSegment::from_tab(tab)
            .map(Some)
            .ok_or_else(|| AppError::Validation(format!("Invalid segment: {tab}"))),
    }
}

/// Filter, count and paginate. `orders` must be newest first.
///
/// Segment counts reflect the search filter but not the segment tab, so every
/// tab shows how many matches it holds.
#[must_use]
pub fn build_page(
    aggregates: Vec<CustomerAggregate>,
    tags: Vec<CustomerTagAssignment>,
    orders: &[OrderSummary],
    query: &CustomerQuery,
    now: DateTime<Utc>,
) -> CustomerPage {
    let needle = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);
    // `list` has already rejected unknown tabs.
    let tab = segment_tab(query.segment.as_deref()).ok().flatten();

    let page_size = query
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let page = query.page.unwrap_or(1).max(1);

    let mut segment_counts = SegmentCounts::default();
    let mut matching = Vec::new();
    for customer in aggregates {
        if needle
            .as_deref()
            .is_some_and(|n| !matches_search(&customer, n))
        {
            continue;
        }
        let segment = CustomerSegment::from_store(customer.segment.as_deref());
        segment_counts.add(segment);
        if tab.is_none_or(|tab| tab == segment) {
            matching.push((customer, segment));
        }
    }

    let total = matching.len();
    let total_pages = total.div_ceil(page_size);

    let mut tags_by_customer: HashMap<CustomerId, Vec<TagView>> = HashMap::new();
    for tag in tags {
        tags_by_customer
            .entry(tag.customer_id)
            .or_default()
            .push(TagView {
                id: tag.tag_id,
                name: tag.name,
                color: tag.color,
            });
    }
    let mut orders_by_customer: HashMap<CustomerId, Vec<&OrderSummary>> = HashMap::new();
    for order in orders {
        if let Some(customer_id) = order.customer_id {
            orders_by_customer.entry(customer_id).or_default().push(order);
        }
    }

    let customers = matching
        .into_iter()
        .skip((page - 1).saturating_mul(page_size))
        .take(page_size)
        .map(|(customer, segment)| {
            let id = customer.customer_id;
            customer_view(
                customer,
                segment,
                tags_by_customer.remove(&id).unwrap_or_default(),
                orders_by_customer.get(&id).map_or(&[][..], Vec::as_slice),
                now,
            )
        })
        .collect();

    CustomerPage {
        customers,
        total,
        page,
        page_size,
        total_pages,
        segment_counts,
    }
}

/// Customer list for any staff member of the tenant.
///
/// # Errors
///
/// `Validation` for an unknown segment tab, and store failures.
#[instrument(skip(store, caller), fields(tenant_id = %caller.tenant_id))]
pub async fn list<S: CustomerStore>(
    store: &S,
    caller: &Caller,
    query: &CustomerQuery,
    now: DateTime<Utc>,
) -> Result<CustomerPage, AppError> {
    segment_tab(query.segment.as_deref())?;

    let tenant_id = caller.tenant_id;
    let aggregates = store
        .customer_aggregates(tenant_id)
        .await
        .store_context("customer_aggregates", Some(tenant_id))?;
    let tags = store
        .customer_tags(tenant_id)
        .await
        .store_context("customer_tags", Some(tenant_id))?;
    let orders = store
        .recent_orders(tenant_id, RECENT_ORDER_WINDOW)
        .await
        .store_context("recent_orders", Some(tenant_id))?;

    Ok(build_page(aggregates, tags, &orders, query, now))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::{TimeDelta, TimeZone};

    use comanda_core::{StaffRole, TenantId};

    use super::*;
    use crate::db::MemoryStore;
    use crate::db::memory::{MemoryCustomer, MemoryTag};
    use crate::services::testing::{staff, tenant};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 12, 0, 0).unwrap()
    }

    fn customer(
        store: &MemoryStore,
        tenant_id: TenantId,
        name: &str,
        segment: Option<&str>,
    ) -> MemoryCustomer {
        let customer = MemoryCustomer {
            id: CustomerId::generate(),
            tenant_id,
            name: name.to_owned(),
            phone: Some(format!("555-{}", name.len())),
            email: Some(format!("{}@example.com", name.to_lowercase())),
            birth_month: None,
            segment: segment.map(str::to_owned),
            created_at: now() - TimeDelta::days(365),
        };
        store.insert_customer(customer.clone());
        customer
    }

    fn order(
        store: &MemoryStore,
        tenant_id: TenantId,
        customer_id: CustomerId,
        days_ago: i64,
        order_type: &str,
        payment_method: &str,
    ) {
        store.insert_order(
            tenant_id,
            OrderSummary {
                id: OrderId::generate(),
                customer_id: Some(customer_id),
                branch_id: None,
                order_number: Some(format!("#{days_ago}")),
                total: Decimal::new(2500, 2),
                order_type: Some(order_type.to_owned()),
                payment_method: Some(payment_method.to_owned()),
                status: "completed".to_owned(),
                created_at: now() - TimeDelta::days(days_ago),
            },
        );
    }

    async fn page(store: &MemoryStore, tenant_id: TenantId, query: CustomerQuery) -> CustomerPage {
        let caller = Caller::new(staff(store, Some(tenant_id), StaffRole::Cashier)).unwrap();
        list(store, &caller, &query, now()).await.unwrap()
    }

    #[test]
    fn test_most_frequent_prefers_recent_on_tie() {
        let values = [Some("delivery"), Some("dine_in"), None, Some("dine_in"), Some("delivery")];
        assert_eq!(
            most_frequent(values.into_iter()).as_deref(),
            Some("delivery")
        );
        let values = [Some("cash"), Some("card"), Some("card")];
        assert_eq!(most_frequent(values.into_iter()).as_deref(), Some("card"));
        assert_eq!(most_frequent([None, None].into_iter()), None);
    }

    #[tokio::test]
    async fn test_derived_fields() {
        let store = MemoryStore::new();
        let t = tenant(&store, "Pho 88");
        let ana = customer(&store, t.id, "Ana", Some("regular"));
        order(&store, t.id, ana.id, 10, "dine_in", "cash");
        order(&store, t.id, ana.id, 5, "delivery", "card");
        order(&store, t.id, ana.id, 0, "delivery", "cash");

        let result = page(&store, t.id, CustomerQuery::default()).await;
        let view = &result.customers[0];
        assert_eq!(view.segment, CustomerSegment::Regular);
        assert_eq!(view.total_orders, 3);
        assert_eq!(view.frequency, "Every 5 days");
        assert_eq!(view.last_visit, "Today");
        assert_eq!(view.days_since_last_order, Some(0));
        assert_eq!(view.preferred_order_type.as_deref(), Some("delivery"));
        assert_eq!(view.preferred_payment_method.as_deref(), Some("cash"));
        assert_eq!(view.recent_orders.len(), 3);
        assert!(view.recent_orders[0].created_at > view.recent_orders[1].created_at);
    }

    #[tokio::test]
    async fn test_no_orders_and_unknown_segment() {
        let store = MemoryStore::new();
        let t = tenant(&store, "Pho 88");
        customer(&store, t.id, "Bea", Some("platinum"));

        let result = page(&store, t.id, CustomerQuery::default()).await;
        let view = &result.customers[0];
        assert_eq!(view.segment, CustomerSegment::New);
        assert_eq!(view.frequency, "No orders");
        assert_eq!(view.last_visit, "Never");
        assert_eq!(view.days_since_last_order, None);
        assert!(view.recent_orders.is_empty());
    }

    #[tokio::test]
    async fn test_recent_orders_capped_per_customer() {
        let store = MemoryStore::new();
        let t = tenant(&store, "Pho 88");
        let ana = customer(&store, t.id, "Ana", None);
        for day in 0..8 {
            order(&store, t.id, ana.id, day, "dine_in", "cash");
        }

        let result = page(&store, t.id, CustomerQuery::default()).await;
        assert_eq!(result.customers[0].recent_orders.len(), RECENT_ORDERS_PER_CUSTOMER);
        assert_eq!(result.customers[0].total_orders, 8);
    }

    #[tokio::test]
    async fn test_birthday_this_month() {
        let store = MemoryStore::new();
        let t = tenant(&store, "Pho 88");
        let mut march = customer(&store, t.id, "March", None);
        march.id = CustomerId::generate();
        march.birth_month = Some(3);
        march.name = "Marzo".to_owned();
        store.insert_customer(march);

        let result = page(&store, t.id, CustomerQuery::default()).await;
        let birthdays: Vec<_> = result
            .customers
            .iter()
            .filter(|c| c.birthday_this_month)
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(birthdays, ["Marzo"]);
    }

    #[tokio::test]
    async fn test_search_and_segment_counts() {
        let store = MemoryStore::new();
        let t = tenant(&store, "Pho 88");
        customer(&store, t.id, "Ana", Some("vip"));
        customer(&store, t.id, "Anabel", Some("regular"));
        customer(&store, t.id, "Bruno", Some("vip"));

        let result = page(
            &store,
            t.id,
            CustomerQuery {
                search: Some("ANA".to_owned()),
                segment: Some("VIP".to_owned()),
                ..CustomerQuery::default()
            },
        )
        .await;

        assert_eq!(result.total, 1);
        assert_eq!(result.customers[0].name, "Ana");
        assert_eq!(
            result.segment_counts,
            SegmentCounts {
                all: 2,
                vip: 1,
                regular: 1,
                ..SegmentCounts::default()
            }
        );
    }

    #[test]
    fn test_segment_tab() {
        assert_eq!(segment_tab(None).unwrap(), None);
        assert_eq!(segment_tab(Some(" ")).unwrap(), None);
        assert_eq!(segment_tab(Some("All")).unwrap(), None);
        assert_eq!(
            segment_tab(Some("at_risk")).unwrap(),
            Some(CustomerSegment::AtRisk)
        );
    }

    #[tokio::test]
    async fn test_unknown_segment_is_rejected() {
        let store = MemoryStore::new();
        let t = tenant(&store, "Pho 88");
        customer(&store, t.id, "Ana", Some("vip"));
        let caller = Caller::new(staff(&store, Some(t.id), StaffRole::Cashier)).unwrap();

        let query = CustomerQuery {
            segment: Some("bogus".to_owned()),
            ..CustomerQuery::default()
        };
        let err = list(&store, &caller, &query, now()).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(ref msg) if msg == "Invalid segment: bogus"));
    }

    #[tokio::test]
    async fn test_search_matches_email_and_phone() {
        let store = MemoryStore::new();
        let t = tenant(&store, "Pho 88");
        customer(&store, t.id, "Ana", None);
        customer(&store, t.id, "Bruno", None);

        let by_email = page(
            &store,
            t.id,
            CustomerQuery {
                search: Some("bruno@".to_owned()),
                ..CustomerQuery::default()
            },
        )
        .await;
        assert_eq!(by_email.total, 1);

        let by_phone = page(
            &store,
            t.id,
            CustomerQuery {
                search: Some("555-3".to_owned()),
                ..CustomerQuery::default()
            },
        )
        .await;
        assert_eq!(by_phone.customers[0].name, "Ana");
    }

    #[tokio::test]
    async fn test_pagination() {
        let store = MemoryStore::new();
        let t = tenant(&store, "Pho 88");
        for i in 0..23 {
            customer(&store, t.id, &format!("Customer {i:02}"), None);
        }

        let first = page(&store, t.id, CustomerQuery::default()).await;
        assert_eq!(first.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(first.customers.len(), 10);
        assert_eq!(first.total, 23);
        assert_eq!(first.total_pages, 3);

        let last = page(
            &store,
            t.id,
            CustomerQuery {
                page: Some(3),
                ..CustomerQuery::default()
            },
        )
        .await;
        assert_eq!(last.customers.len(), 3);

        let clamped = page(
            &store,
            t.id,
            CustomerQuery {
                page_size: Some(1_000),
                page: Some(0),
                ..CustomerQuery::default()
            },
        )
        .await;
        assert_eq!(clamped.page_size, MAX_PAGE_SIZE);
        assert_eq!(clamped.page, 1);
        assert_eq!(clamped.customers.len(), 23);
    }

    #[tokio::test]
    async fn test_other_tenants_hidden() {
        let store = MemoryStore::new();
        let t = tenant(&store, "Pho 88");
        let other = tenant(&store, "Other");
        customer(&store, other.id, "Outsider", None);

        let result = page(&store, t.id, CustomerQuery::default()).await;
        assert_eq!(result.total, 0);
        assert_eq!(result.total_pages, 0);
    }

    #[tokio::test]
    async fn test_tags_attached() {
        let store = MemoryStore::new();
        let t = tenant(&store, "Pho 88");
        let ana = customer(&store, t.id, "Ana", None);
        let tag = MemoryTag {
            id: TagId::generate(),
            tenant_id: t.id,
            name: "Spicy".to_owned(),
            color: Some("#ff0000".to_owned()),
        };
        store.insert_tag(tag.clone());
        store.tag_customer(ana.id, tag.id);

        let result = page(&store, t.id, CustomerQuery::default()).await;
        assert_eq!(result.customers[0].tags.len(), 1);
        assert_eq!(result.customers[0].tags[0].name, "Spicy");
    }
}
