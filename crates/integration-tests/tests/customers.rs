//! Customer list over HTTP.

use axum::http::StatusCode;
use chrono::Utc;
use serde_json::Value;

use comanda_console::db::memory::MemoryCustomer;
use comanda_core::{CustomerId, TenantId};
use comanda_integration_tests::TestApp;

fn seed(app: &TestApp, tenant: &Value, customers: &[(&str, &str)]) {
    let tenant_id: TenantId = tenant["id"]
        .as_str()
        .and_then(|id| id.parse().ok())
        .expect("tenant id");
    for (name, segment) in customers {
        app.store.insert_customer(MemoryCustomer {
            id: CustomerId::generate(),
            tenant_id,
            name: (*name).to_owned(),
            phone: None,
            email: None,
            birth_month: None,
            segment: Some((*segment).to_owned()),
            created_at: Utc::now(),
        });
    }
}

#[tokio::test]
async fn test_segment_tab_and_counts() {
    let app = TestApp::new();
    let (mut owner, onboarded) = app.onboarded_owner("owner@example.com", "Pho 88").await;
    seed(
        &app,
        &onboarded["tenant"],
        &[("Ana", "vip"), ("Bruno", "regular"), ("Carla", "vip"), ("Dario", "new")],
    );

    let page = owner.get("/api/customers?segment=vip").await;
    assert_eq!(page.status, StatusCode::OK, "{}", page.body);
    assert_eq!(page.body["total"], 2);
    assert_eq!(page.body["segmentCounts"]["all"], 4);
    assert_eq!(page.body["segmentCounts"]["vip"], 2);
    assert_eq!(page.body["segmentCounts"]["regular"], 1);
    assert_eq!(page.body["customers"][0]["frequency"], "No orders");
    assert_eq!(page.body["customers"][0]["lastVisit"], "Never");
}

#[tokio::test]
async fn test_pagination_and_search() {
    let app = TestApp::new();
    let (mut owner, onboarded) = app.onboarded_owner("owner@example.com", "Pho 88").await;
    seed(
        &app,
        &onboarded["tenant"],
        &[("Ana", "new"), ("Anabel", "new"), ("Bruno", "new")],
    );

    let page = owner.get("/api/customers?page=2&pageSize=2").await;
    assert_eq!(page.body["page"], 2);
    assert_eq!(page.body["totalPages"], 2);
    assert_eq!(page.body["customers"].as_array().map(Vec::len), Some(1));

    let found = owner.get("/api/customers?search=ana").await;
    assert_eq!(found.body["total"], 2);
    assert_eq!(found.body["segmentCounts"]["all"], 2);
}

#[tokio::test]
async fn test_customers_are_tenant_scoped() {
    let app = TestApp::new();
    let (_, first) = app.onboarded_owner("one@example.com", "Pho 88").await;
    let (mut second, _) = app.onboarded_owner("two@example.com", "Taco Bell").await;
    seed(&app, &first["tenant"], &[("Ana", "vip")]);

    let page = second.get("/api/customers").await;
    assert_eq!(page.status, StatusCode::OK);
    assert_eq!(page.body["total"], 0);
}

#[tokio::test]
async fn test_bad_query_is_rejected() {
    let app = TestApp::new();
    let (mut owner, _) = app.onboarded_owner("owner@example.com", "Pho 88").await;

    let response = owner.get("/api/customers?page=abc").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(!response.error().is_empty());
}

#[tokio::test]
async fn test_unknown_segment_tab_is_rejected() {
    let app = TestApp::new();
    let (mut owner, onboarded) = app.onboarded_owner("owner@example.com", "Pho 88").await;
    seed(&app, &onboarded["tenant"], &[("Ana", "vip")]);

    let response = owner.get("/api/customers?segment=bogus").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error(), "Invalid segment: bogus");

    let all = owner.get("/api/customers?segment=all").await;
    assert_eq!(all.status, StatusCode::OK);
    assert_eq!(all.body["total"], 1);
}
