//! Branch selection through the session.

use axum::http::StatusCode;
use chrono::Utc;
use serde_json::{Value, json};

use comanda_console::models::Branch;
use comanda_core::{BranchId, TenantId};
use comanda_integration_tests::TestApp;

fn add_branch(app: &TestApp, tenant: &Value, name: &str) -> BranchId {
    let tenant_id: TenantId = tenant["id"]
        .as_str()
        .and_then(|id| id.parse().ok())
        .expect("tenant id");
    let id = BranchId::generate();
    app.store.insert_branch(Branch {
        id,
        tenant_id,
        name: name.to_owned(),
        address: None,
        city: None,
        phone: None,
        is_active: true,
        is_main: false,
        created_at: Utc::now(),
    });
    id
}

#[tokio::test]
async fn test_context_defaults_to_first_branch() {
    let app = TestApp::new();
    let (mut owner, onboarded) = app.onboarded_owner("owner@example.com", "Pho 88").await;

    let context = owner.get("/api/branch-context").await;
    assert_eq!(context.status, StatusCode::OK);
    assert_eq!(context.body["branches"].as_array().map(Vec::len), Some(1));
    assert_eq!(context.body["currentBranch"]["id"], onboarded["branch"]["id"]);
}

#[tokio::test]
async fn test_selection_survives_requests() {
    let app = TestApp::new();
    let (mut owner, onboarded) = app.onboarded_owner("owner@example.com", "Pho 88").await;
    let second = add_branch(&app, &onboarded["tenant"], "Terrace");

    let switched = owner
        .post("/api/branch-context/switch", json!({ "branchId": second }))
        .await;
    assert_eq!(switched.status, StatusCode::OK, "{}", switched.body);
    assert_eq!(switched.body["switched"], true);
    assert_eq!(switched.body["currentBranch"]["name"], "Terrace");

    let reloaded = owner.get("/api/branch-context").await;
    assert_eq!(reloaded.body["currentBranch"]["id"], json!(second));
    assert_eq!(reloaded.body["branches"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn test_unknown_branch_is_ignored() {
    let app = TestApp::new();
    let (mut owner, onboarded) = app.onboarded_owner("owner@example.com", "Pho 88").await;
    let (_, other) = app.onboarded_owner("other@example.com", "Taco Bell").await;

    let foreign = owner
        .post(
            "/api/branch-context/switch",
            json!({ "branchId": other["branch"]["id"] }),
        )
        .await;
    assert_eq!(foreign.status, StatusCode::OK);
    assert_eq!(foreign.body["switched"], false);
    assert_eq!(foreign.body["currentBranch"]["id"], onboarded["branch"]["id"]);
}

#[tokio::test]
async fn test_refresh_picks_up_new_branches() {
    let app = TestApp::new();
    let (mut owner, onboarded) = app.onboarded_owner("owner@example.com", "Pho 88").await;
    let main = &onboarded["branch"]["id"];
    let kept = owner
        .post("/api/branch-context/switch", json!({ "branchId": main }))
        .await;
    assert_eq!(kept.body["switched"], true);

    // Sorts before "Main Branch", so only the saved selection keeps Main current
    add_branch(&app, &onboarded["tenant"], "Annex");
    let refreshed = owner.post("/api/branch-context/refresh", json!({})).await;
    assert_eq!(refreshed.status, StatusCode::OK);
    assert_eq!(refreshed.body["branches"].as_array().map(Vec::len), Some(2));
    assert_eq!(refreshed.body["branches"][0]["name"], "Annex");
    assert_eq!(&refreshed.body["currentBranch"]["id"], main);
}

#[tokio::test]
async fn test_user_without_tenant_has_empty_context() {
    let app = TestApp::new();
    let mut owner = app.owner("Owner", "owner@example.com").await;
    owner.get("/api/me").await;

    let context = owner.get("/api/branch-context").await;
    assert_eq!(context.status, StatusCode::OK);
    assert_eq!(context.body["branches"], json!([]));
    assert!(context.body["currentBranch"].is_null());
}
