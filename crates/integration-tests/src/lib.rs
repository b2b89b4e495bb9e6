//! Test harness for the Comanda console.
//!
//! [`TestApp`] builds the real router over the in-memory store and in-memory
//! sessions. [`Agent`] drives it with `tower::ServiceExt::oneshot`, carrying
//! the session cookie between requests like a browser would.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process HTTP tests
//! cargo test -p comanda-integration-tests
//!
//! # Live-server tests (needs a running console and database)
//! cargo test -p comanda-integration-tests -- --ignored
//! ```

#![allow(clippy::missing_panics_doc)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::ServiceExt;

use comanda_console::db::MemoryStore;
use comanda_console::middleware::session_layer;
use comanda_console::routes;
use comanda_console::state::AppState;

/// Password used for every account the helpers create.
pub const PASSWORD: &str = "correct-horse-battery";

/// The console router over a fresh in-memory store.
#[derive(Clone)]
pub struct TestApp {
    router: Router,
    pub store: MemoryStore,
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let sessions = session_layer(tower_sessions::MemoryStore::default(), false, 24);
        let router = routes::app(AppState::new(store.clone()), sessions);
        Self { router, store }
    }

    /// A client with no session.
    #[must_use]
    pub fn agent(&self) -> Agent {
        Agent {
            router: self.router.clone(),
            cookie: None,
        }
    }

    /// Register a fresh owner account; the returned agent is signed in.
    pub async fn owner(&self, name: &str, email: &str) -> Agent {
        let mut agent = self.agent();
        let response = agent
            .post(
                "/api/auth/register",
                json!({ "name": name, "email": email, "password": PASSWORD }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        agent
    }

    /// Register an owner, load its profile and complete onboarding for
    /// `institution`.
    ///
    /// Returns the agent and the onboarding response (`tenant`, `branch`).
    pub async fn onboarded_owner(&self, email: &str, institution: &str) -> (Agent, Value) {
        let mut agent = self.owner("Owner", email).await;
        assert_eq!(agent.get("/api/me").await.status, StatusCode::OK);
        let response = agent
            .post(
                "/api/onboarding",
                json!({ "institution": { "name": institution } }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        (agent, response.body)
    }

    /// Sign up a staff member with `code`, then sign them in.
    pub async fn staff(&self, email: &str, code: &str) -> Agent {
        let mut agent = self.agent();
        let response = agent
            .post(
                "/api/auth/staff-signup",
                json!({
                    "name": "Staff Member",
                    "email": email,
                    "password": PASSWORD,
                    "institutionCode": code,
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        agent.login(email).await;
        agent
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// A response with its body parsed as JSON (plain text becomes a string).
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestResponse {
    /// The `error` message of a failed request.
    #[must_use]
    pub fn error(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}

/// A cookie-carrying client.
pub struct Agent {
    router: Router,
    cookie: Option<String>,
}

impl Agent {
    pub async fn send(&mut self, method: Method, path: &str, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        if let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
        {
            self.cookie = set_cookie.split(';').next().map(str::to_owned);
        }

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        TestResponse { status, body }
    }

    pub async fn get(&mut self, path: &str) -> TestResponse {
        self.send(Method::GET, path, None).await
    }

    pub async fn post(&mut self, path: &str, body: Value) -> TestResponse {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn patch(&mut self, path: &str, body: Value) -> TestResponse {
        self.send(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete(&mut self, path: &str) -> TestResponse {
        self.send(Method::DELETE, path, None).await
    }

    /// Sign in with [`PASSWORD`].
    pub async fn login(&mut self, email: &str) {
        let response = self
            .post(
                "/api/auth/login",
                json!({ "email": email, "password": PASSWORD }),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    }

    /// Create an institution code; returns its JSON.
    pub async fn create_code(&mut self, body: Value) -> Value {
        let response = self.post("/api/institution-codes", body).await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body
    }
}
