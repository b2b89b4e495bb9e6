//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                       - Liveness
//! GET    /health/ready                 - Readiness (store ping)
//!
//! # Auth (public)
//! POST   /api/auth/register            - Owner account registration
//! POST   /api/auth/login               - Email/password login
//! POST   /api/auth/logout              - Logout
//! POST   /api/auth/staff-signup        - Staff signup with an institution code
//!
//! # Identity and onboarding (session)
//! GET    /api/me                       - Current staff user (bootstrapped on first call)
//! POST   /api/onboarding               - Create institution and first branch
//!
//! # Branch context (session)
//! GET    /api/branch-context           - Branches and current branch
//! POST   /api/branch-context/switch    - Select a branch
//! POST   /api/branch-context/refresh   - Re-fetch branches
//!
//! # Tenant resources (tenant staff; writes need owner or manager)
//! GET    /api/branches                 - Branches by name
//! GET    /api/institution-codes        - Codes, newest first
//! POST   /api/institution-codes        - Create code
//! PATCH  /api/institution-codes/{id}   - Toggle active
//! DELETE /api/institution-codes/{id}   - Delete code
//! GET    /api/users                    - Staff list
//! PATCH  /api/users/{id}               - Change role / branch
//! GET    /api/customers                - Customer list with derived metrics
//! ```

pub mod auth;
pub mod branch_context;
pub mod branches;
pub mod customers;
pub mod health;
pub mod institution_codes;
pub mod me;
pub mod onboarding;
pub mod users;

use std::any::Any;

use axum::{
    Router,
    response::{IntoResponse, Response},
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    trace::{DefaultOnResponse, OnResponse, TraceLayer},
};
use tower_sessions::{SessionManagerLayer, SessionStore};
use tracing::Span;

use crate::db::ConsoleStore;
use crate::error::AppError;
use crate::state::AppState;

/// Build the complete API router.
pub fn routes<S: ConsoleStore>() -> Router<AppState<S>> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(me::router())
        .merge(onboarding::router())
        .merge(branch_context::router())
        .merge(branches::router())
        .merge(institution_codes::router())
        .merge(users::router())
        .merge(customers::router())
}

/// The full application: routes plus sessions, tracing and panic recovery.
///
/// Sentry layers are added by the binary, outside of this.
pub fn app<S, St>(state: AppState<S>, sessions: SessionManagerLayer<St>) -> Router
where
    S: ConsoleStore,
    St: SessionStore + Clone,
{
    routes()
        .layer(sessions)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .layer(CatchPanicLayer::custom(panic_response))
        .with_state(state)
}

/// Turn a handler panic into the generic JSON 500.
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    AppError::Unexpected(format!("handler panicked: {detail}")).into_response()
}
