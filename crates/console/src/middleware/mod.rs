//! HTTP middleware and extractors.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `CatchPanicLayer` (panics become a JSON 500)
//! 3. `TraceLayer` (request span with status and latency)
//! 4. Session layer (tower-sessions with `PostgreSQL` store)
//!
//! Authentication is enforced per handler through the [`CurrentSubject`] and
//! [`TenantStaff`] extractors rather than a blanket guard, since the public
//! auth routes share the router.

pub mod auth;
pub mod json;
pub mod session;

pub use auth::{CurrentSubject, TenantStaff, clear_session, set_current_subject};
pub use json::ApiJson;
pub use session::{SessionSelection, create_session_layer, session_layer};
