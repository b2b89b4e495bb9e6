//! Account routes: owner registration, login, logout and staff signup.

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::db::ConsoleStore;
use crate::error::AppError;
use crate::middleware::{ApiJson, clear_session, set_current_subject};
use crate::services::auth::AuthService;
use crate::services::signup::{self, StaffSignupRequest, StaffSignupResponse};
use crate::state::AppState;

pub fn router<S: ConsoleStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/api/auth/register", post(register::<S>))
        .route("/api/auth/login", post(login::<S>))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/staff-signup", post(staff_signup::<S>))
}

#[derive(Clone, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// Register an owner account and sign it in.
#[instrument(skip_all)]
async fn register<S: ConsoleStore>(
    State(state): State<AppState<S>>,
    session: Session,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    let account = AuthService::new(state.store())
        .register_owner(&body.name, &body.email, &body.password)
        .await?;
    set_current_subject(&session, account.id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

#[instrument(skip_all)]
async fn login<S: ConsoleStore>(
    State(state): State<AppState<S>>,
    session: Session,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<SuccessResponse>, AppError> {
    let account = AuthService::new(state.store())
        .login(&body.email, &body.password)
        .await?;
    set_current_subject(&session, account.id).await?;
    tracing::info!(subject = %account.id, "Signed in");
    Ok(Json(SuccessResponse { success: true }))
}

#[instrument(skip_all)]
async fn logout(session: Session) -> Result<Json<SuccessResponse>, AppError> {
    clear_session(&session).await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// Public: join a tenant with an institution code.
#[instrument(skip_all)]
async fn staff_signup<S: ConsoleStore>(
    State(state): State<AppState<S>>,
    ApiJson(body): ApiJson<StaffSignupRequest>,
) -> Result<Json<StaffSignupResponse>, AppError> {
    signup::register(state.store(), body).await.map(Json)
}
