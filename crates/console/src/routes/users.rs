//! Staff administration.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, patch},
};
use serde::Serialize;
use tracing::instrument;

use comanda_core::StaffUserId;

use crate::db::ConsoleStore;
use crate::error::AppError;
use crate::middleware::{ApiJson, TenantStaff};
use crate::models::{StaffListing, StaffUser};
use crate::services::users::{self, UpdateUserRequest};
use crate::state::AppState;

pub fn router<S: ConsoleStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/api/users", get(list::<S>))
        .route("/api/users/{id}", patch(update::<S>))
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<StaffListing>,
}

#[instrument(skip_all, fields(tenant_id = %caller.tenant_id))]
async fn list<S: ConsoleStore>(
    State(state): State<AppState<S>>,
    TenantStaff(caller): TenantStaff,
) -> Result<Json<UsersResponse>, AppError> {
    let users = users::list(state.store(), &caller).await?;
    Ok(Json(UsersResponse { users }))
}

#[instrument(skip_all, fields(tenant_id = %caller.tenant_id, user_id = %id))]
async fn update<S: ConsoleStore>(
    State(state): State<AppState<S>>,
    TenantStaff(caller): TenantStaff,
    Path(id): Path<String>,
    body: Result<ApiJson<UpdateUserRequest>, AppError>,
) -> Result<Json<StaffUser>, AppError> {
    // Role before id and body
    caller.require_manager()?;
    let id: StaffUserId = id
        .parse()
        .map_err(|_| AppError::NotFound("User not found".to_owned()))?;
    let ApiJson(body) = body?;
    let user = users::update(state.store(), &caller, id, body).await?;
    Ok(Json(user))
}
