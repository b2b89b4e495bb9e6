//! Institution code administration.
//!
//! Writes check the caller's role before the path id or the body is looked
//! at, so operational roles always get `PermissionDenied`.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch},
};
use serde::Serialize;
use tracing::instrument;

use comanda_core::InstitutionCodeId;

use super::auth::SuccessResponse;
use crate::db::ConsoleStore;
use crate::error::AppError;
use crate::middleware::{ApiJson, TenantStaff};
use crate::models::InstitutionCode;
use crate::services::codes::{self, CreateCodeRequest, UpdateCodeRequest};
use crate::state::AppState;

pub fn router<S: ConsoleStore>() -> Router<AppState<S>> {
    Router::new()
        .route(
            "/api/institution-codes",
            get(list::<S>).post(create::<S>),
        )
        .route(
            "/api/institution-codes/{id}",
            patch(update::<S>).delete(delete::<S>),
        )
}

#[derive(Debug, Serialize)]
pub struct CodesResponse {
    pub codes: Vec<InstitutionCode>,
}

/// A malformed id names no code, so it gets the same answer as a missing one.
fn parse_id(raw: &str) -> Result<InstitutionCodeId, AppError> {
    raw.parse()
        .map_err(|_| AppError::NotFound("Institution code not found".to_owned()))
}

#[instrument(skip_all, fields(tenant_id = %caller.tenant_id))]
async fn list<S: ConsoleStore>(
    State(state): State<AppState<S>>,
    TenantStaff(caller): TenantStaff,
) -> Result<Json<CodesResponse>, AppError> {
    let codes = codes::list(state.store(), &caller).await?;
    Ok(Json(CodesResponse { codes }))
}

#[instrument(skip_all, fields(tenant_id = %caller.tenant_id))]
async fn create<S: ConsoleStore>(
    State(state): State<AppState<S>>,
    TenantStaff(caller): TenantStaff,
    body: Result<ApiJson<CreateCodeRequest>, AppError>,
) -> Result<(StatusCode, Json<InstitutionCode>), AppError> {
    caller.require_manager()?;
    let ApiJson(body) = body?;
    let code = codes::create(state.store(), &caller, body).await?;
    Ok((StatusCode::CREATED, Json(code)))
}

#[instrument(skip_all, fields(tenant_id = %caller.tenant_id, code_id = %id))]
async fn update<S: ConsoleStore>(
    State(state): State<AppState<S>>,
    TenantStaff(caller): TenantStaff,
    Path(id): Path<String>,
    body: Result<ApiJson<UpdateCodeRequest>, AppError>,
) -> Result<Json<InstitutionCode>, AppError> {
    caller.require_manager()?;
    let id = parse_id(&id)?;
    let ApiJson(body) = body?;
    let code = codes::set_active(state.store(), &caller, id, body.is_active).await?;
    Ok(Json(code))
}

#[instrument(skip_all, fields(tenant_id = %caller.tenant_id, code_id = %id))]
async fn delete<S: ConsoleStore>(
    State(state): State<AppState<S>>,
    TenantStaff(caller): TenantStaff,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    caller.require_manager()?;
    let id = parse_id(&id)?;
    codes::delete(state.store(), &caller, id).await?;
    Ok(Json(SuccessResponse { success: true }))
}
