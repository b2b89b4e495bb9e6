//! Branch listing.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use tracing::instrument;

use comanda_core::BranchId;

use crate::db::ConsoleStore;
use crate::error::{AppError, StoreContext};
use crate::middleware::TenantStaff;
use crate::state::AppState;

pub fn router<S: ConsoleStore>() -> Router<AppState<S>> {
    Router::new().route("/api/branches", get(list::<S>))
}

#[derive(Debug, Serialize)]
pub struct BranchOption {
    pub id: BranchId,
    pub name: String,
    pub address: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BranchesResponse {
    pub branches: Vec<BranchOption>,
}

#[instrument(skip_all, fields(tenant_id = %caller.tenant_id))]
async fn list<S: ConsoleStore>(
    State(state): State<AppState<S>>,
    TenantStaff(caller): TenantStaff,
) -> Result<Json<BranchesResponse>, AppError> {
    let branches = state
        .store()
        .list_branches(caller.tenant_id)
        .await
        .store_context("list_branches", Some(caller.tenant_id))?;

    Ok(Json(BranchesResponse {
        branches: branches
            .into_iter()
            .map(|b| BranchOption {
                id: b.id,
                name: b.name,
                address: b.address,
            })
            .collect(),
    }))
}
