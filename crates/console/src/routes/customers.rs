//! Customer list.

use axum::{
    Json, Router,
    extract::{Query, State, rejection::QueryRejection},
    routing::get,
};
use chrono::Utc;
use tracing::instrument;

use crate::db::ConsoleStore;
use crate::error::AppError;
use crate::middleware::TenantStaff;
use crate::services::customers::{self, CustomerPage, CustomerQuery};
use crate::state::AppState;

pub fn router<S: ConsoleStore>() -> Router<AppState<S>> {
    Router::new().route("/api/customers", get(list::<S>))
}

/// `?search=&segment=&page=&pageSize=`; segment is one of the list tabs.
#[instrument(skip_all, fields(tenant_id = %caller.tenant_id))]
async fn list<S: ConsoleStore>(
    State(state): State<AppState<S>>,
    TenantStaff(caller): TenantStaff,
    query: Result<Query<CustomerQuery>, QueryRejection>,
) -> Result<Json<CustomerPage>, AppError> {
    let Query(query) = query.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    let page = customers::list(state.store(), &caller, &query, Utc::now()).await?;
    Ok(Json(page))
}
