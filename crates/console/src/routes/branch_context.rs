//! Branch context endpoints.
//!
//! Each request rebuilds the context from the store and restores the
//! selection from the session, so the selection survives reloads.

use axum::{Json, Router, extract::State, routing::{get, post}};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use comanda_core::{BranchId, SubjectId};

use crate::db::ConsoleStore;
use crate::error::{AppError, StoreContext};
use crate::middleware::{ApiJson, CurrentSubject, SessionSelection};
use crate::models::StaffUser;
use crate::services::branch_context::{BranchContext, BranchSnapshot};
use crate::state::AppState;

pub fn router<S: ConsoleStore>() -> Router<AppState<S>> {
    Router::new()
        .route("/api/branch-context", get(current::<S>))
        .route("/api/branch-context/switch", post(switch::<S>))
        .route("/api/branch-context/refresh", post(refresh::<S>))
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchRequest {
    pub branch_id: BranchId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchResponse {
    pub switched: bool,
    #[serde(flatten)]
    pub context: BranchSnapshot,
}

async fn staff_user<S: ConsoleStore>(
    state: &AppState<S>,
    subject: SubjectId,
) -> Result<StaffUser, AppError> {
    state
        .store()
        .find_staff_by_subject(subject)
        .await
        .store_context("find_staff_by_subject", None)?
        .ok_or(AppError::ProfileNotFound)
}

async fn load<S: ConsoleStore>(
    state: &AppState<S>,
    subject: SubjectId,
    session: Session,
) -> Result<(BranchContext<SessionSelection>, BranchSnapshot), AppError> {
    let user = staff_user(state, subject).await?;
    let context = BranchContext::new(SessionSelection::new(session));
    let snapshot = context.initialize(state.store(), &user).await?;
    Ok((context, snapshot))
}

#[instrument(skip_all, fields(subject = %subject))]
async fn current<S: ConsoleStore>(
    State(state): State<AppState<S>>,
    CurrentSubject(subject): CurrentSubject,
    session: Session,
) -> Result<Json<BranchSnapshot>, AppError> {
    let (_, snapshot) = load(&state, subject, session).await?;
    Ok(Json(snapshot))
}

/// Unknown or foreign branch ids are ignored (`switched: false`).
#[instrument(skip_all, fields(subject = %subject))]
async fn switch<S: ConsoleStore>(
    State(state): State<AppState<S>>,
    CurrentSubject(subject): CurrentSubject,
    session: Session,
    ApiJson(body): ApiJson<SwitchRequest>,
) -> Result<Json<SwitchResponse>, AppError> {
    let (context, _) = load(&state, subject, session).await?;
    let switched = context.switch_branch(body.branch_id).await?;
    Ok(Json(SwitchResponse {
        switched,
        context: context.snapshot(),
    }))
}

#[instrument(skip_all, fields(subject = %subject))]
async fn refresh<S: ConsoleStore>(
    State(state): State<AppState<S>>,
    CurrentSubject(subject): CurrentSubject,
    session: Session,
) -> Result<Json<BranchSnapshot>, AppError> {
    let user = staff_user(&state, subject).await?;
    let context = BranchContext::new(SessionSelection::new(session));
    let snapshot = match user.tenant_id {
        Some(tenant_id) => context.refresh_branches(state.store(), tenant_id).await?,
        None => context.initialize(state.store(), &user).await?,
    };
    Ok(Json(snapshot))
}
