//! Onboarding endpoint.

use axum::{Json, Router, extract::State, routing::post};
use tracing::instrument;

use crate::db::ConsoleStore;
use crate::error::AppError;
use crate::middleware::{ApiJson, CurrentSubject};
use crate::services::onboarding::{self, OnboardingRequest, OnboardingResponse};
use crate::state::AppState;

pub fn router<S: ConsoleStore>() -> Router<AppState<S>> {
    Router::new().route("/api/onboarding", post(complete::<S>))
}

#[instrument(skip_all, fields(subject = %subject))]
async fn complete<S: ConsoleStore>(
    State(state): State<AppState<S>>,
    CurrentSubject(subject): CurrentSubject,
    ApiJson(body): ApiJson<OnboardingRequest>,
) -> Result<Json<OnboardingResponse>, AppError> {
    onboarding::complete(state.store(), subject, &body)
        .await
        .map(Json)
}
