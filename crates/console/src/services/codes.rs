//! Institution code administration (owners and managers only).

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::instrument;

use comanda_core::{InstitutionCodeError, InstitutionCodeId, normalize_code};

use super::Caller;
use crate::db::{CodeStore, RepositoryError};
use crate::error::{AppError, StoreContext};
use crate::models::{InstitutionCode, NewInstitutionCode};

const NOT_FOUND: &str = "Institution code not found";

/// Body of `POST /api/institution-codes`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCodeRequest {
    #[serde(default)]
    pub code: String,
    pub name: Option<String>,
    pub max_uses: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Body of `PATCH /api/institution-codes/{id}`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCodeRequest {
    pub is_active: bool,
}

/// # Errors
///
/// `PermissionDenied` for roles other than owner and manager.
#[instrument(skip(store, caller), fields(tenant_id = %caller.tenant_id))]
pub async fn list<S: CodeStore>(
    store: &S,
    caller: &Caller,
) -> Result<Vec<InstitutionCode>, AppError> {
    caller.require_manager()?;
    store
        .list_codes(caller.tenant_id)
        .await
        .store_context("list_codes", Some(caller.tenant_id))
}

/// # Errors
///
/// `PermissionDenied`, `Validation` for a blank code or non-positive cap, and
/// `Conflict` when the code value is already taken by any tenant.
#[instrument(skip(store, caller, request), fields(tenant_id = %caller.tenant_id))]
pub async fn create<S: CodeStore>(
    store: &S,
    caller: &Caller,
    request: CreateCodeRequest,
) -> Result<InstitutionCode, AppError> {
    caller.require_manager()?;

    let code = normalize_code(&request.code).map_err(|e| match e {
        InstitutionCodeError::Empty => AppError::Validation("Code is required".to_owned()),
        InstitutionCodeError::TooLong => AppError::Validation(format!(
            "Code must be at most {} characters",
            comanda_core::MAX_CODE_LENGTH
        )),
    })?;
    if request.max_uses.is_some_and(|max| max <= 0) {
        return Err(AppError::Validation(
            "Max uses must be greater than zero".to_owned(),
        ));
    }

    let new_code = NewInstitutionCode {
        code,
        name: request
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_owned),
        max_uses: request.max_uses,
        expires_at: request.expires_at,
        created_by: Some(caller.user.id),
    };

    let created = store
        .create_code(caller.tenant_id, new_code)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AppError::Conflict(
                "An institution code with this value already exists".to_owned(),
            ),
            source => AppError::Store {
                operation: "create_code",
                tenant_id: Some(caller.tenant_id),
                source,
            },
        })?;

    tracing::info!(code_id = %created.id, code = %created.code, "Institution code created");
    Ok(created)
}

/// Load a code, reporting other tenants' codes as missing.
async fn owned_code<S: CodeStore>(
    store: &S,
    caller: &Caller,
    id: InstitutionCodeId,
) -> Result<InstitutionCode, AppError> {
    store
        .find_code(id)
        .await
        .store_context("find_code", Some(caller.tenant_id))?
        .filter(|code| code.tenant_id == caller.tenant_id)
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_owned()))
}

/// Toggle `is_active`; nothing else changes.
///
/// # Errors
///
/// `PermissionDenied`, or `NotFound` for missing and foreign codes alike.
#[instrument(skip(store, caller), fields(tenant_id = %caller.tenant_id))]
pub async fn set_active<S: CodeStore>(
    store: &S,
    caller: &Caller,
    id: InstitutionCodeId,
    is_active: bool,
) -> Result<InstitutionCode, AppError> {
    caller.require_manager()?;
    owned_code(store, caller, id).await?;

    store
        .set_code_active(id, caller.tenant_id, is_active)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(NOT_FOUND.to_owned()),
            source => AppError::Store {
                operation: "set_code_active",
                tenant_id: Some(caller.tenant_id),
                source,
            },
        })
}

/// Hard delete.
///
/// # Errors
///
/// `PermissionDenied`, or `NotFound` for missing and foreign codes alike.
#[instrument(skip(store, caller), fields(tenant_id = %caller.tenant_id))]
pub async fn delete<S: CodeStore>(
    store: &S,
    caller: &Caller,
    id: InstitutionCodeId,
) -> Result<(), AppError> {
    caller.require_manager()?;
    owned_code(store, caller, id).await?;

    let deleted = store
        .delete_code(id, caller.tenant_id)
        .await
        .store_context("delete_code", Some(caller.tenant_id))?;
    if !deleted {
        return Err(AppError::NotFound(NOT_FOUND.to_owned()));
    }

    tracing::info!(code_id = %id, "Institution code deleted");
    Ok(())
}
