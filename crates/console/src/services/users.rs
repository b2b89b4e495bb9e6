//! Staff listing and role/branch assignment.

use serde::{Deserialize, Deserializer};
use tracing::instrument;

use comanda_core::{BranchId, StaffRole, StaffUserId};

use super::Caller;
use crate::db::{BranchStore, RepositoryError, StaffStore};
use crate::error::{AppError, StoreContext};
use crate::models::{StaffListing, StaffPatch, StaffUser};

const NOT_FOUND: &str = "User not found";

/// Body of `PATCH /api/users/{id}`.
///
/// An absent `branchId` leaves the branch alone; an explicit `null` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub role: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub branch_id: Option<Option<BranchId>>,
}

/// Wraps any present value (including `null`) in `Some`.
fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Staff of the caller's tenant, newest first.
///
/// # Errors
///
/// Store failures.
#[instrument(skip(store, caller), fields(tenant_id = %caller.tenant_id))]
pub async fn list<S: StaffStore>(store: &S, caller: &Caller) -> Result<Vec<StaffListing>, AppError> {
    store
        .list_staff(caller.tenant_id)
        .await
        .store_context("list_staff", Some(caller.tenant_id))
}

/// Change a staff member's role and/or branch.
///
/// # Errors
///
/// `PermissionDenied` for operational roles and for managers assigning
/// `owner`, `Validation` for an unknown role or foreign branch, and `NotFound`
/// for missing and foreign users alike.
#[instrument(skip(store, caller, request), fields(tenant_id = %caller.tenant_id))]
pub async fn update<S>(
    store: &S,
    caller: &Caller,
    id: StaffUserId,
    request: UpdateUserRequest,
) -> Result<StaffUser, AppError>
where
    S: StaffStore + BranchStore,
{
    caller.require_manager()?;

    let role = request
        .role
        .as_deref()
        .map(|raw| {
            raw.parse::<StaffRole>()
                .map_err(|_| AppError::Validation(format!("Invalid role: {raw}")))
        })
        .transpose()?;

    let target = store
        .find_staff(id)
        .await
        .store_context("find_staff", Some(caller.tenant_id))?
        .filter(|user| user.tenant_id == Some(caller.tenant_id))
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_owned()))?;

    if role.is_some_and(|role| !caller.user.role.can_assign(role)) {
        return Err(AppError::PermissionDenied(
            "Only owners can assign the owner role".to_owned(),
        ));
    }

    if let Some(Some(branch_id)) = request.branch_id {
        store
            .find_branch(branch_id)
            .await
            .store_context("find_branch", Some(caller.tenant_id))?
            .filter(|branch| branch.tenant_id == caller.tenant_id)
            .ok_or_else(|| AppError::Validation("Branch not found".to_owned()))?;
    }

    let patch = StaffPatch {
        role,
        branch_id: request.branch_id,
    };
    if patch.is_empty() {
        return Ok(target);
    }

    let updated = store
        .update_staff(id, caller.tenant_id, &patch)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::NotFound(NOT_FOUND.to_owned()),
            source => AppError::Store {
                operation: "update_staff",
                tenant_id: Some(caller.tenant_id),
                source,
            },
        })?;

    tracing::info!(
        staff_user_id = %updated.id,
        role = %updated.role,
        branch_id = ?updated.branch_id,
        "Staff user updated"
    );
    Ok(updated)
}
