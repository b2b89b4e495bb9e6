//! Tenant onboarding.
//!
//! The dashboard collects the institution and its first branch in two wizard
//! steps and submits them together. The tenant, the main branch and the owner
//! promotion are written in one transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use comanda_core::{Email, SubjectId, institution_slug};

use crate::db::{OnboardingRecord, RepositoryError, StaffStore};
use crate::error::AppError;
use crate::models::{Branch, NewBranch, NewTenant, Tenant};

/// Name given to the first branch when the wizard leaves it blank.
pub const DEFAULT_BRANCH_NAME: &str = "Main Branch";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionInput {
    #[serde(default)]
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchInput {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub phone: Option<String>,
}

/// Body of `POST /api/onboarding`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingRequest {
    #[serde(default)]
    pub institution: InstitutionInput,
    #[serde(default)]
    pub branch: BranchInput,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnboardingResponse {
    pub tenant: Tenant,
    pub branch: Branch,
}

/// Trimmed value, or `None` when blank.
fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

/// Validate the submission and fill in branch defaults.
///
/// # Errors
///
/// `Validation` for a blank institution name or a malformed email.
pub fn build_record(
    request: &OnboardingRequest,
    now: DateTime<Utc>,
) -> Result<OnboardingRecord, AppError> {
    let institution = &request.institution;
    let name = institution.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation(
            "Institution name is required".to_owned(),
        ));
    }

    let email = non_blank(institution.email.as_deref())
        .map(|raw| Email::parse(&raw))
        .transpose()
        .map_err(|_| AppError::Validation("Invalid institution email".to_owned()))?
        .map(Email::into_inner);

    let tenant = NewTenant {
        name: name.to_owned(),
        slug: institution_slug(name, now),
        email,
        phone: non_blank(institution.phone.as_deref()),
        address: non_blank(institution.address.as_deref()),
        city: non_blank(institution.city.as_deref()),
    };

    let branch_input = &request.branch;
    let branch = NewBranch {
        name: non_blank(branch_input.name.as_deref())
            .unwrap_or_else(|| DEFAULT_BRANCH_NAME.to_owned()),
        address: non_blank(branch_input.address.as_deref()).or_else(|| tenant.address.clone()),
        city: non_blank(branch_input.city.as_deref()).or_else(|| tenant.city.clone()),
        phone: non_blank(branch_input.phone.as_deref()).or_else(|| tenant.phone.clone()),
        is_main: true,
    };

    Ok(OnboardingRecord { tenant, branch })
}

/// Create the tenant and its main branch and make the subject its owner.
///
/// # Errors
///
/// `Validation` for bad input, `ProfileNotFound` if the subject has no staff
/// profile, `Conflict` if the profile already belongs to a tenant.
#[instrument(skip(store, request))]
pub async fn complete<S: StaffStore>(
    store: &S,
    subject: SubjectId,
    request: &OnboardingRequest,
) -> Result<OnboardingResponse, AppError> {
    let record = build_record(request, Utc::now())?;

    let onboarded = store
        .complete_onboarding(subject, record)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => AppError::ProfileNotFound,
            RepositoryError::Conflict(msg) => AppError::Conflict(msg),
            source => AppError::Store {
                operation: "complete_onboarding",
                tenant_id: None,
                source,
            },
        })?;

    tracing::info!(
        tenant_id = %onboarded.tenant.id,
        staff_user_id = %onboarded.user.id,
        slug = %onboarded.tenant.slug,
        "Onboarding completed"
    );

    Ok(OnboardingResponse {
        tenant: onboarded.tenant,
        branch: onboarded.branch,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use comanda_core::StaffRole;

    use super::*;
    use crate::db::MemoryStore;
    use crate::services::testing::{staff, tenant};

    fn request(name: &str) -> OnboardingRequest {
        OnboardingRequest {
            institution: InstitutionInput {
                name: name.to_owned(),
                email: Some("hola@mamas.example".to_owned()),
                phone: Some("555-0100".to_owned()),
                address: Some("Av. Central 1".to_owned()),
                city: Some("Lima".to_owned()),
            },
            branch: BranchInput::default(),
        }
    }

    #[test]
    fn test_name_required() {
        let err = build_record(&request("   "), Utc::now()).unwrap_err();
        assert!(matches!(err, AppError::Validation(msg) if msg == "Institution name is required"));
    }

    #[test]
    fn test_branch_defaults_from_institution() {
        let record = build_record(&request("Mama's Kitchen!!"), Utc::now()).unwrap();
        assert!(record.tenant.slug.starts_with("mama-s-kitchen-"));
        assert_eq!(record.branch.name, DEFAULT_BRANCH_NAME);
        assert_eq!(record.branch.address.as_deref(), Some("Av. Central 1"));
        assert_eq!(record.branch.phone.as_deref(), Some("555-0100"));
        assert_eq!(record.branch.city.as_deref(), Some("Lima"));
        assert!(record.branch.is_main);
    }

    #[test]
    fn test_branch_values_win_over_defaults() {
        let mut req = request("Pho 88");
        req.branch = BranchInput {
            name: Some(" Centro ".to_owned()),
            address: Some("Jr. Union 5".to_owned()),
            city: Some("  ".to_owned()),
            phone: None,
        };
        let record = build_record(&req, Utc::now()).unwrap();
        assert_eq!(record.branch.name, "Centro");
        assert_eq!(record.branch.address.as_deref(), Some("Jr. Union 5"));
        assert_eq!(record.branch.city.as_deref(), Some("Lima"));
    }

    #[test]
    fn test_invalid_email_rejected() {
        let mut req = request("Pho 88");
        req.institution.email = Some("not-an-email".to_owned());
        assert!(matches!(
            build_record(&req, Utc::now()),
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_complete_promotes_owner() {
        let store = MemoryStore::new();
        let user = staff(&store, None, StaffRole::Owner);

        let response = complete(&store, user.auth_subject.unwrap(), &request("Pho 88"))
            .await
            .unwrap();

        let staff_rows = store.staff();
        let promoted = staff_rows.iter().find(|u| u.id == user.id).unwrap();
        assert_eq!(promoted.tenant_id, Some(response.tenant.id));
        assert_eq!(promoted.branch_id, Some(response.branch.id));
        assert_eq!(promoted.role, StaffRole::Owner);
        assert_eq!(response.branch.tenant_id, response.tenant.id);
    }

    #[tokio::test]
    async fn test_second_onboarding_conflicts() {
        let store = MemoryStore::new();
        let t = tenant(&store, "Existing");
        let user = staff(&store, Some(t.id), StaffRole::Owner);

        let err = complete(&store, user.auth_subject.unwrap(), &request("Pho 88"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(store.tenants().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_step_persists_nothing() {
        let store = MemoryStore::new();
        let user = staff(&store, None, StaffRole::Owner);
        store.fail_operation("promote_owner");

        let err = complete(&store, user.auth_subject.unwrap(), &request("Pho 88"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Store { .. }));
        assert!(store.tenants().is_empty());
        assert!(store.branches().is_empty());
        assert!(store.staff()[0].tenant_id.is_none());
    }

    #[tokio::test]
    async fn test_missing_profile() {
        let store = MemoryStore::new();
        let err = complete(&store, SubjectId::generate(), &request("Pho 88"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ProfileNotFound));
    }
}
