//! First-login identity resolution.
//!
//! Maps a session subject to its staff profile, creating a tenant-less owner
//! profile the first time a subject is seen. The unique `auth_subject` column
//! makes concurrent first requests converge on one row.

use serde::Serialize;
use tracing::instrument;

use comanda_core::{StaffRole, SubjectId};

use crate::db::{AccountStore, RepositoryError, StaffStore, TenantStore};
use crate::error::{AppError, StoreContext};
use crate::models::{NewStaffUser, StaffUser, Tenant};

/// Body of `GET /api/me`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user: StaffUser,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant: Option<Tenant>,
    pub needs_onboarding: bool,
}

/// Resolve (or bootstrap) the staff profile for a subject.
///
/// # Errors
///
/// `Unauthorized` if the subject's account no longer exists; store errors
/// otherwise.
#[instrument(skip(store))]
pub async fn resolve<S>(store: &S, subject: SubjectId) -> Result<Identity, AppError>
where
    S: AccountStore + StaffStore + TenantStore,
{
    let user = match store
        .find_staff_by_subject(subject)
        .await
        .store_context("find_staff_by_subject", None)?
    {
        Some(user) => user,
        None => bootstrap(store, subject).await?,
    };

    let tenant = match user.tenant_id {
        Some(tenant_id) => store
            .find_tenant(tenant_id)
            .await
            .store_context("find_tenant", Some(tenant_id))?,
        None => None,
    };

    Ok(Identity {
        needs_onboarding: user.needs_onboarding(),
        user,
        tenant,
    })
}

async fn bootstrap<S>(store: &S, subject: SubjectId) -> Result<StaffUser, AppError>
where
    S: AccountStore + StaffStore,
{
    let account = store
        .find_account(subject)
        .await
        .store_context("find_account", None)?
        .ok_or_else(AppError::unauthorized)?;

    let new_user = NewStaffUser {
        auth_subject: Some(subject),
        tenant_id: None,
        branch_id: None,
        role: StaffRole::Owner,
        name: account.display_name,
        email: Some(account.email.into_inner()),
        phone: account.phone,
    };

    match store.create_staff(new_user).await {
        Ok(user) => {
            tracing::info!(staff_user_id = %user.id, "Bootstrapped staff profile");
            Ok(user)
        }
        // Lost the race against a concurrent first request.
        Err(RepositoryError::Conflict(_)) => store
            .find_staff_by_subject(subject)
            .await
            .store_context("find_staff_by_subject", None)?
            .ok_or_else(|| AppError::Unexpected("staff profile vanished after conflict".to_owned())),
        Err(source) => Err(AppError::Store {
            operation: "create_staff",
            tenant_id: None,
            source,
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use serde_json::json;

    use comanda_core::Email;

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::AuthAccount;
    use crate::services::testing::{staff, tenant};

    fn account(store: &MemoryStore) -> AuthAccount {
        let account = AuthAccount {
            id: SubjectId::generate(),
            email: Email::parse("ana@example.com").unwrap(),
            password_hash: "x".to_owned(),
            display_name: "Ana".to_owned(),
            phone: Some("555-0100".to_owned()),
            metadata: json!({}),
            confirmed_at: None,
            created_at: Utc::now(),
        };
        store.insert_account(account.clone());
        account
    }

    #[tokio::test]
    async fn test_first_login_bootstraps_owner() {
        let store = MemoryStore::new();
        let account = account(&store);

        let identity = resolve(&store, account.id).await.unwrap();
        assert!(identity.needs_onboarding);
        assert!(identity.tenant.is_none());
        assert_eq!(identity.user.role, StaffRole::Owner);
        assert_eq!(identity.user.name, "Ana");
        assert_eq!(identity.user.email.as_deref(), Some("ana@example.com"));
        assert_eq!(identity.user.phone.as_deref(), Some("555-0100"));
    }

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        let store = MemoryStore::new();
        let account = account(&store);

        let first = resolve(&store, account.id).await.unwrap();
        let second = resolve(&store, account.id).await.unwrap();
        assert_eq!(first.user.id, second.user.id);
        assert_eq!(store.staff().len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_bootstrap_converges() {
        let store = MemoryStore::new();
        let account = account(&store);

        let (a, b) = tokio::join!(resolve(&store, account.id), resolve(&store, account.id));
        assert_eq!(a.unwrap().user.id, b.unwrap().user.id);
        assert_eq!(store.staff().len(), 1);
    }

    #[tokio::test]
    async fn test_existing_user_gets_tenant() {
        let store = MemoryStore::new();
        let t = tenant(&store, "Pho 88");
        let user = staff(&store, Some(t.id), StaffRole::Cashier);

        let identity = resolve(&store, user.auth_subject.unwrap()).await.unwrap();
        assert!(!identity.needs_onboarding);
        assert_eq!(identity.tenant.unwrap().id, t.id);
        assert_eq!(identity.user.id, user.id);
    }

    #[tokio::test]
    async fn test_unknown_subject_is_unauthorized() {
        let store = MemoryStore::new();
        let err = resolve(&store, SubjectId::generate()).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_identity_json_shape() {
        let store = MemoryStore::new();
        let account = account(&store);
        let identity = resolve(&store, account.id).await.unwrap();

        let body = serde_json::to_value(&identity).unwrap();
        assert_eq!(body["needsOnboarding"], json!(true));
        assert!(body.get("tenant").is_none());
        assert_eq!(body["user"]["role"], json!("owner"));
    }
}
