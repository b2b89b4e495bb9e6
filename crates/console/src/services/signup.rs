//! Staff signup through an institution code.
//!
//! The only path that creates accounts on someone else's behalf. The code is
//! checked up front for a friendly error, then re-checked under a row lock by
//! [`StaffStore::register_staff`], which creates the account and staff profile
//! and counts the use atomically.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use comanda_core::{Email, InstitutionCodeError, normalize_code};

use super::auth::{hash_password, validate_password};
use crate::db::{CodeStore, RegistrationError, StaffRegistration, StaffStore};
use crate::error::{AppError, StoreContext};
use crate::models::CodeRejection;

/// Body of `POST /api/auth/staff-signup`.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffSignupRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub phone: Option<String>,
    #[serde(default)]
    pub institution_code: String,
}

impl std::fmt::Debug for StaffSignupRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaffSignupRequest")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("phone", &self.phone)
            .field("institution_code", &self.institution_code)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffSignupResponse {
    pub success: bool,
    pub message: String,
    pub institution_name: String,
}

fn required(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(())
}

/// Validate the request, check the code and register the staff member.
///
/// # Errors
///
/// `Validation` for bad input, a rejected code or a taken email.
#[instrument(skip(store, request), fields(code = %request.institution_code.trim()))]
pub async fn register<S>(
    store: &S,
    request: StaffSignupRequest,
) -> Result<StaffSignupResponse, AppError>
where
    S: CodeStore + StaffStore,
{
    required(&request.name, "Name")?;
    required(&request.email, "Email")?;
    required(&request.password, "Password")?;
    required(&request.institution_code, "Institution code")?;

    validate_password(&request.password)?;
    let email = Email::parse(&request.email)
        .map_err(|_| AppError::Validation("Invalid email address".to_owned()))?;
    let code = normalize_code(&request.institution_code).map_err(|e| match e {
        InstitutionCodeError::Empty => {
            AppError::Validation("Institution code is required".to_owned())
        }
        InstitutionCodeError::TooLong => AppError::Validation(CodeRejection::Unknown.to_string()),
    })?;

    let now = Utc::now();
    let found = store
        .find_code_by_value(&code)
        .await
        .store_context("find_code_by_value", None)?
        .ok_or_else(|| AppError::Validation(CodeRejection::Unknown.to_string()))?;
    found
        .check_usable(now)
        .map_err(|reason| AppError::Validation(reason.to_string()))?;

    let registration = StaffRegistration {
        code,
        email,
        password_hash: hash_password(&request.password)?,
        name: request.name.trim().to_owned(),
        phone: request
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_owned),
    };

    let registered = store
        .register_staff(registration, now)
        .await
        .map_err(|e| match e {
            RegistrationError::Code(reason) => AppError::Validation(reason.to_string()),
            RegistrationError::EmailTaken => {
                AppError::Validation("An account with this email already exists".to_owned())
            }
            RegistrationError::Repository(source) => AppError::Store {
                operation: "register_staff",
                tenant_id: Some(found.tenant_id),
                source,
            },
        })?;

    tracing::info!(
        tenant_id = %registered.tenant.id,
        staff_user_id = %registered.user.id,
        "Staff member joined with institution code"
    );

    Ok(StaffSignupResponse {
        success: true,
        message: "Account created successfully. You can now sign in.".to_owned(),
        institution_name: registered.tenant.name,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use chrono::TimeDelta;

    use comanda_core::{InstitutionCodeId, StaffRole, TenantId};

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::InstitutionCode;
    use crate::services::auth::AuthService;
    use crate::services::testing::tenant;

    fn code(
        store: &MemoryStore,
        tenant_id: TenantId,
        max_uses: Option<i32>,
        uses_count: i32,
    ) -> InstitutionCode {
        let code = unsaved_code(tenant_id, "PLAT-2024", max_uses, uses_count);
        store.insert_code(code.clone());
        code
    }

    fn unsaved_code(
        tenant_id: TenantId,
        value: &str,
        max_uses: Option<i32>,
        uses_count: i32,
    ) -> InstitutionCode {
        InstitutionCode {
            id: InstitutionCodeId::generate(),
            tenant_id,
            code: value.to_owned(),
            name: None,
            max_uses,
            uses_count,
            expires_at: None,
            is_active: true,
            created_by: None,
            created_at: Utc::now(),
        }
    }

    fn request(email: &str, institution_code: &str) -> StaffSignupRequest {
        StaffSignupRequest {
            name: "Luis".to_owned(),
            email: email.to_owned(),
            password: "s3cure-pass".to_owned(),
            phone: Some("555-0101".to_owned()),
            institution_code: institution_code.to_owned(),
        }
    }

    fn validation_message(err: AppError) -> String {
        match err {
            AppError::Validation(msg) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_signup_normalizes_code_and_links_tenant() {
        let store = MemoryStore::new();
        let t = tenant(&store, "Pho 88");
        code(&store, t.id, None, 0);

        let response = register(&store, request("luis@example.com", " plat-2024 "))
            .await
            .unwrap();
        assert!(response.success);
        assert_eq!(response.institution_name, "Pho 88");

        let staff = store.staff();
        assert_eq!(staff.len(), 1);
        assert_eq!(staff[0].tenant_id, Some(t.id));
        assert_eq!(staff[0].role, StaffRole::Cashier);
        assert!(store.accounts()[0].confirmed_at.is_some());
        assert_eq!(store.codes()[0].uses_count, 1);

        // The pre-confirmed account can sign in straight away.
        AuthService::new(&store)
            .login("luis@example.com", "s3cure-pass")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_last_use_then_rejected() {
        let store = MemoryStore::new();
        let t = tenant(&store, "Pho 88");
        code(&store, t.id, Some(3), 2);

        register(&store, request("a@example.com", "PLAT-2024"))
            .await
            .unwrap();
        let err = register(&store, request("b@example.com", "PLAT-2024"))
            .await
            .unwrap_err();

        assert_eq!(
            validation_message(err),
            "This institution code has reached its usage limit"
        );
        assert_eq!(store.codes()[0].uses_count, 3);
        assert_eq!(store.accounts().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_inactive_and_expired_codes() {
        let store = MemoryStore::new();
        let t = tenant(&store, "Pho 88");

        let err = register(&store, request("a@example.com", "NOPE")).await.unwrap_err();
        assert_eq!(validation_message(err), "Invalid institution code.");

        let mut inactive = unsaved_code(t.id, "OFF", None, 0);
        inactive.is_active = false;
        store.insert_code(inactive);
        let err = register(&store, request("a@example.com", "off")).await.unwrap_err();
        assert_eq!(
            validation_message(err),
            "This institution code is no longer active"
        );

        let mut expired = unsaved_code(t.id, "OLD", None, 0);
        expired.expires_at = Some(Utc::now() - TimeDelta::days(1));
        store.insert_code(expired);
        let err = register(&store, request("a@example.com", "old")).await.unwrap_err();
        assert_eq!(validation_message(err), "This institution code has expired");

        assert!(store.accounts().is_empty());
    }

    #[tokio::test]
    async fn test_email_taken() {
        let store = MemoryStore::new();
        let t = tenant(&store, "Pho 88");
        code(&store, t.id, None, 0);

        register(&store, request("luis@example.com", "PLAT-2024"))
            .await
            .unwrap();
        let err = register(&store, request("LUIS@example.com", "PLAT-2024"))
            .await
            .unwrap_err();
        assert_eq!(
            validation_message(err),
            "An account with this email already exists"
        );
        assert_eq!(store.codes()[0].uses_count, 1);
    }

    #[tokio::test]
    async fn test_input_validation() {
        let store = MemoryStore::new();

        let mut missing_name = request("a@example.com", "X");
        missing_name.name = "  ".to_owned();
        assert_eq!(
            validation_message(register(&store, missing_name).await.unwrap_err()),
            "Name is required"
        );

        let mut short = request("a@example.com", "X");
        short.password = "short".to_owned();
        assert_eq!(
            validation_message(register(&store, short).await.unwrap_err()),
            "Password must be at least 8 characters"
        );

        assert_eq!(
            validation_message(register(&store, request("nope", "X")).await.unwrap_err()),
            "Invalid email address"
        );
    }

    #[tokio::test]
    async fn test_failed_step_writes_nothing() {
        let store = MemoryStore::new();
        let t = tenant(&store, "Pho 88");
        code(&store, t.id, Some(5), 0);
        store.fail_operation("count_code_use");

        let err = register(&store, request("luis@example.com", "PLAT-2024"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Store { .. }));
        assert!(store.accounts().is_empty());
        assert!(store.staff().is_empty());
        assert_eq!(store.codes()[0].uses_count, 0);
    }

    #[test]
    fn test_debug_redacts_password() {
        let req = request("a@example.com", "X");
        assert!(!format!("{req:?}").contains("s3cure-pass"));
    }
}
