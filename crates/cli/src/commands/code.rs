//! Institution code management.
//!
//! Codes created here have no `created_by`; everything else follows the same
//! rules as the HTTP endpoint.

use chrono::{TimeDelta, Utc};

use comanda_console::db::{CodeStore, PgStore, RepositoryError, TenantStore};
use comanda_console::models::{InstitutionCode, NewInstitutionCode};
use comanda_core::{TenantId, normalize_code};

use super::{CommandError, connect};

fn parse_tenant(raw: &str) -> Result<TenantId, CommandError> {
    raw.parse()
        .map_err(|_| CommandError::InvalidTenant(raw.to_owned()))
}

async fn tenant_store(raw: &str) -> Result<(PgStore, TenantId), CommandError> {
    let tenant_id = parse_tenant(raw)?;
    let store = PgStore::new(connect().await?);
    if store.find_tenant(tenant_id).await?.is_none() {
        return Err(CommandError::TenantNotFound(raw.to_owned()));
    }
    Ok((store, tenant_id))
}

/// Build the insert for a code, validating the same limits as the API.
fn new_code(
    code: &str,
    name: Option<String>,
    max_uses: Option<i32>,
    expires_in_days: Option<i64>,
) -> Result<NewInstitutionCode, CommandError> {
    let code = normalize_code(code).map_err(|e| CommandError::InvalidCode(e.to_string()))?;
    if max_uses.is_some_and(|n| n <= 0) {
        return Err(CommandError::InvalidCode(
            "max uses must be greater than zero".to_owned(),
        ));
    }
    let expires_at = expires_in_days
        .map(|days| {
            TimeDelta::try_days(days)
                .and_then(|delta| Utc::now().checked_add_signed(delta))
                .ok_or_else(|| CommandError::InvalidCode("expiry is out of range".to_owned()))
        })
        .transpose()?;
    Ok(NewInstitutionCode {
        code,
        name: name.filter(|n| !n.trim().is_empty()),
        max_uses,
        expires_at,
        created_by: None,
    })
}

/// Create a code for a tenant.
///
/// # Errors
///
/// Invalid input, unknown tenant, a taken code value, or database failures.
pub async fn create(
    tenant: &str,
    code: &str,
    name: Option<String>,
    max_uses: Option<i32>,
    expires_in_days: Option<i64>,
) -> Result<InstitutionCode, CommandError> {
    let new = new_code(code, name, max_uses, expires_in_days)?;
    let (store, tenant_id) = tenant_store(tenant).await?;

    let value = new.code.clone();
    let created = store
        .create_code(tenant_id, new)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => CommandError::CodeExists(value),
            other => CommandError::Repository(other),
        })?;

    tracing::info!("Institution code created successfully!");
    log_code(&created);
    Ok(created)
}

/// List a tenant's codes, newest first.
///
/// # Errors
///
/// Unknown tenant or database failures.
pub async fn list(tenant: &str) -> Result<(), CommandError> {
    let (store, tenant_id) = tenant_store(tenant).await?;
    let codes = store.list_codes(tenant_id).await?;

    if codes.is_empty() {
        tracing::info!("No institution codes for tenant {tenant_id}");
    }
    for code in &codes {
        log_code(code);
    }
    Ok(())
}

fn log_code(code: &InstitutionCode) {
    let max = code
        .max_uses
        .map_or_else(|| "unlimited".to_owned(), |max| max.to_string());
    let uses = format!("{}/{max}", code.uses_count);
    let expires = code
        .expires_at
        .map_or_else(|| "never".to_owned(), |at| at.to_rfc3339());
    tracing::info!(
        "  {} [{}] uses {} expires {} {}",
        code.code,
        if code.is_active { "active" } else { "inactive" },
        uses,
        expires,
        code.name.as_deref().unwrap_or("")
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_new_code_normalizes() {
        let code = new_code("  plat-2024 ", Some("Platform".to_owned()), Some(3), None).unwrap();
        assert_eq!(code.code, "PLAT-2024");
        assert_eq!(code.max_uses, Some(3));
        assert!(code.expires_at.is_none());
        assert!(code.created_by.is_none());
    }

    #[test]
    fn test_new_code_rejects_bad_input() {
        assert!(matches!(
            new_code("  ", None, None, None),
            Err(CommandError::InvalidCode(_))
        ));
        assert!(matches!(
            new_code("ok", None, Some(0), None),
            Err(CommandError::InvalidCode(_))
        ));
    }

    #[test]
    fn test_new_code_expiry() {
        let code = new_code("x", Some("  ".to_owned()), None, Some(7)).unwrap();
        assert!(code.name.is_none());
        assert!(code.expires_at.unwrap() > Utc::now() + TimeDelta::days(6));
    }

    #[test]
    fn test_new_code_rejects_unrepresentable_expiry() {
        for days in [i64::MAX, i64::MIN, 1_000_000_000] {
            assert!(matches!(
                new_code("x", None, None, Some(days)),
                Err(CommandError::InvalidCode(_))
            ));
        }
    }

    #[test]
    fn test_parse_tenant() {
        assert!(matches!(
            parse_tenant("nope"),
            Err(CommandError::InvalidTenant(_))
        ));
    }
}
