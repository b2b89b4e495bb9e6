use comanda_core::{Email, SubjectId};

use super::rows::AccountRow;
use super::{PgStore, conflict_on_unique};
use crate::db::RepositoryError;
use crate::db::store::AccountStore;
use crate::models::{AuthAccount, NewAccount};

impl AccountStore for PgStore {
    async fn create_account(&self, account: NewAccount) -> Result<AuthAccount, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r"
            INSERT INTO console.auth_account
                (email, password_hash, display_name, phone, metadata, confirmed_at)
            VALUES ($1, $2, $3, $4, $5, CASE WHEN $6 THEN NOW() END)
            RETURNING id, email, password_hash, display_name, phone, metadata,
                      confirmed_at, created_at
            ",
        )
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.display_name)
        .bind(&account.phone)
        .bind(&account.metadata)
        .bind(account.confirmed)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, "email already exists"))?;

        row.try_into()
    }

    async fn find_account_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<AuthAccount>, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r"
            SELECT id, email, password_hash, display_name, phone, metadata,
                   confirmed_at, created_at
            FROM console.auth_account
            WHERE lower(email) = lower($1)
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_account(&self, id: SubjectId) -> Result<Option<AuthAccount>, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r"
            SELECT id, email, password_hash, display_name, phone, metadata,
                   confirmed_at, created_at
            FROM console.auth_account
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }
}
