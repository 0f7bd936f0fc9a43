//! `PostgreSQL` account store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use pattupavadai_core::{AccountRole, Email};

use super::{AccountStore, RepositoryError, conflict_or_database};
use crate::models::{Account, PasswordCredential, SessionToken};

/// Row shape of the `accounts` table.
#[derive(sqlx::FromRow)]
struct AccountRow {
    email: String,
    name: String,
    shipping_address: String,
    contact_details: String,
    password_hash: Option<String>,
    token: String,
    picture: Option<String>,
    auth_provider: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = RepositoryError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let auth_provider = row.auth_provider.parse().map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid auth provider in database: {e}"))
        })?;

        Ok(Self {
            email,
            name: row.name,
            shipping_address: row.shipping_address,
            contact_details: row.contact_details,
            password: PasswordCredential::from_column(row.password_hash),
            token: SessionToken::new(row.token),
            picture: row.picture,
            auth_provider,
            role: AccountRole::Customer,
            created_at: row.created_at,
        })
    }
}

/// Account store backed by the `accounts` table.
#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    /// Create a new account store.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(
            r"
            SELECT email, name, shipping_address, contact_details, password_hash,
                   token, picture, auth_provider, created_at
            FROM accounts
            WHERE email = $1
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Account::try_from).transpose()
    }

    async fn insert(&self, account: &Account) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO accounts (email, name, shipping_address, contact_details,
                                  password_hash, token, picture, auth_provider, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(&account.email)
        .bind(&account.name)
        .bind(&account.shipping_address)
        .bind(&account.contact_details)
        .bind(account.password.hash())
        .bind(account.token.as_str())
        .bind(account.picture.as_deref())
        .bind(account.auth_provider.as_str())
        .bind(account.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| conflict_or_database(e, "email"))?;

        Ok(())
    }

    async fn update_token(
        &self,
        email: &Email,
        token: &SessionToken,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE accounts
            SET token = $2, updated_at = NOW()
            WHERE email = $1
            ",
        )
        .bind(email)
        .bind(token.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
