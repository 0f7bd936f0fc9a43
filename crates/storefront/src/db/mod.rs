//! Persistence for storefront accounts and orders.
//!
//! # Tables
//!
//! - `accounts` - Local and Google-linked accounts, keyed by email
//! - `orders` - Placed orders; items are stored as one JSONB document
//!
//! Both are reached through the [`AccountStore`] and [`OrderStore`] traits so
//! the HTTP layer can run against [`memory`] stores in tests.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p pattupavadai-cli -- migrate
//! ```

pub mod accounts;
pub mod memory;
pub mod orders;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use pattupavadai_core::{Email, OrderId};

use crate::models::{Account, NewOrder, Order, SessionToken};

pub use accounts::PgAccountStore;
pub use memory::{MemoryAccountStore, MemoryOrderStore};
pub use orders::PgOrderStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Map a unique-constraint violation to `Conflict`, anything else to `Database`.
pub(crate) fn conflict_or_database(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

/// A window into a newest-first listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    offset: i64,
    limit: i64,
}

impl Page {
    /// Build a page, defaulting a missing limit to `cap` and clamping larger
    /// limits down to it.
    #[must_use]
    pub fn new(offset: Option<u64>, limit: Option<u64>, cap: u32) -> Self {
        let cap = u64::from(cap);
        let limit = limit.map_or(cap, |l| l.min(cap));
        Self {
            offset: i64::try_from(offset.unwrap_or(0)).unwrap_or(i64::MAX),
            limit: i64::try_from(limit).unwrap_or(i64::MAX),
        }
    }

    #[must_use]
    pub const fn offset(&self) -> i64 {
        self.offset
    }

    #[must_use]
    pub const fn limit(&self) -> i64 {
        self.limit
    }

    /// Offset and limit as `usize` for slicing in-memory collections.
    #[must_use]
    pub fn bounds(&self) -> (usize, usize) {
        (
            usize::try_from(self.offset).unwrap_or(usize::MAX),
            usize::try_from(self.limit).unwrap_or(usize::MAX),
        )
    }
}

/// Account persistence.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Look up an account by exact email.
    async fn find_by_email(&self, email: &Email) -> Result<Option<Account>, RepositoryError>;

    /// Insert a new account.
    ///
    /// Returns `RepositoryError::Conflict` if the email is already taken.
    async fn insert(&self, account: &Account) -> Result<(), RepositoryError>;

    /// Overwrite the account's session token.
    ///
    /// Returns `RepositoryError::NotFound` if no account has this email.
    async fn update_token(&self, email: &Email, token: &SessionToken)
    -> Result<(), RepositoryError>;

    /// Check the store is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// Order persistence.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist an order and return its store-assigned ID.
    async fn insert(&self, order: &NewOrder) -> Result<OrderId, RepositoryError>;

    /// Orders placed by one account, newest first.
    async fn list_for_user(&self, email: &Email, page: Page)
    -> Result<Vec<Order>, RepositoryError>;

    /// Every order, newest first.
    async fn list_all(&self, page: Page) -> Result<Vec<Order>, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
