//! Account domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use pattupavadai_core::{AccountRole, AuthProvider, Email};

/// How an account proves knowledge of a password.
///
/// Accounts created through Google Sign-In have no local password and can
/// only log in through that provider. Stored as a nullable column.
#[derive(Clone, PartialEq, Eq)]
pub enum PasswordCredential {
    /// Argon2 PHC string.
    Hashed(String),
    /// No local password.
    None,
}

impl PasswordCredential {
    /// The PHC string, if the account has a local password.
    #[must_use]
    pub fn hash(&self) -> Option<&str> {
        match self {
            Self::Hashed(hash) => Some(hash),
            Self::None => None,
        }
    }

    /// Build from a nullable column value.
    #[must_use]
    pub fn from_column(value: Option<String>) -> Self {
        value.map_or(Self::None, Self::Hashed)
    }
}

impl std::fmt::Debug for PasswordCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hashed(_) => f.write_str("Hashed([REDACTED])"),
            Self::None => f.write_str("None"),
        }
    }
}

/// Opaque bearer credential; one live value per account.
///
/// Serializes as the raw string (it is returned to its owner at login) but
/// redacts itself in `Debug` output so it never lands in logs.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wrap an issued or stored token value.
    #[must_use]
    pub const fn new(value: String) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken([REDACTED])")
    }
}

/// A storefront account.
#[derive(Debug, Clone)]
pub struct Account {
    /// Unique key, compared exactly as stored.
    pub email: Email,
    pub name: String,
    pub shipping_address: String,
    pub contact_details: String,
    pub password: PasswordCredential,
    /// Most recently issued session token.
    pub token: SessionToken,
    /// Avatar URL from the identity provider.
    pub picture: Option<String>,
    pub auth_provider: AuthProvider,
    /// Always `Customer` for persisted accounts.
    pub role: AccountRole,
    pub created_at: DateTime<Utc>,
}
