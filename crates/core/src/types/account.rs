//! Account classification enums.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// How an account proves its identity.
///
/// Stored as lowercase text in the `accounts.auth_provider` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    /// Email and password held by this service.
    #[default]
    Local,
    /// Google Sign-In ID token; the account has no local password.
    Google,
}

impl AuthProvider {
    /// Returns the stored string representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Google => "google",
        }
    }
}

impl fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a stored provider string is unknown.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown auth provider: {0}")]
pub struct ParseAuthProviderError(pub String);

impl FromStr for AuthProvider {
    type Err = ParseAuthProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Self::Local),
            "google" => Ok(Self::Google),
            other => Err(ParseAuthProviderError(other.to_owned())),
        }
    }
}

/// What an authenticated identity is allowed to see.
///
/// Persisted accounts are always customers; the administrator identity is
/// synthesized at login and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    #[default]
    Customer,
    Admin,
}

impl AccountRole {
    /// Whether this role may view every customer's orders.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}
