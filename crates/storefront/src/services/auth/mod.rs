//! Authentication service.
//!
//! Provides password signup/login, Google ID-token login, and the configured
//! administrator login. Every successful login issues a fresh session token
//! that replaces the account's previous one.

mod error;
pub mod password;
pub mod token;

pub use error::AuthError;
pub use token::issue_token;

use chrono::Utc;
use secrecy::ExposeSecret;
use tracing::instrument;

use pattupavadai_core::{AccountRole, AuthProvider, Email};

use crate::config::AdminCredential;
use crate::db::{AccountStore, RepositoryError};
use crate::models::{Account, PasswordCredential};
use crate::services::identity::IdentityVerifier;

use password::{hash_password, validate_password, verify_password};

/// Display name of the synthesized administrator account.
const ADMIN_DISPLAY_NAME: &str = "Administrator";

/// Details supplied at signup.
#[derive(Debug, Clone)]
pub struct Signup {
    pub email: Email,
    pub name: String,
    pub shipping_address: String,
    pub contact_details: String,
    pub password: String,
}

/// Authentication service.
///
/// Borrows its collaborators from `AppState` for the duration of a request.
pub struct AuthService<'a> {
    accounts: &'a dyn AccountStore,
    identity: &'a dyn IdentityVerifier,
    admin: Option<&'a AdminCredential>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(
        accounts: &'a dyn AccountStore,
        identity: &'a dyn IdentityVerifier,
        admin: Option<&'a AdminCredential>,
    ) -> Self {
        Self {
            accounts,
            identity,
            admin,
        }
    }

    // =========================================================================
    // Password Authentication
    // =========================================================================

    /// Register a new account with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::EmailTaken` if the email is already registered,
    /// including when a concurrent signup wins the insert.
    #[instrument(skip(self, signup), fields(email = %signup.email))]
    pub async fn signup(&self, signup: Signup) -> Result<Account, AuthError> {
        validate_password(&signup.password)?;

        if self.accounts.find_by_email(&signup.email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let account = Account {
            email: signup.email,
            name: signup.name,
            shipping_address: signup.shipping_address,
            contact_details: signup.contact_details,
            password: PasswordCredential::Hashed(hash_password(&signup.password)?),
            token: issue_token(),
            picture: None,
            auth_provider: AuthProvider::Local,
            role: AccountRole::Customer,
            created_at: Utc::now(),
        };

        self.accounts.insert(&account).await.map_err(|e| match e {
            RepositoryError::Conflict(_) => AuthError::EmailTaken,
            other => AuthError::Repository(other),
        })?;

        tracing::info!("account created");
        Ok(account)
    }

    /// Login with email and password.
    ///
    /// The administrator credential, when configured, is checked first and
    /// yields a non-persisted admin account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email is unknown, the
    /// account has no local password, or the password is wrong.
    #[instrument(skip(self, email, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Account, AuthError> {
        if let Some(admin) = self.admin_login(email, password) {
            return Ok(admin);
        }

        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;
        let mut account = self
            .accounts
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let hash = account
            .password
            .hash()
            .ok_or(AuthError::InvalidCredentials)?;
        verify_password(password, hash)?;

        self.rotate_token(&mut account).await?;
        Ok(account)
    }

    fn admin_login(&self, email: &str, password: &str) -> Option<Account> {
        let admin = self.admin?;
        if admin.email.as_str() != email {
            return None;
        }
        verify_password(password, admin.password_hash.expose_secret()).ok()?;

        tracing::info!("administrator login");
        Some(Account {
            email: admin.email.clone(),
            name: ADMIN_DISPLAY_NAME.to_string(),
            shipping_address: String::new(),
            contact_details: String::new(),
            password: PasswordCredential::None,
            token: issue_token(),
            picture: None,
            auth_provider: AuthProvider::Local,
            role: AccountRole::Admin,
            created_at: Utc::now(),
        })
    }

    // =========================================================================
    // Google Sign-In
    // =========================================================================

    /// Login with a Google ID token, creating the account on first use.
    ///
    /// Only the verified token is trusted; emails or names claimed alongside
    /// it by the client are ignored.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Identity` if the token cannot be verified.
    /// Returns `AuthError::Repository` if the store fails.
    #[instrument(skip(self, id_token))]
    pub async fn google_login(&self, id_token: &str) -> Result<Account, AuthError> {
        let identity = self.identity.verify(id_token).await?;

        if let Some(mut account) = self.accounts.find_by_email(&identity.email).await? {
            self.rotate_token(&mut account).await?;
            return Ok(account);
        }

        let account = Account {
            name: identity
                .name
                .unwrap_or_else(|| identity.email.local_part().to_string()),
            email: identity.email,
            shipping_address: String::new(),
            contact_details: String::new(),
            password: PasswordCredential::None,
            token: issue_token(),
            picture: identity.picture,
            auth_provider: AuthProvider::Google,
            role: AccountRole::Customer,
            created_at: Utc::now(),
        };

        match self.accounts.insert(&account).await {
            Ok(()) => {
                tracing::info!(email = %account.email, "account created from google sign-in");
                Ok(account)
            }
            Err(RepositoryError::Conflict(_)) => {
                // Lost a race with a concurrent first login; reuse the winner.
                let mut winner = self
                    .accounts
                    .find_by_email(&account.email)
                    .await?
                    .ok_or(RepositoryError::NotFound)?;
                self.rotate_token(&mut winner).await?;
                Ok(winner)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn rotate_token(&self, account: &mut Account) -> Result<(), AuthError> {
        let token = issue_token();
        self.accounts.update_token(&account.email, &token).await?;
        account.token = token;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use secrecy::SecretString;

    use crate::db::MemoryAccountStore;
    use crate::services::identity::{IdentityError, VerifiedIdentity};

    /// Accepts tokens of the form `valid:<email>`.
    struct PrefixVerifier;

    #[async_trait]
    impl IdentityVerifier for PrefixVerifier {
        async fn verify(&self, id_token: &str) -> Result<VerifiedIdentity, IdentityError> {
            let email = id_token
                .strip_prefix("valid:")
                .ok_or_else(|| IdentityError::Rejected("bad token".into()))?;
            Ok(VerifiedIdentity {
                subject: "sub-1".into(),
                email: Email::parse(email).unwrap(),
                name: Some("Meena".into()),
                picture: Some("https://example.com/meena.png".into()),
            })
        }
    }

    fn signup(email: &str, password: &str) -> Signup {
        Signup {
            email: Email::parse(email).unwrap(),
            name: "Priya".into(),
            shipping_address: "12 Temple St, Madurai".into(),
            contact_details: "+91 98400 00000".into(),
            password: password.into(),
        }
    }

    fn admin() -> AdminCredential {
        AdminCredential {
            email: Email::parse("admin@pattupavadai.in").unwrap(),
            password_hash: SecretString::from(hash_password("admin-pass").unwrap()),
        }
    }

    #[tokio::test]
    async fn test_signup_then_lookup() {
        let store = MemoryAccountStore::new();
        let service = AuthService::new(&store, &PrefixVerifier, None);

        let account = service.signup(signup("priya@example.com", "pw")).await.unwrap();
        assert_eq!(account.auth_provider, AuthProvider::Local);

        let stored = store.find_by_email(&account.email).await.unwrap().unwrap();
        assert_eq!(stored.name, "Priya");
        assert_eq!(stored.shipping_address, "12 Temple St, Madurai");
        assert_eq!(stored.token, account.token);
    }

    #[tokio::test]
    async fn test_signup_duplicate_email() {
        let store = MemoryAccountStore::new();
        let service = AuthService::new(&store, &PrefixVerifier, None);

        service.signup(signup("priya@example.com", "pw")).await.unwrap();
        let result = service.signup(signup("priya@example.com", "other")).await;
        assert!(matches!(result, Err(AuthError::EmailTaken)));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_signup_empty_password() {
        let store = MemoryAccountStore::new();
        let service = AuthService::new(&store, &PrefixVerifier, None);
        let result = service.signup(signup("priya@example.com", "")).await;
        assert!(matches!(result, Err(AuthError::WeakPassword(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_login_rotates_token() {
        let store = MemoryAccountStore::new();
        let service = AuthService::new(&store, &PrefixVerifier, None);
        service.signup(signup("priya@example.com", "pw")).await.unwrap();

        let first = service.login("priya@example.com", "pw").await.unwrap();
        let second = service.login("priya@example.com", "pw").await.unwrap();
        assert_ne!(first.token, second.token);

        let stored = store.find_by_email(&second.email).await.unwrap().unwrap();
        assert_eq!(stored.token, second.token);
    }

    #[tokio::test]
    async fn test_login_failures() {
        let store = MemoryAccountStore::new();
        let service = AuthService::new(&store, &PrefixVerifier, None);
        service.signup(signup("priya@example.com", "pw")).await.unwrap();

        for (email, password) in [
            ("priya@example.com", "wrong"),
            ("ghost@example.com", "pw"),
            ("not-an-email", "pw"),
        ] {
            assert!(matches!(
                service.login(email, password).await,
                Err(AuthError::InvalidCredentials)
            ));
        }
    }

    #[tokio::test]
    async fn test_login_google_account_has_no_password() {
        let store = MemoryAccountStore::new();
        let service = AuthService::new(&store, &PrefixVerifier, None);
        service.google_login("valid:meena@example.com").await.unwrap();

        assert!(matches!(
            service.login("meena@example.com", "").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_admin_login_is_not_persisted() {
        let store = MemoryAccountStore::new();
        let admin = admin();
        let service = AuthService::new(&store, &PrefixVerifier, Some(&admin));

        let first = service.login("admin@pattupavadai.in", "admin-pass").await.unwrap();
        let second = service.login("admin@pattupavadai.in", "admin-pass").await.unwrap();
        assert!(first.role.is_admin());
        assert_ne!(first.token, second.token);
        assert!(store.is_empty());

        assert!(matches!(
            service.login("admin@pattupavadai.in", "guess").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_google_login_creates_once_then_reuses() {
        let store = MemoryAccountStore::new();
        let service = AuthService::new(&store, &PrefixVerifier, None);

        let created = service.google_login("valid:meena@example.com").await.unwrap();
        assert_eq!(created.auth_provider, AuthProvider::Google);
        assert_eq!(created.password, PasswordCredential::None);
        assert_eq!(created.picture.as_deref(), Some("https://example.com/meena.png"));

        let again = service.google_login("valid:meena@example.com").await.unwrap();
        assert_eq!(store.len(), 1);
        assert_ne!(created.token, again.token);
    }

    #[tokio::test]
    async fn test_google_login_rejected_creates_nothing() {
        let store = MemoryAccountStore::new();
        let service = AuthService::new(&store, &PrefixVerifier, None);

        let result = service.google_login("forged").await;
        assert!(matches!(
            result,
            Err(AuthError::Identity(IdentityError::Rejected(_)))
        ));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_google_login_reuses_local_account() {
        let store = MemoryAccountStore::new();
        let service = AuthService::new(&store, &PrefixVerifier, None);
        service.signup(signup("meena@example.com", "pw")).await.unwrap();

        let account = service.google_login("valid:meena@example.com").await.unwrap();
        assert_eq!(account.auth_provider, AuthProvider::Local);
        assert_eq!(store.len(), 1);
    }
}
