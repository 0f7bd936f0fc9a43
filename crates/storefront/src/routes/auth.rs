//! Authentication route handlers.
//!
//! Every successful call returns `{"user": {...}}` with a freshly issued
//! session token.

use axum::extract::State;
use serde::{Deserialize, Serialize};

use pattupavadai_core::{AuthProvider, Email};

use crate::error::{Result, set_sentry_user};
use crate::models::{Account, SessionToken};
use crate::services::auth::{AuthError, Signup};
use crate::state::AppState;

use super::ApiJson;

// =============================================================================
// Request Types
// =============================================================================

/// Signup request body.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub name: String,
    pub shipping_address: String,
    pub contact_details: String,
    pub password: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Google Sign-In request body.
///
/// Clients may also send the email and name they saw; those are ignored in
/// favour of the verified token claims.
#[derive(Debug, Deserialize)]
pub struct GoogleLoginRequest {
    #[serde(alias = "credential", alias = "id_token")]
    pub token: String,
}

// =============================================================================
// Response Types
// =============================================================================

/// Account as returned to its owner.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub email: Email,
    pub name: String,
    pub shipping_address: String,
    pub contact_details: String,
    pub token: SessionToken,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    pub auth_provider: AuthProvider,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_admin: bool,
}

impl From<Account> for UserResponse {
    fn from(account: Account) -> Self {
        Self {
            is_admin: account.role.is_admin(),
            email: account.email,
            name: account.name,
            shipping_address: account.shipping_address,
            contact_details: account.contact_details,
            token: account.token,
            picture: account.picture,
            auth_provider: account.auth_provider,
        }
    }
}

/// Envelope for all auth responses.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserResponse,
}

fn respond(account: Account) -> ApiJson<AuthResponse> {
    set_sentry_user(account.email.as_str());
    ApiJson(AuthResponse {
        user: account.into(),
    })
}

// =============================================================================
// Handlers
// =============================================================================

/// Create a local account.
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SignupRequest>,
) -> Result<ApiJson<AuthResponse>> {
    let email = Email::parse(body.email.trim()).map_err(AuthError::from)?;

    let account = state
        .auth_service()
        .signup(Signup {
            email,
            name: body.name,
            shipping_address: body.shipping_address,
            contact_details: body.contact_details,
            password: body.password,
        })
        .await?;

    Ok(respond(account))
}

/// Log in with email and password.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<ApiJson<AuthResponse>> {
    let account = state
        .auth_service()
        .login(body.email.trim(), &body.password)
        .await?;

    Ok(respond(account))
}

/// Log in with a Google ID token.
pub async fn google(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<GoogleLoginRequest>,
) -> Result<ApiJson<AuthResponse>> {
    let account = state.auth_service().google_login(body.token.trim()).await?;

    Ok(respond(account))
}
