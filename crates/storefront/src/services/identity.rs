//! Google ID-token verification.
//!
//! Tokens are checked against Google's `tokeninfo` endpoint, which validates
//! the signature and returns the decoded claims. The claims are then checked
//! locally: the audience must be our OAuth client, the issuer must be Google,
//! the token must be unexpired and the email verified.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use pattupavadai_core::Email;

/// Public endpoint that validates Google ID tokens.
pub const GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

const GOOGLE_ISSUERS: &[&str] = &["accounts.google.com", "https://accounts.google.com"];

/// Errors that can occur while verifying an identity token.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The token is invalid, expired, or issued for someone else.
    #[error("identity token rejected: {0}")]
    Rejected(String),

    /// No OAuth client ID is configured.
    #[error("identity verification not configured")]
    NotConfigured,

    /// The verification endpoint could not be reached.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The verification endpoint returned claims we could not use.
    #[error("malformed claims: {0}")]
    MalformedClaims(String),
}

/// An identity vouched for by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    /// Provider-stable user identifier.
    pub subject: String,
    pub email: Email,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Verifies third-party identity tokens.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify a token and return the identity it asserts.
    async fn verify(&self, id_token: &str) -> Result<VerifiedIdentity, IdentityError>;
}

/// Claims returned by the `tokeninfo` endpoint.
///
/// Numeric and boolean claims arrive as strings.
#[derive(Debug, Deserialize)]
struct TokenInfoClaims {
    aud: Option<String>,
    iss: Option<String>,
    exp: Option<String>,
    sub: Option<String>,
    email: Option<String>,
    email_verified: Option<serde_json::Value>,
    name: Option<String>,
    picture: Option<String>,
}

/// Error body returned for rejected tokens.
#[derive(Debug, Deserialize)]
struct TokenInfoError {
    error_description: Option<String>,
    error: Option<String>,
}

/// Verifier backed by Google's `tokeninfo` endpoint.
#[derive(Clone)]
pub struct GoogleIdentityVerifier {
    client: reqwest::Client,
    tokeninfo_url: Url,
    client_id: Option<String>,
}

impl GoogleIdentityVerifier {
    /// Create a verifier.
    ///
    /// `client_id` is the OAuth client tokens must be issued for; without it
    /// every verification fails with `IdentityError::NotConfigured`.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::MalformedClaims` if `tokeninfo_url` is not a URL.
    pub fn new(
        client: reqwest::Client,
        tokeninfo_url: &str,
        client_id: Option<String>,
    ) -> Result<Self, IdentityError> {
        let tokeninfo_url = Url::parse(tokeninfo_url)
            .map_err(|e| IdentityError::MalformedClaims(format!("invalid tokeninfo URL: {e}")))?;
        Ok(Self {
            client,
            tokeninfo_url,
            client_id,
        })
    }
}

#[async_trait]
impl IdentityVerifier for GoogleIdentityVerifier {
    #[instrument(skip(self, id_token))]
    async fn verify(&self, id_token: &str) -> Result<VerifiedIdentity, IdentityError> {
        let client_id = self.client_id.as_deref().ok_or(IdentityError::NotConfigured)?;

        let mut url = self.tokeninfo_url.clone();
        url.query_pairs_mut().append_pair("id_token", id_token);

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status.is_client_error() {
            let reason = response
                .json::<TokenInfoError>()
                .await
                .ok()
                .and_then(|e| e.error_description.or(e.error))
                .unwrap_or_else(|| status.to_string());
            return Err(IdentityError::Rejected(reason));
        }
        if !status.is_success() {
            return Err(IdentityError::MalformedClaims(format!(
                "tokeninfo returned {status}"
            )));
        }

        let claims: TokenInfoClaims = response
            .json()
            .await
            .map_err(|e| IdentityError::MalformedClaims(e.to_string()))?;

        validate_claims(claims, client_id, Utc::now().timestamp())
    }
}

/// Check decoded claims against our client ID and the current time.
fn validate_claims(
    claims: TokenInfoClaims,
    client_id: &str,
    now: i64,
) -> Result<VerifiedIdentity, IdentityError> {
    if claims.aud.as_deref() != Some(client_id) {
        return Err(IdentityError::Rejected("audience mismatch".to_string()));
    }

    if !claims
        .iss
        .as_deref()
        .is_some_and(|iss| GOOGLE_ISSUERS.contains(&iss))
    {
        return Err(IdentityError::Rejected("unexpected issuer".to_string()));
    }

    let exp = claims
        .exp
        .as_deref()
        .and_then(|e| e.parse::<i64>().ok())
        .ok_or_else(|| IdentityError::MalformedClaims("missing exp".to_string()))?;
    if exp <= now {
        return Err(IdentityError::Rejected("token expired".to_string()));
    }

    let verified = match claims.email_verified {
        Some(serde_json::Value::Bool(b)) => b,
        Some(serde_json::Value::String(s)) => s == "true",
        _ => false,
    };
    if !verified {
        return Err(IdentityError::Rejected("email not verified".to_string()));
    }

    let email = claims
        .email
        .as_deref()
        .ok_or_else(|| IdentityError::MalformedClaims("missing email".to_string()))
        .and_then(|e| {
            Email::parse(e).map_err(|err| IdentityError::MalformedClaims(err.to_string()))
        })?;
    let subject = claims
        .sub
        .ok_or_else(|| IdentityError::MalformedClaims("missing sub".to_string()))?;

    Ok(VerifiedIdentity {
        subject,
        email,
        name: claims.name,
        picture: claims.picture,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    const CLIENT_ID: &str = "1234.apps.googleusercontent.com";
    const NOW: i64 = 1_780_000_000;

    fn claims(overrides: serde_json::Value) -> TokenInfoClaims {
        let mut base = json!({
            "aud": CLIENT_ID,
            "iss": "https://accounts.google.com",
            "exp": (NOW + 600).to_string(),
            "sub": "1099",
            "email": "priya@example.com",
            "email_verified": "true",
            "name": "Priya",
            "picture": "https://lh3.example.com/p.png"
        });
        if let (Some(base), Some(overrides)) = (base.as_object_mut(), overrides.as_object()) {
            for (k, v) in overrides {
                base.insert(k.clone(), v.clone());
            }
        }
        serde_json::from_value(base).unwrap()
    }

    #[test]
    fn test_valid_claims() {
        let identity = validate_claims(claims(json!({})), CLIENT_ID, NOW).unwrap();
        assert_eq!(identity.email.as_str(), "priya@example.com");
        assert_eq!(identity.subject, "1099");
        assert_eq!(identity.name.as_deref(), Some("Priya"));
    }

    #[test]
    fn test_bare_issuer_and_bool_verified_accepted() {
        let c = claims(json!({"iss": "accounts.google.com", "email_verified": true}));
        assert!(validate_claims(c, CLIENT_ID, NOW).is_ok());
    }

    #[test]
    fn test_wrong_audience_rejected() {
        let c = claims(json!({"aud": "someone-else.apps.googleusercontent.com"}));
        assert!(matches!(
            validate_claims(c, CLIENT_ID, NOW),
            Err(IdentityError::Rejected(_))
        ));
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let c = claims(json!({"iss": "https://evil.example.com"}));
        assert!(matches!(
            validate_claims(c, CLIENT_ID, NOW),
            Err(IdentityError::Rejected(_))
        ));
    }

    #[test]
    fn test_expired_rejected() {
        let c = claims(json!({"exp": NOW.to_string()}));
        assert!(matches!(
            validate_claims(c, CLIENT_ID, NOW),
            Err(IdentityError::Rejected(_))
        ));
    }

    #[test]
    fn test_unverified_email_rejected() {
        let c = claims(json!({"email_verified": "false"}));
        assert!(matches!(
            validate_claims(c, CLIENT_ID, NOW),
            Err(IdentityError::Rejected(_))
        ));
    }

    #[test]
    fn test_missing_email_is_malformed() {
        let c = claims(json!({"email": null}));
        assert!(matches!(
            validate_claims(c, CLIENT_ID, NOW),
            Err(IdentityError::MalformedClaims(_))
        ));
    }

    #[tokio::test]
    async fn test_unconfigured_client_id() {
        let verifier =
            GoogleIdentityVerifier::new(reqwest::Client::new(), GOOGLE_TOKENINFO_URL, None)
                .unwrap();
        assert!(matches!(
            verifier.verify("token").await,
            Err(IdentityError::NotConfigured)
        ));
    }
}
