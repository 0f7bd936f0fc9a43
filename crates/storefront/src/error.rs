//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Error bodies are JSON `{"detail": "<short message>"}`. Upstream failures
//! surface only the provider's top-level message; internals stay in the logs.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::gemini::GeminiError;
use crate::services::auth::AuthError;
use crate::services::chatbot::ChatbotError;
use crate::services::identity::IdentityError;
use crate::services::images::ImageError;
use crate::services::orders::OrderError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Order operation failed.
    #[error("Order error: {0}")]
    Order(#[from] OrderError),

    /// Vision/generation API call failed.
    #[error("Gemini error: {0}")]
    Gemini(#[from] GeminiError),

    /// Preview image generation or storage failed.
    #[error("Image error: {0}")]
    Image(#[from] ImageError),

    /// Chatbot proxy failed.
    #[error("Chatbot error: {0}")]
    Chatbot(#[from] ChatbotError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Dependency unavailable.
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

const INTERNAL: &str = "Internal server error";

impl AppError {
    /// Status code and client-facing message.
    fn status_and_detail(&self) -> (StatusCode, String) {
        match self {
            Self::Database(_) | Self::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_string())
            }
            Self::Auth(err) => auth_status(err),
            Self::Order(err) => match err {
                OrderError::UserNotFound => (StatusCode::NOT_FOUND, "User not found".to_string()),
                OrderError::InvalidOrderDate(raw) => (
                    StatusCode::BAD_REQUEST,
                    format!("Invalid order_date '{raw}': expected RFC 3339 or YYYY-MM-DD"),
                ),
                OrderError::Repository(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_string())
                }
            },
            Self::Gemini(err) => gemini_status(err),
            Self::Image(err) => match err {
                ImageError::Gateway(inner) => gemini_status(inner),
                ImageError::Decode(_) | ImageError::Io(_) | ImageError::Task(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to store preview image".to_string(),
                ),
            },
            Self::Chatbot(err) => match err {
                ChatbotError::NotConfigured => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Chatbot not configured".to_string(),
                ),
                ChatbotError::Timeout => (
                    StatusCode::GATEWAY_TIMEOUT,
                    "Chatbot timed out".to_string(),
                ),
                ChatbotError::Status { status, message } => (
                    StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY),
                    message.clone(),
                ),
                ChatbotError::Http(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Chatbot unavailable".to_string(),
                ),
            },
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
        }
    }
}

fn auth_status(err: &AuthError) -> (StatusCode, String) {
    match err {
        AuthError::InvalidCredentials => {
            (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
        }
        AuthError::EmailTaken => (
            StatusCode::BAD_REQUEST,
            "Email already registered".to_string(),
        ),
        AuthError::WeakPassword(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        AuthError::InvalidEmail(_) => (
            StatusCode::BAD_REQUEST,
            "Invalid email address".to_string(),
        ),
        AuthError::Identity(IdentityError::Rejected(_)) => (
            StatusCode::UNAUTHORIZED,
            "Invalid Google token".to_string(),
        ),
        AuthError::Identity(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Google sign-in failed".to_string(),
        ),
        AuthError::Repository(_) | AuthError::PasswordHash => {
            (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL.to_string())
        }
    }
}

fn gemini_status(err: &GeminiError) -> (StatusCode, String) {
    let detail = match err {
        GeminiError::InvalidImage(msg) => return (StatusCode::BAD_REQUEST, msg.clone()),
        GeminiError::NotConfigured => "Gemini API key not configured".to_string(),
        GeminiError::Api { message, .. } => message.clone(),
        GeminiError::EmptyResponse(reason) => format!("Model returned no content: {reason}"),
        GeminiError::NoImage => "Model returned no image".to_string(),
        GeminiError::Config(_) | GeminiError::Http(_) | GeminiError::Parse(_) => {
            "Image service unavailable".to_string()
        }
    };
    (StatusCode::INTERNAL_SERVER_ERROR, detail)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = self.status_and_detail();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from an account email.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(email: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            email: Some(email.to_string()),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn status_and_detail(err: AppError) -> (StatusCode, String) {
        err.status_and_detail()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("order".to_string());
        assert_eq!(err.to_string(), "Not found: order");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_auth_statuses() {
        assert_eq!(
            status_and_detail(AuthError::EmailTaken.into()),
            (StatusCode::BAD_REQUEST, "Email already registered".to_string())
        );
        assert_eq!(
            status_and_detail(AuthError::InvalidCredentials.into()),
            (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
        );
        assert_eq!(
            status_and_detail(AuthError::Identity(IdentityError::Rejected("exp".into())).into()).0,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_and_detail(AuthError::Identity(IdentityError::NotConfigured).into()).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_order_statuses() {
        assert_eq!(
            status_and_detail(OrderError::UserNotFound.into()),
            (StatusCode::NOT_FOUND, "User not found".to_string())
        );
        assert_eq!(
            status_and_detail(OrderError::InvalidOrderDate("x".into()).into()).0,
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_upstream_statuses_surface_provider_message_only() {
        let err = GeminiError::Api {
            status: "RESOURCE_EXHAUSTED".into(),
            message: "Quota exceeded".into(),
        };
        assert_eq!(
            status_and_detail(ImageError::Gateway(err).into()),
            (StatusCode::INTERNAL_SERVER_ERROR, "Quota exceeded".to_string())
        );
        assert_eq!(
            status_and_detail(GeminiError::InvalidImage("no image provided".into()).into()),
            (StatusCode::BAD_REQUEST, "no image provided".to_string())
        );
    }

    #[test]
    fn test_chatbot_statuses() {
        assert_eq!(
            status_and_detail(ChatbotError::Timeout.into()).0,
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status_and_detail(
                ChatbotError::Status {
                    status: 429,
                    message: "slow down".into()
                }
                .into()
            ),
            (StatusCode::TOO_MANY_REQUESTS, "slow down".to_string())
        );
        assert_eq!(
            status_and_detail(ChatbotError::NotConfigured.into()).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let (status, detail) =
            status_and_detail(AppError::Internal("pool exhausted at 10.0.0.3".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(detail, INTERNAL);
    }

    #[tokio::test]
    async fn test_body_is_detail_json() {
        let response = AppError::NotFound("User not found".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({"detail": "User not found"}));
    }
}
