//! Error types for the Gemini API client.

use thiserror::Error;

/// Errors that can occur when interacting with the Gemini API.
#[derive(Debug, Error)]
pub enum GeminiError {
    /// No API key is configured.
    #[error("Gemini API key not configured")]
    NotConfigured,

    /// The client could not be built from configuration.
    #[error("invalid Gemini configuration: {0}")]
    Config(String),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Gemini API returned an error.
    #[error("API error ({status}): {message}")]
    Api {
        /// Status string from the API (e.g. `INVALID_ARGUMENT`).
        status: String,
        /// Error message.
        message: String,
    },

    /// Failed to parse response.
    #[error("parse error: {0}")]
    Parse(String),

    /// The model returned no usable content.
    #[error("empty response: {0}")]
    EmptyResponse(String),

    /// The model answered without an image.
    #[error("model returned no image")]
    NoImage,

    /// The caller supplied an unusable image.
    #[error("invalid image: {0}")]
    InvalidImage(String),
}

/// API error response from Gemini.
#[derive(Debug, serde::Deserialize)]
pub struct ApiErrorResponse {
    /// Nested error details.
    pub error: ApiError,
}

/// Nested error details.
#[derive(Debug, serde::Deserialize)]
pub struct ApiError {
    /// HTTP status code echoed by the API.
    pub code: Option<u16>,
    /// Error message.
    pub message: String,
    /// Canonical status name.
    pub status: Option<String>,
}
