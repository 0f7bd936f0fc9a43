//! Gemini integration for garment analysis and preview rendering.
//!
//! The storefront uses two `generateContent` calls:
//!
//! - **Analysis**: a shopper's photo plus an attribute-extraction prompt,
//!   answered as a JSON object the client parses itself.
//! - **Generation**: a natural-language description of a configured garment,
//!   answered with an inline PNG.
//!
//! Both are pass-through: no retries and no caching. Routes depend on the
//! [`VisionGateway`] trait so tests can substitute a canned gateway.

mod client;
mod error;
pub mod types;

pub use client::GeminiClient;
pub use error::{ApiError, ApiErrorResponse, GeminiError};

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

/// Media type assumed when the client sends bare base64.
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Multimodal analysis and generation.
#[async_trait]
pub trait VisionGateway: Send + Sync {
    /// Extract garment attributes from a photo; returns the model's JSON text.
    async fn analyze_garment(&self, image: &InlineImage) -> Result<String, GeminiError>;

    /// Render an image for a prompt; returns base64 image bytes.
    async fn generate_image(&self, prompt: &str) -> Result<String, GeminiError>;
}

/// A base64 image ready to be inlined into a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}

impl InlineImage {
    /// Parse a `data:<mime>;base64,<payload>` URL or bare base64.
    ///
    /// # Errors
    ///
    /// Returns `GeminiError::InvalidImage` if the input is empty, is a data
    /// URL that is not base64 encoded, or the payload is not valid base64.
    pub fn parse(input: &str) -> Result<Self, GeminiError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(GeminiError::InvalidImage("no image provided".to_string()));
        }

        let (mime_type, data) = match input.strip_prefix("data:") {
            Some(rest) => {
                let (header, payload) = rest.split_once(',').ok_or_else(|| {
                    GeminiError::InvalidImage("data URL has no payload".to_string())
                })?;
                let mime = header.strip_suffix(";base64").ok_or_else(|| {
                    GeminiError::InvalidImage("data URL is not base64 encoded".to_string())
                })?;
                let mime = if mime.is_empty() { DEFAULT_IMAGE_MIME } else { mime };
                (mime.to_string(), payload)
            }
            None => (DEFAULT_IMAGE_MIME.to_string(), input),
        };

        if data.is_empty() {
            return Err(GeminiError::InvalidImage("no image provided".to_string()));
        }
        STANDARD
            .decode(data)
            .map_err(|e| GeminiError::InvalidImage(format!("invalid base64: {e}")))?;

        Ok(Self {
            mime_type,
            data: data.to_string(),
        })
    }
}
