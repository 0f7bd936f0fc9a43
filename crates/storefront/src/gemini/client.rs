//! Gemini API client.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use tracing::instrument;

use crate::config::GeminiConfig;

use super::error::{ApiErrorResponse, GeminiError};
use super::types::{Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part};
use super::{InlineImage, VisionGateway};

const ANALYSIS_PROMPT: &str = "You are a textile and garment expert for a South Indian \
custom clothing store. Analyse the garment in this photo and return a single flat JSON object \
with these keys: dress_type, fabric_type, top_style, bottom_style, sleeve_type, neck_design, \
border_design, top_color, bottom_color, accent. Use short human-readable values and null for \
anything you cannot determine. Return only the JSON object.";

/// Gemini API client.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct GeminiClient {
    inner: Arc<GeminiClientInner>,
}

struct GeminiClientInner {
    client: reqwest::Client,
    api_base: String,
    analysis_model: String,
    image_model: String,
}

impl GeminiClient {
    /// Create a new Gemini client.
    ///
    /// # Errors
    ///
    /// Returns `GeminiError::NotConfigured` if no API key is set, or
    /// `GeminiError::Config` if the key is not a valid header value.
    pub fn new(config: &GeminiConfig) -> Result<Self, GeminiError> {
        let api_key = config.api_key.as_ref().ok_or(GeminiError::NotConfigured)?;

        let mut key_header = HeaderValue::from_str(api_key.expose_secret())
            .map_err(|_| GeminiError::Config("API key is not a valid header value".to_string()))?;
        key_header.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("x-goog-api-key", key_header);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| GeminiError::Config(e.to_string()))?;

        Ok(Self {
            inner: Arc::new(GeminiClientInner {
                client,
                api_base: config.api_base.trim_end_matches('/').to_string(),
                analysis_model: config.analysis_model.clone(),
                image_model: config.image_model.clone(),
            }),
        })
    }

    /// Call `generateContent` on a model.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the API returns an error response.
    #[instrument(skip(self, request))]
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiError> {
        let url = format!("{}/models/{model}:generateContent", self.inner.api_base);

        let response = self.inner.client.post(url).json(request).send().await?;

        self.handle_response(response).await
    }

    /// Handle a successful response.
    async fn handle_response(
        &self,
        response: reqwest::Response,
    ) -> Result<GenerateContentResponse, GeminiError> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            serde_json::from_str(&body)
                .map_err(|e| GeminiError::Parse(format!("Failed to parse response: {e}")))
        } else {
            Err(self.handle_error_status(status, response).await)
        }
    }

    /// Handle an error status code.
    async fn handle_error_status(
        &self,
        status: reqwest::StatusCode,
        response: reqwest::Response,
    ) -> GeminiError {
        match response.text().await {
            Ok(body) => {
                if let Ok(api_error) = serde_json::from_str::<ApiErrorResponse>(&body) {
                    GeminiError::Api {
                        status: api_error
                            .error
                            .status
                            .unwrap_or_else(|| status.as_u16().to_string()),
                        message: api_error.error.message,
                    }
                } else {
                    // Not the API envelope (proxy page, gateway error): keep it out of responses
                    tracing::warn!(status = %status, body = %body, "unrecognised Gemini error body");
                    GeminiError::Api {
                        status: status.as_u16().to_string(),
                        message: unrecognised_error_message(status),
                    }
                }
            }
            Err(e) => GeminiError::Http(e),
        }
    }
}

/// Client-safe message for an error body that is not the API envelope.
fn unrecognised_error_message(status: reqwest::StatusCode) -> String {
    status
        .canonical_reason()
        .map_or_else(|| "Image service unavailable".to_string(), |reason| {
            format!("Image service unavailable ({reason})")
        })
}

#[async_trait]
impl VisionGateway for GeminiClient {
    #[instrument(skip(self, image), fields(model = %self.inner.analysis_model, mime = %image.mime_type))]
    async fn analyze_garment(&self, image: &InlineImage) -> Result<String, GeminiError> {
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![
                Part::text(ANALYSIS_PROMPT),
                Part::inline(&image.mime_type, &image.data),
            ])],
            generation_config: Some(GenerationConfig {
                response_mime_type: Some("application/json".to_string()),
                ..GenerationConfig::default()
            }),
        };

        let response = self
            .generate_content(&self.inner.analysis_model, &request)
            .await?;
        response
            .text()
            .ok_or_else(|| GeminiError::EmptyResponse(response.empty_reason()))
    }

    #[instrument(skip(self, prompt), fields(model = %self.inner.image_model))]
    async fn generate_image(&self, prompt: &str) -> Result<String, GeminiError> {
        let request = GenerateContentRequest {
            contents: vec![Content::user(vec![Part::text(prompt)])],
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec!["TEXT".to_string(), "IMAGE".to_string()]),
                ..GenerationConfig::default()
            }),
        };

        let response = self
            .generate_content(&self.inner.image_model, &request)
            .await?;
        response
            .first_image()
            .map(|blob| blob.data.clone())
            .ok_or(GeminiError::NoImage)
    }
}
