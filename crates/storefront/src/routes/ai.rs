//! Garment analysis and preview rendering handlers.

use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::gemini::{GeminiError, InlineImage};
use crate::services::images::{GarmentDescription, Preview, generate_preview};
use crate::state::AppState;

use super::ApiJson;

/// Analysis request: a data URL or bare base64 photo.
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub image: String,
}

/// Analysis response; `analysis` is the model's JSON as a string.
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub analysis: String,
}

/// Extract garment attributes from a photo.
pub async fn analyze_dress(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<AnalyzeRequest>,
) -> Result<ApiJson<AnalyzeResponse>> {
    let image = InlineImage::parse(&body.image)?;
    let gateway = state.vision().ok_or(GeminiError::NotConfigured)?;

    let analysis = gateway.analyze_garment(&image).await?;
    Ok(ApiJson(AnalyzeResponse { analysis }))
}

/// Render a catalog preview for a configured garment.
pub async fn preview_image(
    State(state): State<AppState>,
    ApiJson(description): ApiJson<GarmentDescription>,
) -> Result<ApiJson<Preview>> {
    let gateway = state.vision().ok_or(GeminiError::NotConfigured)?;

    let preview = generate_preview(gateway, state.images().clone(), description).await?;
    Ok(ApiJson(preview))
}
