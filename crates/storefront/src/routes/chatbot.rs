//! Chatbot proxy handler.

use axum::extract::State;
use serde::Deserialize;

use crate::error::{AppError, Result};
use crate::services::chatbot::ChatbotError;
use crate::state::AppState;

use super::ApiJson;

#[derive(Debug, Deserialize)]
pub struct ChatbotQuery {
    #[serde(default)]
    pub query: String,
}

/// Forward a shopper question to the upstream assistant.
pub async fn query(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<ChatbotQuery>,
) -> Result<ApiJson<serde_json::Value>> {
    let query = body.query.trim();
    if query.is_empty() {
        return Err(AppError::BadRequest("Query cannot be empty".to_string()));
    }

    let chatbot = state.chatbot().ok_or(ChatbotError::NotConfigured)?;
    Ok(ApiJson(chatbot.query(query).await?))
}
