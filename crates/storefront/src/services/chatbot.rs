//! Proxy to the upstream shopping assistant.
//!
//! Queries are forwarded as `{"query": ...}`. The upstream JSON answer is
//! returned verbatim; clients read `response`, `answer`, or `message` from it.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::instrument;

use crate::config::ChatbotConfig;

/// Errors that can occur when querying the chatbot.
#[derive(Debug, Error)]
pub enum ChatbotError {
    /// No upstream URL is configured.
    #[error("chatbot not configured")]
    NotConfigured,

    /// The upstream did not answer in time.
    #[error("chatbot timed out")]
    Timeout,

    /// The upstream answered with a non-success status.
    #[error("chatbot returned {status}: {message}")]
    Status {
        /// Upstream HTTP status code.
        status: u16,
        /// Short description from the upstream body.
        message: String,
    },

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),
}

impl From<reqwest::Error> for ChatbotError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Http(e)
        }
    }
}

#[derive(Serialize)]
struct ChatbotRequest<'a> {
    query: &'a str,
}

/// Upstream chatbot client.
#[derive(Clone)]
pub struct ChatbotClient {
    inner: Arc<ChatbotClientInner>,
}

struct ChatbotClientInner {
    client: reqwest::Client,
    url: String,
}

impl ChatbotClient {
    /// Create a client, or `None` if no upstream URL is configured.
    ///
    /// # Errors
    ///
    /// Returns `ChatbotError::Http` if the HTTP client cannot be built.
    pub fn from_config(config: &ChatbotConfig) -> Result<Option<Self>, ChatbotError> {
        let Some(url) = config.url.clone() else {
            return Ok(None);
        };

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ChatbotError::Http)?;

        Ok(Some(Self {
            inner: Arc::new(ChatbotClientInner { client, url }),
        }))
    }

    /// Forward a query and return the upstream JSON body.
    ///
    /// # Errors
    ///
    /// Returns `ChatbotError::Timeout` if the upstream is too slow,
    /// `ChatbotError::Status` for non-2xx answers, and `ChatbotError::Http`
    /// for transport failures or non-JSON bodies.
    #[instrument(skip(self, query), fields(query_len = query.len()))]
    pub async fn query(&self, query: &str) -> Result<serde_json::Value, ChatbotError> {
        let response = self
            .inner
            .client
            .post(&self.inner.url)
            .json(&ChatbotRequest { query })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_else(|e| {
                tracing::debug!(error = %e, "failed to read chatbot error body");
                String::new()
            });
            return Err(ChatbotError::Status {
                status: status.as_u16(),
                message: upstream_message(&body, status),
            });
        }

        Ok(response.json().await?)
    }
}

/// Pull a short message out of an upstream error body.
fn upstream_message(body: &str, status: reqwest::StatusCode) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            ["detail", "error", "message"]
                .iter()
                .find_map(|k| v.get(k).and_then(|m| m.as_str()).map(str::to_string))
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Chatbot error")
                .to_string()
        })
}
