//! Integration tests for Pattupavadai.
//!
//! Each test spawns the storefront router on an ephemeral port, backed by
//! in-memory stores, a throwaway image directory and canned upstreams, then
//! drives it over HTTP with `reqwest`.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p pattupavadai-integration-tests
//! ```
//!
//! No database or network access is needed. Upstream services (Gemini,
//! the chatbot) are replaced by small axum servers from [`spawn_upstream`].

#![allow(clippy::expect_used, clippy::missing_panics_doc)]

use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHasher};
use async_trait::async_trait;
use axum::Router;
use secrecy::SecretString;
use serde_json::Value;
use tempfile::TempDir;

use pattupavadai_core::Email;
use pattupavadai_storefront::config::{
    AdminCredential, ChatbotConfig, GeminiConfig, ImageConfig, StorefrontConfig,
};
use pattupavadai_storefront::db::{MemoryAccountStore, MemoryOrderStore};
use pattupavadai_storefront::gemini::{GeminiClient, VisionGateway};
use pattupavadai_storefront::routes;
use pattupavadai_storefront::services::chatbot::ChatbotClient;
use pattupavadai_storefront::services::identity::{
    IdentityError, IdentityVerifier, VerifiedIdentity,
};
use pattupavadai_storefront::state::{AppState, Dependencies};

/// Prefix the stub verifier accepts: `google:<email>`.
pub const GOOGLE_TOKEN_PREFIX: &str = "google:";

/// A 1x1 transparent PNG, base64 encoded.
pub const TINY_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

/// Browser origin allowed by the test CORS configuration.
pub const ALLOWED_ORIGIN: &str = "http://localhost:5173";

/// Identity verifier that trusts `google:<email>` tokens.
pub struct StubVerifier;

#[async_trait]
impl IdentityVerifier for StubVerifier {
    async fn verify(&self, id_token: &str) -> Result<VerifiedIdentity, IdentityError> {
        let email = id_token
            .strip_prefix(GOOGLE_TOKEN_PREFIX)
            .ok_or_else(|| IdentityError::Rejected("signature".to_string()))?;
        let email = Email::parse(email).map_err(|e| IdentityError::MalformedClaims(e.to_string()))?;
        Ok(VerifiedIdentity {
            subject: format!("sub-{email}"),
            name: Some("Google User".to_string()),
            picture: Some("https://lh3.googleusercontent.com/a/test".to_string()),
            email,
        })
    }
}

/// Knobs for a spawned storefront.
#[derive(Default)]
pub struct TestOptions {
    /// Gemini base URL; `None` leaves the AI routes unconfigured.
    pub gemini_api_base: Option<String>,
    /// Chatbot URL; `None` leaves the proxy unconfigured.
    pub chatbot_url: Option<String>,
    /// Chatbot timeout (default 5 s).
    pub chatbot_timeout: Option<Duration>,
    /// Administrator email and plaintext password.
    pub admin: Option<(String, String)>,
}

/// A running storefront and handles to its backing stores.
pub struct TestApp {
    pub base_url: String,
    pub client: reqwest::Client,
    pub accounts: Arc<MemoryAccountStore>,
    pub orders: Arc<MemoryOrderStore>,
    images: TempDir,
}

impl TestApp {
    /// Spawn a storefront with nothing optional configured.
    pub async fn spawn() -> Self {
        Self::spawn_with(TestOptions::default()).await
    }

    /// Spawn a storefront with the given options.
    pub async fn spawn_with(options: TestOptions) -> Self {
        let images = tempfile::tempdir().expect("tempdir");
        let config = test_config(images.path(), &options);

        let accounts = Arc::new(MemoryAccountStore::new());
        let orders = Arc::new(MemoryOrderStore::new());

        let vision: Option<Arc<dyn VisionGateway>> = if config.gemini.api_key.is_some() {
            Some(Arc::new(GeminiClient::new(&config.gemini).expect("gemini client")))
        } else {
            None
        };
        let chatbot = ChatbotClient::from_config(&config.chatbot).expect("chatbot client");

        let state = AppState::new(
            config,
            Dependencies {
                accounts: accounts.clone(),
                orders: orders.clone(),
                identity: Arc::new(StubVerifier),
                vision,
                chatbot,
            },
        );
        state.images().ensure_dirs().await.expect("image dirs");

        let base_url = spawn_upstream(routes::app(state)).await;

        Self {
            base_url,
            client: reqwest::Client::new(),
            accounts,
            orders,
            images,
        }
    }

    /// Absolute URL for a path on this server.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Directory holding unclaimed previews.
    #[must_use]
    pub fn temp_dir(&self) -> PathBuf {
        self.images.path().join("temp")
    }

    /// Directory holding order-bound images.
    #[must_use]
    pub fn orders_dir(&self) -> PathBuf {
        self.images.path().join("orders")
    }

    /// POST JSON and return the status and parsed body.
    pub async fn post_json(&self, path: &str, body: &Value) -> (reqwest::StatusCode, Value) {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("request");
        read_json(response).await
    }

    /// GET and return the status and parsed body.
    pub async fn get_json(&self, path: &str) -> (reqwest::StatusCode, Value) {
        let response = self.client.get(self.url(path)).send().await.expect("request");
        read_json(response).await
    }

    /// Register a local account and return the signup response body.
    pub async fn signup(&self, email: &str, password: &str) -> Value {
        let (status, body) = self
            .post_json(
                "/auth/signup",
                &serde_json::json!({
                    "email": email,
                    "name": "Priya",
                    "shipping_address": "12 Temple St, Madurai",
                    "contact_details": "+91 98400 00000",
                    "password": password,
                }),
            )
            .await;
        assert_eq!(status, reqwest::StatusCode::OK, "signup failed: {body}");
        body
    }
}

async fn read_json(response: reqwest::Response) -> (reqwest::StatusCode, Value) {
    let status = response.status();
    let body = response.json().await.unwrap_or(Value::Null);
    (status, body)
}

fn test_config(images: &Path, options: &TestOptions) -> StorefrontConfig {
    let gemini = options
        .gemini_api_base
        .as_ref()
        .map_or_else(GeminiConfig::default, |base| GeminiConfig {
            api_key: Some(SecretString::from("test-gemini-key-9f8e7d6c5b4a")),
            api_base: base.clone(),
            ..GeminiConfig::default()
        });

    let admin = options.admin.as_ref().map(|(email, password)| AdminCredential {
        email: Email::parse(email).expect("admin email"),
        password_hash: SecretString::from(hash(password)),
    });

    StorefrontConfig {
        database_url: SecretString::from("postgres://unused/test"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        allowed_origins: vec![ALLOWED_ORIGIN.to_string()],
        images: ImageConfig {
            temp_dir: images.join("temp"),
            orders_dir: images.join("orders"),
        },
        gemini,
        google_client_id: Some("test-client.apps.googleusercontent.com".to_string()),
        admin,
        chatbot: ChatbotConfig {
            url: options.chatbot_url.clone(),
            timeout: options.chatbot_timeout.unwrap_or(Duration::from_secs(5)),
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}

fn hash(password: &str) -> String {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .expect("hash")
        .to_string()
}

/// Serve a router on an ephemeral local port and return its base URL.
pub async fn spawn_upstream(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("serve");
    });
    format!("http://{addr}")
}
