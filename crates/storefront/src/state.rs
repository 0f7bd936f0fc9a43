//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::db::{AccountStore, OrderStore, PgAccountStore, PgOrderStore};
use crate::gemini::{GeminiClient, GeminiError, VisionGateway};
use crate::services::auth::AuthService;
use crate::services::chatbot::{ChatbotClient, ChatbotError};
use crate::services::identity::{
    GOOGLE_TOKENINFO_URL, GoogleIdentityVerifier, IdentityError, IdentityVerifier,
};
use crate::services::images::ImageStore;
use crate::services::orders::OrderService;

const IDENTITY_TIMEOUT: Duration = Duration::from_secs(10);

/// Error building application state from configuration.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("gemini client: {0}")]
    Gemini(#[from] GeminiError),
    #[error("identity verifier: {0}")]
    Identity(#[from] IdentityError),
    #[error("chatbot client: {0}")]
    Chatbot(#[from] ChatbotError),
    #[error("http client: {0}")]
    Http(#[from] reqwest::Error),
}

/// External collaborators the handlers depend on.
///
/// Production wiring comes from [`AppState::connect`]; tests assemble their
/// own with in-memory stores and canned gateways.
pub struct Dependencies {
    pub accounts: Arc<dyn AccountStore>,
    pub orders: Arc<dyn OrderStore>,
    pub identity: Arc<dyn IdentityVerifier>,
    /// `None` when no Gemini API key is configured.
    pub vision: Option<Arc<dyn VisionGateway>>,
    /// `None` when no chatbot URL is configured.
    pub chatbot: Option<ChatbotClient>,
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like stores, API clients and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    accounts: Arc<dyn AccountStore>,
    orders: Arc<dyn OrderStore>,
    identity: Arc<dyn IdentityVerifier>,
    vision: Option<Arc<dyn VisionGateway>>,
    chatbot: Option<ChatbotClient>,
    images: ImageStore,
    pool: Option<PgPool>,
}

impl AppState {
    /// Create application state from explicit dependencies.
    #[must_use]
    pub fn new(config: StorefrontConfig, deps: Dependencies) -> Self {
        Self::build(config, deps, None)
    }

    /// Create application state backed by `PostgreSQL` and the real
    /// Google, Gemini, and chatbot endpoints.
    ///
    /// The pool is owned by the state and closed by [`AppState::close`].
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built from configuration.
    pub fn connect(config: StorefrontConfig, pool: PgPool) -> Result<Self, StateError> {
        let http = reqwest::Client::builder()
            .timeout(IDENTITY_TIMEOUT)
            .build()?;
        let identity = GoogleIdentityVerifier::new(
            http,
            GOOGLE_TOKENINFO_URL,
            config.google_client_id.clone(),
        )?;

        let vision: Option<Arc<dyn VisionGateway>> = if config.gemini.api_key.is_some() {
            Some(Arc::new(GeminiClient::new(&config.gemini)?))
        } else {
            tracing::warn!("GEMINI_API_KEY not set; AI routes will fail");
            None
        };
        let chatbot = ChatbotClient::from_config(&config.chatbot)?;

        let deps = Dependencies {
            accounts: Arc::new(PgAccountStore::new(pool.clone())),
            orders: Arc::new(PgOrderStore::new(pool.clone())),
            identity: Arc::new(identity),
            vision,
            chatbot,
        };
        Ok(Self::build(config, deps, Some(pool)))
    }

    fn build(config: StorefrontConfig, deps: Dependencies, pool: Option<PgPool>) -> Self {
        let images = ImageStore::new(&config.images);
        Self {
            inner: Arc::new(AppStateInner {
                config,
                accounts: deps.accounts,
                orders: deps.orders,
                identity: deps.identity,
                vision: deps.vision,
                chatbot: deps.chatbot,
                images,
                pool,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn accounts(&self) -> &dyn AccountStore {
        self.inner.accounts.as_ref()
    }

    #[must_use]
    pub fn orders(&self) -> &dyn OrderStore {
        self.inner.orders.as_ref()
    }

    /// The vision gateway, if configured.
    #[must_use]
    pub fn vision(&self) -> Option<Arc<dyn VisionGateway>> {
        self.inner.vision.clone()
    }

    /// The chatbot client, if configured.
    #[must_use]
    pub fn chatbot(&self) -> Option<&ChatbotClient> {
        self.inner.chatbot.as_ref()
    }

    #[must_use]
    pub fn images(&self) -> &ImageStore {
        &self.inner.images
    }

    /// Authentication service borrowing this state's collaborators.
    #[must_use]
    pub fn auth_service(&self) -> AuthService<'_> {
        AuthService::new(
            self.inner.accounts.as_ref(),
            self.inner.identity.as_ref(),
            self.inner.config.admin.as_ref(),
        )
    }

    /// Order service borrowing this state's collaborators.
    #[must_use]
    pub fn order_service(&self) -> OrderService<'_> {
        OrderService::new(
            self.inner.accounts.as_ref(),
            self.inner.orders.as_ref(),
            &self.inner.images,
        )
    }

    /// Close the database pool, if any. Call once during shutdown.
    pub async fn close(&self) {
        if let Some(pool) = &self.inner.pool {
            pool.close().await;
        }
    }
}
