//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 8000)
//! - `ALLOWED_ORIGINS` - Comma-separated browser origins for CORS
//!   (default: `http://localhost:5173,http://127.0.0.1:5173`)
//! - `GEMINI_API_KEY` - Vision/image generation API key; AI routes return 500 without it
//! - `GEMINI_API_BASE` - API base URL (default: Google's public endpoint)
//! - `GEMINI_ANALYSIS_MODEL` - Model used for garment analysis
//! - `GEMINI_IMAGE_MODEL` - Model used for preview rendering
//! - `GOOGLE_CLIENT_ID` - OAuth client ID that Google ID tokens must be issued for
//! - `ADMIN_EMAIL` / `ADMIN_PASSWORD_HASH` - Break-glass administrator login
//!   (Argon2 PHC string). Both or neither must be set.
//! - `CHATBOT_URL` - Upstream chatbot endpoint for `/chatbot/query`
//! - `CHATBOT_TIMEOUT_SECS` - Upstream chatbot timeout (default: 30)
//! - `IMAGES_TEMP_DIR` - Unclaimed preview images (default: `images/temp`)
//! - `IMAGES_ORDERS_DIR` - Order-bound images, served at `/images/orders` (default: `images/orders`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use pattupavadai_core::Email;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:5173,http://127.0.0.1:5173";
const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_ANALYSIS_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";
const DEFAULT_CHATBOT_TIMEOUT_SECS: u64 = 30;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Browser origins allowed by CORS
    pub allowed_origins: Vec<String>,
    /// Preview and order image directories
    pub images: ImageConfig,
    /// Vision/generation API configuration
    pub gemini: GeminiConfig,
    /// Google OAuth client ID for ID-token audience checks
    pub google_client_id: Option<String>,
    /// Break-glass administrator credential
    pub admin: Option<AdminCredential>,
    /// Upstream chatbot configuration
    pub chatbot: ChatbotConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Locations of the image side-channel directories.
#[derive(Debug, Clone)]
pub struct ImageConfig {
    /// Where freshly generated previews wait to be claimed by an order.
    pub temp_dir: PathBuf,
    /// Where order-bound images live; served as static content.
    pub orders_dir: PathBuf,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            temp_dir: PathBuf::from("images/temp"),
            orders_dir: PathBuf::from("images/orders"),
        }
    }
}

/// Gemini API configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct GeminiConfig {
    /// API key; `None` disables the AI routes.
    pub api_key: Option<SecretString>,
    /// Base URL, without a trailing slash.
    pub api_base: String,
    /// Model used for garment attribute analysis.
    pub analysis_model: String,
    /// Model used for preview image generation.
    pub image_model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            analysis_model: DEFAULT_ANALYSIS_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
        }
    }
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("api_base", &self.api_base)
            .field("analysis_model", &self.analysis_model)
            .field("image_model", &self.image_model)
            .finish()
    }
}

/// Administrator credential supplied through configuration.
///
/// Checked by the same password verifier as stored accounts. Implements
/// `Debug` manually to redact the hash.
#[derive(Clone)]
pub struct AdminCredential {
    /// Administrator login email.
    pub email: Email,
    /// Argon2 PHC hash of the administrator password.
    pub password_hash: SecretString,
}

impl std::fmt::Debug for AdminCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredential")
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

/// Upstream chatbot configuration.
#[derive(Debug, Clone)]
pub struct ChatbotConfig {
    /// Endpoint that receives `{"query": ...}`; `None` disables the proxy.
    pub url: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for ChatbotConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout: Duration::from_secs(DEFAULT_CHATBOT_TIMEOUT_SECS),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_database_url("STOREFRONT_DATABASE_URL")?;
        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "8000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let allowed_origins = parse_origins(&get_env_or_default(
            "ALLOWED_ORIGINS",
            DEFAULT_ALLOWED_ORIGINS,
        ))?;

        let images = ImageConfig {
            temp_dir: PathBuf::from(get_env_or_default("IMAGES_TEMP_DIR", "images/temp")),
            orders_dir: PathBuf::from(get_env_or_default("IMAGES_ORDERS_DIR", "images/orders")),
        };

        let gemini = GeminiConfig::from_env()?;
        let admin = parse_admin_credential(
            get_optional_env("ADMIN_EMAIL"),
            get_optional_env("ADMIN_PASSWORD_HASH"),
        )?;
        let chatbot = ChatbotConfig::from_env()?;

        Ok(Self {
            database_url,
            host,
            port,
            allowed_origins,
            images,
            gemini,
            google_client_id: get_optional_env("GOOGLE_CLIENT_ID"),
            admin,
            chatbot,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl GeminiConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_key = get_optional_env("GEMINI_API_KEY")
            .map(|key| {
                validate_secret_strength(&key, "GEMINI_API_KEY")?;
                Ok(SecretString::from(key))
            })
            .transpose()?;

        Ok(Self {
            api_key,
            api_base: get_env_or_default("GEMINI_API_BASE", DEFAULT_GEMINI_API_BASE)
                .trim_end_matches('/')
                .to_string(),
            analysis_model: get_env_or_default("GEMINI_ANALYSIS_MODEL", DEFAULT_ANALYSIS_MODEL),
            image_model: get_env_or_default("GEMINI_IMAGE_MODEL", DEFAULT_IMAGE_MODEL),
        })
    }
}

impl ChatbotConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let timeout_secs = get_env_or_default(
            "CHATBOT_TIMEOUT_SECS",
            &DEFAULT_CHATBOT_TIMEOUT_SECS.to_string(),
        )
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar("CHATBOT_TIMEOUT_SECS".to_string(), e.to_string()))?;

        Ok(Self {
            url: get_optional_env("CHATBOT_URL"),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    get_required_env("DATABASE_URL")
        .map(SecretString::from)
        .map_err(|_| ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional, non-blank environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Split a comma-separated origin list, rejecting values that are not
/// `scheme://host[:port]`.
fn parse_origins(raw: &str) -> Result<Vec<String>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(|origin| {
            let valid = (origin.starts_with("http://") || origin.starts_with("https://"))
                && !origin.ends_with('/')
                && axum::http::HeaderValue::from_str(origin).is_ok();
            if valid {
                Ok(origin.to_string())
            } else {
                Err(ConfigError::InvalidEnvVar(
                    "ALLOWED_ORIGINS".to_string(),
                    format!("invalid origin '{origin}'"),
                ))
            }
        })
        .collect()
}

/// Build the administrator credential; both parts or neither.
fn parse_admin_credential(
    email: Option<String>,
    password_hash: Option<String>,
) -> Result<Option<AdminCredential>, ConfigError> {
    match (email, password_hash) {
        (None, None) => Ok(None),
        (Some(email), Some(hash)) => {
            let email = Email::parse(&email).map_err(|e| {
                ConfigError::InvalidEnvVar("ADMIN_EMAIL".to_string(), e.to_string())
            })?;
            argon2::PasswordHash::new(&hash).map_err(|e| {
                ConfigError::InvalidEnvVar("ADMIN_PASSWORD_HASH".to_string(), e.to_string())
            })?;
            Ok(Some(AdminCredential {
                email,
                password_hash: SecretString::from(hash),
            }))
        }
        (Some(_), None) => Err(ConfigError::MissingEnvVar("ADMIN_PASSWORD_HASH".to_string())),
        (None, Some(_)) => Err(ConfigError::MissingEnvVar("ADMIN_EMAIL".to_string())),
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}
