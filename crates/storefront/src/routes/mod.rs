//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Readiness check (database)
//!
//! # Auth
//! POST /auth/signup            - Create a local account
//! POST /auth/login             - Email/password (or administrator) login
//! POST /auth/google            - Google ID-token login
//!
//! # AI
//! POST /analyze-dress          - Garment attributes from a photo
//! POST /preview-image          - Render a catalog preview
//!
//! # Orders
//! POST /orders                 - Place an order
//! GET  /orders/{email}         - One account's orders (?offset=&limit=)
//! GET  /admin/orders           - Every order (?offset=&limit=)
//!
//! # Chatbot
//! POST /chatbot/query          - Proxy to the shopping assistant
//!
//! # Static
//! GET  /images/orders/{file}   - Order-bound preview images
//! ```

pub mod ai;
pub mod auth;
pub mod chatbot;
pub mod health;
pub mod orders;

use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRequest, Request, rejection::JsonRejection},
    http::HeaderValue,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::error::AppError;
use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Request bodies carry base64 photos; allow more than axum's 2 MB default.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// JSON extractor and response whose rejections use the `{"detail"}` error body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl<T: Serialize> IntoResponse for ApiJson<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/google", post(auth::google))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(orders::create_order))
        .route("/{user_email}", get(orders::list_user_orders))
}

/// Create all API routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/auth", auth_routes())
        .nest("/orders", order_routes())
        // Not authenticated; see DESIGN.md
        .route("/admin/orders", get(orders::list_all_orders))
        .route("/analyze-dress", post(ai::analyze_dress))
        .route("/preview-image", post(ai::preview_image))
        .route("/chatbot/query", post(chatbot::query))
}

/// Build the complete application with middleware and static images.
///
/// Sentry layers are added by the binary so tests can run without them.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config().allowed_origins);
    let order_images = ServeDir::new(state.images().orders_dir());

    Router::new()
        .merge(routes())
        .nest_service("/images/orders", order_images)
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
            tracing::info_span!(
                "request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = tracing::field::Empty,
            )
        }))
        .layer(cors)
}

/// CORS for the configured browser origins, with credentials.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}
