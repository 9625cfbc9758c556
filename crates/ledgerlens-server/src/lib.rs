//! LedgerLens Web Server
//!
//! Axum-based REST API exposing the expense advisor.
//!
//! - Every AI endpoint answers 200 with a usable payload; degradation is
//!   reported in the `error` field, never as a failed request
//! - Restrictive CORS policy unless origins are configured
//! - Request body size limit
//! - Malformed requests answered with a JSON `{error}` body

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{debug, info, warn};

use ledgerlens_core::{AIBackend, ExpenseAdvisor};

mod handlers;

/// Maximum request body size (1 MB)
pub const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Server configuration
#[derive(Clone, Default)]
pub struct ServerConfig {
    /// Allowed CORS origins (empty = same-origin only)
    pub allowed_origins: Vec<String>,
}

/// Shared application state
pub struct AppState {
    pub advisor: ExpenseAdvisor,
}

/// Build the API router around an advisor
pub fn create_router(advisor: ExpenseAdvisor, config: ServerConfig) -> Router {
    match advisor.client() {
        Some(client) => info!("AI backend configured: {} (model: {})", client.host(), client.model()),
        None => info!("AI backend not configured (set OPENROUTER_API_KEY to enable AI features)"),
    }

    let state = Arc::new(AppState { advisor });

    let api_routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/insights", post(handlers::generate_insights))
        .route("/categorize", post(handlers::categorize))
        .route("/answer", post(handlers::answer));

    let cors = cors_layer(&config.allowed_origins);

    Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
}

/// Same-origin only unless origins are listed
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        cors
    } else {
        cors.allow_origin(origins)
    }
}

/// Start the server around an advisor
pub async fn serve_with_config(
    advisor: ExpenseAdvisor,
    host: &str,
    port: u16,
    config: ServerConfig,
) -> anyhow::Result<()> {
    check_ai_connection(&advisor).await;

    let app = create_router(advisor, config);
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log AI backend connection status
async fn check_ai_connection(advisor: &ExpenseAdvisor) {
    match advisor.client() {
        Some(client) => {
            if client.health_check().await {
                info!("AI backend connected: {} (model: {})", client.host(), client.model());
            } else {
                warn!(
                    "AI backend configured but not responding: {} (model: {})",
                    client.host(),
                    client.model()
                );
            }
        }
        None => {
            info!("AI features will use local fallbacks");
        }
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Request error rendered as `{"error": ...}`
///
/// The advisor never fails, so only the request itself can be rejected.
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        debug!(status = %self.status, error = %self.message, "Rejected request");
        (self.status, Json(serde_json::json!({ "error": self.message }))).into_response()
    }
}
