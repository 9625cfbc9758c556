//! Health handler

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;
use ledgerlens_core::AIBackend;

/// Response for the health endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Whether a remote AI backend is configured (false = offline fallbacks)
    pub ai_configured: bool,
    pub model: Option<String>,
}

/// GET /api/health - Liveness and AI configuration
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let client = state.advisor.client();
    Json(HealthResponse {
        status: "ok",
        ai_configured: client.is_some(),
        model: client.map(|c| c.model().to_string()),
    })
}
