//! Test utilities for ledgerlens-core
//!
//! This module provides testing infrastructure including a mock
//! OpenAI-compatible chat server that can be used for development and
//! integration tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{Json, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tokio::sync::oneshot;

use crate::ai::ChatMessage;

/// How the mock server answers `/chat/completions`
#[derive(Debug, Clone)]
enum Mode {
    Reply(String),
    Status(u16),
    NoChoices,
}

/// A request as the mock server saw it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub authorization: Option<String>,
    pub referer: Option<String>,
    pub title: Option<String>,
}

struct MockState {
    mode: Mode,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Mock chat-completion server for testing and development
pub struct MockChatServer {
    addr: SocketAddr,
    state: Arc<MockState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockChatServer {
    /// Start a server that answers every completion with `content`
    pub async fn replying(content: &str) -> Self {
        Self::start(Mode::Reply(content.to_string())).await
    }

    /// Start a server that answers every completion with an HTTP error status
    pub async fn with_status(status: u16) -> Self {
        Self::start(Mode::Status(status)).await
    }

    /// Start a server that returns a well-formed response with no choices
    pub async fn without_choices() -> Self {
        Self::start(Mode::NoChoices).await
    }

    async fn start(mode: Mode) -> Self {
        let state = Arc::new(MockState {
            mode,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/models", get(handle_models))
            .route("/chat/completions", post(handle_chat))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockChatServer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, Deserialize)]
struct IncomingRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

fn header(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Model listing endpoint (health check)
async fn handle_models() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "data": [{"id": "mock-model", "object": "model"}]
    }))
}

/// Chat completion endpoint
async fn handle_chat(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(request): Json<IncomingRequest>,
) -> Response {
    state.requests.lock().unwrap().push(RecordedRequest {
        model: request.model.clone(),
        messages: request.messages,
        temperature: request.temperature,
        max_tokens: request.max_tokens,
        authorization: header(&headers, "authorization"),
        referer: header(&headers, "http-referer"),
        title: header(&headers, "x-title"),
    });

    match &state.mode {
        Mode::Reply(content) => Json(serde_json::json!({
            "id": "chatcmpl-mock",
            "object": "chat.completion",
            "model": request.model,
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }]
        }))
        .into_response(),
        Mode::Status(code) => {
            let status = StatusCode::from_u16(*code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (
                status,
                Json(serde_json::json!({"error": {"message": "mock failure", "code": code}})),
            )
                .into_response()
        }
        Mode::NoChoices => Json(serde_json::json!({
            "id": "chatcmpl-mock",
            "object": "chat.completion",
            "choices": []
        }))
        .into_response(),
    }
}
