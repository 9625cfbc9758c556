//! Pluggable chat-completion backend abstraction
//!
//! This module provides a backend-agnostic interface for talking to a hosted
//! chat-completion model. The advisor builds prompts; backends only move
//! messages over the wire and report typed errors.
//!
//! # Architecture
//!
//! - `AIBackend` trait: defines the transport interface
//! - `AIClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OpenAICompatibleBackend`, `MockBackend`
//!
//! # Usage
//!
//! ```rust,ignore
//! let config = AIConfig::load(None)?;
//! if let Some(client) = AIClient::from_config(&config)? {
//!     let reply = client.chat(&request).await?;
//! }
//! ```
//!
//! # Configuration
//!
//! Environment variables:
//! - `AI_BACKEND`: Backend to use (openrouter, openai_compatible, mock). Default: openrouter
//! - `OPENROUTER_API_KEY` / `OPENAI_API_KEY`: credential (required for HTTP backends)
//! - `LEDGERLENS_AI_BASE_URL`, `LEDGERLENS_AI_MODEL`: endpoint and model overrides

mod mock;
mod openai_compatible;
pub mod parsing;
pub mod types;

pub use mock::MockBackend;
pub use openai_compatible::OpenAICompatibleBackend;
pub use types::*;

use async_trait::async_trait;
use tracing::warn;

use crate::config::{AIConfig, BackendKind};
use crate::error::Result;

/// Trait defining the interface for all AI backends
///
/// Backends should be Send + Sync to allow use across async tasks.
#[async_trait]
pub trait AIBackend: Send + Sync {
    /// Send one chat completion and return the text of the first choice
    ///
    /// Rate limiting must surface as `Error::RateLimited` so the fallback
    /// policy can tell it apart from other failures.
    async fn chat(&self, request: &ChatRequest) -> Result<String>;

    /// Check if the backend is available
    async fn health_check(&self) -> bool;

    /// Get the model name (for logging)
    fn model(&self) -> &str;

    /// Get the host URL (for logging)
    fn host(&self) -> &str;
}

/// Concrete AI client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum AIClient {
    /// OpenAI-compatible backend (OpenRouter, OpenAI, vLLM, LocalAI, etc.)
    OpenAICompatible(OpenAICompatibleBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl AIClient {
    /// Create an AI client from resolved configuration
    ///
    /// Returns `Ok(None)` when an HTTP backend is selected but no credential
    /// is available; callers then run offline.
    pub fn from_config(config: &AIConfig) -> Result<Option<Self>> {
        match config.backend {
            BackendKind::Mock => Ok(Some(AIClient::mock())),
            BackendKind::OpenAICompatible => {
                if config.api_key.is_none() {
                    warn!("No API key found (set OPENROUTER_API_KEY), AI features run offline");
                    return Ok(None);
                }
                OpenAICompatibleBackend::from_config(config)
                    .map(|b| Some(AIClient::OpenAICompatible(b)))
            }
        }
    }

    /// Scripted mock backend (`backend = "mock"` in config)
    pub fn mock() -> Self {
        AIClient::Mock(MockBackend::new())
    }
}

impl From<MockBackend> for AIClient {
    fn from(backend: MockBackend) -> Self {
        AIClient::Mock(backend)
    }
}

impl From<OpenAICompatibleBackend> for AIClient {
    fn from(backend: OpenAICompatibleBackend) -> Self {
        AIClient::OpenAICompatible(backend)
    }
}

// Implement AIBackend for AIClient by delegating to the inner backend
#[async_trait]
impl AIBackend for AIClient {
    async fn chat(&self, request: &ChatRequest) -> Result<String> {
        match self {
            AIClient::OpenAICompatible(b) => b.chat(request).await,
            AIClient::Mock(b) => b.chat(request).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            AIClient::OpenAICompatible(b) => b.health_check().await,
            AIClient::Mock(b) => b.health_check().await,
        }
    }

    fn model(&self) -> &str {
        match self {
            AIClient::OpenAICompatible(b) => b.model(),
            AIClient::Mock(b) => b.model(),
        }
    }

    fn host(&self) -> &str {
        match self {
            AIClient::OpenAICompatible(b) => b.host(),
            AIClient::Mock(b) => b.host(),
        }
    }
}
