//! Mock backend for testing
//!
//! Provides configurable mock responses for chat completions.
//! Useful for unit tests and development without an API key.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::categories::classify;
use crate::error::{Error, Result};
use crate::fallback::FailureKind;

use super::types::ChatRequest;
use super::AIBackend;

/// What the mock answers with
#[derive(Debug, Clone, Default)]
enum Script {
    /// Plausible answers derived from the prompt
    #[default]
    Canned,
    /// The same text for every request
    Reply(String),
    /// The same failure for every request
    Fail(FailureKind),
}

/// Mock AI backend for testing
///
/// Returns predictable responses and records every request it receives.
#[derive(Clone, Default)]
pub struct MockBackend {
    /// Whether health_check should return true
    pub healthy: bool,
    script: Script,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl MockBackend {
    /// Create a new mock backend (healthy, canned answers)
    pub fn new() -> Self {
        Self {
            healthy: true,
            ..Default::default()
        }
    }

    /// Create a mock that answers every request with `content`
    pub fn replying(content: &str) -> Self {
        Self {
            healthy: true,
            script: Script::Reply(content.to_string()),
            ..Default::default()
        }
    }

    /// Create a mock whose every request fails with `kind`
    pub fn failing(kind: FailureKind) -> Self {
        Self {
            healthy: false,
            script: Script::Fail(kind),
            ..Default::default()
        }
    }

    /// Requests received so far (shared across clones)
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    fn canned_reply(request: &ChatRequest) -> String {
        let user = request.user_content().unwrap_or_default();

        if let Some(rest) = user.strip_prefix("Categorize this expense: ") {
            return classify(rest.trim_matches('"')).to_string();
        }

        if user.contains("financial insights") {
            return r#"```json
[
  {"type": "info", "title": "Spending Snapshot", "message": "Most of your spending is in a single category.", "action": "Review your largest category", "confidence": 0.85},
  {"type": "tip", "title": "Small Purchases Add Up", "message": "Frequent small purchases make up a noticeable share of your total.", "action": "Set a weekly limit for small purchases", "confidence": 0.75}
]
```"#
                .to_string();
        }

        "Your spending looks consistent. Keep tracking expenses to get sharper answers.".to_string()
    }
}

#[async_trait]
impl AIBackend for MockBackend {
    async fn chat(&self, request: &ChatRequest) -> Result<String> {
        if let Ok(mut log) = self.requests.lock() {
            log.push(request.clone());
        }

        match &self.script {
            Script::Canned => Ok(Self::canned_reply(request)),
            Script::Reply(content) => Ok(content.clone()),
            Script::Fail(FailureKind::RateLimited) => Err(Error::RateLimited),
            Script::Fail(FailureKind::Unavailable) => {
                Err(Error::Unavailable("mock backend unavailable".into()))
            }
            Script::Fail(FailureKind::ParseFailure) => {
                Err(Error::Parse("mock backend returned garbage".into()))
            }
        }
    }

    async fn health_check(&self) -> bool {
        self.healthy
    }

    fn model(&self) -> &str {
        "mock"
    }

    fn host(&self) -> &str {
        "mock://localhost"
    }
}
