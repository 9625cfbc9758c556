//! Fallback policy for AI operations
//!
//! Every AI-backed operation routes its result through [`recover`], which
//! classifies the failure once and hands the [`FailureKind`] to the
//! operation's fallback. Canned content for those fallbacks lives here so
//! copy changes happen in one place.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::models::{Insight, InsightKind};

/// Why an AI operation degraded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Remote service refused the request (HTTP 429)
    RateLimited,
    /// Network, authentication, server-side or configuration failure
    Unavailable,
    /// A response arrived but could not be used
    ParseFailure,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::RateLimited => "rate_limited",
            FailureKind::Unavailable => "unavailable",
            FailureKind::ParseFailure => "parse_failure",
        }
    }

    /// Short description suitable for an API `error` field
    pub fn describe(&self) -> &'static str {
        match self {
            FailureKind::RateLimited => "AI service is rate limited",
            FailureKind::Unavailable => "AI service is unavailable",
            FailureKind::ParseFailure => "AI response could not be parsed",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A value that is always usable, plus why it was degraded (if it was)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Advised<T> {
    pub value: T,
    pub degraded: Option<FailureKind>,
}

impl<T> Advised<T> {
    pub fn fresh(value: T) -> Self {
        Self {
            value,
            degraded: None,
        }
    }

    pub fn degraded(value: T, kind: FailureKind) -> Self {
        Self {
            value,
            degraded: Some(kind),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

/// Turn an operation result into an always-usable value
pub fn recover<T>(
    operation: &'static str,
    result: Result<T>,
    fallback: impl FnOnce(FailureKind) -> T,
) -> Advised<T> {
    match result {
        Ok(value) => Advised::fresh(value),
        Err(e) => {
            let kind = e.failure_kind();
            warn!(operation, kind = %kind, error = %e, "AI call failed, using fallback");
            Advised::degraded(fallback(kind), kind)
        }
    }
}

pub const RATE_LIMIT_INSIGHT_ID: &str = "fallback-rate-limit";
pub const UNAVAILABLE_INSIGHT_ID: &str = "fallback-1";

/// Fallback insights for a failed analysis
pub fn insights_for(kind: FailureKind) -> Vec<Insight> {
    let insight = match kind {
        FailureKind::RateLimited => Insight {
            id: RATE_LIMIT_INSIGHT_ID.to_string(),
            kind: InsightKind::Warning,
            title: "AI Analysis Temporarily Unavailable".to_string(),
            message: "AI insights are temporarily unavailable due to high demand. \
                      Please try again in a few minutes."
                .to_string(),
            action: Some("Try again later".to_string()),
            confidence: 0.7,
        },
        FailureKind::Unavailable | FailureKind::ParseFailure => Insight {
            id: UNAVAILABLE_INSIGHT_ID.to_string(),
            kind: InsightKind::Info,
            title: "AI Analysis Unavailable".to_string(),
            message: "Unable to generate personalized insights right now. \
                      Your expense data is still being tracked."
                .to_string(),
            action: Some("Refresh insights".to_string()),
            confidence: 0.5,
        },
    };
    vec![insight]
}

pub const RATE_LIMITED_ANSWER: &str = "The AI assistant is temporarily unavailable due to high \
    demand. Please try your question again in a few minutes.";

pub const UNAVAILABLE_ANSWER: &str = "I'm unable to answer that right now. Please try again \
    shortly, or refresh your insights.";

/// Fallback answer for a failed question
pub fn answer_for(kind: FailureKind) -> String {
    match kind {
        FailureKind::RateLimited => RATE_LIMITED_ANSWER,
        FailureKind::Unavailable | FailureKind::ParseFailure => UNAVAILABLE_ANSWER,
    }
    .to_string()
}
