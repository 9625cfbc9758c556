//! Error types for LedgerLens

use thiserror::Error;

use crate::fallback::FailureKind;

#[derive(Error, Debug)]
pub enum Error {
    #[error("AI service rate limited the request")]
    RateLimited,

    #[error("AI service unavailable: {0}")]
    Unavailable(String),

    #[error("AI backend not configured (set OPENROUTER_API_KEY)")]
    NotConfigured,

    #[error("Could not parse AI response: {0}")]
    Parse(String),

    #[error("AI response had no content")]
    EmptyResponse,

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl Error {
    /// Collapse this error into the closed set the fallback policy switches on
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Error::RateLimited => FailureKind::RateLimited,
            Error::Parse(_) | Error::EmptyResponse | Error::Json(_) => FailureKind::ParseFailure,
            _ => FailureKind::Unavailable,
        }
    }

    /// Whether the remote service refused the request for quota reasons
    pub fn is_rate_limited(&self) -> bool {
        self.failure_kind() == FailureKind::RateLimited
    }
}

pub type Result<T> = std::result::Result<T, Error>;
