//! LedgerLens Core Library
//!
//! Shared functionality for the LedgerLens expense assistant:
//! - Keyword-based expense categorization
//! - Pluggable chat-completion backends (OpenRouter, any OpenAI-compatible API)
//! - Expense advisor: insights, category suggestions and Q&A
//! - Fallback policy so every advisor operation degrades instead of failing
//! - Prompt library for customizable AI prompts
//! - Expense loading from JSON and CSV files

pub mod advisor;
pub mod ai;
pub mod categories;
pub mod config;
pub mod error;
pub mod fallback;
pub mod import;
pub mod models;
pub mod prompts;

/// Test utilities including mock chat-completion server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use advisor::{categorize_expense, generate_ai_answer, generate_expense_insights, ExpenseAdvisor};
pub use ai::{AIBackend, AIClient, ChatMessage, ChatRequest, MockBackend, OpenAICompatibleBackend, Role};
pub use categories::{classify, Category};
pub use config::{AIConfig, BackendKind};
pub use error::{Error, Result};
pub use fallback::{Advised, FailureKind};
pub use import::{load_expenses, ExpenseFormat};
pub use models::{ExpenseRecord, Insight, InsightKind};
pub use prompts::{Prompt, PromptId, PromptInfo, PromptLibrary};
