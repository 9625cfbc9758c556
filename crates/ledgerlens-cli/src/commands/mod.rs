//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `advisor` - Insights, categorization and Q&A over expense files
//! - `ai` - AI backend connection test
//! - `config` - Resolved configuration display
//! - `prompts` - Prompt library management commands
//! - `serve` - Web server command

pub mod advisor;
pub mod ai;
pub mod config;
pub mod prompts;
pub mod serve;

// Re-export command functions for main.rs
pub use advisor::*;
pub use ai::*;
pub use config::*;
pub use prompts::*;
pub use serve::*;

use anyhow::{Context, Result};
use ledgerlens_core::{AIConfig, ExpenseAdvisor};

/// Build the advisor from resolved configuration (offline without a key)
pub fn build_advisor(config: &AIConfig) -> Result<ExpenseAdvisor> {
    ExpenseAdvisor::from_config(config).context("Failed to create AI client")
}

/// Truncate a string for display, respecting char boundaries
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
