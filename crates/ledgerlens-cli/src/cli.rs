//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// LedgerLens - AI insights for your expenses
#[derive(Parser)]
#[command(name = "ledgerlens")]
#[command(about = "AI expense insights with a local fallback", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (defaults to ~/.local/share/ledgerlens/config.toml if present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate spending insights for an expense file
    Insights {
        /// Expense file (JSON array or CSV)
        #[arg(short, long)]
        file: PathBuf,

        /// Print raw JSON instead of a summary
        #[arg(long)]
        json: bool,
    },

    /// Suggest a category for an expense description
    Categorize {
        /// Expense description (e.g. "Dinner at a restaurant")
        description: String,

        /// Use the keyword classifier only (no AI call)
        #[arg(long)]
        local: bool,
    },

    /// Ask a question about an expense file
    Ask {
        /// Question to answer
        question: String,

        /// Expense file (JSON array or CSV)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Start the web server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Allowed CORS origin (repeatable)
        #[arg(long = "allow-origin")]
        allow_origins: Vec<String>,
    },

    /// Test the AI backend connection and run sample requests
    AiTest,

    /// Show the resolved configuration (API key redacted)
    Config,

    /// Manage AI prompts (list, show, path)
    Prompts {
        #[command(subcommand)]
        action: Option<PromptsAction>,
    },
}

#[derive(Subcommand)]
pub enum PromptsAction {
    /// List all available prompts and their override status
    List,

    /// Show the content of a specific prompt
    Show {
        /// Prompt ID (e.g., generate_insights, categorize_expense)
        prompt_id: String,
    },

    /// Show the path where prompt overrides should be placed
    Path,
}
