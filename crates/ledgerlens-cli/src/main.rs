//! LedgerLens CLI - AI expense insights
//!
//! Usage:
//!   ledgerlens insights --file expenses.csv     Generate spending insights
//!   ledgerlens categorize "Uber to airport"     Suggest a category
//!   ledgerlens ask "Where does my money go?" --file expenses.json
//!   ledgerlens serve --port 3000                Start web server

mod cli;
mod commands;


use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;
use ledgerlens_core::AIConfig;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = AIConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Commands::Insights { file, json } => {
            let advisor = commands::build_advisor(&config)?;
            commands::cmd_insights(&advisor, &file, json).await
        }
        Commands::Categorize { description, local } => {
            let advisor = commands::build_advisor(&config)?;
            commands::cmd_categorize(&advisor, &description, local).await
        }
        Commands::Ask { question, file } => {
            let advisor = commands::build_advisor(&config)?;
            commands::cmd_ask(&advisor, &question, &file).await
        }
        Commands::Serve {
            port,
            host,
            allow_origins,
        } => commands::cmd_serve(&config, &host, port, allow_origins).await,
        Commands::AiTest => commands::cmd_ai_test(&config).await,
        Commands::Config => commands::cmd_config(&config, cli.config.as_deref()),
        Commands::Prompts { action } => match action {
            None | Some(PromptsAction::List) => commands::cmd_prompts_list(),
            Some(PromptsAction::Show { prompt_id }) => commands::cmd_prompts_show(&prompt_id),
            Some(PromptsAction::Path) => commands::cmd_prompts_path(),
        },
    }
}
