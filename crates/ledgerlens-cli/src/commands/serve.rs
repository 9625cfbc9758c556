//! Server command implementation

use anyhow::Result;
use ledgerlens_core::{AIBackend, AIConfig, ExpenseAdvisor};
use ledgerlens_server::ServerConfig;

use super::build_advisor;

/// Startup banner for the server, reflecting the advisor actually in use
pub fn format_serve_banner(
    advisor: &ExpenseAdvisor,
    host: &str,
    port: u16,
    allowed_origins: &[String],
) -> String {
    let mut out = String::from("🚀 Starting LedgerLens web server...\n");
    out.push_str(&format!("   Listening: http://{}:{}\n", host, port));
    match advisor.client() {
        Some(client) => out.push_str(&format!("   AI model: {}\n", client.model())),
        None => out.push_str("   AI: not configured (local fallbacks only)\n"),
    }
    if !allowed_origins.is_empty() {
        out.push_str(&format!("   CORS origins: {}\n", allowed_origins.join(", ")));
    }
    out
}

pub async fn cmd_serve(
    config: &AIConfig,
    host: &str,
    port: u16,
    allowed_origins: Vec<String>,
) -> Result<()> {
    let advisor = build_advisor(config)?;
    println!("{}", format_serve_banner(&advisor, host, port, &allowed_origins));

    ledgerlens_server::serve_with_config(advisor, host, port, ServerConfig { allowed_origins })
        .await
}
