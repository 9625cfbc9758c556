//! Configuration display command

use std::path::Path;

use anyhow::Result;
use ledgerlens_core::config::default_config_path;
use ledgerlens_core::AIConfig;

/// Render the resolved configuration with the key redacted
pub fn format_config(config: &AIConfig, source: Option<&Path>) -> String {
    let source = source
        .map(|p| p.display().to_string())
        .or_else(|| {
            default_config_path()
                .filter(|p| p.exists())
                .map(|p| p.display().to_string())
        })
        .unwrap_or_else(|| "(defaults + environment)".to_string());

    [
        format!("Config file:  {}", source),
        format!("Backend:      {:?}", config.backend),
        format!("Base URL:     {}", config.base_url),
        format!("Model:        {}", config.model),
        format!(
            "API key:      {}",
            config.redacted_key().unwrap_or_else(|| "(not set)".to_string())
        ),
        format!("Timeout:      {}s", config.timeout_secs),
        format!("Site URL:     {}", config.site_url),
        format!("App name:     {}", config.app_name),
    ]
    .join("\n")
}

/// Print the resolved configuration
pub fn cmd_config(config: &AIConfig, source: Option<&Path>) -> Result<()> {
    println!("{}", format_config(config, source));
    Ok(())
}
