//! Prompts-related command implementations

use std::path::Path;

use anyhow::{bail, Result};
use ledgerlens_core::prompts::{default_prompts_dir, PromptId, PromptInfo, PromptLibrary, PromptSource};

/// Render the prompt table with override markers
pub fn format_prompt_list(prompts: &[PromptInfo], override_dir: Option<&Path>) -> String {
    let mut lines = vec![
        format!("{:<22} {:>3}  {}", "PROMPT", "V", "SOURCE"),
        "-".repeat(48),
    ];
    lines.extend(prompts.iter().map(|info| {
        let source = match &info.override_path {
            Some(path) => format!("override ({})", path.display()),
            None => "embedded".to_string(),
        };
        format!("{:<22} {:>3}  {}", info.id, info.version, source)
    }));
    lines.push(String::new());
    lines.push(format!(
        "Overrides are read from: {}",
        override_dir
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(no data directory)".to_string())
    ));
    lines.join("\n")
}

/// List the advisor's prompts and where each one is loaded from
pub fn cmd_prompts_list() -> Result<()> {
    let mut library = PromptLibrary::new();
    let prompts = library.list();
    println!("{}", format_prompt_list(&prompts, library.override_dir().map(|p| p.as_path())));
    Ok(())
}

/// Show the content of a specific prompt
pub fn cmd_prompts_show(prompt_id: &str) -> Result<()> {
    let Some(id) = PromptId::parse(prompt_id) else {
        let known: Vec<&str> = PromptId::all().iter().map(|id| id.as_str()).collect();
        bail!(
            "Unknown prompt ID: {} (available: {})",
            prompt_id,
            known.join(", ")
        );
    };

    let mut library = PromptLibrary::new();
    let prompt = library.get(id)?;

    println!("Prompt: {}", prompt.metadata.id);
    println!("Version: {}", prompt.metadata.version);
    println!(
        "Sampling: temperature {}, max_tokens {}",
        prompt.metadata.temperature, prompt.metadata.max_tokens
    );
    match &prompt.source {
        PromptSource::Embedded => println!("Source: Default"),
        PromptSource::Override(path) => println!("Source: Override ({})", path.display()),
    }

    println!();
    println!("--- Content ---");
    println!("{}", prompt.content);

    Ok(())
}

/// Print the override directory
pub fn cmd_prompts_path() -> Result<()> {
    let Some(dir) = default_prompts_dir() else {
        bail!("No local data directory on this system");
    };
    println!("{}", dir.display());
    if !dir.is_dir() {
        eprintln!("(directory does not exist yet; create it and add <prompt_id>.md files)");
    }
    Ok(())
}
