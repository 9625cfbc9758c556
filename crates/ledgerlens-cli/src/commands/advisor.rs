//! Advisor command implementations (insights, categorize, ask)

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use ledgerlens_core::{
    classify, load_expenses, Advised, Category, ExpenseAdvisor, ExpenseRecord, Insight,
    InsightKind,
};

fn load(file: &Path) -> Result<Vec<ExpenseRecord>> {
    load_expenses(file).with_context(|| format!("Failed to load expenses from {}", file.display()))
}

fn icon(kind: InsightKind) -> &'static str {
    match kind {
        InsightKind::Warning => "⚠️ ",
        InsightKind::Info => "ℹ️ ",
        InsightKind::Success => "✅",
        InsightKind::Tip => "💡",
    }
}

/// Note appended when a result came from a fallback
fn degraded_note<T>(advised: &Advised<T>) -> Option<String> {
    advised
        .degraded
        .map(|kind| format!("({}, showing fallback)", kind.describe()))
}

/// Render insights for the terminal
pub fn format_insights(advised: &Advised<Vec<Insight>>) -> String {
    let mut out = String::new();

    for insight in &advised.value {
        let _ = writeln!(
            out,
            "{} {} ({:.0}% confidence)",
            icon(insight.kind),
            insight.title,
            insight.confidence * 100.0
        );
        let _ = writeln!(out, "   {}", insight.message);
        if let Some(action) = &insight.action {
            let _ = writeln!(out, "   → {}", action);
        }
        out.push('\n');
    }

    if let Some(note) = degraded_note(advised) {
        let _ = writeln!(out, "{}", note);
    }
    out
}

/// Generate insights for an expense file
pub async fn cmd_insights(advisor: &ExpenseAdvisor, file: &Path, json: bool) -> Result<()> {
    let expenses = load(file)?;
    let advised = advisor.generate_insights(&expenses).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&advised)?);
        return Ok(());
    }

    println!("📊 Insights for {} expenses\n", expenses.len());
    print!("{}", format_insights(&advised));
    Ok(())
}

/// Render a category suggestion with its source
pub fn format_category(description: &str, advised: &Advised<Category>, local: bool) -> String {
    let source = match (local, degraded_note(advised)) {
        (true, _) => "keywords".to_string(),
        (false, None) => "AI".to_string(),
        (false, Some(note)) => format!("keywords {}", note),
    };
    format!("\"{}\" → {} [{}]", description, advised.value, source)
}

/// Suggest a category for a description
pub async fn cmd_categorize(advisor: &ExpenseAdvisor, description: &str, local: bool) -> Result<()> {
    let advised = if local {
        Advised::fresh(classify(description))
    } else {
        advisor.categorize(description).await
    };

    println!("{}", format_category(description, &advised, local));
    Ok(())
}

/// Answer a question about an expense file
pub async fn cmd_ask(advisor: &ExpenseAdvisor, question: &str, file: &Path) -> Result<()> {
    let expenses = load(file)?;
    let advised = advisor.answer_question(question, &expenses).await;

    println!("💬 {}\n", advised.value);
    if let Some(note) = degraded_note(&advised) {
        println!("{}", note);
    }
    Ok(())
}
