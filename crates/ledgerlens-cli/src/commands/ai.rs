//! AI backend test command

use anyhow::Result;
use ledgerlens_core::{AIBackend, AIConfig, ExpenseAdvisor, ExpenseRecord};

use super::{build_advisor, truncate};

const SAMPLE_DESCRIPTIONS: &[&str] = &[
    "Dinner at a restaurant",
    "Uber to airport",
    "Netflix subscription",
    "Amazon order",
    "Electric bill",
    "Pharmacy pickup",
];

fn sample_expenses() -> Vec<ExpenseRecord> {
    SAMPLE_DESCRIPTIONS
        .iter()
        .zip([48.20, 36.50, 15.49, 62.99, 110.00, 24.75])
        .enumerate()
        .map(|(i, (description, amount))| ExpenseRecord {
            id: format!("sample-{}", i + 1),
            amount,
            category: ledgerlens_core::classify(description).to_string(),
            description: description.to_string(),
            date: format!("2024-03-{:02}", i + 1),
        })
        .collect()
}

/// Test the AI backend connection and run sample requests
pub async fn cmd_ai_test(config: &AIConfig) -> Result<()> {
    println!("🔍 Testing AI backend...\n");
    println!("  Base URL: {}", config.base_url);
    println!("  Model:    {}", config.model);
    println!(
        "  API key:  {}\n",
        config.redacted_key().unwrap_or_else(|| "(not set)".to_string())
    );

    let advisor = build_advisor(config)?;
    let Some(client) = advisor.client() else {
        println!("⚠️  No API key configured, AI features will use local fallbacks.");
        println!("\nTo enable AI features:");
        println!("  export OPENROUTER_API_KEY=sk-or-...");
        return Ok(());
    };

    print!("Checking backend availability... ");
    if client.health_check().await {
        println!("✅ Connected");
    } else {
        println!("❌ Failed");
        println!("\n⚠️  Could not reach {}", client.host());
        return Ok(());
    }

    run_samples(&advisor).await;
    Ok(())
}

async fn run_samples(advisor: &ExpenseAdvisor) {
    println!("\n📋 Testing categorization...\n");
    for description in SAMPLE_DESCRIPTIONS {
        let advised = advisor.categorize(description).await;
        match advised.degraded {
            None => println!("  \"{}\" → {}", description, advised.value),
            Some(kind) => println!(
                "  \"{}\" → {} (fallback: {})",
                description, advised.value, kind
            ),
        }
    }

    println!("\n📊 Testing insights...\n");
    let expenses = sample_expenses();
    let insights = advisor.generate_insights(&expenses).await;
    for insight in &insights.value {
        println!("  [{}] {}", insight.kind, insight.title);
    }
    if let Some(kind) = insights.degraded {
        println!("  (fallback: {})", kind);
    }

    println!("\n💬 Testing Q&A...\n");
    let answer = advisor
        .answer_question("What is my largest expense?", &expenses)
        .await;
    println!("  {}", truncate(&answer.value, 200));
    if let Some(kind) = answer.degraded {
        println!("  (fallback: {})", kind);
    }
}
