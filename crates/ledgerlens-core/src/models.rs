//! Data models for LedgerLens

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// An expense as recorded by the user
///
/// Callers own validation; nothing here checks amount sign, date format or
/// whether `category` is a known category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseRecord {
    pub id: String,
    pub amount: f64,
    pub category: String,
    pub description: String,
    /// Calendar date as entered (e.g. "2024-03-15")
    pub date: String,
}

/// The subset of an expense that is sent to the model
#[derive(Debug, Clone, Serialize)]
pub struct ExpenseProjection<'a> {
    pub amount: f64,
    pub category: &'a str,
    pub description: &'a str,
    pub date: &'a str,
}

impl<'a> From<&'a ExpenseRecord> for ExpenseProjection<'a> {
    fn from(record: &'a ExpenseRecord) -> Self {
        Self {
            amount: record.amount,
            category: &record.category,
            description: &record.description,
            date: &record.date,
        }
    }
}

/// Kind of insight, drives how the UI presents it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Warning,
    #[default]
    Info,
    Success,
    Tip,
}

impl InsightKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightKind::Warning => "warning",
            InsightKind::Info => "info",
            InsightKind::Success => "success",
            InsightKind::Tip => "tip",
        }
    }
}

impl fmt::Display for InsightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InsightKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "warning" => Ok(InsightKind::Warning),
            "info" => Ok(InsightKind::Info),
            "success" => Ok(InsightKind::Success),
            "tip" => Ok(InsightKind::Tip),
            _ => Err(format!("Unknown insight type: {}", s)),
        }
    }
}

/// A human-readable observation about spending
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    /// Confidence level (0.0-1.0)
    pub confidence: f64,
}
