//! Expense file loaders
//!
//! Two formats are accepted:
//! - JSON: an array of `{id, amount, category, description, date}` objects
//! - CSV: header `id,amount,category,description,date` (columns by name,
//!   any order). A blank id becomes `row-<n>`, counting data rows from 1.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::ExpenseRecord;

const REQUIRED_COLUMNS: &[&str] = &["amount", "category", "description", "date"];

/// Input format for expense files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpenseFormat {
    Json,
    Csv,
}

impl ExpenseFormat {
    /// Guess from extension, falling back to content sniffing
    pub fn detect(path: &Path, content: &str) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .as_deref()
        {
            Some("json") => ExpenseFormat::Json,
            Some("csv") => ExpenseFormat::Csv,
            _ if content.trim_start().starts_with('[') => ExpenseFormat::Json,
            _ => ExpenseFormat::Csv,
        }
    }
}

/// Load expenses from a JSON or CSV file
pub fn load_expenses(path: &Path) -> Result<Vec<ExpenseRecord>> {
    let mut content = String::new();
    File::open(path)?.read_to_string(&mut content)?;

    let format = ExpenseFormat::detect(path, &content);
    debug!(path = %path.display(), ?format, "Loading expenses");

    match format {
        ExpenseFormat::Json => parse_json(&content),
        ExpenseFormat::Csv => parse_csv(content.as_bytes()),
    }
}

/// Parse a JSON array of expenses
pub fn parse_json(content: &str) -> Result<Vec<ExpenseRecord>> {
    Ok(serde_json::from_str(content)?)
}

/// Parse amount string, tolerating currency symbols and thousands separators
fn parse_amount(s: &str) -> Result<f64> {
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    cleaned
        .parse()
        .map_err(|_| Error::InvalidData(format!("Invalid amount: {}", s)))
}

fn column(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name))
}

/// Parse CSV expenses
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<ExpenseRecord>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let id_col = column(&headers, "id");
    let mut cols = [0usize; 4];
    for (slot, name) in cols.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = column(&headers, name)
            .ok_or_else(|| Error::InvalidData(format!("Missing CSV column: {}", name)))?;
    }
    let [amount_col, category_col, description_col, date_col] = cols;

    let mut expenses = Vec::new();
    for (index, result) in rdr.records().enumerate() {
        let record = result?;
        let row = index + 1;
        let field = |col: usize| record.get(col).unwrap_or("").to_string();

        let id = id_col
            .and_then(|c| record.get(c))
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("row-{}", row));

        let amount = parse_amount(&field(amount_col))
            .map_err(|e| Error::InvalidData(format!("Row {}: {}", row, e)))?;

        expenses.push(ExpenseRecord {
            id,
            amount,
            category: field(category_col),
            description: field(description_col),
            date: field(date_col),
        });
    }

    debug!(count = expenses.len(), "Parsed CSV expenses");
    Ok(expenses)
}
