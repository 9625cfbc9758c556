//! JSON parsing helpers for AI backend responses
//!
//! Models wrap JSON in Markdown fences or chat around it. These functions
//! locate the payload and turn it into typed results, defaulting missing
//! fields instead of failing.

use serde_json::Value;

use crate::categories::Category;
use crate::error::{Error, Result};
use crate::models::{Insight, InsightKind};

pub const DEFAULT_INSIGHT_TITLE: &str = "AI Insight";
pub const DEFAULT_INSIGHT_MESSAGE: &str = "Analysis complete";
pub const DEFAULT_INSIGHT_CONFIDENCE: f64 = 0.8;

/// Truncate long text for error messages
pub(crate) fn preview(text: &str) -> String {
    if text.len() <= 200 {
        return text.to_string();
    }
    let mut end = 200;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

/// Body of the first Markdown code fence, if the text has one
///
/// An unterminated fence yields everything after the opening line.
fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_open = &text[open + 3..];
    // Skip the info string (e.g. "json") up to the end of the line
    let body_start = after_open.find('\n').map(|i| i + 1).unwrap_or(after_open.len());
    let body = &after_open[body_start..];
    let end = body.find("```").unwrap_or(body.len());
    Some(&body[..end])
}

/// Index of the bracket closing the one at `start`, ignoring brackets in strings
fn matching_close(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(start + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Locate the JSON payload in a model response
///
/// Prefers the contents of a fenced code block, then takes the span from the
/// first `[` or `{` to its matching close. If brackets never balance, falls
/// back to the last closing bracket of the same kind.
pub fn extract_json_payload(response: &str) -> Option<&str> {
    let text = fenced_block(response).unwrap_or(response).trim();

    let start = text.find(|c: char| c == '[' || c == '{')?;
    let closer = if text[start..].starts_with('[') { ']' } else { '}' };

    let end = matching_close(text, start).or_else(|| text.rfind(closer).filter(|&e| e > start))?;
    Some(&text[start..=end])
}

fn non_empty_str(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Build an insight from one (possibly incomplete) JSON element
fn insight_from_value(value: &Value, id: String) -> Insight {
    let kind = non_empty_str(value, "type")
        .and_then(|t| t.to_lowercase().parse::<InsightKind>().ok())
        .unwrap_or_default();

    let confidence = value
        .get("confidence")
        .and_then(Value::as_f64)
        .map(|c| c.clamp(0.0, 1.0))
        .unwrap_or(DEFAULT_INSIGHT_CONFIDENCE);

    Insight {
        id,
        kind,
        title: non_empty_str(value, "title").unwrap_or_else(|| DEFAULT_INSIGHT_TITLE.to_string()),
        message: non_empty_str(value, "message")
            .unwrap_or_else(|| DEFAULT_INSIGHT_MESSAGE.to_string()),
        action: non_empty_str(value, "action"),
        confidence,
    }
}

/// Parse insights from an AI response
///
/// `stamp` seeds the identifiers (`ai-<stamp>-<index>`), so ids are unique
/// within one call's result set.
pub fn parse_insights(response: &str, stamp: i64) -> Result<Vec<Insight>> {
    let payload = extract_json_payload(response).ok_or_else(|| {
        Error::Parse(format!(
            "No JSON found in insights response | Raw: {}",
            preview(response.trim())
        ))
    })?;

    let parsed: Value = serde_json::from_str(payload).map_err(|e| {
        Error::Parse(format!(
            "Invalid insights JSON: {} | Raw: {}",
            e,
            preview(payload)
        ))
    })?;

    let elements = match parsed {
        Value::Array(items) => items,
        Value::Object(mut obj) => match obj.remove("insights") {
            Some(Value::Array(items)) => items,
            _ => vec![Value::Object(obj)],
        },
        other => {
            return Err(Error::Parse(format!(
                "Expected a JSON array of insights, got: {}",
                preview(&other.to_string())
            )))
        }
    };

    Ok(elements
        .iter()
        .enumerate()
        .map(|(index, value)| insight_from_value(value, format!("ai-{}-{}", stamp, index)))
        .collect())
}

/// Validate a category response against the closed set
pub fn parse_category(response: &str) -> Category {
    Category::coerce(response)
}

/// Clean up a free-text answer
pub fn parse_answer(response: &str) -> Result<String> {
    let answer = response.trim();
    if answer.is_empty() {
        return Err(Error::Parse("Empty answer from AI".into()));
    }
    Ok(answer.to_string())
}
