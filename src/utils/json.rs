//! Pulling structured data out of model replies.
//!
//! Models wrap JSON in prose or markdown fences. Extraction tries fenced
//! ```` ```json ```` blocks first, then the outermost `{...}` span.

use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static FENCED_JSON: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json|JSON)?\s*(.*?)```").ok());

/// Extract the first JSON object embedded in `text`.
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    if let Some(fenced) = FENCED_JSON.as_ref() {
        for capture in fenced.captures_iter(text) {
            if let Some(object) = capture.get(1).and_then(|body| parse_object(body.as_str())) {
                return Some(object);
            }
        }
    }

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    parse_object(&text[start..=end])
}

fn parse_object(candidate: &str) -> Option<Map<String, Value>> {
    match serde_json::from_str::<Value>(candidate.trim()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Lowercase keys and turn spaces and hyphens into underscores, so
/// `"Problem Description"` and `"problem-description"` both read as
/// `problem_description`. Nested objects are normalized too.
pub fn normalize_keys(map: Map<String, Value>) -> Map<String, Value> {
    map.into_iter()
        .map(|(key, value)| {
            let key = key.trim().to_lowercase().replace([' ', '-'], "_");
            let value = match value {
                Value::Object(inner) => Value::Object(normalize_keys(inner)),
                other => other,
            };
            (key, value)
        })
        .collect()
}

/// Read a field as a list of strings. Scalars become a one-element list;
/// anything missing becomes empty.
pub fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
        _ => vec![],
    }
}
