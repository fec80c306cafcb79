//! Lightweight text analysis: summary, keywords, sentiment, entities.

use crate::tools::registry::{tool_error, tool_success, Tool};
use crate::types::Result;
use async_trait::async_trait;
use regex::Regex;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::LazyLock;

type Pattern = LazyLock<std::result::Result<Regex, regex::Error>>;
type Analysis = std::result::Result<Value, String>;

static WORD: Pattern = LazyLock::new(|| Regex::new(r"\w+"));
static DATE: Pattern = LazyLock::new(|| Regex::new(r"\b\d{1,2}[/-]\d{1,2}[/-]\d{2,4}\b"));
static EMAIL: Pattern =
    LazyLock::new(|| Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b"));
static URL: Pattern = LazyLock::new(|| Regex::new(r"https?://\S+"));
static NUMBER: Pattern = LazyLock::new(|| Regex::new(r"\b\d+\b"));

const STOP_WORDS: &[&str] = &["the", "and", "a", "to", "of", "in", "is", "that", "it", "with"];
const POSITIVE_WORDS: &[&str] = &[
    "good",
    "great",
    "excellent",
    "positive",
    "success",
    "improve",
    "benefit",
];
const NEGATIVE_WORDS: &[&str] = &[
    "bad", "poor", "negative", "problem", "issue", "concern", "risk",
];
const TOP_KEYWORDS: usize = 10;

/// A pattern that failed to compile is reported, never treated as "no matches".
fn find_all(pattern: &Pattern, text: &str) -> std::result::Result<Vec<String>, String> {
    match pattern.as_ref() {
        Ok(re) => Ok(re.find_iter(text).map(|m| m.as_str().to_string()).collect()),
        Err(e) => Err(format!("Pattern failed to compile: {}", e)),
    }
}

/// Split after `.`, `!` or `?` when followed by whitespace. Always yields at
/// least one (possibly empty) sentence.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        let end = i + c.len_utf8();
        let mut next = end;
        while let Some(&(j, w)) = chars.peek() {
            if !w.is_whitespace() {
                break;
            }
            next = j + w.len_utf8();
            chars.next();
        }
        if next > end {
            sentences.push(&text[start..end]);
            start = next;
        }
    }
    sentences.push(&text[start..]);
    sentences
}

fn summary(text: &str) -> Value {
    let sentences = split_sentences(text);
    let first = sentences.first().copied().unwrap_or_default();
    let last = sentences.last().copied().unwrap_or_default();

    json!({
        "summary": format!("{} {}", first, last),
        "sentence_count": sentences.len(),
        "word_count": text.split_whitespace().count(),
    })
}

fn keywords(text: &str) -> Analysis {
    let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
    for (position, word) in find_all(&WORD, &text.to_lowercase())?.into_iter().enumerate() {
        if STOP_WORDS.contains(&word.as_str()) || word.chars().count() <= 3 {
            continue;
        }
        counts.entry(word).or_insert((0, position)).0 += 1;
    }

    let total = counts.len();
    let mut ranked: Vec<(String, (usize, usize))> = counts.into_iter().collect();
    // most frequent first, ties in order of first appearance
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));

    // keyword -> count, kept in rank order
    let top: Map<String, Value> = ranked
        .into_iter()
        .take(TOP_KEYWORDS)
        .map(|(keyword, (count, _))| (keyword, json!(count)))
        .collect();

    Ok(json!({
        "top_keywords": top,
        "total_keywords": total,
    }))
}

fn sentiment(text: &str) -> Analysis {
    let words = find_all(&WORD, &text.to_lowercase())?;
    let positive = words
        .iter()
        .filter(|w| POSITIVE_WORDS.contains(&w.as_str()))
        .count();
    let negative = words
        .iter()
        .filter(|w| NEGATIVE_WORDS.contains(&w.as_str()))
        .count();

    let score = if words.is_empty() {
        0.0
    } else {
        (positive as f64 - negative as f64) / words.len() as f64
    };
    let label = if score > 0.0 {
        "positive"
    } else if score < 0.0 {
        "negative"
    } else {
        "neutral"
    };

    Ok(json!({
        "sentiment_score": score,
        "positive_words": positive,
        "negative_words": negative,
        "sentiment": label,
    }))
}

fn entities(text: &str) -> Analysis {
    let dates = find_all(&DATE, text)?;
    let emails = find_all(&EMAIL, text)?;
    let urls = find_all(&URL, text)?;
    let numbers = find_all(&NUMBER, text)?;

    Ok(json!({
        "entity_counts": {
            "dates": dates.len(),
            "emails": emails.len(),
            "urls": urls.len(),
            "numbers": numbers.len(),
        },
        "entities": {
            "dates": dates,
            "emails": emails,
            "urls": urls,
            "numbers": numbers,
        },
    }))
}

pub struct DocumentAnalysisTool;

impl DocumentAnalysisTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DocumentAnalysisTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for DocumentAnalysisTool {
    fn name(&self) -> &str {
        "document_analysis"
    }

    fn description(&self) -> &str {
        "Analyze business documents and extract key information"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "text": {
                    "type": "string",
                    "description": "Document text to analyze"
                },
                "analysis_type": {
                    "type": "string",
                    "description": "Type of analysis to perform",
                    "enum": ["summary", "keywords", "sentiment", "entities"]
                }
            },
            "required": ["text", "analysis_type"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let (Some(text), Some(analysis_type)) = (
            args.get("text").and_then(Value::as_str),
            args.get("analysis_type").and_then(Value::as_str),
        ) else {
            return Ok(tool_error("Invalid parameters"));
        };

        let analysis = match analysis_type {
            "summary" => Ok(summary(text)),
            "keywords" => keywords(text),
            "sentiment" => sentiment(text),
            "entities" => entities(text),
            other => return Ok(tool_error(format!("Unknown analysis type: {}", other))),
        };

        Ok(match analysis {
            Ok(results) => tool_success(results),
            Err(e) => {
                tracing::error!(analysis_type, "Document analysis failed: {}", e);
                tool_error(e)
            }
        })
    }
}
