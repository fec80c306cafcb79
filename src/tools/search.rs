//! Search tool implementation using daedra
//!
//! This module provides web search capabilities via the daedra crate,
//! which uses DuckDuckGo as the search backend.

use crate::tools::registry::{tool_error, tool_success, Tool};
use crate::types::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::warn;

const DEFAULT_RESULTS: usize = 5;

/// Web search tool powered by daedra
pub struct SearchTool;

impl SearchTool {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SearchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for information"
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query"
                },
                "num_results": {
                    "type": "integer",
                    "description": "Number of results to return (default: 5)",
                    "default": DEFAULT_RESULTS
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let Some(query) = args
            .get("query")
            .and_then(|v| v.as_str())
            .filter(|q| !q.trim().is_empty())
        else {
            return Ok(tool_error("Invalid parameters"));
        };

        let num_results = args
            .get("num_results")
            .and_then(|v| v.as_u64())
            .map(|n| n as usize)
            .unwrap_or(DEFAULT_RESULTS);

        let search_args = daedra::SearchArgs {
            query: query.to_string(),
            options: Some(daedra::SearchOptions {
                num_results,
                ..Default::default()
            }),
        };

        match daedra::tools::search::perform_search(&search_args).await {
            Ok(response) => {
                let results: Vec<Value> = response
                    .data
                    .iter()
                    .map(|r| {
                        json!({
                            "title": r.title,
                            "url": r.url,
                            "description": r.description
                        })
                    })
                    .collect();

                Ok(tool_success(json!(results)))
            }
            Err(e) => {
                warn!(query, "Web search failed: {}", e);
                Ok(tool_error(format!("Search failed: {}", e)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_tool_definition() {
        let tool = SearchTool::new();
        assert_eq!(tool.name(), "web_search");
        assert!(!tool.description().is_empty());

        let schema = tool.parameters_schema();
        assert_eq!(schema["required"], json!(["query"]));
        assert_eq!(schema["properties"]["num_results"]["default"], 5);
    }

    #[tokio::test]
    async fn test_search_missing_query() {
        let tool = SearchTool::new();
        let result = tool.execute(json!({"query": "  "})).await.unwrap();
        assert_eq!(result["status"], "error");
    }
}
