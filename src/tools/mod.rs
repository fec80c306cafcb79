//! Built-in Tools for Agent Capabilities
//!
//! Tools let agents compute instead of guess: statistics over series,
//! document analysis, business ratios and web search.
//!
//! # Module Structure
//!
//! - [`registry`] - The [`Tool`](registry::Tool) trait, parameter validation
//!   and the [`ToolRegistry`](registry::ToolRegistry)
//! - [`data_analysis`] - Descriptive statistics, correlation and trend
//! - [`document_analysis`] - Summary, keywords, sentiment and entities
//! - [`business_metrics`] - Financial, customer, operational and marketing ratios
//! - [`search`] - Web search via daedra
//!
//! # Results
//!
//! Every tool answers `{"status": "success", "results": ...}` or
//! `{"status": "error", "error": ...}`. Only unknown tools and timeouts are
//! returned as `Err` by the registry.
//!
//! ```ignore
//! let registry = ToolRegistry::with_default_tools();
//! let result = registry
//!     .execute("data_analysis", json!({"data": [1, 2, 3], "analysis_type": "trend"}))
//!     .await?;
//! ```

pub mod business_metrics;
pub mod data_analysis;
pub mod document_analysis;
/// Tool registry for managing available tools.
pub mod registry;
/// Web search tool using DuckDuckGo.
pub mod search;

pub use registry::{Tool, ToolRegistry};

/// Names of the tools registered by [`ToolRegistry::with_default_tools`].
pub const BUILTIN_TOOLS: &[&str] = &[
    "data_analysis",
    "document_analysis",
    "business_metrics",
    "web_search",
];
