//! # Insight - Multi-Agent Business Consulting Server
//!
//! Conversational coach and router agents drive a discovery-to-solution-plan
//! pipeline: the coach interviews the user topic by topic, summarises the
//! problem as structured JSON, and the router turns that summary into a
//! validated solution plan. Pluggable analysis tools (statistics, document
//! analysis, business metrics, web search) are available to agents and over
//! HTTP.
//!
//! ## Overview
//!
//! Insight can be used in two ways:
//!
//! 1. **As a standalone server** - Run the `insight-server` binary
//! 2. **As a library** - Import agents and workflows into your own Rust project
//!
//! ### Running a workflow
//!
//! ```rust,ignore
//! use insight::{AgentFactory, ProviderRegistry, ToolRegistry, WorkflowRegistry};
//! use insight::workflows::WorkflowDeps;
//! use std::sync::Arc;
//!
//! let config = insight::InsightConfig::load("insight.toml")?;
//! let providers = Arc::new(ProviderRegistry::from_config(&config));
//! let tools = Arc::new(ToolRegistry::with_config(&config));
//! let agents = Arc::new(AgentFactory::from_config(&config, providers, tools));
//!
//! let registry = WorkflowRegistry::with_builtin_workflows();
//! let deps = WorkflowDeps { agents };
//! let mut workflow = registry.create("problem_discovery", "Churn", "Why customers leave", &deps)?;
//! let results = workflow
//!     .execute(&serde_json::json!({ "initial_query": "Customers cancel after a month" }))
//!     .await?;
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `ollama` | Ollama local inference (default) |
//! | `openai` | OpenAI API support |
//! | `swagger-ui` | Interactive API documentation |
//!
//! ## Modules
//!
//! - [`agents`] - Coach, router, analyst and simulated-user agents
//! - [`api`] - REST API handlers and routes
//! - [`llm`] - LLM client implementations
//! - [`memory`] - Per-session interaction log
//! - [`services`] - Coaching sessions and workflow runs
//! - [`tools`] - Tool definitions and registry
//! - [`workflows`] - Workflow state machine, registry and built-in workflows
//! - [`types`] - Common types and error handling

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

/// Consulting agents and the agent factory.
pub mod agents;
/// HTTP API handlers and routes.
pub mod api;
/// Command-line interface.
pub mod cli;
/// LLM provider clients and abstractions.
pub mod llm;
/// Per-session interaction memory.
pub mod memory;
/// Application services behind the HTTP handlers.
pub mod services;
/// Built-in analysis tools.
pub mod tools;
/// Core types (requests, responses, errors).
pub mod types;
/// Configuration and JSON extraction utilities.
pub mod utils;
/// Workflow state machine and built-in workflows.
pub mod workflows;

// Re-export commonly used types
pub use agents::{Agent, AgentFactory};
pub use api::routes::build_router;
pub use llm::client::LLMClientFactoryTrait;
pub use llm::{LLMClient, LLMClientFactory, LLMResponse, Provider, ProviderRegistry};
pub use memory::InteractionStore;
pub use services::SessionService;
pub use tools::registry::ToolRegistry;
pub use types::{AppError, Result};
pub use utils::toml_config::{ConfigManager, InsightConfig};
pub use workflows::{Workflow, WorkflowRegistry};

use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// TOML configuration with hot-reload support
    pub config_manager: Arc<ConfigManager>,
    /// Tool registry for agent tools
    pub tool_registry: Arc<ToolRegistry>,
    /// Agent factory for coach, router and analyst instances
    pub agents: Arc<AgentFactory>,
    /// Registered workflows
    pub workflows: Arc<WorkflowRegistry>,
    /// Coaching sessions
    pub sessions: Arc<SessionService>,
    /// Key required in `x-api-key`, when configured
    pub api_key: Option<Arc<str>>,
}

impl AppState {
    /// Wire the registries and services from the current configuration.
    ///
    /// Fails when `[api] api_key_env` names an unset variable.
    pub fn new(
        config_manager: Arc<ConfigManager>,
        llm_factory: Arc<dyn LLMClientFactoryTrait>,
    ) -> Result<Self> {
        let config = config_manager.config();
        let api_key = config
            .api_key()
            .map_err(|e| AppError::Configuration(e.to_string()))?
            .map(Arc::from);

        let tool_registry = Arc::new(ToolRegistry::with_config(&config));
        let agents = Arc::new(AgentFactory::from_config(
            &config,
            llm_factory,
            Arc::clone(&tool_registry),
        ));
        let workflows = Arc::new(WorkflowRegistry::with_builtin_workflows());
        let sessions = Arc::new(SessionService::new(
            Arc::clone(&agents),
            Arc::clone(&workflows),
            Arc::new(InteractionStore::new()),
        )
        .with_limits(config.sessions.clone()));

        Ok(Self {
            config_manager,
            tool_registry,
            agents,
            workflows,
            sessions,
            api_key,
        })
    }
}
