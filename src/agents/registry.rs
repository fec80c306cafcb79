//! Agent factory
//!
//! Builds agents from `[agents.*]` configuration. The four built-in roles
//! are looked up under fixed keys:
//!
//! | key         | agent                         |
//! |-------------|-------------------------------|
//! | `coach`     | [`CoachAgent`]                |
//! | `router`    | [`RouterAgent`]               |
//! | `analyst`   | [`BusinessIntelligenceAgent`] |
//! | `simulator` | [`UserSimulationAgent`]       |
//!
//! A built-in role without an entry runs on the default model with its
//! built-in prompt. An entry may override the model, the prompt and the
//! tool list.

use crate::agents::analyst::{ANALYST_NAME, ANALYST_SYSTEM_PROMPT};
use crate::agents::coach::{COACH_NAME, COACH_SYSTEM_PROMPT};
use crate::agents::router::{ROUTER_NAME, ROUTER_SYSTEM_PROMPT};
use crate::agents::{
    BaseAgent, BusinessIntelligenceAgent, CoachAgent, RouterAgent, UserSimulationAgent,
};
use crate::llm::{LLMClient, LLMClientFactoryTrait};
use crate::tools::registry::ToolRegistry;
use crate::types::{AppError, Result};
use crate::utils::toml_config::{AgentConfig, CoachConfig, InsightConfig, RouterConfig};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

pub const COACH_KEY: &str = "coach";
pub const ROUTER_KEY: &str = "router";
pub const ANALYST_KEY: &str = "analyst";
pub const SIMULATOR_KEY: &str = "simulator";

/// Creates agent instances from configuration
pub struct AgentFactory {
    /// Agent configurations keyed by name
    configs: HashMap<String, AgentConfig>,
    /// Source of LLM clients
    llm_factory: Arc<dyn LLMClientFactoryTrait>,
    /// Tool registry shared across agents
    tool_registry: Arc<ToolRegistry>,
    coach: CoachConfig,
    router: RouterConfig,
}

impl AgentFactory {
    /// Create a factory with no agent entries and default coach/router settings
    pub fn new(
        llm_factory: Arc<dyn LLMClientFactoryTrait>,
        tool_registry: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            configs: HashMap::new(),
            llm_factory,
            tool_registry,
            coach: CoachConfig::default(),
            router: RouterConfig::default(),
        }
    }

    /// Create a factory from the loaded configuration
    pub fn from_config(
        config: &InsightConfig,
        llm_factory: Arc<dyn LLMClientFactoryTrait>,
        tool_registry: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            configs: config.agents.clone(),
            llm_factory,
            tool_registry,
            coach: config.coach.clone(),
            router: config.router.clone(),
        }
    }

    /// Register an agent configuration
    pub fn register(&mut self, name: &str, config: AgentConfig) {
        self.configs.insert(name.to_string(), config);
    }

    /// Get an agent configuration by name
    pub fn get(&self, name: &str) -> Option<&AgentConfig> {
        self.configs.get(name)
    }

    pub fn has_agent(&self, name: &str) -> bool {
        self.configs.contains_key(name)
    }

    /// Configured agent names, sorted
    pub fn agent_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.configs.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn coach_config(&self) -> &CoachConfig {
        &self.coach
    }

    pub fn tool_registry(&self) -> &Arc<ToolRegistry> {
        &self.tool_registry
    }

    async fn client_for(&self, name: &str) -> Result<Box<dyn LLMClient>> {
        match self.configs.get(name) {
            Some(config) => self.llm_factory.create_for_model(&config.model).await,
            None => self.llm_factory.create_default().await,
        }
    }

    /// Build a built-in role: the configured entry when present, otherwise
    /// the default model with `default_prompt`.
    async fn builtin(&self, key: &str, display_name: &str, default_prompt: &str) -> Result<BaseAgent> {
        let llm = self.client_for(key).await?;
        debug!(agent = key, model = llm.model_name(), "Creating built-in agent");
        Ok(match self.configs.get(key) {
            Some(config) => {
                let mut agent = BaseAgent::from_config(
                    display_name,
                    config,
                    llm,
                    Some(Arc::clone(&self.tool_registry)),
                );
                if config.system_prompt.is_none() {
                    agent.set_system_prompt(default_prompt);
                }
                agent
            }
            None => BaseAgent::new(display_name, default_prompt, llm),
        })
    }

    /// Create a configured agent by name
    pub async fn create_agent(&self, name: &str) -> Result<BaseAgent> {
        let config = self
            .configs
            .get(name)
            .ok_or_else(|| AppError::NotFound(format!("Agent '{}' is not configured", name)))?;
        let llm = self.llm_factory.create_for_model(&config.model).await?;
        Ok(BaseAgent::from_config(
            name,
            config,
            llm,
            Some(Arc::clone(&self.tool_registry)),
        ))
    }

    /// A coach over the configured topic list
    pub async fn coach(&self) -> Result<CoachAgent> {
        let base = self
            .builtin(COACH_KEY, COACH_NAME, COACH_SYSTEM_PROMPT)
            .await?;
        Ok(CoachAgent::with_topics(base, self.coach.topics.clone()))
    }

    pub async fn router(&self) -> Result<RouterAgent> {
        let base = self
            .builtin(ROUTER_KEY, ROUTER_NAME, ROUTER_SYSTEM_PROMPT)
            .await?;
        Ok(RouterAgent::new(base).with_strict_validation(self.router.strict_validation))
    }

    pub async fn analyst(&self) -> Result<BusinessIntelligenceAgent> {
        let base = self
            .builtin(ANALYST_KEY, ANALYST_NAME, ANALYST_SYSTEM_PROMPT)
            .await?;
        Ok(BusinessIntelligenceAgent::new(base))
    }

    /// A simulated user playing `profile`
    pub async fn simulator(&self, profile: Map<String, Value>) -> Result<UserSimulationAgent> {
        let llm = self.client_for(SIMULATOR_KEY).await?;
        Ok(UserSimulationAgent::new(profile, llm))
    }
}
