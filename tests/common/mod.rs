#![allow(dead_code)]

pub mod mocks;

use insight::{AgentFactory, AppState, ConfigManager, InsightConfig, ToolRegistry};
use mocks::{MockLLMClient, MockLLMFactory};
use std::sync::Arc;

/// Application state over `config`, answering every model call from `client`
pub fn app_state(config: InsightConfig, client: &MockLLMClient) -> AppState {
    let manager = Arc::new(ConfigManager::from_config(config));
    AppState::new(manager, Arc::new(MockLLMFactory::new(client.clone())))
        .expect("test state should build")
}

/// Agent factory over the default configuration
pub fn agent_factory(client: &MockLLMClient) -> Arc<AgentFactory> {
    Arc::new(AgentFactory::new(
        Arc::new(MockLLMFactory::new(client.clone())),
        Arc::new(ToolRegistry::with_default_tools()),
    ))
}
