//! Conversational agents.
//!
//! Every agent wraps a [`BaseAgent`], which owns the LLM client, the system
//! prompt and the optional tool allow-list. The specialised agents add their
//! own state and prompts on top:
//!
//! - [`CoachAgent`]: topic-by-topic problem discovery
//! - [`RouterAgent`]: framework analysis and solution planning
//! - [`BusinessIntelligenceAgent`]: ad-hoc data analysis
//! - [`UserSimulationAgent`]: a profile-driven stand-in for the user
//!
//! [`AgentFactory`] builds all of them from `[agents.*]` configuration.

pub mod analyst;
pub mod base;
pub mod coach;
pub mod registry;
pub mod router;
pub mod simulation;

use crate::types::AgentReply;
use async_trait::async_trait;

pub use analyst::BusinessIntelligenceAgent;
pub use base::BaseAgent;
pub use coach::CoachAgent;
pub use registry::AgentFactory;
pub use router::RouterAgent;
pub use simulation::UserSimulationAgent;

/// Base trait for all agents
#[async_trait]
pub trait Agent: Send + Sync {
    /// Display name used in logs and replies
    fn name(&self) -> &str;

    /// Get the agent's system prompt
    fn system_prompt(&self) -> &str;

    /// Run one turn. Failures are reported through the reply status, never
    /// as an `Err`.
    async fn process_message(&self, message: &str) -> AgentReply;
}
