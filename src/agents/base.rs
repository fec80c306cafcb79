//! Base agent implementation
//!
//! [`BaseAgent`] is the one piece every agent shares: it sends a message to
//! the model under the agent's system prompt, cleans the reply, and turns
//! failures into error replies. Agents configured with tools run a bounded
//! tool-calling loop instead of a single generation.

use crate::agents::Agent;
use crate::llm::LLMClient;
use crate::tools::registry::{tool_error, ToolRegistry};
use crate::types::{AgentReply, AppError, Result, ToolDefinition};
use crate::utils::toml_config::AgentConfig;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const DEFAULT_MAX_TOOL_ITERATIONS: usize = 5;

/// Shared agent core: model client, prompt, and tool access
pub struct BaseAgent {
    /// The agent's display name
    name: String,
    /// The LLM client to use for generation
    llm: Box<dyn LLMClient>,
    /// System prompt sent with every message
    system_prompt: String,
    /// Tools available to this agent
    tool_registry: Option<Arc<ToolRegistry>>,
    /// List of tool names this agent is allowed to use
    allowed_tools: Vec<String>,
    /// Maximum tool calling iterations
    max_tool_iterations: usize,
}

impl BaseAgent {
    /// Create an agent without tool access
    pub fn new(name: &str, system_prompt: impl Into<String>, llm: Box<dyn LLMClient>) -> Self {
        info!(agent = name, "Initializing agent");
        Self {
            name: name.to_string(),
            llm,
            system_prompt: system_prompt.into(),
            tool_registry: None,
            allowed_tools: Vec::new(),
            max_tool_iterations: DEFAULT_MAX_TOOL_ITERATIONS,
        }
    }

    /// Create an agent from its `[agents.<name>]` entry
    ///
    /// # Arguments
    ///
    /// * `name` - The agent name
    /// * `config` - The agent configuration
    /// * `llm` - The LLM client (already created from the model config)
    /// * `tool_registry` - Tool registry used when the config lists tools
    pub fn from_config(
        name: &str,
        config: &AgentConfig,
        llm: Box<dyn LLMClient>,
        tool_registry: Option<Arc<ToolRegistry>>,
    ) -> Self {
        let system_prompt = config
            .system_prompt
            .clone()
            .unwrap_or_else(|| format!("You are a helpful {} agent.", name));

        let agent = Self::new(name, system_prompt, llm)
            .with_max_tool_iterations(config.max_tool_iterations);
        match tool_registry {
            Some(registry) if !config.tools.is_empty() => {
                agent.with_tools(registry, config.tools.clone())
            }
            _ => agent,
        }
    }

    /// Grant access to `allowed` tools from `registry`
    pub fn with_tools(mut self, registry: Arc<ToolRegistry>, allowed: Vec<String>) -> Self {
        self.tool_registry = Some(registry);
        self.allowed_tools = allowed;
        self
    }

    pub fn with_max_tool_iterations(mut self, iterations: usize) -> Self {
        self.max_tool_iterations = iterations.max(1);
        self
    }

    /// Replace the system prompt
    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.system_prompt = prompt.into();
    }

    pub fn model_name(&self) -> &str {
        self.llm.model_name()
    }

    pub fn max_tool_iterations(&self) -> usize {
        self.max_tool_iterations
    }

    /// Get the list of allowed tool names for this agent
    pub fn allowed_tools(&self) -> &[String] {
        &self.allowed_tools
    }

    /// Check if this agent has tools configured
    pub fn has_tools(&self) -> bool {
        !self.allowed_tools.is_empty() && self.tool_registry.is_some()
    }

    /// Check if a specific tool is allowed for this agent
    pub fn can_use_tool(&self, tool_name: &str) -> bool {
        self.allowed_tools.iter().any(|t| t == tool_name)
            && self
                .tool_registry
                .as_ref()
                .map(|r| r.is_enabled(tool_name))
                .unwrap_or(false)
    }

    /// Schemas for the allowed tools that are enabled in the registry
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        match &self.tool_registry {
            Some(registry) => registry
                .definitions_for(&self.allowed_tools)
                .into_iter()
                .filter(|def| registry.is_enabled(&def.name))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Clean a raw model reply: trim, cut at the first `[INST` marker, and
    /// drop ASCII control characters (below 0x20) other than newline, carriage
    /// return and tab. DEL and C1 controls pass through.
    pub fn sanitize(raw: &str) -> String {
        let trimmed = raw.trim();
        let head = match trimmed.find("[INST") {
            Some(idx) => &trimmed[..idx],
            None => trimmed,
        };
        head.trim()
            .chars()
            .filter(|&c| (c as u32) >= 0x20 || matches!(c, '\n' | '\r' | '\t'))
            .collect()
    }

    /// Invoke a tool on behalf of this agent.
    ///
    /// Tools outside the allow list are refused with [`AppError::Tool`].
    pub async fn use_tool(&self, tool_name: &str, args: Value) -> Result<Value> {
        if !self.can_use_tool(tool_name) {
            warn!(agent = %self.name, tool = tool_name, "Tool not permitted");
            return Err(AppError::Tool(format!(
                "Agent '{}' is not allowed to use tool '{}'",
                self.name, tool_name
            )));
        }
        let registry = self
            .tool_registry
            .as_ref()
            .ok_or_else(|| AppError::Tool("No tool registry configured".to_string()))?;
        registry.execute(tool_name, args).await
    }

    /// Run the tool-calling loop for `message`.
    ///
    /// Each round asks the model with the allowed tool schemas; requested
    /// calls are executed and their outputs appended to the transcript.
    /// After `max_tool_iterations` rounds the model is asked once more,
    /// without tools, to answer from what it has.
    pub async fn process_with_tools(&self, message: &str) -> AgentReply {
        match self.run_tool_loop(message).await {
            Ok((content, tools_used)) => {
                AgentReply::success(Self::sanitize(&content), self.model_name(), tools_used)
            }
            Err(e) => {
                error!(agent = %self.name, error = %e, "Error in process_with_tools");
                AgentReply::error(&e)
            }
        }
    }

    async fn run_tool_loop(&self, message: &str) -> Result<(String, Vec<String>)> {
        let tools = self.tool_definitions();
        let mut transcript = format!("{}\n\nUser: {}", self.system_prompt, message);
        let mut tools_used = Vec::new();

        for iteration in 0..self.max_tool_iterations {
            let response = self.llm.generate_with_tools(&transcript, &tools).await?;
            if response.tool_calls.is_empty() {
                debug!(agent = %self.name, iteration, "Tool loop finished");
                return Ok((response.content, tools_used));
            }

            if !response.content.trim().is_empty() {
                transcript.push_str(&format!("\n\nAssistant: {}", response.content.trim()));
            }
            for call in response.tool_calls {
                let output = match self.use_tool(&call.name, call.arguments.clone()).await {
                    Ok(value) => value,
                    Err(e) => tool_error(e.to_string()),
                };
                transcript.push_str(&format!("\n\nTool `{}` returned: {}", call.name, output));
                tools_used.push(call.name);
            }
        }

        warn!(
            agent = %self.name,
            max = self.max_tool_iterations,
            "Tool loop hit iteration limit"
        );
        transcript.push_str("\n\nAnswer the user using the tool results above.");
        let content = self
            .llm
            .generate_with_system(&self.system_prompt, &transcript)
            .await?;
        Ok((content, tools_used))
    }
}

#[async_trait]
impl Agent for BaseAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    async fn process_message(&self, message: &str) -> AgentReply {
        debug!(agent = %self.name, len = message.len(), "Processing message");
        if self.has_tools() {
            return self.process_with_tools(message).await;
        }

        match self
            .llm
            .generate_with_system(&self.system_prompt, message)
            .await
        {
            Ok(raw) => AgentReply::success(Self::sanitize(&raw), self.model_name(), vec![]),
            Err(e) => {
                error!(agent = %self.name, error = %e, "Error in process_message");
                AgentReply::error(&e)
            }
        }
    }
}
