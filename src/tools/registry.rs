use crate::types::{AppError, Result, ToolDefinition};
use crate::utils::toml_config::InsightConfig;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    /// JSON schema object with `properties` and `required`
    fn parameters_schema(&self) -> Value;
    /// Domain failures come back as `Ok` with an error payload, see [`tool_error`].
    async fn execute(&self, args: Value) -> Result<Value>;
}

/// `{"status": "success", "results": results}`
pub fn tool_success(results: Value) -> Value {
    json!({ "status": "success", "results": results })
}

/// `{"status": "error", "error": message}`
pub fn tool_error(message: impl Into<String>) -> Value {
    json!({ "status": "error", "error": message.into() })
}

/// Check `args` against a tool schema: every `required` key is present and
/// non-null, and string values constrained by an `enum` are members of it.
pub fn validate_parameters(schema: &Value, args: &Value) -> bool {
    let Some(args) = args.as_object() else {
        return false;
    };

    let required = schema
        .get("required")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    for key in required.iter().filter_map(Value::as_str) {
        match args.get(key) {
            None | Some(Value::Null) => {
                debug!(parameter = key, "Missing required parameter");
                return false;
            }
            Some(_) => {}
        }
    }

    if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
        for (key, property) in properties {
            let allowed = property.get("enum").and_then(Value::as_array);
            let given = args.get(key).and_then(Value::as_str);
            if let (Some(allowed), Some(given)) = (allowed, given) {
                if !allowed.iter().any(|v| v.as_str() == Some(given)) {
                    debug!(parameter = %key, value = given, "Value not in enum");
                    return false;
                }
            }
        }
    }

    true
}

pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
    timeouts: HashMap<String, Duration>,
    disabled: HashSet<String>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
            timeouts: HashMap::new(),
            disabled: HashSet::new(),
        }
    }

    /// Create a new registry with the built-in analysis and search tools
    pub fn with_default_tools() -> Self {
        let mut registry = Self::new();

        registry.register(Arc::new(crate::tools::data_analysis::DataAnalysisTool::new()));
        registry.register(Arc::new(
            crate::tools::document_analysis::DocumentAnalysisTool::new(),
        ));
        registry.register(Arc::new(
            crate::tools::business_metrics::BusinessMetricsTool::new(),
        ));
        registry.register(Arc::new(crate::tools::search::SearchTool::new()));

        registry
    }

    /// Built-in tools minus those disabled in `[tools.*]`, with configured timeouts
    pub fn with_config(config: &InsightConfig) -> Self {
        let mut registry = Self::with_default_tools();

        for name in registry.tool_names() {
            if !config.is_tool_enabled(&name) {
                registry.unregister(&name);
                registry.disabled.insert(name.clone());
                info!(tool = %name, "Tool disabled by configuration");
                continue;
            }
            registry
                .timeouts
                .insert(name.clone(), config.tool_timeout(&name));
        }

        registry
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        if self.tools.contains_key(&name) {
            warn!(tool = %name, "Tool already registered, overwriting");
        }
        self.disabled.remove(&name);
        self.tools.insert(name.clone(), tool);
        info!(tool = %name, "Registered tool");
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Remove a tool. Returns false when it was not registered.
    pub fn unregister(&mut self, name: &str) -> bool {
        if self.tools.remove(name).is_some() {
            self.timeouts.remove(name);
            info!(tool = name, "Unregistered tool");
            true
        } else {
            warn!(tool = name, "Tool not found in registry");
            false
        }
    }

    pub fn set_timeout(&mut self, name: &str, timeout: Duration) {
        self.timeouts.insert(name.to_string(), timeout);
    }

    /// Schemas of all registered tools, sorted by name
    pub fn list(&self) -> Vec<ToolDefinition> {
        let mut definitions: Vec<ToolDefinition> =
            self.tools.values().map(|tool| definition(tool.as_ref())).collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    /// Schemas for the named tools that are registered, in the given order
    pub fn definitions_for(&self, names: &[String]) -> Vec<ToolDefinition> {
        names
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|tool| definition(tool.as_ref()))
            .collect()
    }

    /// Run a tool by name.
    ///
    /// Unknown tools and timeouts are errors. Arguments failing schema
    /// validation produce the `Invalid parameters` error payload.
    pub async fn execute(&self, name: &str, args: Value) -> Result<Value> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| AppError::NotFound(format!("Tool not found: {}", name)))?;

        if !validate_parameters(&tool.parameters_schema(), &args) {
            warn!(tool = name, "Invalid parameters");
            return Ok(tool_error("Invalid parameters"));
        }

        let timeout = self.timeouts.get(name).copied().unwrap_or(DEFAULT_TIMEOUT);
        debug!(tool = name, ?timeout, "Executing tool");

        tokio::time::timeout(timeout, tool.execute(args))
            .await
            .map_err(|_| {
                AppError::Tool(format!(
                    "Tool '{}' timed out after {}s",
                    name,
                    timeout.as_secs()
                ))
            })?
    }

    /// Get a sorted list of all registered tool names
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Registered and not disabled by configuration
    pub fn is_enabled(&self, name: &str) -> bool {
        self.has_tool(name) && !self.disabled.contains(name)
    }
}

fn definition(tool: &dyn Tool) -> ToolDefinition {
    ToolDefinition {
        name: tool.name().to_string(),
        description: tool.description().to_string(),
        parameters: tool.parameters_schema(),
    }
}
