//! TOML-based configuration for Insight
//!
//! This module provides declarative configuration for the server, providers,
//! models, agents, tools and the discovery conversation via a TOML file
//! (`insight.toml`).
//!
//! # Hot Reloading
//!
//! Configuration changes are automatically detected and applied at runtime.
//! Use `ConfigManager` for thread-safe access to the current configuration.

use arc_swap::ArcSwap;
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Root configuration structure loaded from insight.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InsightConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub api: ApiConfig,

    /// Named LLM provider configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Named model configurations that reference providers
    #[serde(default)]
    pub models: HashMap<String, ModelConfig>,

    /// Tool configurations
    #[serde(default)]
    pub tools: HashMap<String, ToolConfig>,

    /// Agent configurations, overriding the built-in agents or adding new ones
    #[serde(default)]
    pub agents: HashMap<String, AgentConfig>,

    #[serde(default)]
    pub coach: CoachConfig,

    #[serde(default)]
    pub router: RouterConfig,

    #[serde(default)]
    pub sessions: SessionConfig,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// `pretty` or `json`
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

// ============= API Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_api_prefix")]
    pub prefix: String,

    /// Environment variable holding the key required in the `x-api-key`
    /// header. Requests are not authenticated when unset.
    #[serde(default)]
    pub api_key_env: Option<String>,
}

fn default_api_prefix() -> String {
    "/api/v1".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            prefix: default_api_prefix(),
            api_key_env: None,
        }
    }
}

// ============= Provider Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
        default_model: String,
    },
    OpenAI {
        /// Environment variable containing API key
        api_key_env: String,
        #[serde(default = "default_openai_base")]
        api_base: String,
        default_model: String,
    },
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_openai_base() -> String {
    "https://api.openai.com/v1".to_string()
}

// ============= Model Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Reference to a provider name defined in [providers]
    pub provider: String,

    /// Model name/identifier to use with the provider
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_model_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_model_max_tokens() -> u32 {
    1000
}

// ============= Tool Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default = "default_tool_timeout")]
    pub timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_tool_timeout() -> u64 {
    30
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            description: None,
            timeout_secs: default_tool_timeout(),
        }
    }
}

// ============= Agent Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Reference to a model name defined in [models]
    pub model: String,

    /// System prompt for the agent
    #[serde(default)]
    pub system_prompt: Option<String>,

    /// List of tool names this agent can use
    #[serde(default)]
    pub tools: Vec<String>,

    /// Maximum tool calling iterations
    #[serde(default = "default_max_tool_iterations")]
    pub max_tool_iterations: usize,
}

fn default_max_tool_iterations() -> usize {
    5
}

// ============= Discovery Conversation =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoachConfig {
    /// Ordered topics the coach walks through
    #[serde(default = "default_topics")]
    pub topics: Vec<String>,

    /// Upper bound on user responses within one session
    #[serde(default = "default_max_conversation_turns")]
    pub max_conversation_turns: usize,

    /// History length after which each response refreshes the problem summary
    #[serde(default = "default_summary_after_messages")]
    pub summary_after_messages: usize,
}

pub fn default_topics() -> Vec<String> {
    [
        "specific_challenge",
        "context_background",
        "goals_outcomes",
        "constraints_limitations",
        "stakeholders",
        "urgency_timeline",
        "requirements",
    ]
    .iter()
    .map(|t| t.to_string())
    .collect()
}

fn default_max_conversation_turns() -> usize {
    20
}

fn default_summary_after_messages() -> usize {
    4
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            topics: default_topics(),
            max_conversation_turns: default_max_conversation_turns(),
            summary_after_messages: default_summary_after_messages(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Reject plans whose validation reply cannot be parsed
    #[serde(default)]
    pub strict_validation: bool,
}

// ============= Session Limits =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Sessions untouched for this long are evicted; 0 disables expiry
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,

    /// Live sessions kept at most; the least recently used idle session
    /// makes room for a new one
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

fn default_idle_timeout_secs() -> u64 {
    3600
}

fn default_max_sessions() -> usize {
    1000
}

impl SessionConfig {
    pub fn idle_timeout(&self) -> Option<Duration> {
        (self.idle_timeout_secs > 0).then(|| Duration::from_secs(self.idle_timeout_secs))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: default_idle_timeout_secs(),
            max_sessions: default_max_sessions(),
        }
    }
}

// ============= Configuration Loading & Validation =============

/// Configuration warnings that don't prevent operation but may indicate issues
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub kind: ConfigWarningKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigWarningKind {
    UnusedProvider,
    UnusedModel,
    DisabledTool,
    NoModels,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),

    #[error("Provider '{0}' referenced by model '{1}' does not exist")]
    MissingProvider(String, String),

    #[error("Model '{0}' referenced by agent '{1}' does not exist")]
    MissingModel(String, String),

    #[error("Tool '{0}' referenced by agent '{1}' does not exist")]
    MissingTool(String, String),

    #[error("Watch error: {0}")]
    WatchError(#[from] notify::Error),
}

impl InsightConfig {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config = Self::parse(&content)?;
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration without validating it
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Validate the configuration for internal consistency and env var availability
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.api.prefix.starts_with('/') {
            return Err(ConfigError::ValidationError(format!(
                "api.prefix must start with '/': {}",
                self.api.prefix
            )));
        }

        if !matches!(self.server.log_format.as_str(), "pretty" | "json") {
            return Err(ConfigError::ValidationError(format!(
                "server.log_format must be 'pretty' or 'json', got '{}'",
                self.server.log_format
            )));
        }

        if let Some(ref env) = self.api.api_key_env {
            self.validate_env_var(env)?;
        }

        for provider in self.providers.values() {
            if let ProviderConfig::OpenAI { api_key_env, .. } = provider {
                self.validate_env_var(api_key_env)?;
            }
        }

        // model -> provider
        for (model_name, model_config) in &self.models {
            if !self.providers.contains_key(&model_config.provider) {
                return Err(ConfigError::MissingProvider(
                    model_config.provider.clone(),
                    model_name.clone(),
                ));
            }
        }

        // agent -> model, agent -> tools
        for (agent_name, agent_config) in &self.agents {
            if !self.models.contains_key(&agent_config.model) {
                return Err(ConfigError::MissingModel(
                    agent_config.model.clone(),
                    agent_name.clone(),
                ));
            }

            for tool_name in &agent_config.tools {
                if !self.tools.contains_key(tool_name)
                    && !crate::tools::BUILTIN_TOOLS.contains(&tool_name.as_str())
                {
                    return Err(ConfigError::MissingTool(
                        tool_name.clone(),
                        agent_name.clone(),
                    ));
                }
            }
        }

        if self.coach.topics.is_empty() {
            return Err(ConfigError::ValidationError(
                "coach.topics must contain at least one topic".to_string(),
            ));
        }

        if self.coach.summary_after_messages == 0 {
            return Err(ConfigError::ValidationError(
                "coach.summary_after_messages must be at least 1".to_string(),
            ));
        }

        if self.sessions.max_sessions == 0 {
            return Err(ConfigError::ValidationError(
                "sessions.max_sessions must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Validate configuration and collect warnings for suspicious but legal setups
    pub fn validate_with_warnings(&self) -> Result<Vec<ConfigWarning>, ConfigError> {
        self.validate()?;

        let mut warnings = Vec::new();

        if self.models.is_empty() {
            warnings.push(ConfigWarning {
                kind: ConfigWarningKind::NoModels,
                message: "No models configured; agents cannot reach a language model".to_string(),
            });
        }

        warnings.extend(self.check_unused_providers());
        warnings.extend(self.check_unused_models());
        warnings.extend(self.check_disabled_agent_tools());

        Ok(warnings)
    }

    fn check_unused_providers(&self) -> Vec<ConfigWarning> {
        let referenced: HashSet<_> = self.models.values().map(|m| m.provider.as_str()).collect();

        self.providers
            .keys()
            .filter(|name| !referenced.contains(name.as_str()))
            .map(|name| ConfigWarning {
                kind: ConfigWarningKind::UnusedProvider,
                message: format!(
                    "Provider '{}' is defined but not referenced by any model",
                    name
                ),
            })
            .collect()
    }

    /// The `default` model backs every built-in agent, so it is never unused.
    fn check_unused_models(&self) -> Vec<ConfigWarning> {
        let referenced: HashSet<_> = self.agents.values().map(|a| a.model.as_str()).collect();

        self.models
            .keys()
            .filter(|name| name.as_str() != crate::llm::provider_registry::DEFAULT_MODEL_NAME)
            .filter(|name| !referenced.contains(name.as_str()))
            .map(|name| ConfigWarning {
                kind: ConfigWarningKind::UnusedModel,
                message: format!(
                    "Model '{}' is defined but not referenced by any agent",
                    name
                ),
            })
            .collect()
    }

    fn check_disabled_agent_tools(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        for (agent_name, agent) in &self.agents {
            for tool in &agent.tools {
                if !self.is_tool_enabled(tool) {
                    warnings.push(ConfigWarning {
                        kind: ConfigWarningKind::DisabledTool,
                        message: format!(
                            "Agent '{}' lists tool '{}' which is disabled",
                            agent_name, tool
                        ),
                    });
                }
            }
        }
        warnings
    }

    fn validate_env_var(&self, name: &str) -> Result<(), ConfigError> {
        std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))?;
        Ok(())
    }

    /// Get the API key from the environment, if API key auth is configured
    pub fn api_key(&self) -> Result<Option<String>, ConfigError> {
        match self.api.api_key_env {
            Some(ref env) => std::env::var(env)
                .map(Some)
                .map_err(|_| ConfigError::MissingEnvVar(env.clone())),
            None => Ok(None),
        }
    }

    pub fn get_model(&self, name: &str) -> Option<&ModelConfig> {
        self.models.get(name)
    }

    pub fn get_agent(&self, name: &str) -> Option<&AgentConfig> {
        self.agents.get(name)
    }

    pub fn get_tool(&self, name: &str) -> Option<&ToolConfig> {
        self.tools.get(name)
    }

    /// Tools without a `[tools.*]` entry are enabled.
    pub fn is_tool_enabled(&self, name: &str) -> bool {
        self.get_tool(name).map(|t| t.enabled).unwrap_or(true)
    }

    /// Timeout for a tool, falling back to the default when unconfigured
    pub fn tool_timeout(&self, name: &str) -> Duration {
        let secs = self
            .get_tool(name)
            .map(|t| t.timeout_secs)
            .unwrap_or_else(default_tool_timeout);
        Duration::from_secs(secs)
    }
}

// ============= Hot Reloading Configuration Manager =============

/// How long the config file must stay unchanged before a reload
const RELOAD_QUIET_PERIOD: Duration = Duration::from_millis(500);

/// Call `on_settled` once per burst of events, after the channel has been
/// quiet for `quiet`. The last event of a burst always leads to a call.
async fn debounce_events<F>(mut rx: mpsc::UnboundedReceiver<()>, quiet: Duration, mut on_settled: F)
where
    F: FnMut(),
{
    while rx.recv().await.is_some() {
        loop {
            match tokio::time::timeout(quiet, rx.recv()).await {
                Ok(Some(())) => continue,
                Ok(None) => {
                    on_settled();
                    return;
                }
                Err(_) => break,
            }
        }
        on_settled();
    }
}

/// Thread-safe configuration manager with hot reloading support
pub struct ConfigManager {
    config: Arc<ArcSwap<InsightConfig>>,
    config_path: PathBuf,
    watcher: RwLock<Option<RecommendedWatcher>>,
}

impl ConfigManager {
    /// Create a new configuration manager and load the initial config
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        // Absolute path for reliable file watching
        let path = path.as_ref();
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(ConfigError::ReadError)?
                .join(path)
        };

        let config = InsightConfig::load(&path)?;

        Ok(Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: path,
            watcher: RwLock::new(None),
        })
    }

    /// Create a config manager directly from a config. No file watching.
    pub fn from_config(config: InsightConfig) -> Self {
        Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: PathBuf::from("insight.toml"),
            watcher: RwLock::new(None),
        }
    }

    /// Get the current configuration (lockless read)
    pub fn config(&self) -> Arc<InsightConfig> {
        self.config.load_full()
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Reload the configuration from disk. On failure the previous
    /// configuration stays active.
    pub fn reload(&self) -> Result<(), ConfigError> {
        info!("Reloading configuration from {:?}", self.config_path);

        let new_config = InsightConfig::load(&self.config_path)?;
        self.config.store(Arc::new(new_config));

        info!("Configuration reloaded successfully");
        Ok(())
    }

    /// Start watching for configuration file changes
    pub fn start_watching(&self) -> Result<(), ConfigError> {
        let (tx, mut rx) = mpsc::unbounded_channel::<()>();

        let config_path = self.config_path.clone();
        let config_arc = Arc::clone(&self.config);
        let file_name = self.config_path.file_name().map(|n| n.to_os_string());

        let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
            match res {
                Ok(event) => {
                    let touches_config = event
                        .paths
                        .iter()
                        .any(|p| p.file_name().map(|n| n.to_os_string()) == file_name);
                    if touches_config && (event.kind.is_modify() || event.kind.is_create()) {
                        let _ = tx.send(());
                    }
                }
                Err(e) => {
                    error!("Config watcher error: {:?}", e);
                }
            }
        })?;

        if let Some(parent) = self.config_path.parent() {
            watcher.watch(parent, RecursiveMode::NonRecursive)?;
        }

        *self.watcher.write() = Some(watcher);

        tokio::spawn(debounce_events(rx, RELOAD_QUIET_PERIOD, move || {
            match InsightConfig::load(&config_path) {
                Ok(new_config) => {
                    config_arc.store(Arc::new(new_config));
                    info!("Configuration hot-reloaded successfully");
                }
                Err(e) => {
                    warn!(
                        "Failed to hot-reload config: {}. Keeping previous config.",
                        e
                    );
                }
            }
        }));

        info!("Configuration hot-reload watcher started");
        Ok(())
    }

    /// Stop watching for configuration changes
    pub fn stop_watching(&self) {
        *self.watcher.write() = None;
        info!("Configuration hot-reload watcher stopped");
    }
}

impl Clone for ConfigManager {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            config_path: self.config_path.clone(),
            watcher: RwLock::new(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_config() -> String {
        r#"
[server]
host = "0.0.0.0"
port = 9000
log_level = "debug"

[api]
prefix = "/api/v2"

[providers.local]
type = "ollama"
base_url = "http://localhost:11434"
default_model = "llama3.2"

[models.default]
provider = "local"
model = "llama3.2"
temperature = 0.7
max_tokens = 1000

[tools.web_search]
enabled = false

[tools.data_analysis]
timeout_secs = 5

[agents.analyst]
model = "default"
tools = ["data_analysis", "business_metrics"]
max_tool_iterations = 3

[coach]
summary_after_messages = 6
"#
        .to_string()
    }

    #[test]
    fn test_parse_config() {
        let config = InsightConfig::parse(&create_test_config()).expect("Failed to parse config");

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.api.prefix, "/api/v2");
        assert!(config.providers.contains_key("local"));
        assert!(config.models.contains_key("default"));
        assert_eq!(config.coach.summary_after_messages, 6);
        assert_eq!(config.coach.topics.len(), 7);
        config.validate().unwrap();
    }

    #[test]
    fn test_defaults() {
        let config = InsightConfig::parse("").unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.log_level, "info");
        assert_eq!(config.server.log_format, "pretty");
        assert_eq!(config.api.prefix, "/api/v1");
        assert!(config.api.api_key_env.is_none());
        assert_eq!(config.coach.topics[0], "specific_challenge");
        assert_eq!(config.coach.topics[6], "requirements");
        assert_eq!(config.coach.summary_after_messages, 4);
        assert!(!config.router.strict_validation);
    }

    #[test]
    fn test_validation_missing_provider() {
        let content = r#"
[models.test]
provider = "nonexistent"
model = "test"
"#;
        let config = InsightConfig::parse(content).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingProvider(_, _))
        ));
    }

    #[test]
    fn test_validation_missing_model() {
        let content = r#"
[providers.test]
type = "ollama"
default_model = "llama3.2"
[agents.test]
model = "nonexistent"
"#;
        let config = InsightConfig::parse(content).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingModel(_, _))
        ));
    }

    #[test]
    fn test_validation_missing_tool() {
        let content = r#"
[providers.test]
type = "ollama"
default_model = "llama3.2"
[models.default]
provider = "test"
model = "llama3.2"
[agents.test]
model = "default"
tools = ["nonexistent_tool"]
"#;
        let config = InsightConfig::parse(content).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingTool(_, _))
        ));
    }

    #[test]
    fn test_validation_missing_env_var() {
        let content = r#"
[api]
api_key_env = "INSIGHT_TEST_UNSET_API_KEY"
"#;
        let config = InsightConfig::parse(content).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingEnvVar(name)) if name == "INSIGHT_TEST_UNSET_API_KEY"
        ));
    }

    #[test]
    fn test_validation_rejects_bad_prefix_and_format() {
        let config = InsightConfig::parse("[api]\nprefix = \"api\"").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));

        let config = InsightConfig::parse("[server]\nlog_format = \"xml\"").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validation_rejects_empty_topics() {
        let config = InsightConfig::parse("[coach]\ntopics = []").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_tool_enablement_and_timeout() {
        let config = InsightConfig::parse(&create_test_config()).unwrap();

        assert!(!config.is_tool_enabled("web_search"));
        assert!(config.is_tool_enabled("data_analysis"));
        assert!(config.is_tool_enabled("document_analysis"));
        assert_eq!(config.tool_timeout("data_analysis"), Duration::from_secs(5));
        assert_eq!(
            config.tool_timeout("document_analysis"),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn test_unused_provider_and_model_warnings() {
        let content = r#"
[providers.used]
type = "ollama"
default_model = "llama3.2"
[providers.unused]
type = "ollama"
default_model = "llama3.2"
[models.default]
provider = "used"
model = "llama3.2"
[models.spare]
provider = "used"
model = "mistral"
"#;
        let config = InsightConfig::parse(content).unwrap();
        let warnings = config.validate_with_warnings().unwrap();

        assert!(warnings.iter().any(
            |w| w.kind == ConfigWarningKind::UnusedProvider && w.message.contains("unused")
        ));
        assert!(warnings
            .iter()
            .any(|w| w.kind == ConfigWarningKind::UnusedModel && w.message.contains("spare")));
        assert!(!warnings
            .iter()
            .any(|w| w.kind == ConfigWarningKind::UnusedModel && w.message.contains("default")));
    }

    #[test]
    fn test_disabled_tool_warning() {
        let content = r#"
[providers.p]
type = "ollama"
default_model = "llama3.2"
[models.default]
provider = "p"
model = "llama3.2"
[tools.web_search]
enabled = false
[agents.researcher]
model = "default"
tools = ["web_search"]
"#;
        let config = InsightConfig::parse(content).unwrap();
        let warnings = config.validate_with_warnings().unwrap();
        assert!(warnings
            .iter()
            .any(|w| w.kind == ConfigWarningKind::DisabledTool));
    }

    #[test]
    fn test_config_manager_from_config() {
        let config = InsightConfig::parse(&create_test_config()).unwrap();

        let manager = ConfigManager::from_config(config.clone());
        let loaded = manager.config();

        assert_eq!(loaded.server.host, config.server.host);
        assert_eq!(loaded.server.port, config.server.port);
    }

    #[test]
    fn test_load_missing_file() {
        let result = InsightConfig::load("/definitely/not/here/insight.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_session_limits() {
        let config = InsightConfig::default();
        assert_eq!(config.sessions.max_sessions, 1000);
        assert_eq!(config.sessions.idle_timeout(), Some(Duration::from_secs(3600)));

        let config = InsightConfig::parse("[sessions]\nidle_timeout_secs = 0\n").unwrap();
        assert_eq!(config.sessions.idle_timeout(), None);

        let config = InsightConfig::parse("[sessions]\nmax_sessions = 0\n").unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_debounce_applies_last_event_of_burst() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let (tx, rx) = mpsc::unbounded_channel();
        let reloads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&reloads);
        let task = tokio::spawn(debounce_events(rx, Duration::from_millis(50), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        for _ in 0..3 {
            tx.send(()).unwrap();
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(reloads.load(Ordering::SeqCst), 1);

        // an event right before shutdown still reloads
        tx.send(()).unwrap();
        drop(tx);
        task.await.unwrap();
        assert_eq!(reloads.load(Ordering::SeqCst), 2);
    }
}
