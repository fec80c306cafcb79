//! Provider Registry for managing multiple LLM providers
//!
//! Providers and models are declared in `insight.toml`:
//!
//! ```toml
//! [providers.local]
//! type = "ollama"
//! base_url = "http://localhost:11434"
//! default_model = "llama3.2"
//!
//! [models.default]
//! provider = "local"
//! model = "llama3.2"
//! temperature = 0.7
//! max_tokens = 1000
//! ```
//!
//! Agents reference models by name; the registry resolves the
//! model -> provider chain and builds the client.

use crate::llm::client::{LLMClient, LLMClientFactoryTrait, ModelParams, Provider};
use crate::types::{AppError, Result};
use crate::utils::toml_config::{InsightConfig, ModelConfig, ProviderConfig};
use async_trait::async_trait;
use std::collections::HashMap;

/// Model name preferred as the default when present.
pub const DEFAULT_MODEL_NAME: &str = "default";

/// Registry for managing multiple named LLM providers
pub struct ProviderRegistry {
    providers: HashMap<String, ProviderConfig>,
    models: HashMap<String, ModelConfig>,
    default_model: Option<String>,
}

impl ProviderRegistry {
    /// Create a new empty provider registry
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
            models: HashMap::new(),
            default_model: None,
        }
    }

    /// Create a provider registry from TOML configuration
    ///
    /// The default model is the one named `default`, otherwise the first
    /// model name in sorted order.
    pub fn from_config(config: &InsightConfig) -> Self {
        let default_model = if config.models.contains_key(DEFAULT_MODEL_NAME) {
            Some(DEFAULT_MODEL_NAME.to_string())
        } else {
            let mut names: Vec<&String> = config.models.keys().collect();
            names.sort();
            names.first().map(|name| name.to_string())
        };

        Self {
            providers: config.providers.clone(),
            models: config.models.clone(),
            default_model,
        }
    }

    /// Set the default model name
    pub fn set_default_model(&mut self, model_name: &str) {
        self.default_model = Some(model_name.to_string());
    }

    /// Register a provider configuration
    pub fn register_provider(&mut self, name: &str, config: ProviderConfig) {
        self.providers.insert(name.to_string(), config);
    }

    /// Register a model configuration
    pub fn register_model(&mut self, name: &str, config: ModelConfig) {
        self.models.insert(name.to_string(), config);
    }

    pub fn get_provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.get(name)
    }

    pub fn get_model(&self, name: &str) -> Option<&ModelConfig> {
        self.models.get(name)
    }

    pub fn default_model(&self) -> Option<&str> {
        self.default_model.as_deref()
    }

    /// Get all model names, sorted
    pub fn model_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.models.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn has_model(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// Resolve a model name to the provider that serves it
    pub fn resolve(&self, model_name: &str) -> Result<Provider> {
        let model_config = self.get_model(model_name).ok_or_else(|| {
            AppError::Configuration(format!("Model '{}' not found in configuration", model_name))
        })?;

        let provider_config = self.get_provider(&model_config.provider).ok_or_else(|| {
            AppError::Configuration(format!(
                "Provider '{}' referenced by model '{}' not found",
                model_config.provider, model_name
            ))
        })?;

        Provider::from_model_config(model_config, provider_config)
    }

    /// Create an LLM client for a specific model by name
    pub async fn create_client_for_model(&self, model_name: &str) -> Result<Box<dyn LLMClient>> {
        self.resolve(model_name)?.create_client().await
    }

    /// Create an LLM client for a specific provider by name, using the
    /// provider's default model.
    pub async fn create_client_for_provider(
        &self,
        provider_name: &str,
    ) -> Result<Box<dyn LLMClient>> {
        let provider_config = self.get_provider(provider_name).ok_or_else(|| {
            AppError::Configuration(format!(
                "Provider '{}' not found in configuration",
                provider_name
            ))
        })?;

        Provider::from_config(provider_config, None, ModelParams::default())?
            .create_client()
            .await
    }

    /// Create an LLM client using the default model
    pub async fn create_default_client(&self) -> Result<Box<dyn LLMClient>> {
        let model_name = self
            .default_model
            .as_ref()
            .ok_or_else(|| AppError::Configuration("No default model configured".into()))?;

        self.create_client_for_model(model_name).await
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LLMClientFactoryTrait for ProviderRegistry {
    async fn create_default(&self) -> Result<Box<dyn LLMClient>> {
        self.create_default_client().await
    }

    async fn create_for_model(&self, model_name: &str) -> Result<Box<dyn LLMClient>> {
        self.create_client_for_model(model_name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_registry() -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();

        registry.register_provider(
            "local",
            ProviderConfig::Ollama {
                base_url: "http://localhost:11434".to_string(),
                default_model: "llama3.2".to_string(),
            },
        );

        registry.register_model(
            "fast",
            ModelConfig {
                provider: "local".to_string(),
                model: "llama3.2:1b".to_string(),
                temperature: 0.3,
                max_tokens: 512,
            },
        );

        registry.register_model(
            "orphan",
            ModelConfig {
                provider: "missing".to_string(),
                model: "whatever".to_string(),
                temperature: 0.7,
                max_tokens: 512,
            },
        );

        registry
    }

    #[test]
    fn test_empty_registry() {
        let registry = ProviderRegistry::new();
        assert!(registry.model_names().is_empty());
        assert!(registry.default_model().is_none());
    }

    #[test]
    fn test_resolve_model_to_provider() {
        let registry = create_test_registry();
        let provider = registry.resolve("fast").unwrap();
        assert_eq!(provider.name(), "Ollama");
        assert_eq!(provider.model(), "llama3.2:1b");
    }

    #[test]
    fn test_resolve_unknown_model() {
        let registry = create_test_registry();
        assert!(matches!(
            registry.resolve("nope"),
            Err(AppError::Configuration(_))
        ));
    }

    #[test]
    fn test_resolve_model_with_missing_provider() {
        let registry = create_test_registry();
        let err = registry.resolve("orphan").unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_model_names_sorted() {
        let registry = create_test_registry();
        assert_eq!(registry.model_names(), vec!["fast", "orphan"]);
    }

    #[tokio::test]
    async fn test_default_client_requires_default_model() {
        let registry = ProviderRegistry::new();
        let result = registry.create_default_client().await;
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }
}
