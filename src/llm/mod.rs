//! LLM Provider Clients and Abstractions
//!
//! This module provides a unified interface for the language models that back
//! every agent. Provider-specific code sits behind the [`LLMClient`] trait so
//! agents and workflows never see which backend answers them.
//!
//! # Architecture
//!
//! - [`LLMClient`] - The core trait that all providers implement
//! - [`LLMClientFactoryTrait`] - Seam for creating clients; the server uses
//!   [`ProviderRegistry`], tests inject scripted factories
//! - [`ProviderRegistry`] - Resolves `[models.*]` entries to providers
//!
//! # Supported Providers
//!
//! Enable providers via Cargo features:
//! - `ollama` - Local Ollama server (default)
//! - `openai` - OpenAI API and compatible endpoints
//!
//! # Example
//!
//! ```ignore
//! use insight::llm::{LLMClientFactoryTrait, ProviderRegistry};
//!
//! let registry = ProviderRegistry::from_config(&config);
//! let client = registry.create_for_model("default").await?;
//! let answer = client.generate_with_system("You are terse.", "What is 2+2?").await?;
//! ```

/// Core LLM client trait, provider enum and factories.
pub mod client;
/// Registry for resolving named models to providers.
pub mod provider_registry;

#[cfg(feature = "ollama")]
pub mod ollama;

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(test)]
pub(crate) mod mock;

pub use client::{
    LLMClient, LLMClientFactory, LLMClientFactoryTrait, LLMResponse, ModelParams, Provider,
};
pub use provider_registry::ProviderRegistry;
