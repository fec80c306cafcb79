//! Mock implementations for testing.
//!
//! Mock LLM clients and factories shared by the integration tests, so no
//! test needs a running model server.

use async_trait::async_trait;
use insight::llm::client::LLMClientFactoryTrait;
use insight::llm::{LLMClient, LLMResponse};
use insight::types::{AppError, Result, ToolDefinition};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Mock LLM client with queued replies.
///
/// Queued replies are returned in call order; once the queue is empty every
/// call returns the fallback response. Clones share the queue, so several
/// agents created from one [`MockLLMFactory`] consume a single script.
///
/// # Examples
///
/// ```ignore
/// // Always answers "Hello"
/// let client = MockLLMClient::new("Hello");
///
/// // Answers "first", then "second", then "OK" forever
/// let client = MockLLMClient::scripted(["first", "second"]);
///
/// // Every call fails
/// let client = MockLLMClient::failing();
/// ```
#[derive(Clone)]
pub struct MockLLMClient {
    replies: Arc<Mutex<VecDeque<String>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    fallback: String,
    should_fail: bool,
}

impl MockLLMClient {
    /// A client that always returns `response`.
    pub fn new(response: &str) -> Self {
        Self {
            replies: Arc::default(),
            prompts: Arc::default(),
            fallback: response.to_string(),
            should_fail: false,
        }
    }

    /// A client that plays `replies` in order, then answers "OK".
    pub fn scripted<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let client = Self::new("OK");
        client
            .replies
            .lock()
            .extend(replies.into_iter().map(Into::into));
        client
    }

    /// A client whose every call returns an LLM error.
    pub fn failing() -> Self {
        Self {
            should_fail: true,
            ..Self::new("")
        }
    }

    /// Prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    /// Queued replies not yet consumed
    pub fn remaining(&self) -> usize {
        self.replies.lock().len()
    }

    fn reply(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        if self.should_fail {
            return Err(AppError::LLM("Mock LLM failure".to_string()));
        }
        Ok(self
            .replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone()))
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.reply(prompt)
    }

    async fn generate_with_system(&self, _system: &str, prompt: &str) -> Result<String> {
        self.reply(prompt)
    }

    async fn generate_with_history(&self, messages: &[(String, String)]) -> Result<String> {
        let last = messages
            .last()
            .map(|(_, content)| content.as_str())
            .unwrap_or_default();
        self.reply(last)
    }

    async fn generate_with_tools(
        &self,
        prompt: &str,
        _tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        Ok(LLMResponse {
            content: self.reply(prompt)?,
            tool_calls: vec![],
            finish_reason: "stop".to_string(),
        })
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

/// Mock LLM factory for tests requiring complete isolation from external services.
///
/// Every client it hands out shares the wrapped client's reply queue.
pub struct MockLLMFactory {
    client: MockLLMClient,
}

impl MockLLMFactory {
    pub fn new(client: MockLLMClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LLMClientFactoryTrait for MockLLMFactory {
    async fn create_default(&self) -> Result<Box<dyn LLMClient>> {
        Ok(Box::new(self.client.clone()))
    }
}
