//! Scripted LLM client for unit tests.

use crate::llm::client::{LLMClient, LLMClientFactoryTrait, LLMResponse};
use crate::types::{AppError, Result, ToolDefinition};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Shared reply queue. Every client handed out by the same script pops from
/// one queue, so a test can drive several agents in call order.
#[derive(Clone, Default)]
pub struct Script {
    replies: Arc<Mutex<VecDeque<String>>>,
    tool_replies: Arc<Mutex<VecDeque<LLMResponse>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    systems: Arc<Mutex<Vec<String>>>,
    failure: Arc<Mutex<Option<String>>>,
    gate: Arc<Mutex<Option<Arc<Semaphore>>>>,
}

impl Script {
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let script = Self::default();
        script
            .replies
            .lock()
            .extend(replies.into_iter().map(Into::into));
        script
    }

    pub fn push(&self, reply: impl Into<String>) {
        self.replies.lock().push_back(reply.into());
    }

    pub fn push_tool_response(&self, response: LLMResponse) {
        self.tool_replies.lock().push_back(response);
    }

    pub fn fail_with(&self, message: &str) {
        *self.failure.lock() = Some(message.to_string());
    }

    /// Make every call wait for a permit on the returned semaphore after
    /// its prompt is recorded.
    pub fn hold(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock() = Some(Arc::clone(&gate));
        gate
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().clone()
    }

    pub fn systems(&self) -> Vec<String> {
        self.systems.lock().clone()
    }

    pub fn remaining(&self) -> usize {
        self.replies.lock().len()
    }

    pub fn client(&self) -> ScriptedLLM {
        ScriptedLLM {
            script: self.clone(),
        }
    }

    pub fn factory(&self) -> Arc<ScriptedFactory> {
        Arc::new(ScriptedFactory {
            script: self.clone(),
        })
    }

    fn next(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().push(prompt.to_string());
        if let Some(message) = self.failure.lock().clone() {
            return Err(AppError::LLM(message));
        }
        Ok(self
            .replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| "OK".to_string()))
    }

    async fn pass_gate(&self) {
        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
    }
}

pub struct ScriptedLLM {
    script: Script,
}

#[async_trait]
impl LLMClient for ScriptedLLM {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let reply = self.script.next(prompt);
        self.script.pass_gate().await;
        reply
    }

    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.script.systems.lock().push(system.to_string());
        let reply = self.script.next(prompt);
        self.script.pass_gate().await;
        reply
    }

    async fn generate_with_history(&self, messages: &[(String, String)]) -> Result<String> {
        let last = messages
            .last()
            .map(|(_, content)| content.as_str())
            .unwrap_or_default();
        self.script.next(last)
    }

    async fn generate_with_tools(
        &self,
        prompt: &str,
        _tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        let queued = self.script.tool_replies.lock().pop_front();
        if let Some(response) = queued {
            self.script.prompts.lock().push(prompt.to_string());
            return Ok(response);
        }
        let content = self.script.next(prompt)?;
        Ok(LLMResponse {
            content,
            tool_calls: vec![],
            finish_reason: "stop".to_string(),
        })
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

pub struct ScriptedFactory {
    script: Script,
}

#[async_trait]
impl LLMClientFactoryTrait for ScriptedFactory {
    async fn create_default(&self) -> Result<Box<dyn LLMClient>> {
        Ok(Box::new(self.script.client()))
    }
}
