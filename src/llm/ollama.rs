use crate::llm::client::{LLMClient, LLMResponse, ModelParams};
use crate::types::{AppError, Result, ToolDefinition};
use async_trait::async_trait;
use ollama_rs::{
    generation::chat::{request::ChatMessageRequest, ChatMessage},
    models::ModelOptions,
    Ollama,
};

const DEFAULT_PORT: u16 = 11434;

pub struct OllamaClient {
    client: Ollama,
    model: String,
    params: ModelParams,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: String, params: ModelParams) -> Result<Self> {
        let (host, port) = split_base_url(base_url)?;
        let client = Ollama::new(host, port);

        Ok(Self {
            client,
            model,
            params,
        })
    }

    fn request(&self, messages: Vec<ChatMessage>) -> ChatMessageRequest {
        let options = ModelOptions::default()
            .temperature(self.params.temperature)
            .num_predict(self.params.max_tokens as i32);
        ChatMessageRequest::new(self.model.clone(), messages).options(options)
    }

    async fn send(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let response = self
            .client
            .send_chat_messages(self.request(messages))
            .await
            .map_err(|e| AppError::LLM(format!("Ollama error: {}", e)))?;

        Ok(response.message.content)
    }
}

/// Split `http://host:port` into the scheme-qualified host and the port.
fn split_base_url(base_url: &str) -> Result<(String, u16)> {
    let (scheme, rest) = match base_url.split_once("://") {
        Some((scheme, rest)) => (scheme, rest),
        None => ("http", base_url),
    };
    let rest = rest.trim_end_matches('/');

    let (host, port) = match rest.rsplit_once(':') {
        Some((host, port)) => {
            let port = port.parse::<u16>().map_err(|_| {
                AppError::Configuration(format!("Invalid Ollama port in '{}'", base_url))
            })?;
            (host, port)
        }
        None => (rest, DEFAULT_PORT),
    };

    if host.is_empty() {
        return Err(AppError::Configuration(format!(
            "Invalid Ollama base_url '{}'",
            base_url
        )));
    }

    Ok((format!("{}://{}", scheme, host), port))
}

#[async_trait]
impl LLMClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.send(vec![ChatMessage::user(prompt.to_string())]).await
    }

    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String> {
        self.send(vec![
            ChatMessage::system(system.to_string()),
            ChatMessage::user(prompt.to_string()),
        ])
        .await
    }

    async fn generate_with_history(&self, messages: &[(String, String)]) -> Result<String> {
        let chat_messages: Vec<ChatMessage> = messages
            .iter()
            .map(|(role, content)| match role.as_str() {
                "system" => ChatMessage::system(content.clone()),
                "assistant" => ChatMessage::assistant(content.clone()),
                _ => ChatMessage::user(content.clone()),
            })
            .collect();

        self.send(chat_messages).await
    }

    async fn generate_with_tools(
        &self,
        prompt: &str,
        _tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        // Tool calling depends on model support; plain generation is returned
        // and the caller treats it as a final answer.
        let content = self.generate(prompt).await?;

        Ok(LLMResponse {
            content,
            tool_calls: vec![],
            finish_reason: "stop".to_string(),
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
