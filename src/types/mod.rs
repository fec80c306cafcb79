use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

// ============= API Request/Response Types =============

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StartSessionRequest {
    pub problem: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RespondRequest {
    pub session_id: String,
    pub response: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConfirmRequest {
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SessionReply {
    pub status: ReplyStatus,
    pub response: String,
    pub session_id: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ConfirmResponse {
    pub status: ReplyStatus,
    #[schema(value_type = Object)]
    pub summary: Value,
    #[schema(value_type = Object)]
    pub plan: Value,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RunWorkflowRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[schema(value_type = Object)]
    pub input: Value,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnalysisRequest {
    #[schema(value_type = Object)]
    pub data: serde_json::Map<String, Value>,
    pub analysis_type: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnalysisResponse {
    pub status: ReplyStatus,
    pub analysis: String,
}

// ============= Agent Types =============

/// Outcome of a single agent turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReplyStatus {
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// Reply produced by [`Agent::process_message`](crate::agents::Agent::process_message).
///
/// Failures never escape an agent turn: they come back as a reply with
/// `status = error` and `role = system`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentReply {
    pub status: ReplyStatus,
    pub content: String,
    pub role: ChatRole,
    pub metadata: ReplyMetadata,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReplyMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tools_used: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentReply {
    pub fn success(content: String, model: &str, tools_used: Vec<String>) -> Self {
        Self {
            status: ReplyStatus::Success,
            content,
            role: ChatRole::Assistant,
            metadata: ReplyMetadata {
                timestamp: Some(Utc::now()),
                model: Some(model.to_string()),
                tools_used,
                error: None,
            },
        }
    }

    pub fn error(error: &AppError) -> Self {
        Self {
            status: ReplyStatus::Error,
            content: format!("Error processing message: {}", error),
            role: ChatRole::System,
            metadata: ReplyMetadata {
                timestamp: Some(Utc::now()),
                model: None,
                tools_used: vec![],
                error: Some(error.to_string()),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ReplyStatus::Success
    }

    /// Turn an error reply back into an [`AppError::LLM`].
    pub fn into_result(self) -> Result<String> {
        match self.status {
            ReplyStatus::Success => Ok(self.content),
            ReplyStatus::Error => Err(AppError::LLM(
                self.metadata.error.unwrap_or(self.content),
            )),
        }
    }
}

/// What a conversation entry represents within a discovery dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Question,
    Response,
    Summary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EntryMetadata {
    pub topic: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConversationEntry {
    pub role: ChatRole,
    pub content: String,
    pub metadata: EntryMetadata,
    pub timestamp: DateTime<Utc>,
}

impl ConversationEntry {
    pub fn new(role: ChatRole, content: impl Into<String>, topic: &str, kind: EntryKind) -> Self {
        Self {
            role,
            content: content.into(),
            metadata: EntryMetadata {
                topic: topic.to_string(),
                kind,
            },
            timestamp: Utc::now(),
        }
    }
}

// ============= Tool Types =============

#[derive(Debug, Serialize, Deserialize, Clone, ToSchema)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    #[schema(value_type = Object)]
    pub parameters: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: Value,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Workflow error: {0}")]
    Workflow(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Short variant name, recorded in workflow error reports.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::LLM(_) => "LLMError",
            AppError::NotFound(_) => "NotFound",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::Configuration(_) => "ConfigurationError",
            AppError::Workflow(_) => "WorkflowError",
            AppError::Tool(_) => "ToolError",
            AppError::Internal(_) => "InternalError",
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::NotFound(_) => axum::http::StatusCode::NOT_FOUND,
            AppError::InvalidInput(_) => axum::http::StatusCode::BAD_REQUEST,
            AppError::LLM(_)
            | AppError::Configuration(_)
            | AppError::Workflow(_)
            | AppError::Tool(_)
            | AppError::Internal(_) => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({
            "status": "error",
            "detail": self.to_string(),
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
