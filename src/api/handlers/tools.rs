//! Tool listing and direct execution

use crate::{
    types::{AppError, Result, ToolDefinition},
    AppState,
};
use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use tracing::debug;

/// List enabled tools with their parameter schemas
///
/// Enablement follows the live configuration, so a tool disabled by a
/// config reload disappears here without a restart.
#[utoipa::path(
    get,
    path = "/api/v1/tools",
    responses((status = 200, description = "Enabled tools", body = Vec<ToolDefinition>)),
    tag = "tools"
)]
pub async fn list_tools(State(state): State<AppState>) -> Json<Vec<ToolDefinition>> {
    let config = state.config_manager.config();
    let tools = state
        .tool_registry
        .list()
        .into_iter()
        .filter(|tool| config.is_tool_enabled(&tool.name))
        .collect();
    Json(tools)
}

/// Run a tool with the JSON body as its arguments
///
/// Tool failures are reported in the payload (`{"status": "error", ...}`)
/// with a 200 status; only an unknown tool is an HTTP error.
#[utoipa::path(
    post,
    path = "/api/v1/tools/{name}",
    request_body = Object,
    responses(
        (status = 200, description = "Tool result payload", body = Object),
        (status = 404, description = "Tool not found")
    ),
    params(("name" = String, Path, description = "Tool name")),
    tag = "tools"
)]
pub async fn execute_tool(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(args): Json<Value>,
) -> Result<Json<Value>> {
    if !state.config_manager.config().is_tool_enabled(&name) {
        return Err(AppError::NotFound(format!("Tool not found: {}", name)));
    }
    debug!(tool = %name, "Executing tool over HTTP");
    Ok(Json(state.tool_registry.execute(&name, args).await?))
}
