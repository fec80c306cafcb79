//! Workflow registry handlers

use crate::{
    types::{Result, RunWorkflowRequest},
    workflows::WorkflowInfo,
    AppState,
};
use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::Value;
use std::collections::BTreeMap;

/// List available workflows
///
/// Returns every registered workflow keyed by id.
#[utoipa::path(
    get,
    path = "/api/v1/workflows",
    responses(
        (status = 200, description = "Registered workflows keyed by id", body = Object)
    ),
    tag = "workflows"
)]
pub async fn list_workflows(State(state): State<AppState>) -> Json<BTreeMap<String, WorkflowInfo>> {
    Json(state.workflows.list())
}

/// Execute a workflow by id
///
/// Creates a fresh instance of the workflow, runs it on `input` and returns
/// its final status with results.
#[utoipa::path(
    post,
    path = "/api/v1/workflows/{workflow_id}",
    request_body = RunWorkflowRequest,
    responses(
        (status = 200, description = "Workflow completed", body = Object),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Workflow not found"),
        (status = 500, description = "Workflow failed")
    ),
    params(("workflow_id" = String, Path, description = "Id of the workflow to run")),
    tag = "workflows"
)]
pub async fn execute_workflow(
    State(state): State<AppState>,
    Path(workflow_id): Path<String>,
    Json(payload): Json<RunWorkflowRequest>,
) -> Result<Json<Value>> {
    let status = state.sessions.run_workflow(&workflow_id, &payload).await?;
    Ok(Json(status))
}
