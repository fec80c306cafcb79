//! Workflow state machine shared by every workflow.

use crate::types::{AppError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{error, info};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStatus {
    Initialized,
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// One ordered stage of a workflow
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WorkflowStep {
    /// 1-based position
    pub step_id: usize,
    pub name: String,
    pub description: String,
    pub status: StepStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    #[schema(value_type = Option<Object>)]
    pub results: Option<Value>,
}

/// Error report recorded on a failed workflow
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorInfo {
    pub error_type: String,
    pub error_message: String,
    pub timestamp: DateTime<Utc>,
}

/// Status, steps and outputs of one workflow instance
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WorkflowState {
    pub workflow_id: String,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub status: WorkflowStatus,
    pub steps: Vec<WorkflowStep>,
    /// 0-based index of the step being executed
    pub current_step: usize,
    #[schema(value_type = Object)]
    pub metadata: Map<String, Value>,
    #[schema(value_type = Object)]
    pub results: Map<String, Value>,
}

impl WorkflowState {
    pub fn new(workflow_id: &str, name: &str, description: &str) -> Self {
        Self {
            workflow_id: workflow_id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            created_at: Utc::now(),
            status: WorkflowStatus::Initialized,
            steps: Vec::new(),
            current_step: 0,
            metadata: Map::new(),
            results: Map::new(),
        }
    }

    /// Append a pending step; its `step_id` is its 1-based position.
    pub fn add_step(&mut self, name: &str, description: &str) {
        self.steps.push(WorkflowStep {
            step_id: self.steps.len() + 1,
            name: name.to_string(),
            description: description.to_string(),
            status: StepStatus::Pending,
            started_at: None,
            completed_at: None,
            results: None,
        });
    }

    /// Update the step at 0-based `index`. Out-of-range indices are ignored.
    ///
    /// `Running` stamps `started_at`; `Completed` and `Failed` stamp
    /// `completed_at`. Results are replaced only when given.
    pub fn update_step_status(&mut self, index: usize, status: StepStatus, results: Option<Value>) {
        let Some(step) = self.steps.get_mut(index) else {
            return;
        };
        step.status = status;
        match status {
            StepStatus::Running => step.started_at = Some(Utc::now()),
            StepStatus::Completed | StepStatus::Failed => step.completed_at = Some(Utc::now()),
            StepStatus::Pending => {}
        }
        if results.is_some() {
            step.results = results;
        }
    }

    /// Make `index` the current step and mark it running
    pub fn begin_step(&mut self, index: usize) {
        self.current_step = index;
        self.update_step_status(index, StepStatus::Running, None);
    }

    /// Mark the current step completed with `results`
    pub fn complete_step(&mut self, results: Option<Value>) {
        self.update_step_status(self.current_step, StepStatus::Completed, results);
    }

    pub fn add_metadata(&mut self, key: &str, value: Value) {
        self.metadata.insert(key.to_string(), value);
    }

    pub fn pre_execute(&mut self) {
        self.status = WorkflowStatus::Running;
        info!(workflow_id = %self.workflow_id, name = %self.name, "Starting workflow");
    }

    pub fn post_execute(&mut self) {
        self.status = WorkflowStatus::Completed;
        info!(workflow_id = %self.workflow_id, name = %self.name, "Completed workflow");
    }

    /// Mark the workflow failed and record `err` on `step` (when given)
    /// and under `results.error`.
    pub fn handle_error(&mut self, err: &AppError, step: Option<usize>) {
        self.status = WorkflowStatus::Failed;
        let info = ErrorInfo {
            error_type: err.kind().to_string(),
            error_message: err.to_string(),
            timestamp: Utc::now(),
        };
        let info = serde_json::to_value(&info).unwrap_or_else(|_| json!({}));

        if let Some(index) = step {
            self.update_step_status(index, StepStatus::Failed, Some(json!({ "error": info })));
        }

        error!(
            workflow_id = %self.workflow_id,
            name = %self.name,
            error = %err,
            "Workflow error"
        );
        self.results.insert("error".to_string(), info);
    }

    /// Point-in-time view of the workflow for status endpoints
    pub fn status_snapshot(&self) -> Value {
        json!({
            "workflow_id": self.workflow_id,
            "name": self.name,
            "status": self.status,
            "current_step": self.current_step,
            "total_steps": self.steps.len(),
            "steps": self.steps,
            "created_at": self.created_at,
            "metadata": self.metadata,
            "results": self.results,
        })
    }
}

/// A multi-step process with observable state
#[async_trait]
pub trait Workflow: Send + Sync {
    fn state(&self) -> &WorkflowState;

    fn state_mut(&mut self) -> &mut WorkflowState;

    /// Check input before execution; failures are [`AppError::InvalidInput`].
    fn validate_input(&self, input: &Value) -> Result<()>;

    /// Run every step. On failure the error is recorded in the state and
    /// returned.
    async fn execute(&mut self, input: &Value) -> Result<Value>;

    fn status(&self) -> Value {
        self.state().status_snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_steps() -> WorkflowState {
        let mut state = WorkflowState::new("demo", "Demo", "A demo workflow");
        state.add_step("first", "First step");
        state.add_step("second", "Second step");
        state
    }

    #[test]
    fn test_add_step_numbers_from_one() {
        let state = state_with_steps();
        assert_eq!(state.steps[0].step_id, 1);
        assert_eq!(state.steps[1].step_id, 2);
        assert_eq!(state.steps[1].status, StepStatus::Pending);
        assert!(state.steps[1].started_at.is_none());
        assert_eq!(state.status, WorkflowStatus::Initialized);
    }

    #[test]
    fn test_update_step_status_timestamps() {
        let mut state = state_with_steps();

        state.update_step_status(0, StepStatus::Running, None);
        assert!(state.steps[0].started_at.is_some());
        assert!(state.steps[0].completed_at.is_none());

        state.update_step_status(0, StepStatus::Completed, Some(json!({"rows": 3})));
        assert!(state.steps[0].completed_at.is_some());
        assert_eq!(state.steps[0].results, Some(json!({"rows": 3})));

        // Results survive a status change without new results
        state.update_step_status(0, StepStatus::Completed, None);
        assert_eq!(state.steps[0].results, Some(json!({"rows": 3})));
    }

    #[test]
    fn test_update_step_status_out_of_range_is_ignored() {
        let mut state = state_with_steps();
        state.update_step_status(5, StepStatus::Running, None);
        assert!(state
            .steps
            .iter()
            .all(|s| s.status == StepStatus::Pending));
    }

    #[test]
    fn test_handle_error_records_on_step_and_results() {
        let mut state = state_with_steps();
        state.pre_execute();
        state.begin_step(1);

        state.handle_error(&AppError::LLM("model offline".to_string()), Some(1));

        assert_eq!(state.status, WorkflowStatus::Failed);
        assert_eq!(state.steps[1].status, StepStatus::Failed);
        let step_error = &state.steps[1].results.as_ref().unwrap()["error"];
        assert_eq!(step_error["error_type"], "LLMError");
        assert_eq!(state.results["error"]["error_message"], "LLM error: model offline");
        assert_eq!(state.steps[0].status, StepStatus::Pending);
    }

    #[test]
    fn test_status_snapshot() {
        let mut state = state_with_steps();
        state.add_metadata("source", json!("test"));
        state.pre_execute();

        let snapshot = state.status_snapshot();
        assert_eq!(snapshot["status"], "running");
        assert_eq!(snapshot["total_steps"], 2);
        assert_eq!(snapshot["current_step"], 0);
        assert_eq!(snapshot["metadata"]["source"], "test");
        assert_eq!(snapshot["steps"][0]["status"], "pending");
    }
}
