//! Workflow registry
//!
//! Maps workflow ids (case-insensitive) to constructors, so callers can
//! create fresh workflow instances by id.

use crate::agents::AgentFactory;
use crate::types::{AppError, Result};
use crate::workflows::base::{Workflow, WorkflowState};
use crate::workflows::data_analysis::{self, DataAnalysisWorkflow};
use crate::workflows::problem_discovery::{self, ProblemDiscoveryWorkflow};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{error, info, warn};
use utoipa::ToSchema;

/// What a workflow needs from the rest of the application
#[derive(Clone)]
pub struct WorkflowDeps {
    pub agents: Arc<AgentFactory>,
}

/// Builds a workflow around a freshly named state
pub type WorkflowConstructor =
    Arc<dyn Fn(WorkflowState, &WorkflowDeps) -> Box<dyn Workflow> + Send + Sync>;

/// Listing entry for a registered workflow
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WorkflowInfo {
    pub name: String,
    pub description: String,
}

struct Registration {
    info: WorkflowInfo,
    constructor: WorkflowConstructor,
}

/// Registry of available workflows
#[derive(Default)]
pub struct WorkflowRegistry {
    workflows: HashMap<String, Registration>,
}

impl WorkflowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with `problem_discovery` and `data_analysis`
    pub fn with_builtin_workflows() -> Self {
        let mut registry = Self::new();
        registry.register(
            problem_discovery::WORKFLOW_ID,
            "ProblemDiscoveryWorkflow",
            problem_discovery::DESCRIPTION,
            Arc::new(
                |state: WorkflowState, deps: &WorkflowDeps| -> Box<dyn Workflow> {
                    Box::new(ProblemDiscoveryWorkflow::new(state, deps.clone()))
                },
            ),
        );
        registry.register(
            data_analysis::WORKFLOW_ID,
            "DataAnalysisWorkflow",
            data_analysis::DESCRIPTION,
            Arc::new(
                |state: WorkflowState, _: &WorkflowDeps| -> Box<dyn Workflow> {
                    Box::new(DataAnalysisWorkflow::new(state))
                },
            ),
        );
        registry
    }

    /// Register a workflow constructor under `workflow_id`, overwriting any
    /// existing registration with a warning.
    pub fn register(
        &mut self,
        workflow_id: &str,
        name: &str,
        description: &str,
        constructor: WorkflowConstructor,
    ) {
        let key = workflow_id.to_lowercase();
        if self.workflows.contains_key(&key) {
            warn!(workflow_id = %key, "Workflow already registered. Overwriting...");
        }
        self.workflows.insert(
            key.clone(),
            Registration {
                info: WorkflowInfo {
                    name: name.to_string(),
                    description: description.to_string(),
                },
                constructor,
            },
        );
        info!(workflow_id = %key, "Registered workflow");
    }

    /// Listing entry for a workflow id
    pub fn get(&self, workflow_id: &str) -> Option<&WorkflowInfo> {
        self.workflows
            .get(&workflow_id.to_lowercase())
            .map(|r| &r.info)
    }

    pub fn contains(&self, workflow_id: &str) -> bool {
        self.workflows.contains_key(&workflow_id.to_lowercase())
    }

    /// Create a new instance of a registered workflow
    pub fn create(
        &self,
        workflow_id: &str,
        name: &str,
        description: &str,
        deps: &WorkflowDeps,
    ) -> Result<Box<dyn Workflow>> {
        let key = workflow_id.to_lowercase();
        let Some(registration) = self.workflows.get(&key) else {
            error!(workflow_id = %key, "Workflow not found in registry");
            return Err(AppError::NotFound(format!("Workflow '{}' not found", workflow_id)));
        };
        let state = WorkflowState::new(&key, name, description);
        Ok((registration.constructor)(state, deps))
    }

    /// All registered workflows keyed by id
    pub fn list(&self) -> BTreeMap<String, WorkflowInfo> {
        self.workflows
            .iter()
            .map(|(id, r)| (id.clone(), r.info.clone()))
            .collect()
    }

    /// Remove a workflow; returns whether it was registered
    pub fn unregister(&mut self, workflow_id: &str) -> bool {
        let removed = self.workflows.remove(&workflow_id.to_lowercase()).is_some();
        if removed {
            info!(workflow_id, "Unregistered workflow");
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::Script;
    use crate::tools::ToolRegistry;

    fn deps() -> WorkflowDeps {
        let script = Script::default();
        WorkflowDeps {
            agents: Arc::new(AgentFactory::new(
                script.factory(),
                Arc::new(ToolRegistry::new()),
            )),
        }
    }

    #[test]
    fn test_builtin_workflows_listed() {
        let registry = WorkflowRegistry::with_builtin_workflows();
        let listed = registry.list();

        assert_eq!(
            listed.keys().cloned().collect::<Vec<_>>(),
            vec!["data_analysis", "problem_discovery"]
        );
        assert_eq!(listed["problem_discovery"].name, "ProblemDiscoveryWorkflow");
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let registry = WorkflowRegistry::with_builtin_workflows();
        assert!(registry.contains("Problem_Discovery"));
        assert!(registry.get("DATA_ANALYSIS").is_some());
    }

    #[test]
    fn test_create_builds_fresh_state() {
        let registry = WorkflowRegistry::with_builtin_workflows();
        let workflow = registry
            .create("Data_Analysis", "Quarterly", "Q3 numbers", &deps())
            .unwrap();

        let state = workflow.state();
        assert_eq!(state.workflow_id, "data_analysis");
        assert_eq!(state.name, "Quarterly");
        assert_eq!(state.steps.len(), 5);
    }

    #[test]
    fn test_create_unknown_workflow() {
        let registry = WorkflowRegistry::with_builtin_workflows();
        let result = registry.create("nope", "n", "d", &deps());
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_register_overwrites_and_unregister() {
        let mut registry = WorkflowRegistry::with_builtin_workflows();
        registry.register(
            "DATA_ANALYSIS",
            "Replacement",
            "Replaced",
            Arc::new(
                |state: WorkflowState, _: &WorkflowDeps| -> Box<dyn Workflow> {
                    Box::new(DataAnalysisWorkflow::new(state))
                },
            ),
        );
        assert_eq!(registry.list().len(), 2);
        assert_eq!(registry.get("data_analysis").unwrap().name, "Replacement");

        assert!(registry.unregister("Data_Analysis"));
        assert!(!registry.unregister("data_analysis"));
        assert_eq!(registry.list().len(), 1);
    }
}
