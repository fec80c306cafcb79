//! Problem discovery: coach conversation, problem summary, router plan,
//! and an inception document tying them together.

use crate::agents::CoachAgent;
use crate::types::{AppError, Result};
use crate::workflows::base::{Workflow, WorkflowState};
use crate::workflows::registry::WorkflowDeps;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Map, Value};
use tracing::{debug, info};

pub const WORKFLOW_ID: &str = "problem_discovery";
pub const DESCRIPTION: &str =
    "A workflow for discovering and analyzing business problems through agent interaction.";

const STEPS: [(&str, &str); 4] = [
    (
        "initial_conversation",
        "Coach agent conducts initial conversation to understand the problem",
    ),
    (
        "problem_summary",
        "Coach agent summarizes the gathered information",
    ),
    (
        "solution_planning",
        "Router agent analyzes problem and creates solution plan",
    ),
    (
        "inception_document",
        "Generate comprehensive inception document with problem analysis and solution approach",
    ),
];

/// First value present under any of `keys`, else `default`
fn pick(source: &Map<String, Value>, keys: &[&str], default: Value) -> Value {
    keys.iter()
        .find_map(|key| source.get(*key))
        .cloned()
        .unwrap_or(default)
}

/// Build the inception document from a problem summary and the router's
/// solution package. Fields are read from the package's inner
/// `solution_plan` object.
pub fn inception_document(
    workflow_id: &str,
    problem_summary: &Value,
    solution_plan: &Value,
) -> Value {
    let empty = Map::new();
    let problem = problem_summary.as_object().unwrap_or(&empty);
    let plan = solution_plan
        .get("solution_plan")
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let text = || Value::String(String::new());
    let list = || Value::Array(vec![]);
    let object = || Value::Object(Map::new());

    json!({
        "title": "Project Inception Document",
        "created_at": Utc::now().to_rfc3339(),
        "sections": {
            "executive_summary": {
                "problem_statement": pick(problem, &["problem_description"], text()),
                "proposed_solution": pick(plan, &["summary", "solution_strategy"], text()),
                "expected_outcomes": pick(plan, &["expected_outcomes"], list()),
            },
            "problem_analysis": {
                "context": pick(problem, &["context_background"], text()),
                "stakeholders": pick(problem, &["stakeholders"], list()),
                "constraints": pick(problem, &["constraints_limitations"], list()),
                "success_criteria": pick(problem, &["goals_outcomes"], list()),
            },
            "solution_approach": {
                "methodology": pick(plan, &["methodology"], text()),
                "required_agents": pick(plan, &["required_agents", "required_resources"], list()),
                "timeline": pick(plan, &["estimated_timeline", "timeline"], object()),
                "deliverables": pick(plan, &["deliverables"], list()),
                "risks_mitigations": pick(plan, &["risks", "risk_management"], list()),
            },
            "next_steps": {
                "immediate_actions": pick(plan, &["next_steps"], list()),
                "resource_requirements": pick(plan, &["resource_requirements"], object()),
                "success_metrics": pick(plan, &["success_metrics"], list()),
            },
        },
        "metadata": {
            "workflow_id": workflow_id,
            "generated_by": "ProblemDiscoveryWorkflow",
            "version": "1.0",
        },
    })
}

/// Discovery conversation through to an inception document
pub struct ProblemDiscoveryWorkflow {
    state: WorkflowState,
    deps: WorkflowDeps,
}

impl ProblemDiscoveryWorkflow {
    pub fn new(mut state: WorkflowState, deps: WorkflowDeps) -> Self {
        for (name, description) in STEPS {
            state.add_step(name, description);
        }
        Self { state, deps }
    }

    async fn conduct_conversation(
        &self,
        coach: &mut CoachAgent,
        query: &str,
        context: &Map<String, Value>,
        profile: Option<&Map<String, Value>>,
    ) -> Result<Value> {
        match profile {
            Some(profile) => {
                debug!("Running discovery against a simulated user");
                let mut user = self.deps.agents.simulator(profile.clone()).await?;
                coach
                    .conduct_simulated_conversation(query, context, &mut user)
                    .await
            }
            None => coach.conduct_discovery_conversation(query, context).await,
        }
    }

    async fn run(&mut self, input: &Value) -> Result<Map<String, Value>> {
        let query = input
            .get("initial_query")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let empty = Map::new();
        let context = input
            .get("user_context")
            .and_then(Value::as_object)
            .unwrap_or(&empty);
        let profile = input.get("user_profile").and_then(Value::as_object);

        self.state
            .add_metadata("initial_query", Value::String(query.to_string()));
        let mode = if profile.is_some() {
            "simulated_user"
        } else {
            "user_context"
        };
        self.state.add_metadata("conversation_mode", json!(mode));

        // Step 1: initial conversation
        self.state.begin_step(0);
        let mut coach = self.deps.agents.coach().await?;
        let conversation = self
            .conduct_conversation(&mut coach, query, context, profile)
            .await?;
        self.state.complete_step(Some(
            json!({ "conversation_summary": conversation["summary"] }),
        ));

        // Step 2: problem summary, as prepared at the end of the conversation
        self.state.begin_step(1);
        let problem_summary = coach
            .problem_summary()
            .cloned()
            .unwrap_or_else(|| conversation["summary"].clone());
        self.state
            .complete_step(Some(json!({ "problem_summary": problem_summary })));

        // Step 3: solution planning
        self.state.begin_step(2);
        let router = self.deps.agents.router().await?;
        let solution_plan = router.create_solution_plan(&problem_summary).await?;
        self.state
            .complete_step(Some(json!({ "solution_plan": solution_plan })));

        // Step 4: inception document
        self.state.begin_step(3);
        let document =
            inception_document(&self.state.workflow_id, &problem_summary, &solution_plan);
        self.state
            .complete_step(Some(json!({ "inception_document": document })));

        let mut results = Map::new();
        results.insert("problem_summary".to_string(), problem_summary);
        results.insert("solution_plan".to_string(), solution_plan);
        results.insert("inception_document".to_string(), document);
        results.insert("completed_at".to_string(), json!(Utc::now().to_rfc3339()));
        Ok(results)
    }
}

#[async_trait]
impl Workflow for ProblemDiscoveryWorkflow {
    fn state(&self) -> &WorkflowState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut WorkflowState {
        &mut self.state
    }

    /// `initial_query` must be a non-empty string; `user_context` and
    /// `user_profile`, when present, must be objects.
    fn validate_input(&self, input: &Value) -> Result<()> {
        let query = input
            .get("initial_query")
            .ok_or_else(|| AppError::InvalidInput("Missing initial query in input data".into()))?;
        match query.as_str() {
            Some(q) if !q.trim().is_empty() => {}
            _ => {
                return Err(AppError::InvalidInput(
                    "Initial query must be a non-empty string".into(),
                ))
            }
        }
        for key in ["user_context", "user_profile"] {
            if let Some(value) = input.get(key) {
                if !value.is_object() {
                    return Err(AppError::InvalidInput(format!(
                        "{} must be an object",
                        key
                    )));
                }
            }
        }
        Ok(())
    }

    async fn execute(&mut self, input: &Value) -> Result<Value> {
        self.validate_input(input)?;
        self.state.pre_execute();

        match self.run(input).await {
            Ok(results) => {
                self.state.results = results;
                self.state.post_execute();
                info!(workflow_id = %self.state.workflow_id, "Problem discovery finished");
                Ok(Value::Object(self.state.results.clone()))
            }
            Err(e) => {
                let step = self.state.current_step;
                self.state.handle_error(&e, Some(step));
                Err(e)
            }
        }
    }
}
