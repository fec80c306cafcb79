use crate::{
    agents::{Agent, BaseAgent},
    types::{AppError, Result},
    utils::json::{extract_json_object, normalize_keys},
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{info, warn};

pub const ROUTER_NAME: &str = "Problem_Router";

pub const ROUTER_SYSTEM_PROMPT: &str = r#"You are an expert Problem Router with deep knowledge of business intelligence, data analysis, process optimization, strategic planning and business analysis frameworks.

Your role is to:
- Analyze problem descriptions using established frameworks (SWOT, PESTLE, Porter's Five Forces)
- Select appropriate agents and tools for problem-solving
- Create structured, framework-based solution plans
- Ensure comprehensive risk assessment and mitigation
- Define clear, measurable success metrics

Available agents and tools: Business Intelligence Agent, Strategy Agent, Process Optimization Agent, Data Analysis Tools, Project Management Tools."#;

/// Words that turn a "valid" in free text into a rejection
const NEGATIONS: &[&str] = &["not", "no", "never", "cannot", "isnt", "arent", "nor"];

/// Router agent that turns a problem summary into a validated solution plan.
///
/// Uses an LLM to analyze the problem through business frameworks, draft a
/// plan, and review that plan before it is handed back.
pub struct RouterAgent {
    base: BaseAgent,
    strict_validation: bool,
}

impl RouterAgent {
    /// Creates a new RouterAgent around the given base agent.
    pub fn new(base: BaseAgent) -> Self {
        Self {
            base,
            strict_validation: false,
        }
    }

    /// Reject plans whose validation reply has no recognisable verdict
    pub fn with_strict_validation(mut self, strict: bool) -> Self {
        self.strict_validation = strict;
        self
    }

    async fn ask(&self, prompt: &str) -> Result<String> {
        self.base.process_message(prompt).await.into_result()
    }

    /// JSON object embedded in a reply, or the reply text itself
    fn structured(reply: String) -> Value {
        match extract_json_object(&reply) {
            Some(object) => Value::Object(normalize_keys(object)),
            None => Value::String(reply),
        }
    }

    /// Parse a validation verdict from LLM output
    ///
    /// Only two forms approve a plan: a JSON `validation_result` of exactly
    /// `VALID`, or a reply that is nothing but the bare `VALID` token. Any
    /// other JSON verdict, a bare `INVALID`, or free text that says
    /// "invalid" or negates "valid" rejects it. Free text without a clear
    /// verdict yields `None`.
    fn parse_validation_verdict(output: &str) -> Option<bool> {
        if let Some(object) = extract_json_object(output).map(normalize_keys) {
            if let Some(verdict) = object.get("validation_result") {
                return Some(
                    verdict
                        .as_str()
                        .is_some_and(|v| v.trim().eq_ignore_ascii_case("VALID")),
                );
            }
        }

        let bare = output
            .trim()
            .trim_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace());
        if bare.eq_ignore_ascii_case("VALID") {
            return Some(true);
        }
        if bare.eq_ignore_ascii_case("INVALID") {
            return Some(false);
        }

        let lowered = output.to_lowercase().replace('\u{2019}', "'");
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric() && c != '_' && c != '\'')
            .map(|w| w.trim_matches('\''))
            .filter(|w| !w.is_empty())
            .collect();
        let negated = words
            .iter()
            .any(|w| NEGATIONS.contains(w) || w.ends_with("n't"));
        if words.contains(&"invalid") || (negated && words.contains(&"valid")) {
            Some(false)
        } else {
            None
        }
    }

    /// Analyze a problem summary with SWOT, PESTLE, root cause, stakeholder
    /// and impact frameworks.
    pub async fn analyze_problem(&self, problem_summary: &Value) -> Result<Value> {
        let prompt = format!(
            "Based on the following problem summary:\n{}\n\nPlease perform a comprehensive analysis using:\n1. SWOT Analysis\n2. PESTLE Analysis\n3. Root Cause Analysis\n4. Stakeholder Analysis (Power/Interest Matrix)\n5. Impact Assessment (Business Value vs Implementation Complexity)\n\nFor each framework provide detailed analysis, key insights and potential solution directions.\nFormat the response as a JSON object with each analysis as a separate section, plus a \"key_findings\" section summarizing the most important insights.",
            problem_summary
        );
        Ok(Self::structured(self.ask(&prompt).await?))
    }

    /// Analyze the problem, draft a plan and package both for execution.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Workflow`] when the reviewer rejects the plan.
    pub async fn create_solution_plan(&self, problem_summary: &Value) -> Result<Value> {
        let problem_analysis = self.analyze_problem(problem_summary).await?;

        let prompt = format!(
            "Based on the problem analysis:\n{}\n\nCreate a comprehensive solution plan including:\n1. Solution Strategy: approach, principles, success criteria\n2. Required Resources: agents and roles, tools, external expertise\n3. Implementation Plan: phases, deliverables, timeline and milestones, dependencies\n4. Risk Management: risks, mitigation strategies, contingency plans\n5. Resource Optimization: allocation, parallel vs sequential activities\n6. Success Metrics: KPIs, measurement methodology, targets\n7. Monitoring and Adjustment: tracking, review points, adjustment mechanisms\n\nFormat the response as a detailed JSON object with these sections.",
            problem_analysis
        );
        let plan = Self::structured(self.ask(&prompt).await?);

        let solution_plan = json!({
            "problem_summary": problem_summary,
            "problem_analysis": problem_analysis,
            "solution_plan": plan,
            "metadata": {
                "generated_at": Utc::now().to_rfc3339(),
                "version": "2.0",
                "framework_version": "comprehensive",
            },
            "status": "ready_for_execution",
        });

        if self.validate_plan(&solution_plan).await? {
            info!("Solution plan validated");
            Ok(solution_plan)
        } else {
            Err(AppError::Workflow(
                "Generated solution plan failed validation".to_string(),
            ))
        }
    }

    /// Ask the model to review a plan for completeness and feasibility.
    ///
    /// A reply without a clear verdict passes, unless strict validation is
    /// on, in which case it rejects the plan too.
    pub async fn validate_plan(&self, solution_plan: &Value) -> Result<bool> {
        let prompt = format!(
            "Please validate the following solution plan:\n{}\n\nCheck completeness, feasibility, risk management, success criteria, resource allocation and implementation approach. For each category give a pass/fail assessment, issues found and suggested improvements.\n\nRespond with a JSON object containing:\n- validation_result: \"VALID\" or \"INVALID\"\n- category_results: {{category: {{status, issues, suggestions}}}}\n- overall_assessment: string",
            solution_plan
        );
        let reply = self.ask(&prompt).await?;

        Ok(match Self::parse_validation_verdict(&reply) {
            Some(verdict) => verdict,
            None if self.strict_validation => {
                warn!("Plan validation reply had no verdict, rejecting");
                false
            }
            None => {
                warn!("Plan validation reply had no verdict, accepting");
                true
            }
        })
    }

    /// Ask for an optimized version of a plan.
    pub async fn optimize_plan(&self, solution_plan: &Value) -> Result<Value> {
        let prompt = format!(
            "Please optimize the following solution plan:\n{}\n\nLook for opportunities to parallelize activities, reduce resource requirements, shorten the timeline, and increase efficiency and effectiveness.\nProvide specific optimization recommendations and their impact.\nReturn the optimized plan as a JSON object.",
            solution_plan
        );
        Ok(Self::structured(self.ask(&prompt).await?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::Script;

    fn router(script: &Script) -> RouterAgent {
        RouterAgent::new(BaseAgent::new(
            ROUTER_NAME,
            ROUTER_SYSTEM_PROMPT,
            Box::new(script.client()),
        ))
    }

    #[test]
    fn test_parse_validation_verdict() {
        assert_eq!(
            RouterAgent::parse_validation_verdict(r#"{"validation_result": "VALID"}"#),
            Some(true)
        );
        assert_eq!(
            RouterAgent::parse_validation_verdict(r#"{"Validation Result": "invalid"}"#),
            Some(false)
        );
        assert_eq!(
            RouterAgent::parse_validation_verdict("The plan is INVALID: no timeline."),
            Some(false)
        );
        assert_eq!(RouterAgent::parse_validation_verdict("VALID."), Some(true));
        assert_eq!(RouterAgent::parse_validation_verdict(" invalid "), Some(false));
        assert_eq!(
            RouterAgent::parse_validation_verdict("Looks valid to me."),
            None
        );
        assert_eq!(RouterAgent::parse_validation_verdict("Hmm."), None);
    }

    #[rstest::rstest]
    #[case::not_valid("The plan is not valid.")]
    #[case::isnt_valid("This plan isn't valid yet.")]
    #[case::curly_apostrophe("It isn\u{2019}t valid without a budget.")]
    #[case::json_not_valid(r#"{"validation_result": "NOT VALID"}"#)]
    #[case::json_partially(r#"{"validation_result": "PARTIALLY VALID"}"#)]
    #[case::json_non_string(r#"{"validation_result": true}"#)]
    fn test_negative_verdicts_reject(#[case] reply: &str) {
        assert_eq!(RouterAgent::parse_validation_verdict(reply), Some(false));
    }

    #[rstest::rstest]
    #[case::lenient(false)]
    #[case::strict(true)]
    #[tokio::test]
    async fn test_negated_verdict_rejects_plan(#[case] strict: bool) {
        let script = Script::new(["analysis", "plan", "The plan is not valid: no timeline."]);

        let err = router(&script)
            .with_strict_validation(strict)
            .create_solution_plan(&json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Workflow(_)));
    }

    #[tokio::test]
    async fn test_create_solution_plan_packages_results() {
        let script = Script::new([
            r#"{"swot": {"strengths": ["brand"]}, "key_findings": ["pricing"]}"#,
            r#"{"solution_strategy": "Reprice tiers"}"#,
            r#"{"validation_result": "VALID"}"#,
        ]);
        let summary = json!({"problem_description": "Churn"});

        let plan = router(&script).create_solution_plan(&summary).await.unwrap();

        assert_eq!(plan["status"], "ready_for_execution");
        assert_eq!(plan["problem_summary"], summary);
        assert_eq!(plan["problem_analysis"]["key_findings"], json!(["pricing"]));
        assert_eq!(plan["solution_plan"]["solution_strategy"], "Reprice tiers");
        assert_eq!(plan["metadata"]["version"], "2.0");
        assert_eq!(plan["metadata"]["framework_version"], "comprehensive");
        assert_eq!(script.prompts().len(), 3);
    }

    #[tokio::test]
    async fn test_rejected_plan_is_an_error() {
        let script = Script::new(["analysis", "plan", r#"{"validation_result": "INVALID"}"#]);

        let err = router(&script)
            .create_solution_plan(&json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Workflow(_)));
    }

    #[tokio::test]
    async fn test_unparseable_verdict_depends_on_strictness() {
        let plan = json!({"status": "ready_for_execution"});

        let lenient = Script::new(["I cannot say."]);
        assert!(router(&lenient).validate_plan(&plan).await.unwrap());

        let strict = Script::new(["I cannot say."]);
        let strict_router = router(&strict).with_strict_validation(true);
        assert!(!strict_router.validate_plan(&plan).await.unwrap());
    }

    #[tokio::test]
    async fn test_free_text_analysis_is_kept_as_string() {
        let script = Script::new(["Mostly a pricing problem."]);
        let analysis = router(&script).analyze_problem(&json!({})).await.unwrap();
        assert_eq!(analysis, Value::String("Mostly a pricing problem.".to_string()));
    }

    #[tokio::test]
    async fn test_llm_failure_propagates() {
        let script = Script::default();
        script.fail_with("rate limited");
        let err = router(&script).optimize_plan(&json!({})).await.unwrap_err();
        assert!(matches!(err, AppError::LLM(_)));
    }
}
