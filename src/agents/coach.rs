//! Business coach agent
//!
//! The coach walks a user through a fixed list of discovery topics, one
//! question at a time, and finally condenses the conversation into a
//! structured problem summary for the router.

use crate::agents::{Agent, BaseAgent, UserSimulationAgent};
use crate::types::{ChatRole, ConversationEntry, EntryKind, Result};
use crate::utils::json::{extract_json_object, normalize_keys};
use crate::utils::toml_config::default_topics;
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

pub const COACH_NAME: &str = "Business_Coach";

pub const COACH_SYSTEM_PROMPT: &str = r#"You are an expert Business Coach with deep expertise in problem analysis, business process improvement, strategic planning, change management and stakeholder communication.

Your role is to help users articulate their challenges clearly:
1. Ask only ONE focused question at a time
2. Make each question specific to the topic at hand
3. Validate understanding before moving to the next topic
4. When you have sufficient information, summarize the problem and ask for confirmation
5. Once confirmed, prepare a structured problem description for the routing agent"#;

/// Fields of a routing summary, with alternative spellings models use.
const SUMMARY_FIELDS: [(&str, &[&str]); 7] = [
    ("problem_description", &["problem", "description"]),
    ("context_background", &["context_and_background", "context"]),
    (
        "goals_outcomes",
        &["goals_and_desired_outcomes", "goals_and_outcomes", "goals"],
    ),
    (
        "constraints_limitations",
        &["constraints_and_limitations", "constraints"],
    ),
    ("stakeholders", &["key_stakeholders"]),
    (
        "urgency_timeline",
        &["urgency_and_timeline", "timeline", "urgency"],
    ),
    (
        "requirements",
        &["specific_requirements", "any_specific_requirements"],
    ),
];

fn topic_instruction(topic: &str) -> String {
    match topic {
        "specific_challenge" => "Ask ONE focused question about the specific challenge they're facing.".to_string(),
        "context_background" => "Ask ONE focused question about the context and background of the situation.".to_string(),
        "goals_outcomes" => "Ask ONE focused question about their goals and desired outcomes.".to_string(),
        "constraints_limitations" => "Ask ONE focused question about any constraints or limitations.".to_string(),
        "stakeholders" => "Ask ONE focused question about key stakeholders involved.".to_string(),
        "urgency_timeline" => "Ask ONE focused question about the urgency and timeline.".to_string(),
        "requirements" => "Ask ONE focused question about any specific requirements.".to_string(),
        other => format!("Ask ONE focused question about {}.", other.replace('_', " ")),
    }
}

/// Render a context value for a canned answer: strings unquoted, other JSON as-is.
fn display_value(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "unknown".to_string(),
        Some(other) => other.to_string(),
    }
}

/// Canned answers derived from a user context, used when no simulated user
/// is available.
pub fn simulated_responses(context: &Map<String, Value>) -> Vec<String> {
    let metrics = context
        .iter()
        .filter(|(key, _)| key.contains("rate") || key.contains("lifetime"))
        .map(|(key, value)| format!("{}={}", key, display_value(Some(value))))
        .collect::<Vec<_>>()
        .join(", ");

    vec![
        format!("Our industry is {}", display_value(context.get("industry"))),
        format!("Company size is {}", display_value(context.get("company_size"))),
        format!(
            "We're in the {} space",
            display_value(context.get("product_type"))
        ),
        format!("Current metrics: {}", metrics),
        format!(
            "Our main customer segment is {}",
            display_value(context.get("primary_customer_segment"))
        ),
    ]
}

/// Topic-driven discovery coach
pub struct CoachAgent {
    base: BaseAgent,
    topics: Vec<String>,
    history: Vec<ConversationEntry>,
    topic_index: usize,
    problem_summary: Option<Value>,
}

impl CoachAgent {
    /// Create a coach over the default seven topics
    pub fn new(base: BaseAgent) -> Self {
        Self::with_topics(base, default_topics())
    }

    /// Create a coach over a custom topic list. An empty list falls back to
    /// the defaults.
    pub fn with_topics(base: BaseAgent, topics: Vec<String>) -> Self {
        let topics = if topics.is_empty() {
            default_topics()
        } else {
            topics
        };
        Self {
            base,
            topics,
            history: Vec::new(),
            topic_index: 0,
            problem_summary: None,
        }
    }

    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    pub fn history(&self) -> &[ConversationEntry] {
        &self.history
    }

    pub fn topic_index(&self) -> usize {
        self.topic_index
    }

    /// Topic currently being discussed, capped at the last topic
    pub fn current_topic(&self) -> &str {
        let last = self.topics.len().saturating_sub(1);
        &self.topics[self.topic_index.min(last)]
    }

    pub fn topics_covered(&self) -> &[String] {
        &self.topics[..self.topic_index.min(self.topics.len())]
    }

    pub fn is_complete(&self) -> bool {
        self.topic_index >= self.topics.len()
    }

    pub fn completion_status(&self) -> &'static str {
        if self.is_complete() {
            "completed"
        } else {
            "in_progress"
        }
    }

    pub fn problem_summary(&self) -> Option<&Value> {
        self.problem_summary.as_ref()
    }

    /// Number of user responses recorded since the opening question
    pub fn user_turns(&self) -> usize {
        self.history
            .iter()
            .filter(|e| e.role == ChatRole::User)
            .count()
    }

    async fn ask(&self, prompt: &str) -> Result<String> {
        self.base.process_message(prompt).await.into_result()
    }

    fn transcript(&self) -> String {
        self.history
            .iter()
            .map(|entry| format!("{}: {}", entry.role.as_str(), entry.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Start a fresh discovery conversation and return the first question.
    pub async fn start_coaching(&mut self, initial_problem: &str) -> Result<String> {
        self.history.clear();
        self.problem_summary = None;
        self.topic_index = 0;

        let prompt = format!(
            "A user has presented the following business problem:\n{}\n\n{}\nMake your question clear and specific, focusing on understanding the core issue.",
            initial_problem,
            topic_instruction(&self.topics[0]),
        );
        let question = self.ask(&prompt).await?;

        let topic = self.topics[0].clone();
        self.history.push(ConversationEntry::new(
            ChatRole::Assistant,
            question.clone(),
            &topic,
            EntryKind::Question,
        ));
        info!(topic = %topic, "Coaching started");
        Ok(question)
    }

    /// Record the user's answer, move to the next topic, and return the
    /// next question, or a confirmation summary once every topic is covered.
    pub async fn continue_coaching(&mut self, user_response: &str) -> Result<String> {
        let answered = self.current_topic().to_string();
        self.history.push(ConversationEntry::new(
            ChatRole::User,
            user_response,
            &answered,
            EntryKind::Response,
        ));

        if self.history.len() >= 2 {
            self.topic_index += 1;
        }

        let prompt = if self.is_complete() {
            format!(
                "Based on the conversation history:\n{}\n\nPlease provide a summary of the problem and ask for confirmation.\nHighlight the key points we've discussed.\nFormat your response as a JSON object with: summary, key_points, confirmation_question.",
                self.transcript()
            )
        } else {
            format!(
                "User's response: {}\n\n{}\nMake your question specific and focused on this aspect.\nFormat your response as a JSON object with: question, topic, insights.",
                user_response,
                topic_instruction(self.current_topic()),
            )
        };

        let reply = self.ask(&prompt).await?;
        let kind = if self.is_complete() {
            EntryKind::Summary
        } else {
            EntryKind::Question
        };
        let topic = self.current_topic().to_string();
        debug!(topic = %topic, ?kind, index = self.topic_index, "Coach turn");
        self.history.push(ConversationEntry::new(
            ChatRole::Assistant,
            reply.clone(),
            &topic,
            kind,
        ));
        Ok(reply)
    }

    /// Ask the model for a structured problem summary of the conversation
    /// so far and keep it as the coach's current summary.
    ///
    /// A reply without an embedded JSON object is kept verbatim as the
    /// problem description and flagged with `parsing_error`.
    pub async fn prepare_routing_summary(&mut self) -> Result<Value> {
        let prompt = format!(
            "Based on the conversation history:\n{}\n\nPlease prepare a structured summary of the problem as a JSON object with the keys problem_description, context_background, goals_outcomes, constraints_limitations, stakeholders, urgency_timeline and requirements.\nEnsure each section is detailed and actionable, including specific metrics and data points mentioned in the conversation.",
            self.transcript()
        );
        let raw = self.ask(&prompt).await?;

        let summary = match extract_json_object(&raw).map(normalize_keys) {
            Some(fields) => {
                let mut summary = Map::new();
                for (key, aliases) in SUMMARY_FIELDS {
                    let value = std::iter::once(key)
                        .chain(aliases.iter().copied())
                        .find_map(|k| fields.get(k))
                        .cloned()
                        .unwrap_or_else(|| Value::String(String::new()));
                    summary.insert(key.to_string(), value);
                }
                summary.insert(
                    "metadata".to_string(),
                    json!({
                        "conversation_length": self.history.len(),
                        "topics_covered": self.topics_covered(),
                        "completion_status": self.completion_status(),
                    }),
                );
                Value::Object(summary)
            }
            None => {
                warn!("Routing summary reply contained no JSON object");
                json!({
                    "problem_description": raw,
                    "metadata": {
                        "parsing_error": true,
                        "raw_response": raw,
                    }
                })
            }
        };

        self.problem_summary = Some(summary.clone());
        Ok(summary)
    }

    /// Run a whole discovery conversation without a live user: the opening
    /// query followed by canned answers built from `context`.
    pub async fn conduct_discovery_conversation(
        &mut self,
        query: &str,
        context: &Map<String, Value>,
    ) -> Result<Value> {
        self.start_coaching(query).await?;
        for answer in simulated_responses(context) {
            self.continue_coaching(&answer).await?;
        }
        self.finish_discovery(context).await
    }

    /// Run a discovery conversation against a simulated user, one answer
    /// per remaining topic.
    pub async fn conduct_simulated_conversation(
        &mut self,
        query: &str,
        context: &Map<String, Value>,
        user: &mut UserSimulationAgent,
    ) -> Result<Value> {
        let mut question = self.start_coaching(query).await?;
        while !self.is_complete() {
            let answer = user.respond_to_coach(&question).await?;
            question = self.continue_coaching(&answer).await?;
        }
        self.finish_discovery(context).await
    }

    async fn finish_discovery(&mut self, context: &Map<String, Value>) -> Result<Value> {
        let summary = self.prepare_routing_summary().await?;

        let key_insights: Vec<Value> = self
            .topics
            .iter()
            .map(|topic| {
                let insight = self
                    .history
                    .iter()
                    .find(|entry| entry.metadata.topic.contains(topic.as_str()))
                    .map(|entry| entry.content.clone());
                json!({ "topic": topic, "insight": insight })
            })
            .collect();

        Ok(json!({
            "summary": summary,
            "conversation_history": self.history,
            "topics_covered": self.topics_covered(),
            "key_insights": key_insights,
            "metadata": {
                "total_exchanges": self.history.len(),
                "completion_status": self.completion_status(),
                "context_used": context,
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::Script;
    use crate::types::AppError;

    fn coach(script: &Script) -> CoachAgent {
        CoachAgent::new(BaseAgent::new(
            COACH_NAME,
            COACH_SYSTEM_PROMPT,
            Box::new(script.client()),
        ))
    }

    #[tokio::test]
    async fn test_start_coaching_records_question() {
        let script = Script::new(["What exactly is declining?"]);
        let mut coach = coach(&script);

        let question = coach.start_coaching("Sales are down").await.unwrap();

        assert_eq!(question, "What exactly is declining?");
        assert_eq!(coach.topic_index(), 0);
        assert_eq!(coach.history().len(), 1);
        assert_eq!(coach.user_turns(), 0);
        let last = coach.history().last().unwrap();
        assert_eq!(last.role, ChatRole::Assistant);
        assert_eq!(last.metadata.topic, "specific_challenge");
        assert_eq!(last.metadata.kind, EntryKind::Question);
        assert!(script.prompts()[0].contains("Sales are down"));
    }

    #[tokio::test]
    async fn test_continue_coaching_advances_topics() {
        let script = Script::new(["Q1", "Q2", "Q3"]);
        let mut coach = coach(&script);
        coach.start_coaching("Churn is high").await.unwrap();

        coach.continue_coaching("Monthly churn is 8%").await.unwrap();
        assert_eq!(coach.topic_index(), 1);
        let answer = &coach.history()[1];
        assert_eq!(answer.role, ChatRole::User);
        assert_eq!(answer.metadata.topic, "specific_challenge");
        assert_eq!(coach.history()[2].metadata.topic, "context_background");

        coach.continue_coaching("We are a SaaS company").await.unwrap();
        assert_eq!(coach.topic_index(), 2);
        assert_eq!(coach.history()[3].metadata.topic, "context_background");
        assert_eq!(coach.user_turns(), 2);
    }

    #[tokio::test]
    async fn test_all_topics_lead_to_summary() {
        let script = Script::default();
        let mut coach = coach(&script);
        coach.start_coaching("Growth stalled").await.unwrap();

        for i in 0..7 {
            coach.continue_coaching(&format!("answer {}", i)).await.unwrap();
        }

        assert!(coach.is_complete());
        assert_eq!(coach.completion_status(), "completed");
        let last = coach.history().last().unwrap();
        assert_eq!(last.metadata.kind, EntryKind::Summary);
        assert_eq!(last.metadata.topic, "requirements");

        // Extra answers stay on the last topic instead of running off the list
        coach.continue_coaching("one more thing").await.unwrap();
        assert_eq!(coach.current_topic(), "requirements");
    }

    #[tokio::test]
    async fn test_routing_summary_parses_fenced_json() {
        let script = Script::new([
            "Q1",
            "Q2",
            "Here you go:\n```json\n{\"Problem Description\": \"Churn\", \"key_stakeholders\": [\"CFO\"]}\n```",
        ]);
        let mut coach = coach(&script);
        coach.start_coaching("Churn").await.unwrap();
        coach.continue_coaching("8% monthly").await.unwrap();

        let summary = coach.prepare_routing_summary().await.unwrap();

        assert_eq!(summary["problem_description"], "Churn");
        assert_eq!(summary["stakeholders"], json!(["CFO"]));
        assert_eq!(summary["requirements"], "");
        assert_eq!(summary["metadata"]["conversation_length"], 3);
        assert_eq!(
            summary["metadata"]["topics_covered"],
            json!(["specific_challenge"])
        );
        assert_eq!(summary["metadata"]["completion_status"], "in_progress");
        assert_eq!(coach.problem_summary(), Some(&summary));
    }

    #[tokio::test]
    async fn test_routing_summary_falls_back_to_raw_text() {
        let script = Script::new(["Q1", "The user struggles with churn."]);
        let mut coach = coach(&script);
        coach.start_coaching("Churn").await.unwrap();

        let summary = coach.prepare_routing_summary().await.unwrap();

        assert_eq!(summary["problem_description"], "The user struggles with churn.");
        assert_eq!(summary["metadata"]["parsing_error"], true);
        assert_eq!(
            summary["metadata"]["raw_response"],
            "The user struggles with churn."
        );
    }

    #[tokio::test]
    async fn test_llm_failure_propagates() {
        let script = Script::default();
        script.fail_with("model offline");
        let mut coach = coach(&script);

        let err = coach.start_coaching("anything").await.unwrap_err();
        assert!(matches!(err, AppError::LLM(_)));
        assert!(coach.history().is_empty());
    }

    #[test]
    fn test_simulated_responses_from_context() {
        let context = json!({
            "industry": "retail",
            "company_size": 120,
            "churn_rate": 0.08,
            "customer_lifetime": "18 months",
            "primary_customer_segment": "SMB"
        });
        let answers = simulated_responses(context.as_object().unwrap());

        assert_eq!(answers[0], "Our industry is retail");
        assert_eq!(answers[1], "Company size is 120");
        assert_eq!(answers[2], "We're in the unknown space");
        assert_eq!(
            answers[3],
            "Current metrics: churn_rate=0.08, customer_lifetime=18 months"
        );
        assert_eq!(answers[4], "Our main customer segment is SMB");
    }

    #[tokio::test]
    async fn test_discovery_conversation_shape() {
        let script = Script::default();
        for i in 0..6 {
            script.push(format!("Question {}", i));
        }
        script.push(r#"{"problem_description": "Low retention"}"#);
        let mut coach = coach(&script);
        let context = json!({"industry": "fintech"});

        let result = coach
            .conduct_discovery_conversation("Retention is poor", context.as_object().unwrap())
            .await
            .unwrap();

        assert_eq!(result["summary"]["problem_description"], "Low retention");
        // opening question plus five answered questions
        assert_eq!(result["metadata"]["total_exchanges"], 11);
        assert_eq!(result["metadata"]["completion_status"], "in_progress");
        assert_eq!(result["metadata"]["context_used"]["industry"], "fintech");
        assert_eq!(result["topics_covered"].as_array().unwrap().len(), 5);
        let insights = result["key_insights"].as_array().unwrap();
        assert_eq!(insights.len(), 7);
        assert_eq!(insights[0]["insight"], "Question 0");
        assert!(result["conversation_history"]
            .as_array()
            .unwrap()
            .iter()
            .all(|entry| entry["content"] != "Retention is poor"));
        assert!(insights[6]["insight"].is_null());
    }
}
