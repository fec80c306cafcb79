//! Simulated user for unattended discovery conversations.

use crate::agents::{Agent, BaseAgent};
use crate::llm::LLMClient;
use crate::types::Result;
use serde_json::{Map, Value};

pub const SIMULATOR_NAME: &str = "UserSimulationAgent";

/// Number of earlier turns shown to the model with each coach message
const CONTEXT_TURNS: usize = 3;

fn profile_field<'a>(profile: &'a Map<String, Value>, key: &str, default: &'a str) -> &'a str {
    profile.get(key).and_then(Value::as_str).unwrap_or(default)
}

/// Build the simulated user's system prompt from a profile object with the
/// optional keys `role`, `industry`, `technical_level`,
/// `communication_style` and `pain_points`.
pub fn profile_prompt(profile: &Map<String, Value>) -> String {
    let pain_points = crate::utils::json::string_list(profile.get("pain_points"))
        .iter()
        .map(|point| format!("- {}", point))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a simulated user with the following profile:\nRole: {}\nIndustry: {}\nTechnical Level: {}\nCommunication Style: {}\n\nYour pain points include:\n{}\n\nWhen responding to the coach:\n1. Be realistic and consistent with your profile\n2. Provide relevant context about your situation\n3. Express concerns and challenges naturally\n4. Ask clarifying questions when needed\n5. Be open to exploring solutions but maintain realistic constraints",
        profile_field(profile, "role", "Business User"),
        profile_field(profile, "industry", "Technology"),
        profile_field(profile, "technical_level", "Intermediate"),
        profile_field(profile, "communication_style", "Direct and concise"),
        pain_points,
    )
}

/// Plays the user's side of a coaching conversation
pub struct UserSimulationAgent {
    base: BaseAgent,
    profile: Map<String, Value>,
    /// (speaker, message) pairs, speaker is `coach` or `user`
    history: Vec<(String, String)>,
}

impl UserSimulationAgent {
    pub fn new(profile: Map<String, Value>, llm: Box<dyn LLMClient>) -> Self {
        let base = BaseAgent::new(SIMULATOR_NAME, profile_prompt(&profile), llm);
        Self {
            base,
            profile,
            history: Vec::new(),
        }
    }

    pub fn profile(&self) -> &Map<String, Value> {
        &self.profile
    }

    pub fn conversation_history(&self) -> &[(String, String)] {
        &self.history
    }

    /// Answer a coach message in character.
    pub async fn respond_to_coach(&mut self, coach_message: &str) -> Result<String> {
        self.history
            .push(("coach".to_string(), coach_message.to_string()));

        let start = self.history.len().saturating_sub(CONTEXT_TURNS);
        let previous = self.history[start..]
            .iter()
            .map(|(speaker, content)| format!("{}: {}", capitalize(speaker), content))
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            "Previous conversation:\n{}\n\nCoach's latest message: {}\n\nBased on your user profile and the conversation so far, provide a natural response that addresses the coach's questions, gives relevant context from your experience, and stays consistent with your profile.\n\nYour response:",
            previous, coach_message
        );
        let response = self.base.process_message(&prompt).await.into_result()?;

        self.history.push(("user".to_string(), response.clone()));
        Ok(response)
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
