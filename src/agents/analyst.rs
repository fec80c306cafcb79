use crate::agents::{Agent, BaseAgent};
use crate::types::Result;
use serde_json::{Map, Value};

pub const ANALYST_NAME: &str = "BI_Analyst";

pub const ANALYST_SYSTEM_PROMPT: &str = r#"You are an expert Business Intelligence Analyst with deep knowledge in data analysis and interpretation, market research and competitive analysis, financial analysis and forecasting, business strategy, and performance metrics and KPIs.

Analyze business data and provide actionable insights, identify trends and patterns, and make data-driven recommendations.
Always maintain a professional tone and focus on practical, implementable solutions."#;

/// Business intelligence analyst for ad-hoc data questions
pub struct BusinessIntelligenceAgent {
    base: BaseAgent,
}

impl BusinessIntelligenceAgent {
    pub fn new(base: BaseAgent) -> Self {
        Self { base }
    }

    pub fn name(&self) -> &str {
        self.base.name()
    }

    /// Analyze `data` for the given kind of analysis and return the
    /// analyst's findings as text.
    pub async fn analyze_data(&self, data: &Map<String, Value>, analysis_type: &str) -> Result<String> {
        let prompt = format!(
            "Please analyze the following business data for {}:\n\nData: {}\n\nProvide a detailed analysis including:\n1. Key findings\n2. Trends identified\n3. Recommendations\n4. Potential risks and opportunities",
            analysis_type,
            Value::Object(data.clone())
        );
        self.base.process_message(&prompt).await.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::Script;
    use serde_json::json;

    #[tokio::test]
    async fn test_analyze_data_prompt_carries_data() {
        let script = Script::new(["Revenue is trending up."]);
        let agent = BusinessIntelligenceAgent::new(BaseAgent::new(
            ANALYST_NAME,
            ANALYST_SYSTEM_PROMPT,
            Box::new(script.client()),
        ));
        let data = json!({"revenue": [100, 120, 150]});

        let analysis = agent
            .analyze_data(data.as_object().unwrap(), "growth")
            .await
            .unwrap();

        assert_eq!(analysis, "Revenue is trending up.");
        let prompt = &script.prompts()[0];
        assert!(prompt.contains("for growth"));
        assert!(prompt.contains("[100,120,150]"));
        assert_eq!(agent.name(), "BI_Analyst");
    }
}
