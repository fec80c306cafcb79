//! Coaching sessions and workflow runs behind the HTTP surface.

use crate::agents::coach::COACH_NAME;
use crate::agents::router::ROUTER_NAME;
use crate::agents::{AgentFactory, CoachAgent};
use crate::memory::{Interaction, InteractionStore, CONFIRM_SUMMARY, CONTINUE_SESSION, START_SESSION};
use crate::types::{
    AppError, ChatRole, ConfirmResponse, ConversationEntry, EntryKind, ReplyStatus, Result,
    RunWorkflowRequest, SessionReply,
};
use crate::utils::toml_config::{CoachConfig, SessionConfig};
use crate::workflows::{WorkflowDeps, WorkflowRegistry};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, warn};
use uuid::Uuid;

/// One live coaching conversation
pub struct Session {
    pub id: String,
    pub coach: CoachAgent,
    /// The user's problem statement that opened the conversation
    pub opening: ConversationEntry,
    pub problem_summary: Option<Value>,
    pub solution_plan: Option<Value>,
    pub created_at: DateTime<Utc>,
    closed: bool,
}

impl Session {
    /// Opening statement plus every coach exchange
    pub fn conversation_length(&self) -> usize {
        self.coach.history().len() + 1
    }

    fn conversation_history(&self) -> Vec<&ConversationEntry> {
        std::iter::once(&self.opening)
            .chain(self.coach.history())
            .collect()
    }

    fn status(&self, store: &InteractionStore) -> Value {
        json!({
            "status": "active",
            "has_problem_summary": self.problem_summary.is_some(),
            "has_solution_plan": self.solution_plan.is_some(),
            "session_id": self.id,
            "created_at": self.created_at,
            "topics_covered": self.coach.topics_covered(),
            "completion_status": self.coach.completion_status(),
            "conversation_history": self.conversation_history(),
            "integration_context": store.session_context(&self.id),
        })
    }
}

struct SessionSlot {
    session: Arc<Mutex<Session>>,
    last_active: RwLock<Instant>,
}

impl SessionSlot {
    fn touch(&self) {
        *self.last_active.write() = Instant::now();
    }

    fn idle_since(&self) -> Instant {
        *self.last_active.read()
    }
}

fn not_found(session_id: &str) -> AppError {
    AppError::NotFound(format!("Session '{}' not found", session_id))
}

/// Runs coaching sessions keyed by id, plus one-shot workflow executions.
///
/// The session map is only locked long enough to look a session up; each
/// session has its own async lock held across model calls, so concurrent
/// sessions never wait on each other. Removing a session (clear or
/// eviction) happens under that session's lock, so no turn in flight can
/// write to the interaction log of a removed session.
pub struct SessionService {
    sessions: RwLock<HashMap<String, Arc<SessionSlot>>>,
    agents: Arc<AgentFactory>,
    workflows: Arc<WorkflowRegistry>,
    store: Arc<InteractionStore>,
    coach_config: CoachConfig,
    limits: SessionConfig,
}

impl SessionService {
    pub fn new(
        agents: Arc<AgentFactory>,
        workflows: Arc<WorkflowRegistry>,
        store: Arc<InteractionStore>,
    ) -> Self {
        let coach_config = agents.coach_config().clone();
        Self {
            sessions: RwLock::new(HashMap::new()),
            agents,
            workflows,
            store,
            coach_config,
            limits: SessionConfig::default(),
        }
    }

    /// Idle timeout and session cap
    pub fn with_limits(mut self, limits: SessionConfig) -> Self {
        self.limits = limits;
        self
    }

    pub fn store(&self) -> &Arc<InteractionStore> {
        &self.store
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    fn slot(&self, session_id: &str) -> Result<Arc<SessionSlot>> {
        let slot = self
            .sessions
            .read()
            .get(session_id)
            .cloned()
            .ok_or_else(|| not_found(session_id))?;
        slot.touch();
        Ok(slot)
    }

    /// Lock a live session. A session removed while the caller waited for
    /// the lock is not found.
    async fn lock(&self, session_id: &str) -> Result<OwnedMutexGuard<Session>> {
        let slot = self.slot(session_id)?;
        let session = Arc::clone(&slot.session).lock_owned().await;
        if session.closed {
            return Err(not_found(session_id));
        }
        Ok(session)
    }

    /// Remove a locked session and its interaction log
    fn close(&self, session: &mut Session) {
        session.closed = true;
        self.sessions.write().remove(&session.id);
        self.store.clear_session(&session.id);
    }

    /// Close the session unless a turn currently holds it
    fn try_evict(&self, slot: &SessionSlot) -> bool {
        match slot.session.try_lock() {
            Ok(mut session) if !session.closed => {
                self.close(&mut session);
                true
            }
            _ => false,
        }
    }

    /// Evict sessions idle for longer than the configured timeout. Sessions
    /// in the middle of a turn are skipped.
    pub fn evict_idle(&self) -> usize {
        self.evict_idle_at(Instant::now())
    }

    fn evict_idle_at(&self, now: Instant) -> usize {
        let Some(timeout) = self.limits.idle_timeout() else {
            return 0;
        };
        let expired: Vec<Arc<SessionSlot>> = self
            .sessions
            .read()
            .values()
            .filter(|slot| now.saturating_duration_since(slot.idle_since()) >= timeout)
            .cloned()
            .collect();

        let mut evicted = 0;
        for slot in expired {
            if self.try_evict(&slot) {
                evicted += 1;
            }
        }
        if evicted > 0 {
            info!(evicted, "Evicted idle sessions");
        }
        evicted
    }

    /// Evict least recently used sessions until one more fits under
    /// `max_sessions`
    fn make_room(&self) {
        self.evict_idle();

        let mut slots: Vec<Arc<SessionSlot>> = self.sessions.read().values().cloned().collect();
        let mut excess = (slots.len() + 1).saturating_sub(self.limits.max_sessions);
        if excess == 0 {
            return;
        }

        slots.sort_by_key(|slot| slot.idle_since());
        for slot in slots {
            if excess == 0 {
                break;
            }
            if self.try_evict(&slot) {
                excess -= 1;
            }
        }
        if excess > 0 {
            warn!(
                max_sessions = self.limits.max_sessions,
                "Session limit exceeded; every remaining session is busy"
            );
        }
    }

    /// Open a new session with the user's problem statement and return the
    /// coach's first question.
    pub async fn start_session(&self, problem: &str) -> Result<SessionReply> {
        if problem.trim().is_empty() {
            return Err(AppError::InvalidInput("Problem must not be empty".into()));
        }

        let session_id = Uuid::new_v4().to_string();
        info!(session_id = %session_id, "Starting new coaching session");

        let mut coach = self.agents.coach().await?;
        let question = coach.start_coaching(problem).await?;
        let opening_topic = coach.topics().first().cloned().unwrap_or_default();

        self.make_room();
        self.store.store_interaction(
            &session_id,
            Interaction::new(START_SESSION, COACH_NAME)
                .with_data("problem", json!(problem))
                .with_data("response", json!(question))
                .with_metadata("session_type", json!("coaching"))
                .with_metadata("initial_problem", json!(problem)),
        );

        let session = Session {
            id: session_id.clone(),
            coach,
            opening: ConversationEntry::new(
                ChatRole::User,
                problem,
                &opening_topic,
                EntryKind::Response,
            ),
            problem_summary: None,
            solution_plan: None,
            created_at: Utc::now(),
            closed: false,
        };
        let slot = SessionSlot {
            session: Arc::new(Mutex::new(session)),
            last_active: RwLock::new(Instant::now()),
        };
        self.sessions
            .write()
            .insert(session_id.clone(), Arc::new(slot));

        Ok(SessionReply {
            status: ReplyStatus::Success,
            response: question,
            session_id,
        })
    }

    /// Feed the user's answer to the coach and return its next question.
    ///
    /// Once the conversation holds `summary_after_messages` entries the
    /// problem summary is refreshed after every turn. A failed refresh keeps
    /// the previous summary.
    pub async fn continue_session(&self, session_id: &str, response: &str) -> Result<SessionReply> {
        let mut session = self.lock(session_id).await?;

        if session.coach.user_turns() >= self.coach_config.max_conversation_turns {
            return Err(AppError::InvalidInput(format!(
                "Session has reached the limit of {} responses",
                self.coach_config.max_conversation_turns
            )));
        }

        info!(session_id, "Continuing coaching session");
        let reply = session.coach.continue_coaching(response).await?;

        if session.conversation_length() >= self.coach_config.summary_after_messages {
            match session.coach.prepare_routing_summary().await {
                Ok(summary) => session.problem_summary = Some(summary),
                Err(e) => warn!(session_id, error = %e, "Could not refresh problem summary"),
            }
        }

        let conversation_length = session.conversation_length();
        let has_summary = session.problem_summary.is_some();
        self.store.store_interaction(
            session_id,
            Interaction::new(CONTINUE_SESSION, COACH_NAME)
                .with_data("response", json!(response))
                .with_data("agent_response", json!(reply))
                .with_metadata("conversation_length", json!(conversation_length))
                .with_metadata("has_problem_summary", json!(has_summary))
                .with_metadata("current_topic", json!(session.coach.current_topic())),
        );

        Ok(SessionReply {
            status: ReplyStatus::Success,
            response: reply,
            session_id: session_id.to_string(),
        })
    }

    /// Turn the session's problem summary into a validated solution plan
    pub async fn confirm_problem_summary(&self, session_id: &str) -> Result<ConfirmResponse> {
        let mut session = self.lock(session_id).await?;

        let summary = session
            .problem_summary
            .clone()
            .ok_or_else(|| AppError::InvalidInput("No problem summary available".into()))?;

        info!(session_id, "Confirming problem summary");
        let router = self.agents.router().await?;
        let plan = router.create_solution_plan(&summary).await?;
        session.solution_plan = Some(plan.clone());

        let plan_complexity = plan["solution_plan"]["steps"]
            .as_array()
            .map(Vec::len)
            .unwrap_or(0);
        self.store.store_interaction(
            session_id,
            Interaction::new(CONFIRM_SUMMARY, ROUTER_NAME)
                .with_data("summary", summary.clone())
                .with_data("plan", plan.clone())
                .with_metadata("conversation_length", json!(session.conversation_length()))
                .with_metadata("plan_complexity", json!(plan_complexity)),
        );

        Ok(ConfirmResponse {
            status: ReplyStatus::Success,
            summary,
            plan,
        })
    }

    /// Status view of a session; unknown ids report `inactive`.
    pub async fn session_status(&self, session_id: &str) -> Value {
        match self.lock(session_id).await {
            Ok(session) => session.status(&self.store),
            Err(_) => json!({
                "status": "inactive",
                "has_problem_summary": false,
                "has_solution_plan": false,
                "session_id": session_id,
                "conversation_history": [],
                "integration_context": {},
            }),
        }
    }

    /// Aggregate of the interactions recorded for a session
    pub fn analyze_session(&self, session_id: &str) -> Result<Value> {
        self.slot(session_id)?;
        Ok(json!({
            "session_id": session_id,
            "summary": self.store.session_summary(session_id),
        }))
    }

    /// Drop a session and its interaction log, waiting for a turn in flight
    /// to finish first.
    pub async fn clear_session(&self, session_id: &str) -> Result<()> {
        let mut session = self.lock(session_id).await?;
        self.close(&mut session);
        info!(session_id, "Cleared session");
        Ok(())
    }

    /// Create a fresh instance of a registered workflow and execute it.
    ///
    /// Returns the final status snapshot; failures carry the workflow's
    /// error.
    pub async fn run_workflow(&self, workflow_id: &str, request: &RunWorkflowRequest) -> Result<Value> {
        let info = self
            .workflows
            .get(workflow_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Workflow '{}' not found", workflow_id)))?;
        let name = request.name.as_deref().unwrap_or(&info.name);
        let description = request.description.as_deref().unwrap_or(&info.description);

        let deps = WorkflowDeps {
            agents: Arc::clone(&self.agents),
        };
        let mut workflow = self.workflows.create(workflow_id, name, description, &deps)?;
        workflow.execute(&request.input).await?;
        Ok(workflow.status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::Script;
    use crate::tools::ToolRegistry;
    use crate::utils::toml_config::InsightConfig;
    use std::time::Duration;

    fn service(script: &Script, config: InsightConfig) -> SessionService {
        let agents = Arc::new(AgentFactory::from_config(
            &config,
            script.factory(),
            Arc::new(ToolRegistry::new()),
        ));
        SessionService::new(
            agents,
            Arc::new(WorkflowRegistry::with_builtin_workflows()),
            Arc::new(InteractionStore::new()),
        )
        .with_limits(config.sessions.clone())
    }

    async fn wait_for_prompts(script: &Script, count: usize) {
        while script.prompts().len() < count {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_full_session() {
        let script = Script::new([
            "What exactly is going wrong?",
            "Tell me about your company.",
            r#"{"problem_description": "Churn", "stakeholders": ["CEO"]}"#,
            r#"{"key_findings": []}"#,
            r#"{"summary": "Fix onboarding", "steps": [{"name": "Audit"}, {"name": "Redesign"}]}"#,
            r#"{"validation_result": "VALID"}"#,
        ]);
        let svc = service(&script, InsightConfig::default());

        let started = svc.start_session("Customers leave").await.unwrap();
        assert_eq!(started.response, "What exactly is going wrong?");
        let id = started.session_id;

        let next = svc.continue_session(&id, "They churn in month two").await.unwrap();
        assert_eq!(next.response, "Tell me about your company.");

        let status = svc.session_status(&id).await;
        assert_eq!(status["status"], "active");
        assert_eq!(status["has_problem_summary"], true);
        assert_eq!(status["has_solution_plan"], false);

        let confirmed = svc.confirm_problem_summary(&id).await.unwrap();
        assert_eq!(confirmed.summary["problem_description"], "Churn");
        assert_eq!(confirmed.plan["status"], "ready_for_execution");

        let analysis = svc.analyze_session(&id).unwrap();
        assert_eq!(analysis["summary"]["total_interactions"], 3);
        assert_eq!(analysis["summary"]["metadata"]["plan_complexity"], 2);
    }

    #[tokio::test]
    async fn test_confirm_requires_summary() {
        let script = Script::default();
        let mut config = InsightConfig::default();
        config.coach.summary_after_messages = 100;
        let svc = service(&script, config);

        let id = svc.start_session("Costs are rising").await.unwrap().session_id;
        svc.continue_session(&id, "Mostly logistics").await.unwrap();

        let err = svc.confirm_problem_summary(&id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_turn_limit() {
        let script = Script::default();
        let mut config = InsightConfig::default();
        config.coach.max_conversation_turns = 1;
        config.coach.summary_after_messages = 100;
        let svc = service(&script, config);

        let id = svc.start_session("Costs are rising").await.unwrap().session_id;
        svc.continue_session(&id, "first").await.unwrap();
        let err = svc.continue_session(&id, "second").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let script = Script::default();
        let svc = service(&script, InsightConfig::default());

        assert!(matches!(
            svc.continue_session("nope", "hi").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(svc.analyze_session("nope"), Err(AppError::NotFound(_))));
        assert_eq!(svc.session_status("nope").await["status"], "inactive");
    }

    #[tokio::test]
    async fn test_clear_session() {
        let script = Script::default();
        let svc = service(&script, InsightConfig::default());
        let id = svc.start_session("Costs").await.unwrap().session_id;

        svc.clear_session(&id).await.unwrap();
        assert_eq!(svc.session_count(), 0);
        assert!(svc.store().interactions(&id).is_empty());
        assert!(svc.clear_session(&id).await.is_err());
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let script = Script::default();
        let svc = service(&script, InsightConfig::default());
        let a = svc.start_session("Problem A").await.unwrap().session_id;
        let b = svc.start_session("Problem B").await.unwrap().session_id;

        assert_ne!(a, b);
        svc.clear_session(&a).await.unwrap();
        assert_eq!(svc.session_status(&b).await["status"], "active");
    }

    #[tokio::test]
    async fn test_run_data_analysis_workflow() {
        let script = Script::default();
        let svc = service(&script, InsightConfig::default());
        let request = RunWorkflowRequest {
            name: None,
            description: None,
            input: json!({"data": [1, 2, 3, 4], "metrics": ["mean"], "report_format": "json"}),
        };

        let status = svc.run_workflow("Data_Analysis", &request).await.unwrap();
        assert_eq!(status["status"], "completed");
        assert_eq!(status["name"], "DataAnalysisWorkflow");
        assert_eq!(status["results"]["analysis_results"]["metrics"]["mean"], 2.5);

        let missing = svc.run_workflow("unknown", &request).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_status_history_starts_with_problem() {
        let script = Script::new(["What is going wrong?"]);
        let svc = service(&script, InsightConfig::default());
        let id = svc.start_session("Margins are shrinking").await.unwrap().session_id;

        let status = svc.session_status(&id).await;
        let history = status["conversation_history"].as_array().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0]["role"], "user");
        assert_eq!(history[0]["content"], "Margins are shrinking");
        assert_eq!(history[1]["content"], "What is going wrong?");
    }

    #[tokio::test]
    async fn test_clear_waits_for_turn_in_flight() {
        let script = Script::default();
        let mut config = InsightConfig::default();
        config.coach.summary_after_messages = 100;
        let svc = Arc::new(service(&script, config));
        let id = svc.start_session("Costs are rising").await.unwrap().session_id;

        let gate = script.hold();
        let turn = {
            let svc = Arc::clone(&svc);
            let id = id.clone();
            tokio::spawn(async move { svc.continue_session(&id, "Mostly freight").await })
        };
        wait_for_prompts(&script, 2).await;

        let clear = {
            let svc = Arc::clone(&svc);
            let id = id.clone();
            tokio::spawn(async move { svc.clear_session(&id).await })
        };
        tokio::task::yield_now().await;
        gate.add_permits(1);

        assert!(turn.await.unwrap().is_ok());
        assert!(clear.await.unwrap().is_ok());
        assert_eq!(svc.session_count(), 0);
        assert_eq!(svc.store().session_count(), 0);
        assert!(svc.analyze_session(&id).is_err());
    }

    #[tokio::test]
    async fn test_turn_after_clear_is_not_found() {
        let script = Script::default();
        let svc = service(&script, InsightConfig::default());
        let id = svc.start_session("Costs are rising").await.unwrap().session_id;

        svc.clear_session(&id).await.unwrap();

        assert!(matches!(
            svc.continue_session(&id, "hello").await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(svc.store().session_count(), 0);
    }

    #[tokio::test]
    async fn test_idle_sessions_expire() {
        let script = Script::default();
        let mut config = InsightConfig::default();
        config.sessions.idle_timeout_secs = 60;
        let svc = service(&script, config);
        let id = svc.start_session("Costs are rising").await.unwrap().session_id;

        assert_eq!(svc.evict_idle(), 0);
        let later = Instant::now() + Duration::from_secs(61);
        assert_eq!(svc.evict_idle_at(later), 1);

        assert_eq!(svc.session_count(), 0);
        assert!(svc.store().interactions(&id).is_empty());
        assert_eq!(svc.session_status(&id).await["status"], "inactive");
    }

    #[tokio::test]
    async fn test_idle_expiry_can_be_disabled() {
        let script = Script::default();
        let mut config = InsightConfig::default();
        config.sessions.idle_timeout_secs = 0;
        let svc = service(&script, config);
        svc.start_session("Costs are rising").await.unwrap();

        let much_later = Instant::now() + Duration::from_secs(365 * 24 * 3600);
        assert_eq!(svc.evict_idle_at(much_later), 0);
        assert_eq!(svc.session_count(), 1);
    }

    #[tokio::test]
    async fn test_session_cap_evicts_least_recently_used() {
        let script = Script::default();
        let mut config = InsightConfig::default();
        config.sessions.max_sessions = 2;
        let svc = service(&script, config);

        let a = svc.start_session("Problem A").await.unwrap().session_id;
        tokio::time::sleep(Duration::from_millis(5)).await;
        let b = svc.start_session("Problem B").await.unwrap().session_id;
        tokio::time::sleep(Duration::from_millis(5)).await;
        // touching A leaves B as the least recently used
        svc.session_status(&a).await;
        tokio::time::sleep(Duration::from_millis(5)).await;
        let c = svc.start_session("Problem C").await.unwrap().session_id;

        assert_eq!(svc.session_count(), 2);
        assert_eq!(svc.session_status(&a).await["status"], "active");
        assert_eq!(svc.session_status(&b).await["status"], "inactive");
        assert_eq!(svc.session_status(&c).await["status"], "active");
        assert!(svc.store().interactions(&b).is_empty());
    }
}
