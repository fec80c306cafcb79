//! Session interaction memory.
//!
//! Keeps a per-session log of interactions (session starts, coach replies,
//! confirmed plans) in process. Each interaction records its type, the agent
//! that handled it, a timestamp and free-form metadata.
//!
//! # Example
//! ```ignore
//! let store = InteractionStore::new();
//! store.store_interaction("abc", Interaction::new("start_session", "Business_Coach"));
//! let summary = store.session_summary("abc");
//! ```

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Interaction type recorded when a session starts
pub const START_SESSION: &str = "start_session";
/// Interaction type recorded for each user reply
pub const CONTINUE_SESSION: &str = "continue_session";
/// Interaction type recorded when a summary is confirmed into a plan
pub const CONFIRM_SUMMARY: &str = "confirm_summary";

/// One recorded exchange within a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    #[serde(rename = "type")]
    pub kind: String,
    pub agent: String,
    pub timestamp: DateTime<Utc>,
    /// Exchange payload (problem, responses, plan)
    #[serde(default)]
    pub data: Map<String, Value>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Interaction {
    pub fn new(kind: &str, agent: &str) -> Self {
        Self {
            kind: kind.to_string(),
            agent: agent.to_string(),
            timestamp: Utc::now(),
            data: Map::new(),
            metadata: Map::new(),
        }
    }

    pub fn with_data(mut self, key: &str, value: Value) -> Self {
        self.data.insert(key.to_string(), value);
        self
    }

    pub fn with_metadata(mut self, key: &str, value: Value) -> Self {
        self.metadata.insert(key.to_string(), value);
        self
    }
}

/// Thread-safe store of interactions keyed by session id
#[derive(Debug, Default)]
pub struct InteractionStore {
    sessions: RwLock<HashMap<String, Vec<Interaction>>>,
}

impl InteractionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an interaction to a session's log
    pub fn store_interaction(&self, session_id: &str, interaction: Interaction) {
        debug!(session_id, kind = %interaction.kind, "Storing interaction");
        self.sessions
            .write()
            .entry(session_id.to_string())
            .or_default()
            .push(interaction);
    }

    /// All interactions recorded for a session, oldest first
    pub fn interactions(&self, session_id: &str) -> Vec<Interaction> {
        self.sessions
            .read()
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Session id plus its interaction log, for status views
    pub fn session_context(&self, session_id: &str) -> Value {
        json!({
            "session_id": session_id,
            "interactions": self.interactions(session_id),
        })
    }

    /// Aggregate view of a session.
    ///
    /// Interaction types are deduplicated; metadata maps are merged in
    /// order, so later interactions win on key conflicts. A session with no
    /// interactions yields `{"error": "No session data found"}`.
    pub fn session_summary(&self, session_id: &str) -> Value {
        let sessions = self.sessions.read();
        let Some(interactions) = sessions.get(session_id).filter(|i| !i.is_empty()) else {
            return json!({ "error": "No session data found" });
        };

        let kinds: BTreeSet<&str> = interactions.iter().map(|i| i.kind.as_str()).collect();
        let timestamps: Vec<String> = interactions
            .iter()
            .map(|i| i.timestamp.to_rfc3339())
            .collect();
        let mut metadata = Map::new();
        for interaction in interactions {
            for (key, value) in &interaction.metadata {
                metadata.insert(key.clone(), value.clone());
            }
        }

        json!({
            "session_id": session_id,
            "total_interactions": interactions.len(),
            "interaction_types": kinds,
            "timestamps": timestamps,
            "metadata": metadata,
        })
    }

    /// Drop a session's log; returns whether anything was stored
    pub fn clear_session(&self, session_id: &str) -> bool {
        self.sessions.write().remove(session_id).is_some()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }
}
