//! Session, conversation, and message entities.
//!
//! A session holds the current interaction mode for one user. A conversation
//! is the unique (session, agent) pairing; its messages are append-only and
//! strictly ordered. User and assistant messages are always written as a
//! pair per turn.

use crate::agent::entities::AgentId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a session dispatches an inbound turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionMode {
    /// The user's active agent answers every turn.
    #[default]
    Manual,
    /// A scoring strategy picks one agent per turn.
    Router,
    /// Several agents contribute under a collaboration style.
    Collaborative,
    /// One seeded-random active agent per turn.
    Random,
}

impl InteractionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionMode::Manual => "manual",
            InteractionMode::Router => "router",
            InteractionMode::Collaborative => "collaborative",
            InteractionMode::Random => "random",
        }
    }
}

impl std::str::FromStr for InteractionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(InteractionMode::Manual),
            "router" => Ok(InteractionMode::Router),
            "collaborative" => Ok(InteractionMode::Collaborative),
            "random" => Ok(InteractionMode::Random),
            other => Err(format!("unknown interaction mode: {other}")),
        }
    }
}

/// Per-user session state (Entity).
///
/// Created lazily on first access. Mode transitions are explicit and
/// immediate; switching modes never alters existing conversations, only how
/// future turns are dispatched. `active_agent_id` is meaningful only in
/// manual mode but is stored in any mode, so a user can pre-select an agent
/// before switching back to manual.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TutorSession {
    pub id: String,
    pub user_id: String,
    pub mode: InteractionMode,
    pub active_agent_id: Option<AgentId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TutorSession {
    pub fn new(id: impl Into<String>, user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            mode: InteractionMode::default(),
            active_agent_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// The message history container for one (session, agent) pairing (Entity).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TutorConversation {
    pub id: String,
    pub session_id: String,
    pub agent_id: AgentId,
    pub message_count: u64,
    pub last_activity: DateTime<Utc>,
}

impl TutorConversation {
    pub fn new(
        id: impl Into<String>,
        session_id: impl Into<String>,
        agent_id: impl Into<AgentId>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            session_id: session_id.into(),
            agent_id: agent_id.into(),
            message_count: 0,
            last_activity: now,
        }
    }
}

/// Who authored a stored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    User,
    Assistant,
}

/// One stored message within a conversation (Entity, append-only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TutorMessage {
    pub conversation_id: String,
    /// Strictly increasing position within the conversation.
    pub sequence: u64,
    pub kind: MessageKind,
    pub content: String,
    /// Serialized per-turn metadata (route decision, collaborative info).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl TutorMessage {
    pub fn user(
        conversation_id: impl Into<String>,
        content: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            sequence: 0,
            kind: MessageKind::User,
            content: content.into(),
            metadata: None,
            created_at: now,
        }
    }

    pub fn assistant(
        conversation_id: impl Into<String>,
        content: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            sequence: 0,
            kind: MessageKind::Assistant,
            content: content.into(),
            metadata: None,
            created_at: now,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_round_trip() {
        for mode in [
            InteractionMode::Manual,
            InteractionMode::Router,
            InteractionMode::Collaborative,
            InteractionMode::Random,
        ] {
            let parsed: InteractionMode = mode.as_str().parse().unwrap();
            assert_eq!(parsed, mode);
        }
        assert!("debate".parse::<InteractionMode>().is_err());
    }

    #[test]
    fn test_new_session_defaults_to_manual() {
        let session = TutorSession::new("s1", "user-1", Utc::now());
        assert_eq!(session.mode, InteractionMode::Manual);
        assert!(session.active_agent_id.is_none());
    }
}
