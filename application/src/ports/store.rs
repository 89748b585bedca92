//! Persistence port for sessions, conversations, and messages.
//!
//! The core never assumes a storage engine — only that a write is durable
//! before a turn is acknowledged, and that the user/assistant pair of a
//! turn is written atomically as a unit or not at all.

use async_trait::async_trait;
use thiserror::Error;
use tutormesh_domain::{TutorConversation, TutorMessage, TutorSession};

/// Errors surfaced by store adapters
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Conversation not found: {0}")]
    ConversationNotFound(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Repository for tutoring state
#[async_trait]
pub trait TutorStore: Send + Sync {
    /// Fetch the session for a user, if one exists.
    async fn get_session(&self, user_id: &str) -> Result<Option<TutorSession>, StoreError>;

    /// Insert or replace a session. Last write wins; a subsequent
    /// `get_session` from the same caller must observe this write.
    async fn put_session(&self, session: TutorSession) -> Result<(), StoreError>;

    /// Fetch or lazily create the conversation for (session, agent).
    /// The boolean is `true` when the conversation was just created.
    async fn get_or_create_conversation(
        &self,
        session_id: &str,
        agent_id: &str,
    ) -> Result<(TutorConversation, bool), StoreError>;

    /// All messages of a conversation, in sequence order.
    async fn messages(&self, conversation_id: &str) -> Result<Vec<TutorMessage>, StoreError>;

    /// Append a user/assistant pair atomically, assigning consecutive
    /// sequence numbers and bumping the conversation counters.
    async fn append_turn(
        &self,
        user: TutorMessage,
        assistant: TutorMessage,
    ) -> Result<(TutorMessage, TutorMessage), StoreError>;
}
