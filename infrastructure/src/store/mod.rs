//! In-memory tutoring store.
//!
//! One mutex guards all maps, so a turn's user/assistant pair is assigned
//! its sequence numbers and inserted under a single critical section.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use tutormesh_application::{StoreError, TutorStore};
use tutormesh_domain::{TutorConversation, TutorMessage, TutorSession};

#[derive(Default)]
struct State {
    sessions: HashMap<String, TutorSession>,
    conversations: HashMap<String, TutorConversation>,
    messages: HashMap<String, Vec<TutorMessage>>,
}

#[derive(Default)]
pub struct MemoryTutorStore {
    state: Mutex<State>,
}

impl MemoryTutorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn conversation_id(session_id: &str, agent_id: &str) -> String {
    format!("{session_id}:{agent_id}")
}

#[async_trait]
impl TutorStore for MemoryTutorStore {
    async fn get_session(&self, user_id: &str) -> Result<Option<TutorSession>, StoreError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .sessions
            .values()
            .find(|s| s.user_id == user_id)
            .cloned())
    }

    async fn put_session(&self, session: TutorSession) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.sessions.insert(session.id.clone(), session);
        Ok(())
    }

    async fn get_or_create_conversation(
        &self,
        session_id: &str,
        agent_id: &str,
    ) -> Result<(TutorConversation, bool), StoreError> {
        let mut state = self.state.lock().unwrap();
        let id = conversation_id(session_id, agent_id);
        if let Some(existing) = state.conversations.get(&id) {
            return Ok((existing.clone(), false));
        }
        let conversation = TutorConversation::new(id.clone(), session_id, agent_id, Utc::now());
        state.conversations.insert(id.clone(), conversation.clone());
        state.messages.insert(id, Vec::new());
        Ok((conversation, true))
    }

    async fn messages(&self, conversation_id: &str) -> Result<Vec<TutorMessage>, StoreError> {
        let state = self.state.lock().unwrap();
        state
            .messages
            .get(conversation_id)
            .cloned()
            .ok_or_else(|| StoreError::ConversationNotFound(conversation_id.to_string()))
    }

    async fn append_turn(
        &self,
        mut user: TutorMessage,
        mut assistant: TutorMessage,
    ) -> Result<(TutorMessage, TutorMessage), StoreError> {
        let mut state = self.state.lock().unwrap();
        let id = user.conversation_id.clone();
        let conversation = state
            .conversations
            .get_mut(&id)
            .ok_or_else(|| StoreError::ConversationNotFound(id.clone()))?;

        let next = conversation.message_count + 1;
        user.sequence = next;
        assistant.sequence = next + 1;
        conversation.message_count = next + 1;
        conversation.last_activity = Utc::now();

        let log = state.messages.entry(id).or_default();
        log.push(user.clone());
        log.push(assistant.clone());
        Ok((user, assistant))
    }
}
