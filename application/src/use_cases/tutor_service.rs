//! Tutoring service use case
//!
//! The single entry point the web layer consumes: session lifecycle, mode
//! dispatch, and the `send_message` turn. A turn's orchestration path is
//! fully determined by the session mode; all paths go through the model
//! gateway, and the user/assistant message pair is persisted atomically
//! only after the turn has produced a response.

use crate::ports::model_gateway::ModelGateway;
use crate::ports::store::{StoreError, TutorStore};
use crate::ports::turn_audit::{TurnAuditLogger, TurnRecord};
use crate::use_cases::collaborate::CollaborativeOrchestrator;
use crate::use_cases::route::AgentRouter;
use chrono::Utc;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tutormesh_domain::{
    AgentDirectory, AgentId, ChatMessage, CollaborativeInfo, CollaborativeSettings,
    CompletionRequest, DomainError, InteractionMode, MessageKind, ProviderError, RouteDecision,
    TutorAgent, TutorConversation, TutorMessage, TutorSession,
};

/// Errors surfaced by the tutoring contract
#[derive(Error, Debug)]
pub enum SendMessageError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Input for one inbound chat turn
#[derive(Debug, Clone, Default)]
pub struct SendMessageInput {
    pub user_id: String,
    /// Explicit agent for this turn; manual mode falls back to the
    /// session's active agent.
    pub agent_id: Option<AgentId>,
    pub message: String,
    /// Per-turn collaborative settings; `None` uses the configured defaults.
    pub collaborative: Option<CollaborativeSettings>,
    /// Seed for random mode; explicit for reproducibility.
    pub seed: Option<u64>,
    /// Best-effort cancellation of outstanding provider calls. A cancelled
    /// turn persists nothing.
    pub cancel: Option<CancellationToken>,
}

impl SendMessageInput {
    pub fn new(user_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            message: message.into(),
            ..Default::default()
        }
    }
}

/// The acknowledged result of one turn
#[derive(Debug, Clone)]
pub struct TutorMessageResponse {
    pub session_id: String,
    pub conversation_id: String,
    /// Agents that served this turn (one for manual/router/random).
    pub agent_ids: Vec<AgentId>,
    pub content: String,
    pub user_message: TutorMessage,
    pub assistant_message: TutorMessage,
    pub route: Option<RouteDecision>,
    pub collaborative: Option<CollaborativeInfo>,
    /// Welcome message, present when the conversation was just created.
    pub welcome: Option<String>,
}

/// Result of the orchestration phase, before persistence.
struct TurnOutput {
    conversation: TutorConversation,
    conversation_created: bool,
    agent_ids: Vec<AgentId>,
    content: String,
    route: Option<RouteDecision>,
    collaborative: Option<CollaborativeInfo>,
    welcome: Option<String>,
}

/// Facade over the tutoring contract.
pub struct TutorService<G: ModelGateway + 'static> {
    gateway: Arc<G>,
    directory: Arc<AgentDirectory>,
    store: Arc<dyn TutorStore>,
    audit: Arc<dyn TurnAuditLogger>,
    router: AgentRouter,
    orchestrator: CollaborativeOrchestrator<G>,
    collab_defaults: CollaborativeSettings,
}

impl<G: ModelGateway + 'static> TutorService<G> {
    pub fn new(
        gateway: Arc<G>,
        directory: Arc<AgentDirectory>,
        store: Arc<dyn TutorStore>,
        audit: Arc<dyn TurnAuditLogger>,
    ) -> Self {
        let router = AgentRouter::new(Arc::clone(&directory));
        let orchestrator =
            CollaborativeOrchestrator::new(Arc::clone(&gateway), Arc::clone(&directory));
        Self {
            gateway,
            directory,
            store,
            audit,
            router,
            orchestrator,
            collab_defaults: CollaborativeSettings::default(),
        }
    }

    pub fn with_router(mut self, router: AgentRouter) -> Self {
        self.router = router;
        self
    }

    pub fn with_collaborative_defaults(mut self, settings: CollaborativeSettings) -> Self {
        self.collab_defaults = settings;
        self
    }

    /// Fetch the user's session, creating it lazily in manual mode.
    pub async fn get_or_create_session(&self, user_id: &str) -> Result<TutorSession, StoreError> {
        if let Some(session) = self.store.get_session(user_id).await? {
            return Ok(session);
        }
        let session = TutorSession::new(format!("sess-{user_id}"), user_id, Utc::now());
        self.store.put_session(session.clone()).await?;
        Ok(session)
    }

    /// Switch the session's interaction mode. Explicit and immediate: a
    /// `get_or_create_session` read issued afterwards reflects the new mode.
    /// Existing conversations are untouched; only future turns change.
    pub async fn set_mode(
        &self,
        user_id: &str,
        mode: InteractionMode,
    ) -> Result<TutorSession, StoreError> {
        let mut session = self.get_or_create_session(user_id).await?;
        session.mode = mode;
        session.updated_at = Utc::now();
        self.store.put_session(session.clone()).await?;
        info!(user = user_id, mode = mode.as_str(), "session mode changed");
        Ok(session)
    }

    /// Store the user's active agent. Accepted in any mode (a user may
    /// pre-select before switching back to manual); only manual turns use it.
    pub async fn set_active_agent(
        &self,
        user_id: &str,
        agent_id: &str,
    ) -> Result<TutorSession, SendMessageError> {
        self.directory.get(agent_id)?;
        let mut session = self.get_or_create_session(user_id).await?;
        session.active_agent_id = Some(agent_id.to_string());
        session.updated_at = Utc::now();
        self.store.put_session(session.clone()).await?;
        Ok(session)
    }

    /// List agents from the directory.
    pub fn list_agents(&self, active_only: bool) -> Vec<TutorAgent> {
        self.directory
            .list(active_only)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Handle one inbound chat turn.
    pub async fn send_message(
        &self,
        input: SendMessageInput,
    ) -> Result<TutorMessageResponse, SendMessageError> {
        let started = Instant::now();
        let session = self.get_or_create_session(&input.user_id).await?;

        let output = match &input.cancel {
            Some(token) => {
                tokio::select! {
                    _ = token.cancelled() => {
                        warn!(user = %input.user_id, "turn cancelled");
                        return Err(DomainError::Cancelled.into());
                    }
                    result = self.run_turn(&session, &input) => result?,
                }
            }
            None => self.run_turn(&session, &input).await?,
        };

        // Persist the pair atomically, only now that the turn succeeded.
        let user_message = TutorMessage::user(
            output.conversation.id.clone(),
            input.message.clone(),
            Utc::now(),
        );
        let mut assistant_message = TutorMessage::assistant(
            output.conversation.id.clone(),
            output.content.clone(),
            Utc::now(),
        );
        if let Some(route) = &output.route {
            assistant_message = assistant_message.with_metadata(json!({ "route": route }));
        }
        if let Some(collab) = &output.collaborative {
            assistant_message = assistant_message.with_metadata(json!({ "collaborative": collab }));
        }
        let (user_message, assistant_message) =
            self.store.append_turn(user_message, assistant_message).await?;

        self.audit.record(&TurnRecord {
            timestamp: Utc::now(),
            user_id: input.user_id.clone(),
            session_id: session.id.clone(),
            mode: session.mode,
            agent_ids: output.agent_ids.clone(),
            latency_ms: started.elapsed().as_millis() as u64,
            route: output.route.clone(),
            collaborative: output.collaborative.clone(),
        });

        Ok(TutorMessageResponse {
            session_id: session.id,
            conversation_id: output.conversation.id.clone(),
            agent_ids: output.agent_ids,
            content: output.content,
            user_message,
            assistant_message,
            route: output.route,
            collaborative: output.collaborative,
            welcome: if output.conversation_created {
                output.welcome
            } else {
                None
            },
        })
    }

    /// Dispatch on the session mode and produce the turn's content.
    async fn run_turn(
        &self,
        session: &TutorSession,
        input: &SendMessageInput,
    ) -> Result<TurnOutput, SendMessageError> {
        match session.mode {
            InteractionMode::Manual => {
                let agent_id = input
                    .agent_id
                    .clone()
                    .or_else(|| session.active_agent_id.clone())
                    .ok_or(DomainError::NoActiveAgent)?;
                let agent = self.directory.get_active(&agent_id)?.clone();
                self.single_agent_turn(session, &agent, &input.message, None)
                    .await
            }
            InteractionMode::Router => {
                let decision = self.router.route(&input.message)?;
                let agent = self.directory.get_active(&decision.agent_id)?.clone();
                self.single_agent_turn(session, &agent, &input.message, Some(decision))
                    .await
            }
            InteractionMode::Random => {
                let seed = input.seed.unwrap_or_else(rand::random);
                let mut rng = StdRng::seed_from_u64(seed);
                let candidates = self.directory.list(true);
                let agent = candidates.choose(&mut rng).ok_or(DomainError::NoAgents)?;
                let agent = (*agent).clone();
                self.single_agent_turn(session, &agent, &input.message, None)
                    .await
            }
            InteractionMode::Collaborative => {
                let settings = input
                    .collaborative
                    .clone()
                    .unwrap_or_else(|| self.collab_defaults.clone());
                let (content, collab) = self.orchestrator.run(&input.message, &settings).await?;

                // Collaborative turns live in the first participant's
                // conversation; the contribution records carry the rest.
                let lead = collab
                    .agent_ids
                    .first()
                    .cloned()
                    .ok_or(DomainError::NoAgents)?;
                let (conversation, created) = self
                    .store
                    .get_or_create_conversation(&session.id, &lead)
                    .await?;
                let welcome = self
                    .directory
                    .get(&lead)
                    .ok()
                    .and_then(|a| a.welcome_message.clone());
                Ok(TurnOutput {
                    conversation,
                    conversation_created: created,
                    agent_ids: collab.agent_ids.clone(),
                    content,
                    route: None,
                    collaborative: Some(collab),
                    welcome,
                })
            }
        }
    }

    /// One-agent turn: conversation lookup, history replay, gateway call.
    async fn single_agent_turn(
        &self,
        session: &TutorSession,
        agent: &TutorAgent,
        message: &str,
        route: Option<RouteDecision>,
    ) -> Result<TurnOutput, SendMessageError> {
        let (conversation, created) = self
            .store
            .get_or_create_conversation(&session.id, &agent.id)
            .await?;

        let mut messages = vec![ChatMessage::system(agent.persona_prompt())];
        for stored in self.store.messages(&conversation.id).await? {
            messages.push(match stored.kind {
                MessageKind::User => ChatMessage::user(stored.content),
                MessageKind::Assistant => ChatMessage::assistant(stored.content),
            });
        }
        messages.push(ChatMessage::user(message));

        let mut request = CompletionRequest::new(messages).with_params(agent.params.clone());
        if let Some(provider) = &agent.provider {
            request = request.with_provider(provider.clone());
        }
        if let Some(model) = &agent.model {
            request = request.with_model(model.clone());
        }

        let response = self.gateway.complete(request).await?;
        Ok(TurnOutput {
            conversation,
            conversation_created: created,
            agent_ids: vec![agent.id.clone()],
            content: response.text().to_string(),
            route,
            collaborative: None,
            welcome: agent.welcome_message.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::turn_audit::NoAudit;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tutormesh_domain::{Choice, CompletionResponse, FinishReason, Role, TokenUsage};

    struct MockGateway {
        fail_all: Mutex<Option<ProviderError>>,
        requests: Mutex<Vec<CompletionRequest>>,
    }

    impl MockGateway {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                fail_all: Mutex::new(None),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn fail_with(&self, error: ProviderError) {
            *self.fail_all.lock().unwrap() = Some(error);
        }
    }

    #[async_trait]
    impl ModelGateway for MockGateway {
        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, ProviderError> {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(error) = self.fail_all.lock().unwrap().clone() {
                return Err(error);
            }
            let model = request.model.unwrap_or_else(|| "default".to_string());
            Ok(CompletionResponse {
                choices: vec![Choice {
                    message: ChatMessage {
                        role: Role::Assistant,
                        content: format!("reply from {model}"),
                    },
                    finish_reason: FinishReason::Stop,
                }],
                usage: TokenUsage::default(),
                latency_ms: 1,
                provider: "mock".into(),
                model,
            })
        }
    }

    /// Minimal in-memory store double.
    #[derive(Default)]
    struct MemoryStore {
        sessions: Mutex<HashMap<String, TutorSession>>,
        conversations: Mutex<HashMap<String, TutorConversation>>,
        messages: Mutex<Vec<TutorMessage>>,
    }

    #[async_trait]
    impl TutorStore for MemoryStore {
        async fn get_session(&self, user_id: &str) -> Result<Option<TutorSession>, StoreError> {
            Ok(self.sessions.lock().unwrap().get(user_id).cloned())
        }

        async fn put_session(&self, session: TutorSession) -> Result<(), StoreError> {
            self.sessions
                .lock()
                .unwrap()
                .insert(session.user_id.clone(), session);
            Ok(())
        }

        async fn get_or_create_conversation(
            &self,
            session_id: &str,
            agent_id: &str,
        ) -> Result<(TutorConversation, bool), StoreError> {
            let key = format!("{session_id}:{agent_id}");
            let mut conversations = self.conversations.lock().unwrap();
            if let Some(existing) = conversations.get(&key) {
                return Ok((existing.clone(), false));
            }
            let conversation =
                TutorConversation::new(key.clone(), session_id, agent_id, Utc::now());
            conversations.insert(key, conversation.clone());
            Ok((conversation, true))
        }

        async fn messages(&self, conversation_id: &str) -> Result<Vec<TutorMessage>, StoreError> {
            Ok(self
                .messages
                .lock()
                .unwrap()
                .iter()
                .filter(|m| m.conversation_id == conversation_id)
                .cloned()
                .collect())
        }

        async fn append_turn(
            &self,
            mut user: TutorMessage,
            mut assistant: TutorMessage,
        ) -> Result<(TutorMessage, TutorMessage), StoreError> {
            let mut messages = self.messages.lock().unwrap();
            let next = messages
                .iter()
                .filter(|m| m.conversation_id == user.conversation_id)
                .count() as u64
                + 1;
            user.sequence = next;
            assistant.sequence = next + 1;
            messages.push(user.clone());
            messages.push(assistant.clone());
            if let Some(conversation) = self
                .conversations
                .lock()
                .unwrap()
                .get_mut(&user.conversation_id)
            {
                conversation.message_count += 2;
                conversation.last_activity = Utc::now();
            }
            Ok((user, assistant))
        }
    }

    fn agents() -> Vec<TutorAgent> {
        ["alpha", "beta", "gamma"]
            .iter()
            .map(|name| {
                let mut agent = TutorAgent::new(*name, format!("Tutor {name}"))
                    .with_keywords(&[*name])
                    .with_system_prompt(format!("You are {name}."));
                agent.model = Some(name.to_string());
                agent.welcome_message = Some(format!("Welcome from {name}!"));
                agent
            })
            .collect()
    }

    fn service(gateway: Arc<MockGateway>) -> TutorService<MockGateway> {
        let directory = Arc::new(AgentDirectory::new(agents()).with_fallback("alpha"));
        TutorService::new(
            gateway,
            directory,
            Arc::new(MemoryStore::default()),
            Arc::new(NoAudit),
        )
    }

    #[tokio::test]
    async fn test_session_created_lazily_in_manual_mode() {
        let service = service(MockGateway::new());
        let session = service.get_or_create_session("user-1").await.unwrap();
        assert_eq!(session.mode, InteractionMode::Manual);
        assert!(session.active_agent_id.is_none());
    }

    #[tokio::test]
    async fn test_set_mode_read_your_write() {
        let service = service(MockGateway::new());
        service
            .set_mode("user-1", InteractionMode::Collaborative)
            .await
            .unwrap();
        let session = service.get_or_create_session("user-1").await.unwrap();
        assert_eq!(session.mode, InteractionMode::Collaborative);
    }

    #[tokio::test]
    async fn test_set_active_agent_accepted_in_any_mode() {
        let service = service(MockGateway::new());
        service
            .set_mode("user-1", InteractionMode::Router)
            .await
            .unwrap();
        let session = service.set_active_agent("user-1", "beta").await.unwrap();
        assert_eq!(session.mode, InteractionMode::Router);
        assert_eq!(session.active_agent_id.as_deref(), Some("beta"));
    }

    #[tokio::test]
    async fn test_set_active_agent_unknown_agent_fails() {
        let service = service(MockGateway::new());
        let result = service.set_active_agent("user-1", "nope").await;
        assert!(matches!(
            result,
            Err(SendMessageError::Domain(DomainError::AgentNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_manual_mode_requires_active_agent() {
        let service = service(MockGateway::new());
        let result = service
            .send_message(SendMessageInput::new("user-1", "hello"))
            .await;
        assert!(matches!(
            result,
            Err(SendMessageError::Domain(DomainError::NoActiveAgent))
        ));
    }

    #[tokio::test]
    async fn test_manual_turn_persists_ordered_pair_and_welcome() {
        let service = service(MockGateway::new());
        service.set_active_agent("user-1", "alpha").await.unwrap();

        let first = service
            .send_message(SendMessageInput::new("user-1", "hello"))
            .await
            .unwrap();
        assert_eq!(first.content, "reply from alpha");
        assert_eq!(first.user_message.sequence, 1);
        assert_eq!(first.assistant_message.sequence, 2);
        assert_eq!(first.welcome.as_deref(), Some("Welcome from alpha!"));

        let second = service
            .send_message(SendMessageInput::new("user-1", "more"))
            .await
            .unwrap();
        assert_eq!(second.user_message.sequence, 3);
        assert!(second.welcome.is_none());
    }

    #[tokio::test]
    async fn test_history_replayed_into_later_turns() {
        let gateway = MockGateway::new();
        let service = service(Arc::clone(&gateway));
        service.set_active_agent("user-1", "alpha").await.unwrap();

        service
            .send_message(SendMessageInput::new("user-1", "first question"))
            .await
            .unwrap();
        service
            .send_message(SendMessageInput::new("user-1", "second question"))
            .await
            .unwrap();

        let requests = gateway.requests.lock().unwrap().clone();
        let last = requests.last().unwrap();
        // system + first user + first assistant + second user
        assert_eq!(last.messages.len(), 4);
        assert_eq!(last.messages[1].content, "first question");
        assert_eq!(last.messages[2].content, "reply from alpha");
    }

    #[tokio::test]
    async fn test_terminal_failure_persists_no_messages() {
        let gateway = MockGateway::new();
        let service = service(Arc::clone(&gateway));
        service.set_active_agent("user-1", "alpha").await.unwrap();
        gateway.fail_with(ProviderError::InvalidApiKey("mock".into()));

        let result = service
            .send_message(SendMessageInput::new("user-1", "hello"))
            .await;
        assert!(matches!(result, Err(SendMessageError::Provider(_))));

        // The failed turn left no orphan messages behind.
        gateway.fail_all.lock().unwrap().take();
        let ok = service
            .send_message(SendMessageInput::new("user-1", "again"))
            .await
            .unwrap();
        assert_eq!(ok.user_message.sequence, 1);
    }

    #[tokio::test]
    async fn test_router_mode_records_decision() {
        let service = service(MockGateway::new());
        service
            .set_mode("user-1", InteractionMode::Router)
            .await
            .unwrap();

        let response = service
            .send_message(SendMessageInput::new("user-1", "tell me about beta"))
            .await
            .unwrap();
        assert_eq!(response.agent_ids, vec!["beta".to_string()]);
        let route = response.route.unwrap();
        assert_eq!(route.agent_id, "beta");
        assert!(
            response.assistant_message.metadata.unwrap()["route"]["agent_id"]
                .as_str()
                .unwrap()
                .eq("beta")
        );
    }

    #[tokio::test]
    async fn test_random_mode_is_deterministic_given_seed() {
        let service = service(MockGateway::new());
        service
            .set_mode("user-1", InteractionMode::Random)
            .await
            .unwrap();
        service
            .set_mode("user-2", InteractionMode::Random)
            .await
            .unwrap();

        let mut input1 = SendMessageInput::new("user-1", "hello");
        input1.seed = Some(7);
        let mut input2 = SendMessageInput::new("user-2", "hello");
        input2.seed = Some(7);

        let r1 = service.send_message(input1).await.unwrap();
        let r2 = service.send_message(input2).await.unwrap();
        assert_eq!(r1.agent_ids, r2.agent_ids);
    }

    #[tokio::test]
    async fn test_collaborative_mode_returns_contributions() {
        let service = service(MockGateway::new());
        service
            .set_mode("user-1", InteractionMode::Collaborative)
            .await
            .unwrap();

        let response = service
            .send_message(SendMessageInput::new("user-1", "explain gravity"))
            .await
            .unwrap();
        let collab = response.collaborative.unwrap();
        assert_eq!(collab.contributions.len(), 3);
        assert_eq!(response.agent_ids.len(), 3);
        assert!(response.content.contains("reply from"));
    }

    #[tokio::test]
    async fn test_pre_cancelled_turn_persists_nothing() {
        let service = service(MockGateway::new());
        service.set_active_agent("user-1", "alpha").await.unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let mut input = SendMessageInput::new("user-1", "hello");
        input.cancel = Some(token);

        let result = service.send_message(input).await;
        assert!(matches!(
            result,
            Err(SendMessageError::Domain(DomainError::Cancelled))
        ));

        let ok = service
            .send_message(SendMessageInput::new("user-1", "again"))
            .await
            .unwrap();
        assert_eq!(ok.user_message.sequence, 1);
    }

    #[tokio::test]
    async fn test_mode_switch_does_not_touch_existing_conversations() {
        let service = service(MockGateway::new());
        service.set_active_agent("user-1", "alpha").await.unwrap();
        service
            .send_message(SendMessageInput::new("user-1", "hi"))
            .await
            .unwrap();

        service
            .set_mode("user-1", InteractionMode::Router)
            .await
            .unwrap();
        service
            .set_mode("user-1", InteractionMode::Manual)
            .await
            .unwrap();

        let response = service
            .send_message(SendMessageInput::new("user-1", "back again"))
            .await
            .unwrap();
        // Same conversation continues: sequence picks up where it left off.
        assert_eq!(response.user_message.sequence, 3);
    }
}
