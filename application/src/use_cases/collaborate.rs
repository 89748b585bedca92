//! Collaborative orchestrator use case
//!
//! Coordinates several agents within one turn under a chosen style:
//!
//! - **parallel**: concurrent fan-out, join with an optional turn deadline
//! - **sequential**: strictly ordered, each agent sees the running transcript
//! - **debate**: bounded rebuttal rounds; an agent that fails mid-debate is
//!   dropped from later rounds, and the debate ends early once fewer than
//!   two participants survive
//! - **random**: seeded-random subset, then parallel
//!
//! One agent's failure never fails the turn; the turn fails only when every
//! participant fails.

use crate::ports::model_gateway::ModelGateway;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::{Instant, timeout};
use tracing::{debug, info, warn};
use tutormesh_domain::{
    AgentContribution, AgentDirectory, ChatMessage, CollaborationStyle, CollaborativeInfo,
    CollaborativeSettings, CompletionRequest, DomainError, TutorAgent, TutorPromptTemplate,
};

/// Coordinates one collaborative turn across the model gateway.
pub struct CollaborativeOrchestrator<G: ModelGateway + 'static> {
    gateway: Arc<G>,
    directory: Arc<AgentDirectory>,
}

impl<G: ModelGateway + 'static> CollaborativeOrchestrator<G> {
    pub fn new(gateway: Arc<G>, directory: Arc<AgentDirectory>) -> Self {
        Self { gateway, directory }
    }

    /// Run one collaborative turn. Returns the combined assistant-visible
    /// response plus the full contribution audit record.
    pub async fn run(
        &self,
        question: &str,
        settings: &CollaborativeSettings,
    ) -> Result<(String, CollaborativeInfo), DomainError> {
        let participants = self.participants(settings)?;
        info!(
            style = settings.style.as_str(),
            participants = participants.len(),
            "starting collaborative turn"
        );

        let (contributions, rounds) = match settings.style {
            CollaborationStyle::Parallel | CollaborationStyle::Random => {
                (self.run_parallel(question, &participants, settings).await, 1)
            }
            CollaborationStyle::Sequential => {
                (self.run_sequential(question, &participants, settings).await, 1)
            }
            CollaborationStyle::Debate => {
                self.run_debate(question, participants.clone(), settings)
                    .await
            }
        };

        if !contributions.iter().any(|c| c.success) {
            return Err(DomainError::AllAgentsFailed);
        }

        let (combined, synthesized) = self.synthesize(question, &contributions, settings).await;

        let info = CollaborativeInfo {
            style: settings.style,
            agent_ids: participants.iter().map(|a| a.id.clone()).collect(),
            contributions,
            rounds,
            synthesized,
        };
        Ok((combined, info))
    }

    /// Resolve and cap the participating agents for this turn.
    fn participants(
        &self,
        settings: &CollaborativeSettings,
    ) -> Result<Vec<TutorAgent>, DomainError> {
        let mut agents: Vec<TutorAgent> = match &settings.selected_agent_ids {
            Some(ids) => ids
                .iter()
                .map(|id| self.directory.get_active(id).cloned())
                .collect::<Result<_, _>>()?,
            None => self.directory.list(true).into_iter().cloned().collect(),
        };
        if agents.is_empty() {
            return Err(DomainError::NoAgents);
        }

        if settings.style == CollaborationStyle::Random {
            // Seeded subset: reproducible given the same seed and agent set.
            let seed = settings.seed.unwrap_or_else(rand::random);
            let mut rng = StdRng::seed_from_u64(seed);
            agents.shuffle(&mut rng);
        }
        agents.truncate(settings.max_agents);
        Ok(agents)
    }

    /// Fan out to all participants concurrently and join, bounded by the
    /// optional turn deadline. Agents not finished by the deadline are
    /// recorded as failed, not fatal.
    async fn run_parallel(
        &self,
        question: &str,
        agents: &[TutorAgent],
        settings: &CollaborativeSettings,
    ) -> Vec<AgentContribution> {
        let mut join_set = JoinSet::new();
        let mut pending: HashMap<String, String> = HashMap::new();

        for agent in agents {
            pending.insert(agent.id.clone(), agent.name.clone());
            let gateway = Arc::clone(&self.gateway);
            let agent = agent.clone();
            let request = agent_request(
                &agent,
                Some(TutorPromptTemplate::collaborative_system_note()),
                question.to_string(),
            );

            join_set.spawn(async move {
                let started = Instant::now();
                let result = gateway.complete(request).await;
                (agent, result, started.elapsed())
            });
        }

        let mut contributions = Vec::new();
        let collect = async {
            while let Some(joined) = join_set.join_next().await {
                match joined {
                    Ok((agent, Ok(response), elapsed)) => {
                        debug!(agent = %agent.id, "agent contributed");
                        pending.remove(&agent.id);
                        contributions.push(
                            AgentContribution::success(
                                agent.id,
                                agent.name,
                                response.text(),
                                elapsed.as_millis() as u64,
                                0,
                            )
                            .truncated(settings.max_response_length),
                        );
                    }
                    Ok((agent, Err(e), _)) => {
                        warn!(agent = %agent.id, error = %e, "agent failed");
                        pending.remove(&agent.id);
                        contributions.push(AgentContribution::failure(
                            agent.id,
                            agent.name,
                            e.to_string(),
                            0,
                        ));
                    }
                    Err(e) => warn!("task join error: {e}"),
                }
            }
        };

        match settings.turn_timeout_ms {
            Some(ms) => {
                if timeout(Duration::from_millis(ms), collect).await.is_err() {
                    warn!("turn deadline exceeded; dropping unfinished agents");
                }
            }
            None => collect.await,
        }

        // Anything still pending missed the deadline.
        for (id, name) in pending {
            contributions.push(AgentContribution::failure(
                id,
                name,
                "turn deadline exceeded",
                0,
            ));
        }
        contributions
    }

    /// Strictly ordered: each agent sees prior successful contributions
    /// verbatim, in order. No concurrency.
    async fn run_sequential(
        &self,
        question: &str,
        agents: &[TutorAgent],
        settings: &CollaborativeSettings,
    ) -> Vec<AgentContribution> {
        let mut contributions: Vec<AgentContribution> = Vec::new();

        for agent in agents {
            let transcript: Vec<AgentContribution> = contributions
                .iter()
                .filter(|c| c.success)
                .cloned()
                .collect();
            let prompt = TutorPromptTemplate::sequential_prompt(question, &transcript);
            let request = agent_request(
                agent,
                Some(TutorPromptTemplate::collaborative_system_note()),
                prompt,
            );

            let started = Instant::now();
            match self.gateway.complete(request).await {
                Ok(response) => contributions.push(
                    AgentContribution::success(
                        agent.id.clone(),
                        agent.name.clone(),
                        response.text(),
                        started.elapsed().as_millis() as u64,
                        0,
                    )
                    .truncated(settings.max_response_length),
                ),
                Err(e) => {
                    warn!(agent = %agent.id, error = %e, "sequential agent failed");
                    contributions.push(AgentContribution::failure(
                        agent.id.clone(),
                        agent.name.clone(),
                        e.to_string(),
                        0,
                    ));
                }
            }
        }
        contributions
    }

    /// Bounded debate: every round each surviving participant sees the
    /// previous round's contributions and may rebut. Terminates after the
    /// round cap regardless of convergence; ends early when fewer than two
    /// participants survive a round.
    async fn run_debate(
        &self,
        question: &str,
        mut agents: Vec<TutorAgent>,
        settings: &CollaborativeSettings,
    ) -> (Vec<AgentContribution>, usize) {
        let mut all_contributions: Vec<AgentContribution> = Vec::new();
        let mut previous_round: Vec<AgentContribution> = Vec::new();
        let rounds_cap = settings.debate_rounds.max(1);
        let mut rounds_run = 0;

        for round in 0..rounds_cap {
            rounds_run = round + 1;
            let mut this_round: Vec<AgentContribution> = Vec::new();
            let mut survivors: Vec<TutorAgent> = Vec::new();

            for agent in &agents {
                let prompt = if round == 0 {
                    question.to_string()
                } else {
                    TutorPromptTemplate::debate_round_prompt(question, round, &previous_round)
                };
                let request = agent_request(
                    agent,
                    Some(TutorPromptTemplate::collaborative_system_note()),
                    prompt,
                );

                let started = Instant::now();
                match self.gateway.complete(request).await {
                    Ok(response) => {
                        this_round.push(
                            AgentContribution::success(
                                agent.id.clone(),
                                agent.name.clone(),
                                response.text(),
                                started.elapsed().as_millis() as u64,
                                round,
                            )
                            .truncated(settings.max_response_length),
                        );
                        survivors.push(agent.clone());
                    }
                    Err(e) => {
                        warn!(agent = %agent.id, round, error = %e, "debate agent dropped");
                        this_round.push(AgentContribution::failure(
                            agent.id.clone(),
                            agent.name.clone(),
                            e.to_string(),
                            round,
                        ));
                    }
                }
            }

            previous_round = this_round.iter().filter(|c| c.success).cloned().collect();
            all_contributions.extend(this_round);
            agents = survivors;

            // A debate needs at least two voices.
            if agents.len() < 2 {
                debug!(round, "debate ended early: fewer than two participants left");
                break;
            }
        }

        (all_contributions, rounds_run)
    }

    /// Merge contributions into one assistant-visible response.
    ///
    /// Default is concatenation with attribution; a configured synthesizer
    /// agent replaces it with a dedicated call. A failed synthesizer call
    /// falls back to concatenation rather than failing the turn.
    async fn synthesize(
        &self,
        question: &str,
        contributions: &[AgentContribution],
        settings: &CollaborativeSettings,
    ) -> (String, bool) {
        let final_round = contributions.iter().map(|c| c.round).max().unwrap_or(0);
        let successes: Vec<AgentContribution> = contributions
            .iter()
            .filter(|c| c.success && c.round == final_round)
            .cloned()
            .collect();
        let concatenated = TutorPromptTemplate::concatenate_with_attribution(&successes);

        let Some(synthesizer_id) = &settings.synthesizer_agent_id else {
            return (concatenated, false);
        };
        let Ok(synthesizer) = self.directory.get_active(synthesizer_id) else {
            warn!(agent = %synthesizer_id, "synthesizer agent unavailable; concatenating");
            return (concatenated, false);
        };

        let request = CompletionRequest::new(vec![
            ChatMessage::system(TutorPromptTemplate::synthesis_system()),
            ChatMessage::user(TutorPromptTemplate::synthesis_prompt(question, &successes)),
        ])
        .with_params(synthesizer.params.clone());
        let request = apply_agent_target(request, synthesizer);

        match self.gateway.complete(request).await {
            Ok(response) => {
                let summary = response.text().to_string();
                if settings.show_individual_responses {
                    (format!("{summary}\n\n---\n\n{concatenated}"), true)
                } else {
                    (summary, true)
                }
            }
            Err(e) => {
                warn!(error = %e, "synthesis failed; falling back to concatenation");
                (concatenated, false)
            }
        }
    }
}

/// Build the completion request for one agent's contribution.
fn agent_request(
    agent: &TutorAgent,
    system_note: Option<&str>,
    user_prompt: String,
) -> CompletionRequest {
    let system = match system_note {
        Some(note) => format!("{}\n\n{note}", agent.persona_prompt()),
        None => agent.persona_prompt(),
    };
    let request = CompletionRequest::new(vec![
        ChatMessage::system(system),
        ChatMessage::user(user_prompt),
    ])
    .with_params(agent.params.clone());
    apply_agent_target(request, agent)
}

fn apply_agent_target(mut request: CompletionRequest, agent: &TutorAgent) -> CompletionRequest {
    if let Some(provider) = &agent.provider {
        request = request.with_provider(provider.clone());
    }
    if let Some(model) = &agent.model {
        request = request.with_model(model.clone());
    }
    request
}
