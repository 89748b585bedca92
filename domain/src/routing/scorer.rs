//! Agent scoring strategies.
//!
//! The router ranks active agents with a pluggable [`AgentScorer`]; the
//! default [`KeywordScorer`] matches the message against each agent's
//! subject keywords and description. Selection itself (tie-breaking,
//! confidence floor, fallback) lives in [`select_agent`] so every strategy
//! shares the same deterministic rules.

use crate::agent::directory::AgentDirectory;
use crate::agent::entities::TutorAgent;
use crate::core::error::DomainError;
use crate::routing::decision::{AgentScore, RouteDecision, RouteReason};

/// Maximum runner-ups carried on a decision.
const MAX_ALTERNATIVES: usize = 3;

/// A swappable scoring strategy: message × agent → confidence in [0, 1].
pub trait AgentScorer: Send + Sync {
    fn score(&self, message: &str, agent: &TutorAgent) -> f64;
}

/// Default strategy: keyword and description word match.
///
/// Score = matched keywords weighted 2:1 against matched description words,
/// normalized into [0, 1]. Case-insensitive, whole-word.
#[derive(Debug, Clone, Default)]
pub struct KeywordScorer;

impl KeywordScorer {
    fn words(text: &str) -> Vec<String> {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(|w| w.to_lowercase())
            .collect()
    }
}

impl AgentScorer for KeywordScorer {
    fn score(&self, message: &str, agent: &TutorAgent) -> f64 {
        let message_words = Self::words(message);
        if message_words.is_empty() {
            return 0.0;
        }

        let keyword_hits = agent
            .keywords
            .iter()
            .filter(|k| message_words.contains(&k.to_lowercase()))
            .count();

        let description_words = Self::words(&agent.description);
        let description_hits = description_words
            .iter()
            .filter(|w| w.len() > 3 && message_words.contains(*w))
            .count();

        let keyword_part = if agent.keywords.is_empty() {
            0.0
        } else {
            keyword_hits as f64 / agent.keywords.len() as f64
        };
        let description_part = if description_words.is_empty() {
            0.0
        } else {
            description_hits as f64 / description_words.len() as f64
        };

        ((2.0 * keyword_part + description_part) / 3.0).clamp(0.0, 1.0)
    }
}

/// Score all active agents and pick one.
///
/// Deterministic: the highest confidence wins, ties break to the lowest
/// agent id. When no agent clears `confidence_floor` the directory fallback
/// is chosen and the decision carries `reason == Fallback`.
pub fn select_agent(
    scorer: &dyn AgentScorer,
    directory: &AgentDirectory,
    message: &str,
    confidence_floor: f64,
) -> Result<RouteDecision, DomainError> {
    let candidates = directory.list(true);
    if candidates.is_empty() {
        return Err(DomainError::NoAgents);
    }

    let mut scores: Vec<AgentScore> = candidates
        .iter()
        .map(|agent| AgentScore {
            agent_id: agent.id.clone(),
            confidence: scorer.score(message, agent),
        })
        .collect();

    // Highest confidence first; equal confidence orders by lowest id.
    scores.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.agent_id.cmp(&b.agent_id))
    });

    let best = scores[0].clone();
    let alternatives: Vec<AgentScore> = scores
        .iter()
        .skip(1)
        .take(MAX_ALTERNATIVES)
        .cloned()
        .collect();

    if best.confidence >= confidence_floor {
        Ok(RouteDecision {
            agent_id: best.agent_id,
            reason: RouteReason::BestMatch,
            confidence: best.confidence,
            alternatives,
        })
    } else {
        let fallback = directory.fallback_agent()?;
        Ok(RouteDecision {
            agent_id: fallback.id.clone(),
            reason: RouteReason::Fallback,
            confidence: best.confidence,
            alternatives,
        })
    }
}
