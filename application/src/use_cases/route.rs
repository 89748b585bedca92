//! Router turn use case
//!
//! Thin policy wrapper around the domain scoring strategy: holds the
//! configured scorer and confidence floor, and logs each decision.

use std::sync::Arc;
use tracing::debug;
use tutormesh_domain::{
    AgentDirectory, AgentScorer, DomainError, KeywordScorer, RouteDecision, select_agent,
};

/// Default minimum confidence before the fallback agent is used.
pub const DEFAULT_CONFIDENCE_FLOOR: f64 = 0.15;

/// Per-turn single-agent selection.
pub struct AgentRouter {
    scorer: Box<dyn AgentScorer>,
    directory: Arc<AgentDirectory>,
    confidence_floor: f64,
}

impl AgentRouter {
    pub fn new(directory: Arc<AgentDirectory>) -> Self {
        Self {
            scorer: Box::new(KeywordScorer),
            directory,
            confidence_floor: DEFAULT_CONFIDENCE_FLOOR,
        }
    }

    pub fn with_scorer(mut self, scorer: Box<dyn AgentScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    pub fn with_confidence_floor(mut self, floor: f64) -> Self {
        self.confidence_floor = floor;
        self
    }

    /// Pick the agent for this message.
    pub fn route(&self, message: &str) -> Result<RouteDecision, DomainError> {
        let decision = select_agent(
            self.scorer.as_ref(),
            &self.directory,
            message,
            self.confidence_floor,
        )?;
        debug!(
            agent = %decision.agent_id,
            reason = ?decision.reason,
            confidence = decision.confidence,
            "routed turn"
        );
        Ok(decision)
    }
}
