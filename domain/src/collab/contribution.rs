//! Contribution records for collaborative turns.
//!
//! These value objects are transient: they live for one turn and are then
//! serialized into the assistant message's metadata for audit.

use crate::agent::entities::AgentId;
use crate::collab::settings::CollaborationStyle;
use serde::{Deserialize, Serialize};

/// One agent's output within a collaborative turn.
///
/// Failed contributions are retained with `success == false` so the audit
/// trail shows who was asked, not only who answered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentContribution {
    pub agent_id: AgentId,
    pub agent_name: String,
    pub text: String,
    pub latency_ms: u64,
    /// Debate round this contribution belongs to (0 for other styles).
    pub round: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentContribution {
    pub fn success(
        agent_id: impl Into<AgentId>,
        agent_name: impl Into<String>,
        text: impl Into<String>,
        latency_ms: u64,
        round: usize,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            agent_name: agent_name.into(),
            text: text.into(),
            latency_ms,
            round,
            success: true,
            error: None,
        }
    }

    pub fn failure(
        agent_id: impl Into<AgentId>,
        agent_name: impl Into<String>,
        error: impl Into<String>,
        round: usize,
    ) -> Self {
        Self {
            agent_id: agent_id.into(),
            agent_name: agent_name.into(),
            text: String::new(),
            latency_ms: 0,
            round,
            success: false,
            error: Some(error.into()),
        }
    }

    /// Truncate the contribution text to at most `limit` characters,
    /// respecting char boundaries.
    pub fn truncated(mut self, limit: usize) -> Self {
        if self.text.chars().count() > limit {
            self.text = self.text.chars().take(limit).collect();
        }
        self
    }
}

/// Summary of a collaborative turn, serialized into message metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollaborativeInfo {
    pub style: CollaborationStyle,
    pub agent_ids: Vec<AgentId>,
    pub contributions: Vec<AgentContribution>,
    /// Number of debate rounds actually run (1 for other styles).
    pub rounds: usize,
    /// Whether a synthesizer call produced the combined answer.
    pub synthesized: bool,
}

impl CollaborativeInfo {
    /// Contributions that succeeded, in arrival order.
    pub fn successful(&self) -> impl Iterator<Item = &AgentContribution> {
        self.contributions.iter().filter(|c| c.success)
    }
}
