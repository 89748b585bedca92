//! Router decision value objects.

use crate::agent::entities::AgentId;
use serde::{Deserialize, Serialize};

/// Why the router picked the agent it picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteReason {
    /// The agent scored highest and cleared the confidence floor.
    BestMatch,
    /// No agent cleared the floor; the directory fallback was used.
    Fallback,
}

/// One agent's score for a message, confidence in [0, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentScore {
    pub agent_id: AgentId,
    pub confidence: f64,
}

/// The router's choice for one turn, with runner-ups for observability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteDecision {
    pub agent_id: AgentId,
    pub reason: RouteReason,
    pub confidence: f64,
    /// Up to N runner-up candidates, best first.
    pub alternatives: Vec<AgentScore>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(RouteReason::Fallback).unwrap(),
            serde_json::json!("fallback")
        );
        assert_eq!(
            serde_json::to_value(RouteReason::BestMatch).unwrap(),
            serde_json::json!("best_match")
        );
    }
}
