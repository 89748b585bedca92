//! Per-turn collaborative settings.

use crate::agent::entities::AgentId;
use serde::{Deserialize, Serialize};

/// How participating agents are coordinated within one collaborative turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollaborationStyle {
    /// Concurrent fan-out; all contributions joined at the end.
    #[default]
    Parallel,
    /// Each agent sees the running transcript of prior contributions.
    Sequential,
    /// Bounded rebuttal rounds; every round sees the previous round.
    Debate,
    /// Seeded-random subset of agents, then parallel.
    Random,
}

impl CollaborationStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollaborationStyle::Parallel => "parallel",
            CollaborationStyle::Sequential => "sequential",
            CollaborationStyle::Debate => "debate",
            CollaborationStyle::Random => "random",
        }
    }
}

impl std::str::FromStr for CollaborationStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "parallel" => Ok(CollaborationStyle::Parallel),
            "sequential" => Ok(CollaborationStyle::Sequential),
            "debate" => Ok(CollaborationStyle::Debate),
            "random" => Ok(CollaborationStyle::Random),
            other => Err(format!("unknown collaboration style: {other}")),
        }
    }
}

/// Transient settings for one collaborative turn (Value Object).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollaborativeSettings {
    #[serde(default)]
    pub style: CollaborationStyle,
    /// Explicit participants; `None` means all active agents.
    #[serde(default)]
    pub selected_agent_ids: Option<Vec<AgentId>>,
    #[serde(default = "default_max_agents")]
    pub max_agents: usize,
    /// Per-contribution truncation limit in characters.
    #[serde(default = "default_max_response_length")]
    pub max_response_length: usize,
    /// Whether individual contributions appear in the combined response.
    #[serde(default = "default_true")]
    pub show_individual_responses: bool,
    /// Round cap for the debate style.
    #[serde(default = "default_debate_rounds")]
    pub debate_rounds: usize,
    /// RNG seed for the random style; explicit for reproducibility.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Agent that synthesizes the combined answer; `None` concatenates
    /// contributions with attribution.
    #[serde(default)]
    pub synthesizer_agent_id: Option<AgentId>,
    /// Overall turn deadline for concurrent styles, in milliseconds.
    #[serde(default)]
    pub turn_timeout_ms: Option<u64>,
}

fn default_max_agents() -> usize {
    3
}

fn default_max_response_length() -> usize {
    500
}

fn default_debate_rounds() -> usize {
    2
}

fn default_true() -> bool {
    true
}

impl Default for CollaborativeSettings {
    fn default() -> Self {
        Self {
            style: CollaborationStyle::default(),
            selected_agent_ids: None,
            max_agents: default_max_agents(),
            max_response_length: default_max_response_length(),
            show_individual_responses: true,
            debate_rounds: default_debate_rounds(),
            seed: None,
            synthesizer_agent_id: None,
            turn_timeout_ms: None,
        }
    }
}

impl CollaborativeSettings {
    pub fn with_style(mut self, style: CollaborationStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_agents(mut self, ids: Vec<AgentId>) -> Self {
        self.selected_agent_ids = Some(ids);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = CollaborativeSettings::default();
        assert_eq!(settings.style, CollaborationStyle::Parallel);
        assert_eq!(settings.max_agents, 3);
        assert_eq!(settings.max_response_length, 500);
        assert_eq!(settings.debate_rounds, 2);
        assert!(settings.show_individual_responses);
    }

    #[test]
    fn test_style_round_trip() {
        for style in [
            CollaborationStyle::Parallel,
            CollaborationStyle::Sequential,
            CollaborationStyle::Debate,
            CollaborationStyle::Random,
        ] {
            let parsed: CollaborationStyle = style.as_str().parse().unwrap();
            assert_eq!(parsed, style);
        }
    }
}
