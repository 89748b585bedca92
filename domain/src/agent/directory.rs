//! Read-mostly catalog of tutor agents.
//!
//! No orchestration logic lives here; the directory only answers
//! `list` / `get` and knows which agent is the router fallback.

use crate::agent::entities::{AgentId, TutorAgent};
use crate::core::error::DomainError;

/// In-memory agent catalog, loaded at startup from configuration.
#[derive(Debug, Clone, Default)]
pub struct AgentDirectory {
    agents: Vec<TutorAgent>,
    /// Agent the router falls back to when no score clears the floor.
    fallback_agent_id: Option<AgentId>,
}

impl AgentDirectory {
    pub fn new(agents: Vec<TutorAgent>) -> Self {
        Self {
            agents,
            fallback_agent_id: None,
        }
    }

    pub fn with_fallback(mut self, agent_id: impl Into<AgentId>) -> Self {
        self.fallback_agent_id = Some(agent_id.into());
        self
    }

    /// List agents, optionally restricted to active ones.
    pub fn list(&self, active_only: bool) -> Vec<&TutorAgent> {
        self.agents
            .iter()
            .filter(|a| !active_only || a.active)
            .collect()
    }

    /// Look up an agent by id.
    pub fn get(&self, id: &str) -> Result<&TutorAgent, DomainError> {
        self.agents
            .iter()
            .find(|a| a.id == id)
            .ok_or_else(|| DomainError::AgentNotFound(id.to_string()))
    }

    /// Look up an agent that must be active to receive a message.
    pub fn get_active(&self, id: &str) -> Result<&TutorAgent, DomainError> {
        let agent = self.get(id)?;
        if !agent.active {
            return Err(DomainError::AgentInactive(id.to_string()));
        }
        Ok(agent)
    }

    /// The configured fallback agent, or the first active agent.
    pub fn fallback_agent(&self) -> Result<&TutorAgent, DomainError> {
        if let Some(id) = &self.fallback_agent_id {
            return self.get_active(id);
        }
        self.agents
            .iter()
            .find(|a| a.active)
            .ok_or(DomainError::NoAgents)
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> AgentDirectory {
        let mut inactive = TutorAgent::new("latin", "Latin Tutor");
        inactive.active = false;
        AgentDirectory::new(vec![
            TutorAgent::new("math", "Math Tutor"),
            TutorAgent::new("history", "History Tutor"),
            inactive,
        ])
    }

    #[test]
    fn test_list_active_only_filters() {
        let dir = directory();
        assert_eq!(dir.list(false).len(), 3);
        assert_eq!(dir.list(true).len(), 2);
    }

    #[test]
    fn test_get_unknown_agent() {
        let dir = directory();
        assert!(matches!(
            dir.get("astrology"),
            Err(DomainError::AgentNotFound(_))
        ));
    }

    #[test]
    fn test_get_active_rejects_inactive() {
        let dir = directory();
        assert!(dir.get("latin").is_ok());
        assert!(matches!(
            dir.get_active("latin"),
            Err(DomainError::AgentInactive(_))
        ));
    }

    #[test]
    fn test_fallback_prefers_configured_agent() {
        let dir = directory().with_fallback("history");
        assert_eq!(dir.fallback_agent().unwrap().id, "history");

        let dir = directory();
        assert_eq!(dir.fallback_agent().unwrap().id, "math");
    }
}
