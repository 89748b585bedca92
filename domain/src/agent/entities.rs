//! Tutor agent domain entities

use crate::provider::config::GenerationParams;
use serde::{Deserialize, Serialize};

/// Identifier of a tutor agent.
///
/// Ordered lexicographically; router tie-breaking picks the lowest id.
pub type AgentId = String;

/// A tutoring persona: prompt plus generation defaults, independent of
/// which provider ultimately serves it (Entity, read-mostly).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TutorAgent {
    pub id: AgentId,
    pub name: String,
    /// Short description of what this agent teaches; the keyword scorer
    /// matches user messages against it.
    pub description: String,
    /// Subject keywords used by the router's scoring strategy.
    #[serde(default)]
    pub keywords: Vec<String>,
    pub system_prompt: String,
    /// One-line personality note appended to the system prompt.
    #[serde(default)]
    pub personality: Option<String>,
    /// Generation overrides for this persona (typically temperature).
    #[serde(default)]
    pub params: GenerationParams,
    /// Shown when a conversation with this agent is first created.
    #[serde(default)]
    pub welcome_message: Option<String>,
    /// Preferred provider override; `None` uses the registry default.
    #[serde(default)]
    pub provider: Option<String>,
    /// Preferred model override; `None` uses the provider default.
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_true")]
    pub active: bool,
}

fn default_true() -> bool {
    true
}

impl TutorAgent {
    pub fn new(id: impl Into<AgentId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            keywords: Vec::new(),
            system_prompt: String::new(),
            personality: None,
            params: GenerationParams::default(),
            welcome_message: None,
            provider: None,
            model: None,
            active: true,
        }
    }

    pub fn with_keywords(mut self, keywords: &[&str]) -> Self {
        self.keywords = keywords.iter().map(|k| k.to_string()).collect();
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Full system prompt including the personality note.
    pub fn persona_prompt(&self) -> String {
        match &self.personality {
            Some(personality) => format!("{}\n\nPersonality: {}", self.system_prompt, personality),
            None => self.system_prompt.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persona_prompt_includes_personality() {
        let agent = TutorAgent::new("math", "Math Tutor")
            .with_system_prompt("You teach mathematics.");
        assert_eq!(agent.persona_prompt(), "You teach mathematics.");

        let mut agent = agent;
        agent.personality = Some("patient and rigorous".to_string());
        let prompt = agent.persona_prompt();
        assert!(prompt.contains("You teach mathematics."));
        assert!(prompt.contains("patient and rigorous"));
    }
}
