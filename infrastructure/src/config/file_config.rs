//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Providers, models, and agents are keyed by name in the file, so the raw
//! types omit the name field and gain it back during conversion to the
//! domain entities.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tutormesh_domain::{
    AgentDirectory, Capabilities, CollaborativeSettings, GenerationParams, ModelConfig,
    ProviderConfig, ProviderKind, ProviderLimits, TutorAgent,
};

/// Configuration validation errors
#[derive(Debug, Error)]
pub enum ConfigValidationError {
    #[error("provider '{0}': unknown kind '{1}'")]
    UnknownProviderKind(String, String),

    #[error("provider '{0}': base_url cannot be empty")]
    EmptyBaseUrl(String),

    #[error("agent '{0}': system_prompt cannot be empty")]
    EmptySystemPrompt(String),

    #[error("routing fallback agent '{0}' is not defined under [agents]")]
    UnknownFallbackAgent(String),
}

/// Raw provider entry under `[providers.<name>]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProviderConfig {
    /// Wire-protocol family, e.g. "openai", "anthropic", "ollama".
    pub kind: String,
    pub base_url: String,
    pub display_name: Option<String>,
    pub api_key: String,
    pub api_key_env: Option<String>,
    pub defaults: GenerationParams,
    pub limits: ProviderLimits,
    pub capabilities: Capabilities,
    pub enabled: bool,
    pub is_default: bool,
    pub priority: u32,
}

impl Default for FileProviderConfig {
    fn default() -> Self {
        Self {
            kind: "openai".to_string(),
            base_url: String::new(),
            display_name: None,
            api_key: String::new(),
            api_key_env: None,
            defaults: GenerationParams::default(),
            limits: ProviderLimits::default(),
            capabilities: Capabilities::default(),
            enabled: true,
            is_default: false,
            priority: 100,
        }
    }
}

impl FileProviderConfig {
    fn into_provider(self, name: &str) -> Result<ProviderConfig, ConfigValidationError> {
        let kind: ProviderKind = self.kind.parse().map_err(|_| {
            ConfigValidationError::UnknownProviderKind(name.to_string(), self.kind.clone())
        })?;
        if self.base_url.trim().is_empty() {
            return Err(ConfigValidationError::EmptyBaseUrl(name.to_string()));
        }
        let mut provider = ProviderConfig::new(name, kind, self.base_url);
        provider.display_name = self.display_name.unwrap_or_else(|| name.to_string());
        provider.api_key = self.api_key;
        provider.api_key_env = self.api_key_env;
        provider.defaults = self.defaults;
        provider.limits = self.limits;
        provider.capabilities = self.capabilities;
        provider.enabled = self.enabled;
        provider.is_default = self.is_default;
        provider.priority = self.priority;
        Ok(provider)
    }
}

/// Raw model entry under `[models."<id>"]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelConfig {
    /// Name of the owning provider.
    pub provider: String,
    pub display_name: Option<String>,
    pub capabilities: Option<Capabilities>,
    pub defaults: GenerationParams,
    pub reasoning: bool,
    pub is_default: bool,
}

impl FileModelConfig {
    fn into_model(self, id: &str) -> ModelConfig {
        let mut model = ModelConfig::new(self.provider, id);
        if let Some(display_name) = self.display_name {
            model.display_name = display_name;
        }
        model.capabilities = self.capabilities;
        model.defaults = self.defaults;
        model.reasoning = self.reasoning;
        model.is_default = self.is_default;
        model
    }
}

/// Raw agent entry under `[agents.<id>]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAgentConfig {
    pub name: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub system_prompt: String,
    pub personality: Option<String>,
    pub params: GenerationParams,
    pub welcome_message: Option<String>,
    pub provider: Option<String>,
    pub model: Option<String>,
    pub active: bool,
}

impl Default for FileAgentConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
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
}

impl FileAgentConfig {
    fn into_agent(self, id: &str) -> Result<TutorAgent, ConfigValidationError> {
        if self.system_prompt.trim().is_empty() {
            return Err(ConfigValidationError::EmptySystemPrompt(id.to_string()));
        }
        let mut agent = TutorAgent::new(id, if self.name.is_empty() {
            id.to_string()
        } else {
            self.name
        });
        agent.description = self.description;
        agent.keywords = self.keywords;
        agent.system_prompt = self.system_prompt;
        agent.personality = self.personality;
        agent.params = self.params;
        agent.welcome_message = self.welcome_message;
        agent.provider = self.provider;
        agent.model = self.model;
        agent.active = self.active;
        Ok(agent)
    }
}

/// Raw routing configuration under `[routing]`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRoutingConfig {
    /// Scores below this route to the fallback agent.
    pub confidence_floor: f64,
    /// Agent that receives unroutable turns.
    pub fallback_agent: Option<String>,
}

impl Default for FileRoutingConfig {
    fn default() -> Self {
        Self {
            confidence_floor: 0.15,
            fallback_agent: None,
        }
    }
}

/// Raw audit configuration under `[audit]`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAuditConfig {
    /// Path of the JSONL turn log; audit is disabled when unset.
    pub path: Option<String>,
}

/// Top-level TOML configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub providers: BTreeMap<String, FileProviderConfig>,
    pub models: BTreeMap<String, FileModelConfig>,
    pub agents: BTreeMap<String, FileAgentConfig>,
    pub collaboration: CollaborativeSettings,
    pub routing: FileRoutingConfig,
    pub audit: FileAuditConfig,
}

impl FileConfig {
    /// Convert the raw file shape into domain entities.
    ///
    /// Exactly-one-default and model-ownership checks live in the registry;
    /// this step only validates what the registry cannot see.
    pub fn into_parts(
        self,
    ) -> Result<(Vec<ProviderConfig>, Vec<ModelConfig>, AgentDirectory), ConfigValidationError>
    {
        let providers = self
            .providers
            .into_iter()
            .map(|(name, raw)| raw.into_provider(&name))
            .collect::<Result<Vec<_>, _>>()?;

        let models = self
            .models
            .into_iter()
            .map(|(id, raw)| raw.into_model(&id))
            .collect::<Vec<_>>();

        let agents = self
            .agents
            .into_iter()
            .map(|(id, raw)| raw.into_agent(&id))
            .collect::<Result<Vec<_>, _>>()?;

        let mut directory = AgentDirectory::new(agents);
        if let Some(fallback) = &self.routing.fallback_agent {
            if directory.get(fallback).is_err() {
                return Err(ConfigValidationError::UnknownFallbackAgent(fallback.clone()));
            }
            directory = directory.with_fallback(fallback.clone());
        }

        Ok((providers, models, directory))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FileConfig {
        toml::from_str(
            r#"
            [providers.openai]
            kind = "openai"
            base_url = "https://api.openai.com/v1"
            api_key_env = "OPENAI_API_KEY"
            is_default = true

            [providers.local]
            kind = "ollama"
            base_url = "http://localhost:11434/v1"
            priority = 10

            [models."gpt-4.1"]
            provider = "openai"
            is_default = true

            [models."o3-mini"]
            provider = "openai"
            reasoning = true

            [agents.math-tutor]
            name = "Math Tutor"
            description = "Algebra, geometry, and calculus help"
            keywords = ["algebra", "calculus"]
            system_prompt = "You are a patient math tutor."
            welcome_message = "Hi! Ready to work through some math?"

            [agents.general]
            name = "Study Buddy"
            system_prompt = "You help with any subject."

            [routing]
            confidence_floor = 0.2
            fallback_agent = "general"

            [collaboration]
            style = "sequential"
            max_agents = 2
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_sample_converts_to_domain_entities() {
        let config = sample();
        assert_eq!(config.routing.confidence_floor, 0.2);
        let collaboration = config.collaboration.clone();
        let (providers, models, directory) = config.into_parts().unwrap();

        assert_eq!(providers.len(), 2);
        let openai = providers.iter().find(|p| p.name == "openai").unwrap();
        assert!(openai.is_default);
        assert_eq!(openai.api_key_env.as_deref(), Some("OPENAI_API_KEY"));

        assert_eq!(models.len(), 2);
        assert!(models.iter().any(|m| m.id == "o3-mini" && m.reasoning));

        assert_eq!(directory.list(false).len(), 2);
        let fallback = directory.fallback_agent().unwrap();
        assert_eq!(fallback.id, "general");

        assert_eq!(collaboration.max_agents, 2);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let config: FileConfig = toml::from_str(
            r#"
            [providers.bad]
            kind = "carrier-pigeon"
            base_url = "http://example.com"
            "#,
        )
        .unwrap();
        assert!(matches!(
            config.into_parts(),
            Err(ConfigValidationError::UnknownProviderKind(_, _))
        ));
    }

    #[test]
    fn test_empty_base_url_rejected() {
        let config: FileConfig = toml::from_str(
            r#"
            [providers.bad]
            kind = "openai"
            "#,
        )
        .unwrap();
        assert!(matches!(
            config.into_parts(),
            Err(ConfigValidationError::EmptyBaseUrl(_))
        ));
    }

    #[test]
    fn test_agent_without_prompt_rejected() {
        let config: FileConfig = toml::from_str(
            r#"
            [agents.mute]
            name = "Mute"
            "#,
        )
        .unwrap();
        assert!(matches!(
            config.into_parts(),
            Err(ConfigValidationError::EmptySystemPrompt(_))
        ));
    }

    #[test]
    fn test_unknown_fallback_rejected() {
        let config: FileConfig = toml::from_str(
            r#"
            [routing]
            fallback_agent = "ghost"
            "#,
        )
        .unwrap();
        assert!(matches!(
            config.into_parts(),
            Err(ConfigValidationError::UnknownFallbackAgent(_))
        ));
    }
}
