//! Provider and model configuration entities.
//!
//! These types are provider-neutral: every backend is described by the same
//! [`ProviderConfig`] shape plus a [`ProviderKind`] tag. Adding a provider is
//! a configuration change and a row in the parameter support matrix
//! ([`crate::provider::params`]), not a new type hierarchy.

use crate::provider::health::HealthState;
use crate::provider::usage::UsageCounters;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Wire-protocol family a provider speaks.
///
/// The tag drives parameter shaping and error mapping through one generic
/// call path; there is no per-provider adapter type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    OpenAi,
    Azure,
    Anthropic,
    Google,
    Mistral,
    Groq,
    DeepSeek,
    Together,
    Fireworks,
    OpenRouter,
    Xai,
    Ollama,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Azure => "azure",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Google => "google",
            ProviderKind::Mistral => "mistral",
            ProviderKind::Groq => "groq",
            ProviderKind::DeepSeek => "deepseek",
            ProviderKind::Together => "together",
            ProviderKind::Fireworks => "fireworks",
            ProviderKind::OpenRouter => "openrouter",
            ProviderKind::Xai => "xai",
            ProviderKind::Ollama => "ollama",
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "openai" => Ok(ProviderKind::OpenAi),
            "azure" => Ok(ProviderKind::Azure),
            "anthropic" => Ok(ProviderKind::Anthropic),
            "google" | "gemini" => Ok(ProviderKind::Google),
            "mistral" => Ok(ProviderKind::Mistral),
            "groq" => Ok(ProviderKind::Groq),
            "deepseek" => Ok(ProviderKind::DeepSeek),
            "together" => Ok(ProviderKind::Together),
            "fireworks" => Ok(ProviderKind::Fireworks),
            "openrouter" => Ok(ProviderKind::OpenRouter),
            "xai" | "grok" => Ok(ProviderKind::Xai),
            "ollama" => Ok(ProviderKind::Ollama),
            other => Err(format!("unknown provider kind: {other}")),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capability flags for a provider or a specific model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    pub streaming: bool,
    pub vision: bool,
    pub function_calling: bool,
    pub json_mode: bool,
    /// Whether the backend accepts more than one system message per request.
    /// When false, system messages are merged during shaping.
    pub multi_system_message: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            streaming: true,
            vision: false,
            function_calling: false,
            json_mode: false,
            multi_system_message: false,
        }
    }
}

/// Generation parameters, all optional so that per-model overrides and
/// per-request overrides can layer over provider defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GenerationParams {
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
    pub top_p: Option<f64>,
    pub top_k: Option<u32>,
    pub frequency_penalty: Option<f64>,
    pub presence_penalty: Option<f64>,
    pub stop: Option<Vec<String>>,
    pub seed: Option<u64>,
}

impl GenerationParams {
    /// Layer `other` over `self`: any parameter set in `other` wins.
    pub fn merged_with(&self, other: &GenerationParams) -> GenerationParams {
        GenerationParams {
            temperature: other.temperature.or(self.temperature),
            max_tokens: other.max_tokens.or(self.max_tokens),
            top_p: other.top_p.or(self.top_p),
            top_k: other.top_k.or(self.top_k),
            frequency_penalty: other.frequency_penalty.or(self.frequency_penalty),
            presence_penalty: other.presence_penalty.or(self.presence_penalty),
            stop: other.stop.clone().or_else(|| self.stop.clone()),
            seed: other.seed.or(self.seed),
        }
    }
}

/// Operational limits for a provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderLimits {
    /// Maximum context window in tokens.
    pub context_length: u32,
    /// Per-attempt timeout in milliseconds.
    pub request_timeout_ms: u64,
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Base delay before the first retry, in milliseconds.
    pub retry_delay_ms: u64,
    /// Multiplier applied per attempt: `delay * multiplier^attempt`.
    pub backoff_multiplier: f64,
    /// Maximum in-flight requests to this provider; excess calls queue FIFO.
    pub concurrency_limit: usize,
    /// Rate limit window, requests per minute (informational; enforced upstream).
    pub requests_per_minute: Option<u32>,
    /// Consecutive terminal failures before the provider is marked unhealthy.
    pub unhealthy_threshold: u32,
    /// Interval between health probes, in milliseconds.
    pub health_check_interval_ms: u64,
    /// Whether the health monitor probes this provider at all.
    pub health_checks_enabled: bool,
}

impl Default for ProviderLimits {
    fn default() -> Self {
        Self {
            context_length: 128_000,
            request_timeout_ms: 60_000,
            max_retries: 3,
            retry_delay_ms: 500,
            backoff_multiplier: 2.0,
            concurrency_limit: 8,
            requests_per_minute: None,
            unhealthy_threshold: 3,
            health_check_interval_ms: 60_000,
            health_checks_enabled: true,
        }
    }
}

impl ProviderLimits {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn health_check_interval(&self) -> Duration {
        Duration::from_millis(self.health_check_interval_ms)
    }
}

/// One external model backend (Entity).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Unique provider name, e.g. "openai-prod".
    pub name: String,
    pub display_name: String,
    pub kind: ProviderKind,
    pub base_url: String,
    /// API key; empty for keyless local backends (e.g. Ollama).
    #[serde(default)]
    pub api_key: String,
    /// Environment variable consulted when `api_key` is empty.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default)]
    pub defaults: GenerationParams,
    #[serde(default)]
    pub limits: ProviderLimits,
    #[serde(default)]
    pub capabilities: Capabilities,
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Exactly one provider may be the default at a time.
    #[serde(default)]
    pub is_default: bool,
    /// Lower value wins during default-resolution fallback.
    #[serde(default)]
    pub priority: u32,
    #[serde(default)]
    pub health: HealthState,
    #[serde(default)]
    pub usage: UsageCounters,
}

fn default_true() -> bool {
    true
}

impl ProviderConfig {
    pub fn new(name: impl Into<String>, kind: ProviderKind, base_url: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            display_name: name.clone(),
            name,
            kind,
            base_url: base_url.into(),
            api_key: String::new(),
            api_key_env: None,
            defaults: GenerationParams::default(),
            limits: ProviderLimits::default(),
            capabilities: Capabilities::default(),
            enabled: true,
            is_default: false,
            priority: 100,
            health: HealthState::default(),
            usage: UsageCounters::default(),
        }
    }

    pub fn with_default(mut self, is_default: bool) -> Self {
        self.is_default = is_default;
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }
}

/// One addressable model under a provider (Entity).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Name of the owning provider.
    pub provider: String,
    /// Wire identifier, e.g. "gpt-5-mini".
    pub id: String,
    pub display_name: String,
    /// Capability overrides; `None` inherits from the provider.
    #[serde(default)]
    pub capabilities: Option<Capabilities>,
    #[serde(default)]
    pub defaults: GenerationParams,
    /// Marks reasoning-family models that reject sampling parameters
    /// and use a renamed token-limit key.
    #[serde(default)]
    pub reasoning: bool,
    /// At most one model per provider is the default.
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub usage: UsageCounters,
}

/// Model id prefixes treated as reasoning-family even without the
/// explicit `reasoning` flag.
const REASONING_PREFIXES: &[&str] = &["o1", "o3", "o4-mini", "deepseek-reasoner"];

impl ModelConfig {
    pub fn new(provider: impl Into<String>, id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            provider: provider.into(),
            display_name: id.clone(),
            id,
            capabilities: None,
            defaults: GenerationParams::default(),
            reasoning: false,
            is_default: false,
            usage: UsageCounters::default(),
        }
    }

    pub fn with_default(mut self, is_default: bool) -> Self {
        self.is_default = is_default;
        self
    }

    /// Whether this model belongs to a reasoning-only family.
    pub fn is_reasoning(&self) -> bool {
        self.reasoning
            || REASONING_PREFIXES
                .iter()
                .any(|p| self.id.starts_with(p))
    }

    /// Effective capabilities after applying the model override.
    pub fn effective_capabilities(&self, provider: &ProviderConfig) -> Capabilities {
        self.capabilities.unwrap_or(provider.capabilities)
    }
}
