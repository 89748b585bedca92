//! Parameter adapter: the provider × parameter support matrix.
//!
//! Parameters the target provider does not support are silently dropped —
//! not defaulted, not rejected — so cross-provider callers need no
//! per-provider branches. The dropped names are returned for logging.
//! Fidelity over strictness, deliberately.
//!
//! The matrix is data, not code: adding a provider is a new [`MatrixRow`].
//! Reasoning-family models override the matrix: they reject sampling
//! parameters entirely and take their token limit under
//! `max_completion_tokens`.

use crate::provider::config::{ModelConfig, ProviderConfig, ProviderKind};
use crate::provider::request::{ChatMessage, CompletionRequest, Role};
use serde_json::{Map, Value, json};

/// A tunable generation parameter, as known to the support matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    Temperature,
    MaxTokens,
    TopP,
    TopK,
    FrequencyPenalty,
    PresencePenalty,
    Stop,
    Seed,
}

impl Param {
    /// Wire key for non-reasoning targets.
    pub fn wire_key(&self) -> &'static str {
        match self {
            Param::Temperature => "temperature",
            Param::MaxTokens => "max_tokens",
            Param::TopP => "top_p",
            Param::TopK => "top_k",
            Param::FrequencyPenalty => "frequency_penalty",
            Param::PresencePenalty => "presence_penalty",
            Param::Stop => "stop",
            Param::Seed => "seed",
        }
    }
}

/// One row of the support matrix: provider kind × parameter → supported.
#[derive(Debug, Clone, Copy)]
pub struct MatrixRow {
    pub kind: ProviderKind,
    pub temperature: bool,
    pub max_tokens: bool,
    pub top_p: bool,
    pub top_k: bool,
    pub frequency_penalty: bool,
    pub presence_penalty: bool,
    pub stop: bool,
    pub seed: bool,
}

impl MatrixRow {
    fn supports(&self, param: Param) -> bool {
        match param {
            Param::Temperature => self.temperature,
            Param::MaxTokens => self.max_tokens,
            Param::TopP => self.top_p,
            Param::TopK => self.top_k,
            Param::FrequencyPenalty => self.frequency_penalty,
            Param::PresencePenalty => self.presence_penalty,
            Param::Stop => self.stop,
            Param::Seed => self.seed,
        }
    }
}

#[rustfmt::skip]
const SUPPORT_MATRIX: &[MatrixRow] = &[
    //                                      kind  temp  max   top_p top_k freq  pres  stop  seed
    MatrixRow { kind: ProviderKind::OpenAi,     temperature: true,  max_tokens: true, top_p: true,  top_k: false, frequency_penalty: true,  presence_penalty: true,  stop: true, seed: true  },
    MatrixRow { kind: ProviderKind::Azure,      temperature: true,  max_tokens: true, top_p: true,  top_k: false, frequency_penalty: true,  presence_penalty: true,  stop: true, seed: true  },
    MatrixRow { kind: ProviderKind::Anthropic,  temperature: true,  max_tokens: true, top_p: true,  top_k: true,  frequency_penalty: false, presence_penalty: false, stop: true, seed: false },
    MatrixRow { kind: ProviderKind::Google,     temperature: true,  max_tokens: true, top_p: true,  top_k: true,  frequency_penalty: false, presence_penalty: false, stop: true, seed: false },
    MatrixRow { kind: ProviderKind::Mistral,    temperature: true,  max_tokens: true, top_p: true,  top_k: false, frequency_penalty: true,  presence_penalty: true,  stop: true, seed: true  },
    MatrixRow { kind: ProviderKind::Groq,       temperature: true,  max_tokens: true, top_p: true,  top_k: false, frequency_penalty: true,  presence_penalty: true,  stop: true, seed: true  },
    MatrixRow { kind: ProviderKind::DeepSeek,   temperature: true,  max_tokens: true, top_p: true,  top_k: false, frequency_penalty: true,  presence_penalty: true,  stop: true, seed: false },
    MatrixRow { kind: ProviderKind::Together,   temperature: true,  max_tokens: true, top_p: true,  top_k: true,  frequency_penalty: true,  presence_penalty: true,  stop: true, seed: true  },
    MatrixRow { kind: ProviderKind::Fireworks,  temperature: true,  max_tokens: true, top_p: true,  top_k: true,  frequency_penalty: true,  presence_penalty: true,  stop: true, seed: true  },
    MatrixRow { kind: ProviderKind::OpenRouter, temperature: true,  max_tokens: true, top_p: true,  top_k: true,  frequency_penalty: true,  presence_penalty: true,  stop: true, seed: true  },
    MatrixRow { kind: ProviderKind::Xai,        temperature: true,  max_tokens: true, top_p: true,  top_k: false, frequency_penalty: true,  presence_penalty: true,  stop: true, seed: true  },
    MatrixRow { kind: ProviderKind::Ollama,     temperature: true,  max_tokens: true, top_p: true,  top_k: true,  frequency_penalty: true,  presence_penalty: true,  stop: true, seed: true  },
];

/// Parameters a reasoning-family model rejects outright.
const REASONING_REJECTED: &[Param] = &[
    Param::Temperature,
    Param::TopP,
    Param::TopK,
    Param::FrequencyPenalty,
    Param::PresencePenalty,
    Param::Stop,
];

/// Renamed token-limit key for reasoning-family models.
const REASONING_MAX_TOKENS_KEY: &str = "max_completion_tokens";

/// Whether `kind` supports `param` according to the matrix.
pub fn supports(kind: ProviderKind, param: Param) -> bool {
    SUPPORT_MATRIX
        .iter()
        .find(|row| row.kind == kind)
        .map(|row| row.supports(param))
        .unwrap_or(false)
}

/// A provider-shaped request: only supported parameters remain, under their
/// wire keys, plus the dropped parameter names for logging.
#[derive(Debug, Clone)]
pub struct ShapedRequest {
    pub messages: Vec<ChatMessage>,
    pub params: Map<String, Value>,
    pub dropped: Vec<&'static str>,
}

/// Shape a request for the resolved (provider, model) pair.
///
/// Layering order for parameters: provider defaults, then model defaults,
/// then the request's own parameters. System messages are merged into one
/// when the target does not accept multiple.
pub fn shape_request(
    request: &CompletionRequest,
    provider: &ProviderConfig,
    model: &ModelConfig,
) -> ShapedRequest {
    let effective = provider
        .defaults
        .merged_with(&model.defaults)
        .merged_with(&request.params);
    let reasoning = model.is_reasoning();

    let mut params = Map::new();
    let mut dropped = Vec::new();

    let mut place = |param: Param, value: Option<Value>| {
        let Some(value) = value else { return };
        if reasoning && REASONING_REJECTED.contains(&param) {
            dropped.push(param.wire_key());
            return;
        }
        if !supports(provider.kind, param) {
            dropped.push(param.wire_key());
            return;
        }
        let key = if reasoning && param == Param::MaxTokens {
            REASONING_MAX_TOKENS_KEY
        } else {
            param.wire_key()
        };
        params.insert(key.to_string(), value);
    };

    place(Param::Temperature, effective.temperature.map(|v| json!(v)));
    place(Param::MaxTokens, effective.max_tokens.map(|v| json!(v)));
    place(Param::TopP, effective.top_p.map(|v| json!(v)));
    place(Param::TopK, effective.top_k.map(|v| json!(v)));
    place(
        Param::FrequencyPenalty,
        effective.frequency_penalty.map(|v| json!(v)),
    );
    place(
        Param::PresencePenalty,
        effective.presence_penalty.map(|v| json!(v)),
    );
    place(Param::Stop, effective.stop.as_ref().map(|v| json!(v)));
    place(Param::Seed, effective.seed.map(|v| json!(v)));

    let messages = if model.effective_capabilities(provider).multi_system_message {
        request.messages.clone()
    } else {
        merge_system_messages(&request.messages)
    };

    ShapedRequest {
        messages,
        params,
        dropped,
    }
}

/// Collapse all system messages into a single leading one, preserving the
/// relative order of everything else.
fn merge_system_messages(messages: &[ChatMessage]) -> Vec<ChatMessage> {
    let system_count = messages.iter().filter(|m| m.role == Role::System).count();
    if system_count <= 1 {
        return messages.to_vec();
    }

    let merged = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut out = Vec::with_capacity(messages.len() - system_count + 1);
    out.push(ChatMessage::system(merged));
    out.extend(
        messages
            .iter()
            .filter(|m| m.role != Role::System)
            .cloned(),
    );
    out
}
