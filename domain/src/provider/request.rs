//! Completion request/response value objects.
//!
//! A [`CompletionRequest`] is immutable once constructed; it yields exactly
//! one [`CompletionResponse`] or one typed [`crate::provider::error::ProviderError`],
//! never both.

use crate::provider::config::GenerationParams;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Role of a message in a completion request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// A role-tagged message in a completion request (Value Object)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A function/tool declaration carried on a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDeclaration {
    pub name: String,
    pub description: String,
    /// JSON schema of the tool parameters.
    pub parameters: serde_json::Value,
}

/// One provider call, provider-neutral.
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    /// Explicit provider override; `None` resolves the default provider.
    pub provider: Option<String>,
    /// Explicit model override; `None` resolves the provider's default model.
    pub model: Option<String>,
    pub params: GenerationParams,
    pub tools: Vec<ToolDeclaration>,
    /// Optional overall deadline covering queue wait and all retries.
    pub deadline: Option<Duration>,
}

impl CompletionRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_params(mut self, params: GenerationParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

/// Why the model stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    Other,
}

/// One generated alternative
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub message: ChatMessage,
    pub finish_reason: FinishReason,
}

/// Token accounting reported by the provider
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// The result of one provider call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub choices: Vec<Choice>,
    pub usage: TokenUsage,
    /// Wall-clock time of the winning attempt, in milliseconds.
    pub latency_ms: u64,
    /// Provider that actually served the call.
    pub provider: String,
    /// Model that actually served the call.
    pub model: String,
}

impl CompletionResponse {
    /// Content of the first choice, or empty if the provider returned none.
    pub fn text(&self) -> &str {
        self.choices
            .first()
            .map(|c| c.message.content.as_str())
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = CompletionRequest::new(vec![ChatMessage::user("hi")])
            .with_provider("openai")
            .with_model("gpt-4.1");
        assert_eq!(request.provider.as_deref(), Some("openai"));
        assert_eq!(request.model.as_deref(), Some("gpt-4.1"));
        assert_eq!(request.messages.len(), 1);
    }

    #[test]
    fn test_response_text_first_choice() {
        let response = CompletionResponse {
            choices: vec![Choice {
                message: ChatMessage::assistant("answer"),
                finish_reason: FinishReason::Stop,
            }],
            usage: TokenUsage::default(),
            latency_ms: 12,
            provider: "openai".into(),
            model: "gpt-4.1".into(),
        };
        assert_eq!(response.text(), "answer");
    }

    #[test]
    fn test_response_text_empty_choices() {
        let response = CompletionResponse {
            choices: vec![],
            usage: TokenUsage::default(),
            latency_ms: 0,
            provider: "openai".into(),
            model: "gpt-4.1".into(),
        };
        assert_eq!(response.text(), "");
    }
}
